use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::role::Role;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "asha@college.edu")]
    pub email: String,
    pub role: Role,
    #[schema(example = "CSE")]
    pub dept: String,
    #[schema(example = "2024-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// A user together with the stored password hash. Only the login path sees this.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// argon2 PHC string, never the plain password
    pub password_hash: String,
    pub role: Role,
    pub dept: String,
}
