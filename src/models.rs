use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::model::attendance::Attendance;
use crate::model::leave_request::LeaveRequest;
use crate::model::role::Role;
use crate::model::user::User;

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "asha@college.edu")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
    pub role: Role,
    #[schema(example = "CSE")]
    pub dept: String,
}

const MIN_PASSWORD_LEN: usize = 6;

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

impl RegisterReq {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().chars().count() < 2 {
            return Err(AppError::validation("name must be at least 2 characters"));
        }
        if !looks_like_email(self.email.trim()) {
            return Err(AppError::validation("email is not a valid address"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.dept.trim().chars().count() < 2 {
            return Err(AppError::validation("dept must be at least 2 characters"));
        }
        Ok(())
    }
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "asha@college.edu")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// email of the user the token was issued to
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
}

pub const LEAVE_PAGE_SIZE: u32 = 10;
pub const USER_PAGE_SIZE: u32 = 10;
pub const ATTENDANCE_PAGE_SIZE: u32 = 30;

#[derive(Deserialize, IntoParams)]
pub struct PageQuery {
    /// Page number, starting with 1. Missing or invalid values fall back to 1.
    pub page: Option<String>,
}

/// Offset/limit window derived from a 1-based page number.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size,
        }
    }

    pub fn from_query(query: &PageQuery, page_size: u32) -> Self {
        let page = query
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1);
        Self::new(page, page_size)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[aliases(LeavePage = Page<LeaveRequest>, UserPage = Page<User>, AttendancePage = Page<Attendance>)]
pub struct Page<T> {
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub page_size: u32,
    #[schema(example = 1)]
    pub total: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, total: i64, items: Vec<T>) -> Self {
        Self {
            page: request.page,
            page_size: request.page_size,
            total,
            items,
        }
    }
}
