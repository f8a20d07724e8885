use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub student_id: u64,
    #[schema(example = "2024-01-10", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = false)]
    pub present: bool,
    /// user who recorded the row, either a marker or the approving staff member
    #[schema(example = 7)]
    pub marked_by: u64,
}

/// Attendance row before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub student_id: u64,
    pub date: NaiveDate,
    pub present: bool,
    pub marked_by: u64,
}
