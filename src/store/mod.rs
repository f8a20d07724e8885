use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::attendance::{Attendance, NewAttendance};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveTransition, NewLeave};
use crate::model::role::Role;
use crate::model::user::{NewUser, User, UserAccount};

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub use mysql::MySqlStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// a uniqueness constraint rejected the write
    #[error("record already exists")]
    Duplicate,
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt {table} row {id}: {reason}")]
    Corrupt {
        table: &'static str,
        id: u64,
        reason: String,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Durable storage for users, leave requests and attendance.
///
/// Implementations give per-row read-then-write atomicity and enforce the
/// `(student_id, date)` uniqueness of attendance rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user(&self, id: u64) -> Result<Option<User>, StoreError>;
    async fn find_account_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError>;
    async fn list_users(&self, offset: u64, limit: u64) -> Result<Vec<User>, StoreError>;
    async fn count_users(&self) -> Result<i64, StoreError>;
    async fn count_users_by_role(&self, role: Role) -> Result<i64, StoreError>;

    async fn insert_leave(&self, leave: NewLeave) -> Result<LeaveRequest, StoreError>;
    async fn find_leave(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError>;
    /// Applies the transition only if the leave is still pending.
    /// Returns `false` when no pending row matched.
    async fn transition_leave(&self, transition: &LeaveTransition) -> Result<bool, StoreError>;
    /// Newest first. `student_id = None` scans every student.
    async fn list_leaves(
        &self,
        student_id: Option<u64>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<LeaveRequest>, StoreError>;
    async fn count_leaves(&self, student_id: Option<u64>) -> Result<i64, StoreError>;
    async fn count_leaves_by_status(&self, status: LeaveStatus) -> Result<i64, StoreError>;

    async fn find_attendance(
        &self,
        student_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, StoreError>;
    /// Fails with [`StoreError::Duplicate`] if the `(student_id, date)` row exists.
    async fn insert_attendance(&self, row: NewAttendance) -> Result<Attendance, StoreError>;
    /// Creates the row or overwrites `present`/`marked_by` on the existing one.
    async fn upsert_attendance(&self, row: NewAttendance) -> Result<Attendance, StoreError>;
    async fn count_present_since(&self, student_id: u64, since: NaiveDate)
    -> Result<i64, StoreError>;
    /// Newest date first.
    async fn list_attendance(
        &self,
        student_id: u64,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Attendance>, StoreError>;
    async fn count_attendance(&self, student_id: u64) -> Result<i64, StoreError>;
    async fn count_attendance_by_presence(&self, present: bool) -> Result<i64, StoreError>;
}
