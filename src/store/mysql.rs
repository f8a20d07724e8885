use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};

use super::{RecordStore, StoreError};
use crate::model::attendance::{Attendance, NewAttendance};
use crate::model::leave_request::{
    LeaveRequest, LeaveStatus, LeaveTransition, LeaveType, NewLeave,
};
use crate::model::role::Role;
use crate::model::user::{NewUser, User, UserAccount};

/// MySQL duplicate key / integrity violation SQLSTATE.
const INTEGRITY_VIOLATION: &str = "23000";

const LEAVE_COLUMNS: &str = "id, student_id, leave_type, reason, start_date, end_date, status, approved_by, remarks, created_at";
const USER_COLUMNS: &str = "id, name, email, password, role, dept, created_at";

#[derive(FromRow)]
struct UserRow {
    id: u64,
    name: String,
    email: String,
    password: String,
    role: String,
    dept: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).map_err(|e| StoreError::Corrupt {
            table: "users",
            id: row.id,
            reason: format!("role {:?}: {e}", row.role),
        })?;
        Ok(UserAccount {
            user: User {
                id: row.id,
                name: row.name,
                email: row.email,
                role,
                dept: row.dept,
                created_at: row.created_at,
            },
            password_hash: row.password,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    student_id: u64,
    leave_type: String,
    reason: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    approved_by: Option<u64>,
    remarks: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt {
            table: "leave_requests",
            id: row.id,
            reason,
        };
        let leave_type = LeaveType::from_str(&row.leave_type)
            .map_err(|e| corrupt(format!("leave_type {:?}: {e}", row.leave_type)))?;
        let status = LeaveStatus::from_str(&row.status)
            .map_err(|e| corrupt(format!("status {:?}: {e}", row.status)))?;
        Ok(LeaveRequest {
            id: row.id,
            student_id: row.student_id,
            leave_type,
            reason: row.reason,
            start_date: row.start_date,
            end_date: row.end_date,
            status,
            approved_by: row.approved_by,
            remarks: row.remarks,
            created_at: row.created_at,
        })
    }
}

fn is_integrity_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(INTEGRITY_VIOLATION))
}

/// [`RecordStore`] over the MySQL schema in `migrations/`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for MySqlStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password, role, dept)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_ref())
        .bind(&user.dept)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_integrity_violation(&e) {
                StoreError::Duplicate
            } else {
                StoreError::from(e)
            }
        })?;

        self.find_user(result.last_insert_id())
            .await?
            .ok_or_else(|| StoreError::Unavailable("inserted user not readable".into()))
    }

    async fn find_user(&self, id: u64) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| UserAccount::try_from(r).map(|a| a.user))
            .transpose()
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserAccount::try_from).transpose()
    }

    async fn list_users(&self, offset: u64, limit: u64) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT ? OFFSET ?");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| UserAccount::try_from(row).map(|a| a.user))
            .collect()
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn count_users_by_role(&self, role: Role) -> Result<i64, StoreError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.as_ref())
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn insert_leave(&self, leave: NewLeave) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (student_id, leave_type, reason, start_date, end_date, status)
            VALUES (?, ?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(leave.student_id)
        .bind(leave.leave_type.as_ref())
        .bind(&leave.reason)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .execute(&self.pool)
        .await?;

        self.find_leave(result.last_insert_id())
            .await?
            .ok_or_else(|| StoreError::Unavailable("inserted leave not readable".into()))
    }

    async fn find_leave(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn transition_leave(&self, transition: &LeaveTransition) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approved_by = ?, remarks = COALESCE(?, remarks)
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(transition.status.as_ref())
        .bind(transition.approved_by)
        .bind(transition.remarks.as_deref())
        .bind(transition.leave_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_leaves(
        &self,
        student_id: Option<u64>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let where_sql = if student_id.is_some() {
            " WHERE student_id = ?"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests{where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );

        let mut query = sqlx::query_as::<_, LeaveRow>(&sql);
        if let Some(id) = student_id {
            query = query.bind(id);
        }
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(LeaveRequest::try_from).collect()
    }

    async fn count_leaves(&self, student_id: Option<u64>) -> Result<i64, StoreError> {
        let total = match student_id {
            Some(id) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM leave_requests WHERE student_id = ?",
                )
                .bind(id)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leave_requests")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(total)
    }

    async fn count_leaves_by_status(&self, status: LeaveStatus) -> Result<i64, StoreError> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leave_requests WHERE status = ?")
                .bind(status.as_ref())
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    async fn find_attendance(
        &self,
        student_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, StoreError> {
        let row = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, student_id, date, present, marked_by
            FROM attendance
            WHERE student_id = ? AND date = ?
            "#,
        )
        .bind(student_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_attendance(&self, row: NewAttendance) -> Result<Attendance, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (student_id, date, present, marked_by)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(row.student_id)
        .bind(row.date)
        .bind(row.present)
        .bind(row.marked_by)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_integrity_violation(&e) {
                StoreError::Duplicate
            } else {
                StoreError::from(e)
            }
        })?;

        Ok(Attendance {
            id: result.last_insert_id(),
            student_id: row.student_id,
            date: row.date,
            present: row.present,
            marked_by: row.marked_by,
        })
    }

    async fn upsert_attendance(&self, row: NewAttendance) -> Result<Attendance, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO attendance (student_id, date, present, marked_by)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE present = VALUES(present), marked_by = VALUES(marked_by)
            "#,
        )
        .bind(row.student_id)
        .bind(row.date)
        .bind(row.present)
        .bind(row.marked_by)
        .execute(&self.pool)
        .await?;

        self.find_attendance(row.student_id, row.date)
            .await?
            .ok_or_else(|| StoreError::Unavailable("upserted attendance not readable".into()))
    }

    async fn count_present_since(
        &self,
        student_id: u64,
        since: NaiveDate,
    ) -> Result<i64, StoreError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM attendance
            WHERE student_id = ? AND present = TRUE AND date >= ?
            "#,
        )
        .bind(student_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn list_attendance(
        &self,
        student_id: u64,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Attendance>, StoreError> {
        let rows = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, student_id, date, present, marked_by
            FROM attendance
            WHERE student_id = ?
            ORDER BY date DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(student_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_attendance(&self, student_id: u64) -> Result<i64, StoreError> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance WHERE student_id = ?")
                .bind(student_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    async fn count_attendance_by_presence(&self, present: bool) -> Result<i64, StoreError> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance WHERE present = ?")
                .bind(present)
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }
}
