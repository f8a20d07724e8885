use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
pub enum LeaveType {
    Medical,
    Personal,
    Academic,
    Emergency,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

/// Staff decision on a pending leave.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveAction {
    Approve,
    Reject,
}

impl LeaveAction {
    /// The status a pending leave moves to under this action.
    pub fn target(self) -> LeaveStatus {
        match self {
            LeaveAction::Approve => LeaveStatus::Approved,
            LeaveAction::Reject => LeaveStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "student_id": 42,
    "leave_type": "Medical",
    "reason": "flu",
    "start_date": "2024-01-10",
    "end_date": "2024-01-12",
    "status": "approved",
    "approved_by": 7,
    "remarks": "get well",
    "created_at": "2024-01-09T08:30:00Z"
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub student_id: u64,
    pub leave_type: LeaveType,
    pub reason: String,
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Applies a persisted transition to this in-memory copy.
    pub fn with_transition(mut self, transition: &LeaveTransition) -> Self {
        self.status = transition.status;
        self.approved_by = Some(transition.approved_by);
        if transition.remarks.is_some() {
            self.remarks = transition.remarks.clone();
        }
        self
    }
}

/// A validated leave application, ready to be stored as `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeave {
    pub student_id: u64,
    pub leave_type: LeaveType,
    pub reason: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// The single write that moves a leave out of `pending`.
///
/// Stores apply it only while the row is still pending, so two racing
/// staff decisions cannot both land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveTransition {
    pub leave_id: u64,
    pub status: LeaveStatus,
    pub approved_by: u64,
    pub remarks: Option<String>,
}
