use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use super::dispatcher::NotificationDispatcher;
use super::policy::{self, Action, Visibility};
use super::reconciler::AttendanceReconciler;
use crate::error::AppError;
use crate::model::actor::Actor;
use crate::model::leave_request::{
    LeaveAction, LeaveRequest, LeaveTransition, LeaveType, NewLeave,
};
use crate::models::{Page, PageRequest};
use crate::store::RecordStore;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        AppError::validation(format!("Invalid {field} {value:?}. Use YYYY-MM-DD"))
    })
}

/// Raw leave application as submitted by a student.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LeaveApplication {
    #[schema(example = "Medical")]
    pub leave_type: String,
    #[schema(example = "flu")]
    pub reason: String,
    #[schema(example = "2024-01-10", format = "date")]
    pub start_date: String,
    #[schema(example = "2024-01-12", format = "date")]
    pub end_date: String,
}

impl LeaveApplication {
    pub fn validate(&self, student_id: u64) -> Result<NewLeave, AppError> {
        let leave_type = LeaveType::from_str(self.leave_type.trim()).map_err(|_| {
            AppError::validation(
                "Invalid leave type. Allowed: Medical, Personal, Academic, Emergency",
            )
        })?;

        let reason = self.reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("reason must not be empty"));
        }

        let start_date = parse_date("start_date", &self.start_date)?;
        let end_date = parse_date("end_date", &self.end_date)?;
        if start_date > end_date {
            return Err(AppError::validation("start_date cannot be after end_date"));
        }

        Ok(NewLeave {
            student_id,
            leave_type,
            reason: reason.to_string(),
            start_date,
            end_date,
        })
    }
}

/// Decides the transition for `action` on `leave`, or why it is illegal.
///
/// Only `pending` leaves move; anything else is a conflict, including a
/// repeat of the action that already happened.
pub fn plan_transition(
    leave: &LeaveRequest,
    action: LeaveAction,
    actor: &Actor,
    remarks: Option<String>,
) -> Result<LeaveTransition, AppError> {
    if leave.status.is_terminal() {
        return Err(AppError::conflict(format!(
            "Leave request #{} is already {}",
            leave.id, leave.status
        )));
    }
    Ok(LeaveTransition {
        leave_id: leave.id,
        status: action.target(),
        approved_by: actor.id,
        remarks,
    })
}

/// Leave lifecycle: submission, the single pending → approved/rejected
/// decision, and listing.
pub struct LeaveService {
    store: Arc<dyn RecordStore>,
    reconciler: AttendanceReconciler,
    dispatcher: NotificationDispatcher,
}

impl LeaveService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        reconciler: AttendanceReconciler,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            reconciler,
            dispatcher,
        }
    }

    pub async fn submit(
        &self,
        actor: &Actor,
        application: &LeaveApplication,
    ) -> Result<LeaveRequest, AppError> {
        policy::authorize(actor, Action::SubmitLeave)?;
        let new_leave = application.validate(actor.id)?;

        let leave = self.store.insert_leave(new_leave).await?;
        info!(
            leave_id = leave.id,
            student_id = leave.student_id,
            leave_type = %leave.leave_type,
            "Leave request submitted"
        );
        Ok(leave)
    }

    /// Approves or rejects a pending leave.
    ///
    /// Order is fixed: persist the transition, reconcile attendance (approve
    /// only), then enqueue the notification. A reconciliation failure is
    /// returned as `Internal` even though the new status is already stored;
    /// callers must re-fetch to learn the actual state.
    pub async fn act(
        &self,
        leave_id: u64,
        action: LeaveAction,
        actor: &Actor,
        remarks: Option<String>,
    ) -> Result<LeaveRequest, AppError> {
        policy::authorize(actor, Action::ActOnLeave)?;

        let leave = self
            .store
            .find_leave(leave_id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave not found"))?;

        let transition = plan_transition(&leave, action, actor, remarks)?;
        if !self.store.transition_leave(&transition).await? {
            // another decision landed between our read and write
            return Err(AppError::conflict(format!(
                "Leave request #{leave_id} is no longer pending"
            )));
        }
        let leave = leave.with_transition(&transition);
        info!(leave_id, status = %leave.status, approved_by = actor.id, "Leave request decided");

        if action == LeaveAction::Approve {
            self.reconciler
                .reconcile(leave.student_id, leave.start_date, leave.end_date, actor.id)
                .await
                .map_err(|e| {
                    error!(leave_id, error = %e, "Attendance reconciliation failed after approval");
                    AppError::Internal(format!("leave #{leave_id} approved but {e}"))
                })?;
        }

        match self.store.find_user(leave.student_id).await {
            Ok(Some(student)) => self.dispatcher.notify(&leave, &student, action),
            Ok(None) => warn!(leave_id, student_id = leave.student_id, "Student not found, skipping notification"),
            Err(e) => warn!(leave_id, error = %e, "Student lookup failed, skipping notification"),
        }

        Ok(leave)
    }

    /// Students see their own leaves, staff see everyone's. Newest first.
    pub async fn list_for(
        &self,
        actor: &Actor,
        page: PageRequest,
    ) -> Result<Page<LeaveRequest>, AppError> {
        policy::authorize(actor, Action::ListOwnLeaves)?;
        self.page(Visibility::of(actor).scope(), page).await
    }

    /// Leaves the actor filed, whatever their role.
    pub async fn list_own(
        &self,
        actor: &Actor,
        page: PageRequest,
    ) -> Result<Page<LeaveRequest>, AppError> {
        policy::authorize(actor, Action::ListOwnLeaves)?;
        self.page(Some(actor.id), page).await
    }

    pub async fn list_all(
        &self,
        actor: &Actor,
        page: PageRequest,
    ) -> Result<Page<LeaveRequest>, AppError> {
        policy::authorize(actor, Action::ListAllLeaves)?;
        self.list_for(actor, page).await
    }

    pub async fn get(&self, actor: &Actor, leave_id: u64) -> Result<LeaveRequest, AppError> {
        let leave = self
            .store
            .find_leave(leave_id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave not found"))?;
        policy::ensure_visible(actor, leave.student_id)?;
        Ok(leave)
    }

    async fn page(
        &self,
        student_id: Option<u64>,
        page: PageRequest,
    ) -> Result<Page<LeaveRequest>, AppError> {
        let total = self.store.count_leaves(student_id).await?;
        let items = self
            .store
            .list_leaves(student_id, page.offset(), page.limit())
            .await?;
        Ok(Page::new(page, total, items))
    }
}
