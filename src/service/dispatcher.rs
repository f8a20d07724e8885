use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::model::leave_request::{LeaveAction, LeaveRequest};
use crate::model::user::User;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("notifier not configured: {0}")]
    NotConfigured(String),
    #[error("invalid address {0:?}")]
    Address(String),
    #[error("message could not be built: {0}")]
    Message(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Outbound message transport (SMTP in production).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub address: String,
    pub subject: String,
    pub body: String,
}

/// Builds the outcome email for a leave that just left `pending`.
pub fn compose(leave: &LeaveRequest, student: &User, action: LeaveAction) -> Notification {
    let outcome = action.target();
    let remarks = leave.remarks.as_deref().unwrap_or("-");

    Notification {
        address: student.email.clone(),
        subject: format!("Leave Request #{} {}", leave.id, outcome),
        body: format!(
            "Hi {},\n\nYour leave request has been {}.\n\nRemarks: {}\n\nRegards,\nFaculty",
            student.name, outcome, remarks
        ),
    }
}

/// Fire-and-forget delivery of leave outcome notifications.
///
/// [`notify`](Self::notify) only enqueues. A background task drains the queue
/// and hands each message to the [`Notifier`] exactly once: no retry, failures
/// are logged and dropped. The task is never awaited, so whatever is still
/// queued at shutdown is lost.
#[derive(Clone)]
pub struct NotificationDispatcher {
    queue: mpsc::UnboundedSender<Notification>,
}

impl NotificationDispatcher {
    /// Spawns the delivery task on the current tokio runtime.
    pub fn start(notifier: Arc<dyn Notifier>) -> Self {
        let (queue, mut pending) = mpsc::unbounded_channel::<Notification>();

        tokio::spawn(async move {
            while let Some(message) = pending.recv().await {
                match notifier
                    .send(&message.address, &message.subject, &message.body)
                    .await
                {
                    Ok(()) => info!(to = %message.address, subject = %message.subject, "Notification sent"),
                    Err(e) => error!(
                        to = %message.address,
                        subject = %message.subject,
                        error = %e,
                        "Failed to send notification"
                    ),
                }
            }
        });

        Self { queue }
    }

    pub fn notify(&self, leave: &LeaveRequest, student: &User, action: LeaveAction) {
        let message = compose(leave, student, action);
        if let Err(e) = self.queue.send(message) {
            warn!(leave_id = leave.id, to = %e.0.address, "Notification queue closed, dropping message");
        }
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use chrono::{NaiveDate, Utc};

    use super::testing::{FailingNotifier, RecordingNotifier};
    use super::*;
    use crate::model::leave_request::{LeaveStatus, LeaveType};
    use crate::model::role::Role;

    fn student() -> User {
        User {
            id: 42,
            name: "Asha".into(),
            email: "asha@college.edu".into(),
            role: Role::Student,
            dept: "CSE".into(),
            created_at: Utc::now(),
        }
    }

    fn leave(status: LeaveStatus, remarks: Option<&str>) -> LeaveRequest {
        LeaveRequest {
            id: 17,
            student_id: 42,
            leave_type: LeaveType::Medical,
            reason: "flu".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
            status,
            approved_by: Some(7),
            remarks: remarks.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn approved_message_carries_remarks() {
        let message = compose(
            &leave(LeaveStatus::Approved, Some("get well")),
            &student(),
            LeaveAction::Approve,
        );
        assert_eq!(message.address, "asha@college.edu");
        assert_eq!(message.subject, "Leave Request #17 approved");
        assert_eq!(
            message.body,
            "Hi Asha,\n\nYour leave request has been approved.\n\nRemarks: get well\n\nRegards,\nFaculty"
        );
    }

    #[test]
    fn missing_remarks_render_as_dash() {
        let message = compose(
            &leave(LeaveStatus::Rejected, None),
            &student(),
            LeaveAction::Reject,
        );
        assert_eq!(message.subject, "Leave Request #17 rejected");
        assert!(message.body.contains("has been rejected."));
        assert!(message.body.contains("Remarks: -\n"));
    }

    #[actix_web::test]
    async fn queued_notification_is_delivered_in_background() {
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = NotificationDispatcher::start(notifier.clone());

        dispatcher.notify(
            &leave(LeaveStatus::Approved, None),
            &student(),
            LeaveAction::Approve,
        );

        let delivered = notifier.next().await.expect("notification delivered");
        assert_eq!(delivered.subject, "Leave Request #17 approved");
    }

    #[actix_web::test]
    async fn failed_delivery_is_attempted_once() {
        let notifier = Arc::new(FailingNotifier::default());
        let dispatcher = NotificationDispatcher::start(notifier.clone());

        dispatcher.notify(
            &leave(LeaveStatus::Rejected, None),
            &student(),
            LeaveAction::Reject,
        );
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
    }
}
