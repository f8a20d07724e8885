//! Leave lifecycle and attendance reconciliation.
//!
//! A caller action enters through [`policy`], moves a leave through
//! [`leave::LeaveService`], and on approval runs the
//! [`reconciler::AttendanceReconciler`] before handing the outcome to the
//! [`dispatcher::NotificationDispatcher`].

pub mod analytics;
pub mod attendance;
pub mod dispatcher;
pub mod leave;
pub mod policy;
pub mod reconciler;
