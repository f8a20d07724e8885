//! Role based authorization.
//!
//! [`allowed`] is the whole rulebook: a fixed table from `(role, action)` to
//! yes/no. Every arm names its roles explicitly, so introducing a role breaks
//! the build here until someone decides what it may do.
//!
//! The policy is stateless and must run before any write is attempted.

use strum_macros::Display;

use crate::error::AppError;
use crate::model::actor::Actor;
use crate::model::role::Role;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    SubmitLeave,
    ActOnLeave,
    ListOwnLeaves,
    ListAllLeaves,
    MarkAttendance,
    /// students pass the table but are scoped to their own rows
    ViewAttendance,
    ViewAnalytics,
    ListUsers,
}

pub fn allowed(role: Role, action: Action) -> bool {
    use Action::*;
    use Role::*;

    match action {
        SubmitLeave => match role {
            Student => true,
            Faculty | Warden | Admin => false,
        },
        ActOnLeave => match role {
            Faculty | Warden => true,
            Student | Admin => false,
        },
        ListOwnLeaves => match role {
            Student | Faculty | Warden | Admin => true,
        },
        ListAllLeaves => match role {
            Faculty | Warden => true,
            Student | Admin => false,
        },
        MarkAttendance => match role {
            Faculty | Warden | Admin => true,
            Student => false,
        },
        ViewAttendance => match role {
            Student | Faculty | Warden | Admin => true,
        },
        ViewAnalytics | ListUsers => match role {
            Admin => true,
            Student | Faculty | Warden => false,
        },
    }
}

/// Fails with `Forbidden` unless the actor's role may perform `action`.
pub fn authorize(actor: &Actor, action: Action) -> Result<(), AppError> {
    if allowed(actor.role, action) {
        Ok(())
    } else {
        tracing::info!(user_id = actor.id, role = %actor.role, %action, "Action denied");
        Err(AppError::forbidden(format!(
            "role '{}' is not permitted to {}",
            actor.role,
            action.to_string().replace('_', " ")
        )))
    }
}

/// Which student-owned rows a caller may see.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Visibility {
    Own(u64),
    All,
}

impl Visibility {
    pub fn of(actor: &Actor) -> Self {
        match actor.role {
            Role::Student => Visibility::Own(actor.id),
            Role::Faculty | Role::Warden | Role::Admin => Visibility::All,
        }
    }

    /// `Some(student_id)` when a scan must be restricted to one student.
    pub fn scope(self) -> Option<u64> {
        match self {
            Visibility::Own(id) => Some(id),
            Visibility::All => None,
        }
    }

    pub fn covers(self, student_id: u64) -> bool {
        match self {
            Visibility::Own(id) => id == student_id,
            Visibility::All => true,
        }
    }
}

/// Fails with `Forbidden` when a student reaches for another student's records.
pub fn ensure_visible(actor: &Actor, student_id: u64) -> Result<(), AppError> {
    if Visibility::of(actor).covers(student_id) {
        Ok(())
    } else {
        Err(AppError::forbidden("students may only access their own records"))
    }
}
