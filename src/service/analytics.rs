use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use super::policy::{self, Action};
use crate::error::AppError;
use crate::model::actor::Actor;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::role::Role;
use crate::store::RecordStore;

const RECENT_LEAVES: u64 = 10;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserCounts {
    pub students: i64,
    pub faculty: i64,
    pub wardens: i64,
    pub admins: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceCounts {
    pub present: i64,
    pub absent: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsSummary {
    pub users: UserCounts,
    pub leaves: LeaveCounts,
    pub attendance: AttendanceCounts,
    pub recent_leaves: Vec<LeaveRequest>,
}

pub struct AnalyticsService {
    store: Arc<dyn RecordStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn summary(&self, actor: &Actor) -> Result<AnalyticsSummary, AppError> {
        policy::authorize(actor, Action::ViewAnalytics)?;
        let store = &self.store;

        Ok(AnalyticsSummary {
            users: UserCounts {
                students: store.count_users_by_role(Role::Student).await?,
                faculty: store.count_users_by_role(Role::Faculty).await?,
                wardens: store.count_users_by_role(Role::Warden).await?,
                admins: store.count_users_by_role(Role::Admin).await?,
            },
            leaves: LeaveCounts {
                pending: store.count_leaves_by_status(LeaveStatus::Pending).await?,
                approved: store.count_leaves_by_status(LeaveStatus::Approved).await?,
                rejected: store.count_leaves_by_status(LeaveStatus::Rejected).await?,
            },
            attendance: AttendanceCounts {
                present: store.count_attendance_by_presence(true).await?,
                absent: store.count_attendance_by_presence(false).await?,
            },
            recent_leaves: store.list_leaves(None, 0, RECENT_LEAVES).await?,
        })
    }
}
