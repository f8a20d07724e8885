use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::leave::parse_date;
use super::policy::{self, Action};
use crate::error::AppError;
use crate::model::actor::Actor;
use crate::model::attendance::{Attendance, NewAttendance};
use crate::models::{Page, PageRequest};
use crate::store::RecordStore;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = 42)]
    pub student_id: u64,
    #[schema(example = "2024-01-10", format = "date")]
    pub date: String,
    #[schema(example = true)]
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceStats {
    #[schema(example = 42)]
    pub student_id: u64,
    #[schema(example = 12)]
    pub present_days: i64,
    #[schema(example = 14)]
    pub total_days: i64,
    #[schema(example = 85.7)]
    pub percentage: f64,
}

/// Approximate school days elapsed this month: every full week drops two weekend days.
pub fn school_days_so_far(today: NaiveDate) -> i64 {
    let day = i64::from(today.day());
    (day - (day / 7) * 2).max(0)
}

/// Explicit daily marking by staff, plus per-student reporting.
///
/// Unlike the leave reconciler, a staff marking overwrites an existing row
/// for the same day.
pub struct AttendanceService {
    store: Arc<dyn RecordStore>,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn mark(&self, actor: &Actor, request: &MarkAttendance) -> Result<Attendance, AppError> {
        policy::authorize(actor, Action::MarkAttendance)?;
        let date = parse_date("date", &request.date)?;

        let row = self
            .store
            .upsert_attendance(NewAttendance {
                student_id: request.student_id,
                date,
                present: request.present,
                marked_by: actor.id,
            })
            .await?;
        info!(
            student_id = row.student_id,
            %date,
            present = row.present,
            marked_by = actor.id,
            "Attendance marked"
        );
        Ok(row)
    }

    pub async fn stats(
        &self,
        actor: &Actor,
        student_id: u64,
        today: NaiveDate,
    ) -> Result<AttendanceStats, AppError> {
        policy::authorize(actor, Action::ViewAttendance)?;
        policy::ensure_visible(actor, student_id)?;

        let month_start = today.with_day(1).unwrap_or(today);
        let present_days = self.store.count_present_since(student_id, month_start).await?;
        let total_days = school_days_so_far(today);
        let percentage = if total_days > 0 {
            present_days as f64 / total_days as f64 * 100.0
        } else {
            0.0
        };

        Ok(AttendanceStats {
            student_id,
            present_days,
            total_days,
            percentage,
        })
    }

    pub async fn history(
        &self,
        actor: &Actor,
        student_id: u64,
        page: PageRequest,
    ) -> Result<Page<Attendance>, AppError> {
        policy::authorize(actor, Action::ViewAttendance)?;
        policy::ensure_visible(actor, student_id)?;

        let total = self.store.count_attendance(student_id).await?;
        let items = self
            .store
            .list_attendance(student_id, page.offset(), page.limit())
            .await?;
        Ok(Page::new(page, total, items))
    }
}
