use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::model::attendance::NewAttendance;
use crate::store::{RecordStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("range starts {start} after it ends {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    /// Days before `date` that were created stay in place.
    #[error("reconciliation halted at {date} after creating {created} row(s): {source}")]
    Halted {
        date: NaiveDate,
        created: u32,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub created: u32,
    /// days that already had a row, including ones another writer won
    pub kept: u32,
}

/// Backfills absent attendance rows for an approved leave.
///
/// First-writer-wins: an existing `(student_id, date)` row is never touched,
/// whatever its `present` value. The walk is not atomic; a store failure
/// halts it and the days already created remain.
#[derive(Clone)]
pub struct AttendanceReconciler {
    store: Arc<dyn RecordStore>,
}

impl AttendanceReconciler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn reconcile(
        &self,
        student_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        marker_id: u64,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if start > end {
            return Err(ReconcileError::InvertedRange { start, end });
        }

        let mut outcome = ReconcileOutcome::default();
        for date in start.iter_days().take_while(|day| *day <= end) {
            let halt = |source: StoreError, created: u32| ReconcileError::Halted {
                date,
                created,
                source,
            };

            match self.store.find_attendance(student_id, date).await {
                Ok(Some(_)) => {
                    outcome.kept += 1;
                    continue;
                }
                Ok(None) => {}
                Err(e) => return Err(halt(e, outcome.created)),
            }

            let row = NewAttendance {
                student_id,
                date,
                present: false,
                marked_by: marker_id,
            };
            match self.store.insert_attendance(row).await {
                Ok(_) => outcome.created += 1,
                Err(StoreError::Duplicate) => {
                    debug!(student_id, %date, "Attendance row appeared concurrently, keeping it");
                    outcome.kept += 1;
                }
                Err(e) => {
                    warn!(student_id, %date, created = outcome.created, error = %e, "Reconciliation halted");
                    return Err(halt(e, outcome.created));
                }
            }
        }

        info!(
            student_id,
            %start,
            %end,
            created = outcome.created,
            kept = outcome.kept,
            "Attendance reconciled"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    const STUDENT: u64 = 42;
    const FACULTY: u64 = 7;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn setup() -> (Arc<MemoryStore>, AttendanceReconciler) {
        let store = Arc::new(MemoryStore::new());
        let reconciler = AttendanceReconciler::new(store.clone());
        (store, reconciler)
    }

    #[actix_web::test]
    async fn fills_every_day_in_inclusive_range() {
        let (store, reconciler) = setup();

        let outcome = reconciler.reconcile(STUDENT, day(10), day(12), FACULTY).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome { created: 3, kept: 0 });
        let rows = store.attendance_for(STUDENT);
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(10), day(11), day(12)]);
        assert!(rows.iter().all(|r| !r.present && r.marked_by == FACULTY));
    }

    #[actix_web::test]
    async fn single_day_range_creates_one_row() {
        let (store, reconciler) = setup();
        reconciler.reconcile(STUDENT, day(5), day(5), FACULTY).await.unwrap();
        assert_eq!(store.attendance_for(STUDENT).len(), 1);
    }

    #[actix_web::test]
    async fn existing_rows_are_left_untouched() {
        let (store, reconciler) = setup();
        let marked = store.seed_attendance(NewAttendance {
            student_id: STUDENT,
            date: day(11),
            present: true,
            marked_by: 99,
        });

        let outcome = reconciler.reconcile(STUDENT, day(10), day(12), FACULTY).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome { created: 2, kept: 1 });
        let rows = store.attendance_for(STUDENT);
        assert_eq!(rows.len(), 3);
        let kept = rows.iter().find(|r| r.date == day(11)).unwrap();
        assert_eq!(kept, &marked);
    }

    #[actix_web::test]
    async fn rerun_creates_nothing() {
        let (store, reconciler) = setup();
        reconciler.reconcile(STUDENT, day(1), day(7), FACULTY).await.unwrap();
        let before = store.attendance_for(STUDENT);

        let outcome = reconciler.reconcile(STUDENT, day(1), day(7), FACULTY).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome { created: 0, kept: 7 });
        assert_eq!(store.attendance_for(STUDENT), before);
    }

    #[actix_web::test]
    async fn lost_insert_race_counts_as_existing_row() {
        let (store, reconciler) = setup();
        store.race_attendance_on(day(11));

        let outcome = reconciler.reconcile(STUDENT, day(10), day(12), FACULTY).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome { created: 2, kept: 1 });
        let rows = store.attendance_for(STUDENT);
        assert_eq!(rows.len(), 3);
        // the concurrent writer's row survives
        assert!(rows.iter().find(|r| r.date == day(11)).unwrap().present);
    }

    #[actix_web::test]
    async fn store_failure_halts_and_keeps_created_days() {
        let (store, reconciler) = setup();
        store.fail_attendance_inserts_after(2);

        let err = reconciler
            .reconcile(STUDENT, day(10), day(14), FACULTY)
            .await
            .unwrap_err();

        match err {
            ReconcileError::Halted { date, created, .. } => {
                assert_eq!(date, day(12));
                assert_eq!(created, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
        let dates: Vec<NaiveDate> = store.attendance_for(STUDENT).iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(10), day(11)]);
    }

    #[actix_web::test]
    async fn outage_during_lookup_halts_and_rerun_finishes() {
        let (store, reconciler) = setup();
        store.go_offline_after_inserts(2);

        let err = reconciler
            .reconcile(STUDENT, day(10), day(14), FACULTY)
            .await
            .unwrap_err();

        match err {
            ReconcileError::Halted { date, created, source } => {
                assert_eq!(date, day(12));
                assert_eq!(created, 2);
                assert!(matches!(source, StoreError::Unavailable(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }

        store.set_offline(false);
        assert_eq!(store.attendance_for(STUDENT).len(), 2);
        let outcome = reconciler.reconcile(STUDENT, day(10), day(14), FACULTY).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome { created: 3, kept: 2 });
    }

    #[actix_web::test]
    async fn inverted_range_is_rejected_without_writes() {
        let (store, reconciler) = setup();
        let err = reconciler.reconcile(STUDENT, day(12), day(10), FACULTY).await.unwrap_err();
        assert!(matches!(err, ReconcileError::InvertedRange { .. }));
        assert!(store.attendance_for(STUDENT).is_empty());
    }
}
