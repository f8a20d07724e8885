//! In-process [`RecordStore`] used by the test suites.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};

use super::{RecordStore, StoreError};
use crate::model::attendance::{Attendance, NewAttendance};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveTransition, NewLeave};
use crate::model::role::Role;
use crate::model::user::{NewUser, User, UserAccount};

#[derive(Default)]
struct Inner {
    next_id: u64,
    users: BTreeMap<u64, UserAccount>,
    leaves: BTreeMap<u64, LeaveRequest>,
    attendance: BTreeMap<(u64, NaiveDate), Attendance>,
    /// attendance inserts left before the store starts failing
    insert_budget: Option<usize>,
    /// dates whose row appears between the reconciler's lookup and its insert
    raced_dates: HashSet<NaiveDate>,
    /// leaves another staff member decides between our read and our update
    raced_leaves: HashSet<u64>,
    /// attendance inserts left before the connection drops
    inserts_before_outage: Option<usize>,
    offline: bool,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            Err(StoreError::Unavailable("store offline".into()))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets `n` more attendance inserts succeed, then reports the store as unreachable.
    pub fn fail_attendance_inserts_after(&self, n: usize) {
        self.inner.lock().unwrap().insert_budget = Some(n);
    }

    /// Simulates a concurrent writer creating the row for `date` right before our insert.
    pub fn race_attendance_on(&self, date: NaiveDate) {
        self.inner.lock().unwrap().raced_dates.insert(date);
    }

    /// Simulates another staff member rejecting `leave_id` right before our update.
    pub fn race_transition_on(&self, leave_id: u64) {
        self.inner.lock().unwrap().raced_leaves.insert(leave_id);
    }

    /// Takes the whole store offline once `n` more attendance inserts succeed.
    pub fn go_offline_after_inserts(&self, n: usize) {
        self.inner.lock().unwrap().inserts_before_outage = Some(n);
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().unwrap().offline = offline;
    }

    pub fn seed_user(&self, name: &str, role: Role) -> User {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let user = User {
            id,
            name: name.to_string(),
            email: format!("{}@college.edu", name.to_lowercase()),
            role,
            dept: "CSE".into(),
            created_at: Utc::now(),
        };
        inner.users.insert(
            id,
            UserAccount {
                user: user.clone(),
                password_hash: String::new(),
            },
        );
        user
    }

    pub fn seed_attendance(&self, row: NewAttendance) -> Attendance {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let stored = Attendance {
            id,
            student_id: row.student_id,
            date: row.date,
            present: row.present,
            marked_by: row.marked_by,
        };
        inner
            .attendance
            .insert((row.student_id, row.date), stored.clone());
        stored
    }

    pub fn attendance_for(&self, student_id: u64) -> Vec<Attendance> {
        let inner = self.inner.lock().unwrap();
        inner
            .attendance
            .values()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_online()?;
        if inner.users.values().any(|a| a.user.email == user.email) {
            return Err(StoreError::Duplicate);
        }
        let id = inner.next_id();
        let stored = User {
            id,
            name: user.name,
            email: user.email,
            role: user.role,
            dept: user.dept,
            created_at: Utc::now(),
        };
        inner.users.insert(
            id,
            UserAccount {
                user: stored.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(stored)
    }

    async fn find_user(&self, id: u64) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        Ok(inner.users.get(&id).map(|a| a.user.clone()))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        Ok(inner.users.values().find(|a| a.user.email == email).cloned())
    }

    async fn list_users(&self, offset: u64, limit: u64) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        Ok(inner
            .users
            .values()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|a| a.user.clone())
            .collect())
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        Ok(inner.users.len() as i64)
    }

    async fn count_users_by_role(&self, role: Role) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        Ok(inner.users.values().filter(|a| a.user.role == role).count() as i64)
    }

    async fn insert_leave(&self, leave: NewLeave) -> Result<LeaveRequest, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_online()?;
        let id = inner.next_id();
        // strictly increasing creation times keep newest-first ordering deterministic
        let created_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(id as i64);
        let stored = LeaveRequest {
            id,
            student_id: leave.student_id,
            leave_type: leave.leave_type,
            reason: leave.reason,
            start_date: leave.start_date,
            end_date: leave.end_date,
            status: LeaveStatus::Pending,
            approved_by: None,
            remarks: None,
            created_at,
        };
        inner.leaves.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_leave(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        Ok(inner.leaves.get(&id).cloned())
    }

    async fn transition_leave(&self, transition: &LeaveTransition) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_online()?;
        if inner.raced_leaves.remove(&transition.leave_id) {
            if let Some(leave) = inner.leaves.get_mut(&transition.leave_id) {
                leave.status = LeaveStatus::Rejected;
                leave.approved_by = Some(0);
            }
        }
        match inner.leaves.get_mut(&transition.leave_id) {
            Some(leave) if leave.status == LeaveStatus::Pending => {
                leave.status = transition.status;
                leave.approved_by = Some(transition.approved_by);
                if transition.remarks.is_some() {
                    leave.remarks = transition.remarks.clone();
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_leaves(
        &self,
        student_id: Option<u64>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        let mut leaves: Vec<LeaveRequest> = inner
            .leaves
            .values()
            .filter(|l| student_id.is_none_or(|id| l.student_id == id))
            .cloned()
            .collect();
        leaves.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(leaves
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_leaves(&self, student_id: Option<u64>) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        Ok(inner
            .leaves
            .values()
            .filter(|l| student_id.is_none_or(|id| l.student_id == id))
            .count() as i64)
    }

    async fn count_leaves_by_status(&self, status: LeaveStatus) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        Ok(inner.leaves.values().filter(|l| l.status == status).count() as i64)
    }

    async fn find_attendance(
        &self,
        student_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        Ok(inner.attendance.get(&(student_id, date)).cloned())
    }

    async fn insert_attendance(&self, row: NewAttendance) -> Result<Attendance, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_online()?;
        if let Some(budget) = inner.insert_budget.as_mut() {
            if *budget == 0 {
                return Err(StoreError::Unavailable("connection reset".into()));
            }
            *budget -= 1;
        }
        if inner.raced_dates.remove(&row.date) {
            let id = inner.next_id();
            let winner = Attendance {
                id,
                student_id: row.student_id,
                date: row.date,
                present: true,
                marked_by: 0,
            };
            inner.attendance.insert((row.student_id, row.date), winner);
        }
        if inner.attendance.contains_key(&(row.student_id, row.date)) {
            return Err(StoreError::Duplicate);
        }
        let id = inner.next_id();
        let stored = Attendance {
            id,
            student_id: row.student_id,
            date: row.date,
            present: row.present,
            marked_by: row.marked_by,
        };
        inner
            .attendance
            .insert((row.student_id, row.date), stored.clone());
        if let Some(left) = inner.inserts_before_outage.as_mut() {
            *left = left.saturating_sub(1);
            if *left == 0 {
                inner.inserts_before_outage = None;
                inner.offline = true;
            }
        }
        Ok(stored)
    }

    async fn upsert_attendance(&self, row: NewAttendance) -> Result<Attendance, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_online()?;
        let key = (row.student_id, row.date);
        if let Some(existing) = inner.attendance.get_mut(&key) {
            existing.present = row.present;
            existing.marked_by = row.marked_by;
            return Ok(existing.clone());
        }
        let id = inner.next_id();
        let stored = Attendance {
            id,
            student_id: row.student_id,
            date: row.date,
            present: row.present,
            marked_by: row.marked_by,
        };
        inner.attendance.insert(key, stored.clone());
        Ok(stored)
    }

    async fn count_present_since(
        &self,
        student_id: u64,
        since: NaiveDate,
    ) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        Ok(inner
            .attendance
            .values()
            .filter(|a| a.student_id == student_id && a.present && a.date >= since)
            .count() as i64)
    }

    async fn list_attendance(
        &self,
        student_id: u64,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Attendance>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        Ok(inner
            .attendance
            .values()
            .rev()
            .filter(|a| a.student_id == student_id)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_attendance(&self, student_id: u64) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        Ok(inner
            .attendance
            .values()
            .filter(|a| a.student_id == student_id)
            .count() as i64)
    }

    async fn count_attendance_by_presence(&self, present: bool) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_online()?;
        Ok(inner
            .attendance
            .values()
            .filter(|a| a.present == present)
            .count() as i64)
    }
}
