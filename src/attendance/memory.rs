//! In-memory store used by the ledger and handler tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::attendance::error::{StoreError, StoreResult};
use crate::attendance::recap::{LeaveCategory, RecapRow};
use crate::attendance::store::{AttendanceStore, AttendanceTx};
use crate::model::attendance::{AttendanceRecord, BreakInterval};
use crate::model::geofence::Geofence;
use crate::model::shift::ShiftDefinition;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryState {
    pub records: Vec<AttendanceRecord>,
    pub breaks: Vec<BreakInterval>,
    next_id: u64,
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    geofences: Vec<Geofence>,
    grants: HashMap<u64, HashSet<u64>>,
    wfh: HashSet<u64>,
    shifts: HashMap<u64, ShiftDefinition>,
    retired_shifts: HashSet<u64>,
    shift_grants: HashSet<(u64, u64)>,
    leaves: HashMap<u64, HashMap<NaiveDate, LeaveCategory>>,
    holidays: HashSet<NaiveDate>,
    failing: AtomicBool,
    row_locks: Arc<Mutex<Vec<RowLock>>>,
}

/// Row lock taken by a transaction, in the order it was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    Employee(u64),
    OpenRecordOf(u64),
    Record(u64),
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

impl MemoryStore {
    /// Store seeded with shifts 1 (08:00-16:00), 2 (08:00-17:00) and
    /// 3 (22:00-06:00).
    pub fn with_default_shifts() -> Self {
        Self::default()
            .with_shift(1, "Regular", t(8, 0), t(16, 0), 480)
            .with_shift(2, "Office", t(8, 0), t(17, 0), 420)
            .with_shift(3, "Night", t(22, 0), t(6, 0), 360)
    }

    pub fn with_shift(
        mut self,
        id: u64,
        name: &str,
        start_time: NaiveTime,
        end_time: NaiveTime,
        nominal_minutes: i64,
    ) -> Self {
        self.shifts.insert(
            id,
            ShiftDefinition {
                id,
                name: name.to_string(),
                start_time,
                end_time,
                nominal_minutes,
            },
        );
        self
    }

    /// Keeps the shift readable for old records but closed to check-in.
    pub fn retire_shift(mut self, id: u64) -> Self {
        self.retired_shifts.insert(id);
        self
    }

    pub fn with_geofence(mut self, id: u64, name: &str, latitude: f64, longitude: f64) -> Self {
        self.geofences.push(Geofence {
            id,
            name: name.to_string(),
            latitude: Some(latitude),
            longitude: Some(longitude),
            radius_meters: None,
            active: true,
        });
        self
    }

    pub fn with_grant(mut self, employee_id: u64, geofence_id: u64) -> Self {
        self.grants.entry(employee_id).or_default().insert(geofence_id);
        self
    }

    pub fn with_wfh(mut self, employee_id: u64) -> Self {
        self.wfh.insert(employee_id);
        self
    }

    pub fn with_shift_grant(mut self, employee_id: u64, shift_id: u64) -> Self {
        self.shift_grants.insert((employee_id, shift_id));
        self
    }

    pub fn with_leave(mut self, employee_id: u64, day: NaiveDate, category: LeaveCategory) -> Self {
        self.leaves.entry(employee_id).or_default().insert(day, category);
        self
    }

    pub fn with_holiday(mut self, day: NaiveDate) -> Self {
        self.holidays.insert(day);
        self
    }

    pub fn snapshot(&self) -> MemoryState {
        self.state.lock().unwrap().clone()
    }

    pub fn record(&self, id: u64) -> AttendanceRecord {
        self.snapshot()
            .records
            .into_iter()
            .find(|r| r.id == id)
            .unwrap()
    }

    pub fn breaks_of(&self, record_id: u64) -> Vec<BreakInterval> {
        self.snapshot()
            .breaks
            .into_iter()
            .filter(|b| b.attendance_id == record_id)
            .collect()
    }

    /// Inserts a record directly, bypassing the ledger.
    pub fn seed_record(&self, mut record: AttendanceRecord) -> u64 {
        let mut state = self.state.lock().unwrap();
        record.id = state.next_id();
        let id = record.id;
        state.records.push(record);
        id
    }

    pub fn seed_break(&self, mut interval: BreakInterval) -> u64 {
        let mut state = self.state.lock().unwrap();
        interval.id = state.next_id();
        let id = interval.id;
        state.breaks.push(interval);
        id
    }

    pub fn row_locks(&self) -> Vec<RowLock> {
        self.row_locks.lock().unwrap().clone()
    }

    /// Makes every subsequent call fail as if the database were down.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn AttendanceTx>> {
        self.check()?;
        let working = self.state.lock().unwrap().clone();
        Ok(Box::new(MemoryTx {
            shared: Arc::clone(&self.state),
            working,
            row_locks: Arc::clone(&self.row_locks),
        }))
    }

    async fn list_active_geofences(&self) -> StoreResult<Vec<Geofence>> {
        self.check()?;
        Ok(self.geofences.iter().filter(|g| g.active).cloned().collect())
    }

    async fn employee_grants(&self, employee_id: u64) -> StoreResult<HashSet<u64>> {
        self.check()?;
        Ok(self.grants.get(&employee_id).cloned().unwrap_or_default())
    }

    async fn is_wfh_eligible(&self, employee_id: u64) -> StoreResult<bool> {
        self.check()?;
        Ok(self.wfh.contains(&employee_id))
    }

    async fn shift_by_id(&self, shift_id: u64) -> StoreResult<Option<ShiftDefinition>> {
        self.check()?;
        if self.retired_shifts.contains(&shift_id) {
            return Ok(None);
        }
        Ok(self.shifts.get(&shift_id).cloned())
    }

    async fn any_shift_by_id(&self, shift_id: u64) -> StoreResult<Option<ShiftDefinition>> {
        self.check()?;
        Ok(self.shifts.get(&shift_id).cloned())
    }

    async fn record_owner(&self, record_id: u64) -> StoreResult<Option<u64>> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .records
            .iter()
            .find(|r| r.id == record_id && r.active)
            .map(|r| r.employee_id))
    }

    async fn is_shift_granted(&self, employee_id: u64, shift_id: u64) -> StoreResult<bool> {
        self.check()?;
        Ok(self.shift_grants.contains(&(employee_id, shift_id)))
    }

    async fn recap_rows(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<RecapRow>> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .records
            .iter()
            .filter(|r| r.employee_id == employee_id && r.active)
            .filter(|r| r.work_date >= start && r.work_date <= end)
            .filter_map(|r| {
                let shift = self.shifts.get(&r.shift_id)?;
                Some(RecapRow {
                    work_date: r.work_date,
                    lateness_minutes: r.lateness_minutes,
                    worked_minutes: r.worked_minutes,
                    nominal_minutes: shift.nominal_minutes,
                })
            })
            .collect())
    }

    async fn approved_leave_days(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<HashMap<NaiveDate, LeaveCategory>> {
        self.check()?;
        Ok(self
            .leaves
            .get(&employee_id)
            .map(|days| {
                days.iter()
                    .filter(|(day, _)| **day >= start && **day <= end)
                    .map(|(day, category)| (*day, *category))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn holidays(&self, start: NaiveDate, end: NaiveDate) -> StoreResult<HashSet<NaiveDate>> {
        self.check()?;
        Ok(self
            .holidays
            .iter()
            .filter(|day| **day >= start && **day <= end)
            .copied()
            .collect())
    }
}

/// Works on a private copy; `commit` publishes it, drop discards it.
pub struct MemoryTx {
    shared: Arc<Mutex<MemoryState>>,
    working: MemoryState,
    row_locks: Arc<Mutex<Vec<RowLock>>>,
}

impl MemoryTx {
    fn took(&self, lock: RowLock) {
        self.row_locks.lock().unwrap().push(lock);
    }
}

#[async_trait]
impl AttendanceTx for MemoryTx {
    async fn lock_employee(&mut self, employee_id: u64) -> StoreResult<()> {
        self.took(RowLock::Employee(employee_id));
        Ok(())
    }

    async fn read_open_record(&mut self, employee_id: u64) -> StoreResult<Option<AttendanceRecord>> {
        self.took(RowLock::OpenRecordOf(employee_id));
        Ok(self
            .working
            .records
            .iter()
            .filter(|r| r.employee_id == employee_id && r.is_open())
            .max_by_key(|r| r.work_date)
            .cloned())
    }

    async fn read_record(&mut self, record_id: u64) -> StoreResult<Option<AttendanceRecord>> {
        self.took(RowLock::Record(record_id));
        Ok(self
            .working
            .records
            .iter()
            .find(|r| r.id == record_id && r.active)
            .cloned())
    }

    async fn read_record_on(
        &mut self,
        employee_id: u64,
        work_date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        Ok(self
            .working
            .records
            .iter()
            .filter(|r| r.employee_id == employee_id && r.work_date == work_date)
            .max_by_key(|r| (r.active, r.id))
            .cloned())
    }

    async fn read_open_break(&mut self, record_id: u64) -> StoreResult<Option<BreakInterval>> {
        Ok(self
            .working
            .breaks
            .iter()
            .find(|b| b.attendance_id == record_id && b.is_open())
            .cloned())
    }

    async fn list_breaks(&mut self, record_id: u64) -> StoreResult<Vec<BreakInterval>> {
        let mut breaks: Vec<BreakInterval> = self
            .working
            .breaks
            .iter()
            .filter(|b| b.attendance_id == record_id && b.active)
            .cloned()
            .collect();
        breaks.sort_by_key(|b| (b.start, b.id));
        Ok(breaks)
    }

    async fn create_record(&mut self, record: &AttendanceRecord) -> StoreResult<u64> {
        let id = self.working.next_id();
        self.working.records.push(AttendanceRecord { id, ..record.clone() });
        Ok(id)
    }

    async fn update_record(&mut self, record: &AttendanceRecord) -> StoreResult<()> {
        if let Some(slot) = self.working.records.iter_mut().find(|r| r.id == record.id) {
            *slot = record.clone();
        }
        Ok(())
    }

    async fn create_break(&mut self, interval: &BreakInterval) -> StoreResult<u64> {
        let id = self.working.next_id();
        self.working.breaks.push(BreakInterval { id, ..interval.clone() });
        Ok(id)
    }

    async fn update_break(&mut self, interval: &BreakInterval) -> StoreResult<()> {
        if let Some(slot) = self.working.breaks.iter_mut().find(|b| b.id == interval.id) {
            *slot = interval.clone();
        }
        Ok(())
    }

    async fn deactivate_breaks(&mut self, record_id: u64) -> StoreResult<()> {
        self.working
            .breaks
            .iter_mut()
            .filter(|b| b.attendance_id == record_id)
            .for_each(|b| b.active = false);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { shared, working, .. } = *self;
        *shared.lock().unwrap() = working;
        Ok(())
    }
}
