use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::attendance::error::StoreResult;
use crate::attendance::recap::{LeaveCategory, RecapRow};
use crate::model::attendance::{AttendanceRecord, BreakInterval};
use crate::model::geofence::Geofence;
use crate::model::shift::ShiftDefinition;

/// Storage collaborator of the attendance engine.
///
/// Reference data is read straight from the store; attendance state is only
/// read and written through an [`AttendanceTx`].
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Opens a unit of work. Dropping it without `commit` discards every write.
    async fn begin(&self) -> StoreResult<Box<dyn AttendanceTx>>;

    async fn list_active_geofences(&self) -> StoreResult<Vec<Geofence>>;

    async fn employee_grants(&self, employee_id: u64) -> StoreResult<HashSet<u64>>;

    async fn is_wfh_eligible(&self, employee_id: u64) -> StoreResult<bool>;

    /// Active shift, the ones open to check-in.
    async fn shift_by_id(&self, shift_id: u64) -> StoreResult<Option<ShiftDefinition>>;

    /// Shift by id, retired ones included.
    async fn any_shift_by_id(&self, shift_id: u64) -> StoreResult<Option<ShiftDefinition>>;

    /// Employee of an active record, read without locking.
    async fn record_owner(&self, record_id: u64) -> StoreResult<Option<u64>>;

    async fn is_shift_granted(&self, employee_id: u64, shift_id: u64) -> StoreResult<bool>;

    async fn recap_rows(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<RecapRow>>;

    async fn approved_leave_days(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<HashMap<NaiveDate, LeaveCategory>>;

    async fn holidays(&self, start: NaiveDate, end: NaiveDate) -> StoreResult<HashSet<NaiveDate>>;
}

/// Serialized view of one employee's attendance state.
#[async_trait]
pub trait AttendanceTx: Send {
    /// Blocks concurrent operations for the same employee until commit/drop.
    async fn lock_employee(&mut self, employee_id: u64) -> StoreResult<()>;

    /// Active record of the employee with no check-out, any date.
    async fn read_open_record(&mut self, employee_id: u64) -> StoreResult<Option<AttendanceRecord>>;

    /// Active record by id.
    async fn read_record(&mut self, record_id: u64) -> StoreResult<Option<AttendanceRecord>>;

    /// Record for a work date, the active one first, soft-deleted otherwise.
    async fn read_record_on(
        &mut self,
        employee_id: u64,
        work_date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>>;

    async fn read_open_break(&mut self, record_id: u64) -> StoreResult<Option<BreakInterval>>;

    /// Active breaks ordered by start.
    async fn list_breaks(&mut self, record_id: u64) -> StoreResult<Vec<BreakInterval>>;

    /// Inserts the record, ignoring its `id`; returns the new id.
    async fn create_record(&mut self, record: &AttendanceRecord) -> StoreResult<u64>;

    async fn update_record(&mut self, record: &AttendanceRecord) -> StoreResult<()>;

    /// Inserts the break, ignoring its `id`; returns the new id.
    async fn create_break(&mut self, interval: &BreakInterval) -> StoreResult<u64>;

    async fn update_break(&mut self, interval: &BreakInterval) -> StoreResult<()>;

    async fn deactivate_breaks(&mut self, record_id: u64) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
