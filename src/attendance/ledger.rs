use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use utoipa::ToSchema;

use crate::attendance::biometric::BiometricVerifier;
use crate::attendance::error::{AttendanceError, AttendanceResult, RejectionKind};
use crate::attendance::location::{AuthorizedLocation, LocationPolicy};
use crate::attendance::recap::{self, MonthlyRecap};
use crate::attendance::store::{AttendanceStore, AttendanceTx};
use crate::config::AttendancePolicy;
use crate::model::attendance::{AttendanceRecord, BreakInterval};
use crate::model::geofence::Coordinate;
use crate::model::shift::ShiftDefinition;
use crate::utils::{shift_date, time_calc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceState {
    NoOpenRecord,
    CheckedIn,
    OnBreak,
    CheckedOut,
}

/// Record state after a successful operation.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceReceipt {
    pub record: AttendanceRecord,
    pub breaks: Vec<BreakInterval>,
    /// Location the operation was recorded from, absent on admin paths.
    pub location: Option<AuthorizedLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyStatus {
    pub state: AttendanceState,
    pub record: Option<AttendanceRecord>,
    pub breaks: Vec<BreakInterval>,
    /// How far the last closed break ran past the return deadline.
    pub break_overrun_minutes: i64,
}

/// Fields an administrator may overwrite; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceCorrection {
    pub check_in: Option<NaiveTime>,
    pub check_in_location_id: Option<u64>,
    pub check_out: Option<NaiveTime>,
    pub check_out_location_id: Option<u64>,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub break_return_location_id: Option<u64>,
}

/// Attendance entered by an administrator.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualEntry {
    pub employee_id: u64,
    pub work_date: NaiveDate,
    /// Falls back to the default shift.
    pub shift_id: Option<u64>,
    pub check_in: NaiveTime,
    pub check_in_location_id: u64,
    pub check_out: Option<NaiveTime>,
    pub check_out_location_id: Option<u64>,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub break_return_location_id: Option<u64>,
}

/// Per-employee attendance state machine.
///
/// Every mutating operation runs in one store transaction with the employee
/// locked; a rejection drops the transaction before commit.
#[derive(Clone)]
pub struct AttendanceLedger {
    store: Arc<dyn AttendanceStore>,
    verifier: Arc<dyn BiometricVerifier>,
    locations: LocationPolicy,
    policy: AttendancePolicy,
}

impl AttendanceLedger {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        verifier: Arc<dyn BiometricVerifier>,
        policy: AttendancePolicy,
    ) -> Self {
        let locations = LocationPolicy::new(Arc::clone(&store), policy.wfh_location_id);
        Self {
            store,
            verifier,
            locations,
            policy,
        }
    }

    pub async fn authorize_location(
        &self,
        employee_id: u64,
        point: Coordinate,
    ) -> AttendanceResult<AuthorizedLocation> {
        self.locations.authorize(employee_id, point).await
    }

    #[tracing::instrument(skip(self, face_image))]
    pub async fn check_in(
        &self,
        employee_id: u64,
        now: NaiveDateTime,
        shift_id: Option<u64>,
        point: Coordinate,
        face_image: &[u8],
    ) -> AttendanceResult<AttendanceReceipt> {
        self.verify_face(employee_id, face_image).await?;

        let mut tx = self.store.begin().await?;
        tx.lock_employee(employee_id).await?;

        if tx.read_open_record(employee_id).await?.is_some() {
            return Err(AttendanceError::validation(
                RejectionKind::AlreadyCheckedIn,
                "already has active attendance",
            ));
        }

        let shift = self
            .allowed_shift(employee_id, shift_id.unwrap_or(self.policy.default_shift_id))
            .await?;
        let location = self.locations.authorize(employee_id, point).await?;

        let at = clock(now);
        let work_date = shift_date::resolve_attendance_date(
            now,
            shift.start_time,
            self.policy.early_check_in_window,
        );
        let mut record = AttendanceRecord::opened(
            employee_id,
            work_date,
            shift.id,
            at,
            location.geofence_id,
            time_calc::lateness(at, shift.start_time),
        );

        let auto_break = self.policy.auto_breaks.get(&shift.id).map(|window| BreakInterval {
            end: Some(window.end),
            duration_minutes: Some(time_calc::minutes_between(window.start, window.end)),
            return_location_id: Some(location.geofence_id),
            ..BreakInterval::started(0, window.start)
        });
        if let Some(interval) = &auto_break {
            record.break_minutes += interval.duration_minutes.unwrap_or(0);
        }

        record.id = tx.create_record(&record).await?;
        if let Some(mut interval) = auto_break {
            interval.attendance_id = record.id;
            tx.create_break(&interval).await?;
        }

        let receipt = receipt(tx.as_mut(), record, Some(location)).await?;
        tx.commit().await?;

        tracing::info!(
            employee_id,
            record_id = receipt.record.id,
            work_date = %receipt.record.work_date,
            lateness = receipt.record.lateness_minutes,
            "Checked in"
        );
        Ok(receipt)
    }

    #[tracing::instrument(skip(self))]
    pub async fn break_start(
        &self,
        employee_id: u64,
        now: NaiveDateTime,
    ) -> AttendanceResult<AttendanceReceipt> {
        let mut tx = self.store.begin().await?;
        tx.lock_employee(employee_id).await?;

        let record = open_record(tx.as_mut(), employee_id).await?;

        if tx.read_open_break(record.id).await?.is_some() {
            return Err(AttendanceError::validation(
                RejectionKind::BreakAlreadyActive,
                "break already started",
            ));
        }

        let at = clock(now);
        if at < self.policy.earliest_break {
            return Err(AttendanceError::validation(
                RejectionKind::BreakTooEarly,
                format!(
                    "break cannot start before {}",
                    self.policy.earliest_break.format("%H:%M")
                ),
            ));
        }

        tx.create_break(&BreakInterval::started(record.id, at)).await?;

        let receipt = receipt(tx.as_mut(), record, None).await?;
        tx.commit().await?;

        tracing::info!(employee_id, record_id = receipt.record.id, "Break started");
        Ok(receipt)
    }

    #[tracing::instrument(skip(self, face_image))]
    pub async fn break_end(
        &self,
        employee_id: u64,
        now: NaiveDateTime,
        point: Coordinate,
        face_image: &[u8],
    ) -> AttendanceResult<AttendanceReceipt> {
        self.verify_face(employee_id, face_image).await?;

        let mut tx = self.store.begin().await?;
        tx.lock_employee(employee_id).await?;

        let mut record = open_record(tx.as_mut(), employee_id).await?;

        let Some(mut interval) = tx.read_open_break(record.id).await? else {
            return Err(AttendanceError::validation(
                RejectionKind::NoActiveBreak,
                "no active break",
            ));
        };

        let location = self.locations.authorize(employee_id, point).await?;

        let at = clock(now);
        let duration = time_calc::minutes_between(interval.start, at);
        interval.end = Some(at);
        interval.duration_minutes = Some(duration);
        interval.return_location_id = Some(location.geofence_id);
        tx.update_break(&interval).await?;

        record.break_minutes += duration;
        tx.update_record(&record).await?;

        let receipt = receipt(tx.as_mut(), record, Some(location)).await?;
        tx.commit().await?;

        let overrun = time_calc::break_overrun(Some(at), self.policy.break_return_deadline);
        tracing::info!(employee_id, record_id = receipt.record.id, duration, overrun, "Break ended");
        Ok(receipt)
    }

    #[tracing::instrument(skip(self, face_image))]
    pub async fn check_out(
        &self,
        employee_id: u64,
        now: NaiveDateTime,
        point: Coordinate,
        face_image: &[u8],
    ) -> AttendanceResult<AttendanceReceipt> {
        self.verify_face(employee_id, face_image).await?;

        let mut tx = self.store.begin().await?;
        tx.lock_employee(employee_id).await?;

        let mut record = open_record(tx.as_mut(), employee_id).await?;

        let Some(check_in) = record.check_in else {
            return Err(AttendanceError::validation(
                RejectionKind::InvalidRecord,
                "invalid attendance record",
            ));
        };

        if tx.read_open_break(record.id).await?.is_some() {
            return Err(AttendanceError::validation(
                RejectionKind::BreakStillOpen,
                "finish your break first",
            ));
        }

        let location = self.locations.authorize(employee_id, point).await?;

        let at = clock(now);
        record.check_out = Some(at);
        record.check_out_location_id = Some(location.geofence_id);
        record.worked_minutes = Some(time_calc::worked_minutes(check_in, at, record.break_minutes));
        tx.update_record(&record).await?;

        let receipt = receipt(tx.as_mut(), record, Some(location)).await?;
        tx.commit().await?;

        tracing::info!(
            employee_id,
            record_id = receipt.record.id,
            worked = ?receipt.record.worked_minutes,
            "Checked out"
        );
        Ok(receipt)
    }

    #[tracing::instrument(skip(self))]
    pub async fn admin_correct(
        &self,
        record_id: u64,
        correction: AttendanceCorrection,
    ) -> AttendanceResult<AttendanceReceipt> {
        let mut tx = self.store.begin().await?;
        let mut record = self.locked_record(tx.as_mut(), record_id).await?;

        if let Some(check_in) = correction.check_in {
            record.check_in = Some(check_in);
        }
        if let Some(location_id) = correction.check_in_location_id {
            record.check_in_location_id = Some(location_id);
        }
        if let Some(check_out) = correction.check_out {
            record.check_out = Some(check_out);
        }
        if let Some(location_id) = correction.check_out_location_id {
            record.check_out_location_id = Some(location_id);
        }

        upsert_break(
            tx.as_mut(),
            record.id,
            correction.break_start,
            correction.break_end,
            correction.break_return_location_id,
        )
        .await?;

        let record = self.recompute(tx.as_mut(), record).await?;
        let receipt = receipt(tx.as_mut(), record, None).await?;
        validate_corrected(&receipt)?;
        tx.commit().await?;

        tracing::info!(record_id, employee_id = receipt.record.employee_id, "Attendance corrected");
        Ok(receipt)
    }

    #[tracing::instrument(skip(self))]
    pub async fn recalculate(&self, record_id: u64) -> AttendanceResult<AttendanceReceipt> {
        let mut tx = self.store.begin().await?;
        let record = self.locked_record(tx.as_mut(), record_id).await?;

        let record = self.recompute(tx.as_mut(), record).await?;
        let receipt = receipt(tx.as_mut(), record, None).await?;
        tx.commit().await?;

        Ok(receipt)
    }

    #[tracing::instrument(skip(self))]
    pub async fn admin_create(&self, entry: ManualEntry) -> AttendanceResult<AttendanceReceipt> {
        let shift = self
            .shift(entry.shift_id.unwrap_or(self.policy.default_shift_id))
            .await?;

        let mut tx = self.store.begin().await?;
        tx.lock_employee(entry.employee_id).await?;

        let previous = tx.read_record_on(entry.employee_id, entry.work_date).await?;
        if previous.as_ref().is_some_and(|r| r.active) {
            return Err(AttendanceError::validation(
                RejectionKind::RecordExists,
                "attendance already exists on this date",
            ));
        }
        if entry.check_out.is_none() && tx.read_open_record(entry.employee_id).await?.is_some() {
            return Err(AttendanceError::validation(
                RejectionKind::AlreadyCheckedIn,
                "already has active attendance",
            ));
        }

        let mut record = AttendanceRecord::opened(
            entry.employee_id,
            entry.work_date,
            shift.id,
            entry.check_in,
            entry.check_in_location_id,
            0,
        );
        record.check_out = entry.check_out;
        record.check_out_location_id = entry.check_out_location_id;

        match previous {
            Some(revived) => {
                record.id = revived.id;
                tx.deactivate_breaks(record.id).await?;
                tx.update_record(&record).await?;
            }
            None => record.id = tx.create_record(&record).await?,
        }

        upsert_break(
            tx.as_mut(),
            record.id,
            entry.break_start,
            entry.break_end,
            entry.break_return_location_id,
        )
        .await?;

        let record = self.recompute(tx.as_mut(), record).await?;
        let receipt = receipt(tx.as_mut(), record, None).await?;
        validate_corrected(&receipt)?;
        tx.commit().await?;

        tracing::info!(
            employee_id = entry.employee_id,
            record_id = receipt.record.id,
            work_date = %entry.work_date,
            "Manual attendance recorded"
        );
        Ok(receipt)
    }

    #[tracing::instrument(skip(self))]
    pub async fn deactivate(&self, record_id: u64) -> AttendanceResult<()> {
        let mut tx = self.store.begin().await?;
        let mut record = self.locked_record(tx.as_mut(), record_id).await?;

        record.active = false;
        tx.update_record(&record).await?;
        tx.deactivate_breaks(record.id).await?;
        tx.commit().await?;

        tracing::info!(record_id, employee_id = record.employee_id, "Attendance deactivated");
        Ok(())
    }

    /// Open record if any, else the active record of `date`.
    pub async fn daily_status(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> AttendanceResult<DailyStatus> {
        let mut tx = self.store.begin().await?;

        let record = match tx.read_open_record(employee_id).await? {
            Some(open) => Some(open),
            None => tx
                .read_record_on(employee_id, date)
                .await?
                .filter(|r| r.active),
        };

        let Some(record) = record else {
            return Ok(DailyStatus {
                state: AttendanceState::NoOpenRecord,
                record: None,
                breaks: Vec::new(),
                break_overrun_minutes: 0,
            });
        };

        let breaks = tx.list_breaks(record.id).await?;
        let state = if !record.is_open() {
            AttendanceState::CheckedOut
        } else if breaks.iter().any(BreakInterval::is_open) {
            AttendanceState::OnBreak
        } else {
            AttendanceState::CheckedIn
        };
        let last_end = breaks.iter().rev().find(|b| b.is_closed()).and_then(|b| b.end);

        Ok(DailyStatus {
            state,
            break_overrun_minutes: time_calc::break_overrun(
                last_end,
                self.policy.break_return_deadline,
            ),
            record: Some(record),
            breaks,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn monthly_recap(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> AttendanceResult<MonthlyRecap> {
        let invalid = || {
            AttendanceError::validation(RejectionKind::InvalidPeriod, "month must be between 1 and 12")
        };
        let (start, end) = recap::month_bounds(year, month).ok_or_else(invalid)?;

        let rows = self.store.recap_rows(employee_id, start, end).await?;
        let leaves = self.store.approved_leave_days(employee_id, start, end).await?;
        let holidays = self.store.holidays(start, end).await?;

        recap::build_monthly_recap(employee_id, year, month, today, &rows, &leaves, &holidays)
            .ok_or_else(invalid)
    }

    async fn verify_face(&self, employee_id: u64, image: &[u8]) -> AttendanceResult<()> {
        if !self.policy.biometric_required {
            return Ok(());
        }

        if image.is_empty() {
            return Err(AttendanceError::authorization(
                RejectionKind::FaceMismatch,
                "face image is required",
            ));
        }

        match self.verifier.verify(employee_id, image).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AttendanceError::authorization(
                RejectionKind::FaceMismatch,
                "face does not match",
            )),
            Err(e) => {
                tracing::warn!(error = %e, employee_id, "Face verification unavailable");
                Err(AttendanceError::authorization(
                    RejectionKind::FaceMismatch,
                    "face verification failed",
                ))
            }
        }
    }

    async fn shift(&self, shift_id: u64) -> AttendanceResult<ShiftDefinition> {
        self.store.shift_by_id(shift_id).await?.ok_or_else(|| {
            AttendanceError::validation(RejectionKind::UnknownShift, "unknown shift")
        })
    }

    async fn allowed_shift(&self, employee_id: u64, shift_id: u64) -> AttendanceResult<ShiftDefinition> {
        let shift = self.shift(shift_id).await?;

        if shift.id != self.policy.default_shift_id
            && !self.store.is_shift_granted(employee_id, shift.id).await?
        {
            return Err(AttendanceError::authorization(
                RejectionKind::ShiftNotAllowed,
                "not allowed to take this shift",
            ));
        }

        Ok(shift)
    }

    /// Locks the owning employee first, then the record, the same order as
    /// the employee operations.
    async fn locked_record(
        &self,
        tx: &mut dyn AttendanceTx,
        record_id: u64,
    ) -> AttendanceResult<AttendanceRecord> {
        let Some(employee_id) = self.store.record_owner(record_id).await? else {
            return Err(record_not_found());
        };
        tx.lock_employee(employee_id).await?;

        tx.read_record(record_id)
            .await?
            .filter(|r| r.employee_id == employee_id)
            .ok_or_else(record_not_found)
    }

    /// Rebuilds the derived fields from check-in, check-out and breaks.
    async fn recompute(
        &self,
        tx: &mut dyn AttendanceTx,
        mut record: AttendanceRecord,
    ) -> AttendanceResult<AttendanceRecord> {
        let shift = self
            .store
            .any_shift_by_id(record.shift_id)
            .await?
            .ok_or_else(|| AttendanceError::validation(RejectionKind::UnknownShift, "unknown shift"))?;
        let breaks = tx.list_breaks(record.id).await?;

        record.break_minutes = breaks
            .iter()
            .filter(|b| b.is_closed())
            .map(|b| b.duration_minutes.unwrap_or(0))
            .sum();
        record.lateness_minutes = record
            .check_in
            .map_or(0, |check_in| time_calc::lateness(check_in, shift.start_time));
        record.worked_minutes = match (record.check_in, record.check_out) {
            (Some(check_in), Some(check_out)) => Some(time_calc::worked_minutes(
                check_in,
                check_out,
                record.break_minutes,
            )),
            _ => None,
        };

        tx.update_record(&record).await?;
        Ok(record)
    }
}

fn clock(now: NaiveDateTime) -> NaiveTime {
    let time = now.time();
    time.with_nanosecond(0).unwrap_or(time)
}

async fn open_record(tx: &mut dyn AttendanceTx, employee_id: u64) -> AttendanceResult<AttendanceRecord> {
    tx.read_open_record(employee_id).await?.ok_or_else(|| {
        AttendanceError::validation(RejectionKind::NotCheckedIn, "no active attendance")
    })
}

fn record_not_found() -> AttendanceError {
    AttendanceError::validation(RejectionKind::RecordNotFound, "attendance record not found")
}

async fn receipt(
    tx: &mut dyn AttendanceTx,
    record: AttendanceRecord,
    location: Option<AuthorizedLocation>,
) -> AttendanceResult<AttendanceReceipt> {
    let breaks = tx.list_breaks(record.id).await?;
    Ok(AttendanceReceipt {
        record,
        breaks,
        location,
    })
}

/// Creates or edits the first active break of a record.
async fn upsert_break(
    tx: &mut dyn AttendanceTx,
    record_id: u64,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
    return_location_id: Option<u64>,
) -> AttendanceResult<()> {
    if start.is_none() && end.is_none() && return_location_id.is_none() {
        return Ok(());
    }

    let mut interval = match tx.list_breaks(record_id).await?.into_iter().next() {
        Some(existing) => existing,
        None => {
            let Some(start) = start else {
                return Err(AttendanceError::validation(
                    RejectionKind::InvalidCorrection,
                    "break start is required",
                ));
            };
            BreakInterval::started(record_id, start)
        }
    };

    if let Some(start) = start {
        interval.start = start;
    }
    if let Some(end) = end {
        interval.end = Some(end);
    }
    if return_location_id.is_some() {
        interval.return_location_id = return_location_id;
    }
    interval.duration_minutes = interval
        .end
        .map(|end| time_calc::minutes_between(interval.start, end));

    if interval.id == 0 {
        tx.create_break(&interval).await?;
    } else {
        tx.update_break(&interval).await?;
    }

    Ok(())
}

fn validate_corrected(receipt: &AttendanceReceipt) -> AttendanceResult<()> {
    let record = &receipt.record;

    if record.check_out.is_some() && record.check_in.is_none() {
        return Err(AttendanceError::validation(
            RejectionKind::InvalidCorrection,
            "check-out requires a check-in",
        ));
    }
    if record.check_out.is_some() && receipt.breaks.iter().any(BreakInterval::is_open) {
        return Err(AttendanceError::validation(
            RejectionKind::InvalidCorrection,
            "a checked-out record cannot keep an open break",
        ));
    }

    Ok(())
}
