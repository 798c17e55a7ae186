use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use sqlx::{MySql, MySqlPool, Transaction};

use crate::attendance::error::StoreResult;
use crate::attendance::recap::{LeaveCategory, RecapRow};
use crate::attendance::store::{AttendanceStore, AttendanceTx};
use crate::model::attendance::{AttendanceRecord, BreakInterval};
use crate::model::geofence::Geofence;
use crate::model::shift::ShiftDefinition;

macro_rules! select_record {
    ($tail:literal) => {
        concat!(
            "SELECT id, employee_id, work_date, shift_id, check_in, check_in_location_id, ",
            "check_out, check_out_location_id, break_minutes, lateness_minutes, worked_minutes, active ",
            "FROM attendance_records ",
            $tail
        )
    };
}

macro_rules! select_break {
    ($tail:literal) => {
        concat!(
            "SELECT id, attendance_id, break_start, break_end, duration_minutes, return_location_id, active ",
            "FROM attendance_breaks ",
            $tail
        )
    };
}

#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn begin(&self) -> StoreResult<Box<dyn AttendanceTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlAttendanceTx { tx }))
    }

    async fn list_active_geofences(&self) -> StoreResult<Vec<Geofence>> {
        let rows = sqlx::query_as::<_, Geofence>(
            r#"
            SELECT id, name, latitude, longitude, radius_meters, active
            FROM geofences
            WHERE active = 1
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn employee_grants(&self, employee_id: u64) -> StoreResult<HashSet<u64>> {
        let rows = sqlx::query_scalar::<_, u64>(
            r#"
            SELECT geofence_id
            FROM employee_geofences
            WHERE employee_id = ?
            AND active = 1
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn is_wfh_eligible(&self, employee_id: u64) -> StoreResult<bool> {
        let row = sqlx::query_scalar::<_, u64>(
            "SELECT employee_id FROM employee_wfh WHERE employee_id = ? AND active = 1 LIMIT 1",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn shift_by_id(&self, shift_id: u64) -> StoreResult<Option<ShiftDefinition>> {
        let shift = sqlx::query_as::<_, ShiftDefinition>(
            r#"
            SELECT id, name, start_time, end_time, nominal_minutes
            FROM shifts
            WHERE id = ?
            AND active = 1
            "#,
        )
        .bind(shift_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    async fn any_shift_by_id(&self, shift_id: u64) -> StoreResult<Option<ShiftDefinition>> {
        let shift = sqlx::query_as::<_, ShiftDefinition>(
            "SELECT id, name, start_time, end_time, nominal_minutes FROM shifts WHERE id = ?",
        )
        .bind(shift_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    async fn record_owner(&self, record_id: u64) -> StoreResult<Option<u64>> {
        let owner = sqlx::query_scalar::<_, u64>(
            "SELECT employee_id FROM attendance_records WHERE id = ? AND active = 1",
        )
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner)
    }

    async fn is_shift_granted(&self, employee_id: u64, shift_id: u64) -> StoreResult<bool> {
        let row = sqlx::query_scalar::<_, u64>(
            r#"
            SELECT shift_id
            FROM employee_shifts
            WHERE employee_id = ?
            AND shift_id = ?
            AND active = 1
            LIMIT 1
            "#,
        )
        .bind(employee_id)
        .bind(shift_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn recap_rows(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<RecapRow>> {
        let rows = sqlx::query_as::<_, RecapRow>(
            r#"
            SELECT a.work_date, a.lateness_minutes, a.worked_minutes, s.nominal_minutes
            FROM attendance_records a
            JOIN shifts s ON s.id = a.shift_id
            WHERE a.employee_id = ?
            AND a.active = 1
            AND a.work_date BETWEEN ? AND ?
            "#,
        )
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn approved_leave_days(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<HashMap<NaiveDate, LeaveCategory>> {
        let rows = sqlx::query_as::<_, (NaiveDate, NaiveDate, String)>(
            r#"
            SELECT start_date, end_date, leave_type
            FROM leave_requests
            WHERE employee_id = ?
            AND status = 'approved'
            AND end_date >= ?
            AND start_date <= ?
            "#,
        )
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut days = HashMap::new();
        for (from, to, leave_type) in rows {
            let Some(category) = LeaveCategory::from_leave_type(&leave_type) else {
                tracing::warn!(employee_id, leave_type = %leave_type, "Unknown leave type ignored in recap");
                continue;
            };

            let mut day = from.max(start);
            while day <= to.min(end) {
                days.insert(day, category);
                day += Duration::days(1);
            }
        }

        Ok(days)
    }

    async fn holidays(&self, start: NaiveDate, end: NaiveDate) -> StoreResult<HashSet<NaiveDate>> {
        let rows = sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT holiday_date
            FROM holidays
            WHERE active = 1
            AND holiday_date BETWEEN ? AND ?
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}

pub struct MySqlAttendanceTx {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl AttendanceTx for MySqlAttendanceTx {
    async fn lock_employee(&mut self, employee_id: u64) -> StoreResult<()> {
        sqlx::query("SELECT id FROM employees WHERE id = ? FOR UPDATE")
            .bind(employee_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn read_open_record(&mut self, employee_id: u64) -> StoreResult<Option<AttendanceRecord>> {
        let record = sqlx::query_as::<_, AttendanceRecord>(select_record!(
            "WHERE employee_id = ? AND check_out IS NULL AND active = 1 ORDER BY work_date DESC LIMIT 1 FOR UPDATE"
        ))
        .bind(employee_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(record)
    }

    async fn read_record(&mut self, record_id: u64) -> StoreResult<Option<AttendanceRecord>> {
        let record = sqlx::query_as::<_, AttendanceRecord>(select_record!(
            "WHERE id = ? AND active = 1 FOR UPDATE"
        ))
        .bind(record_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(record)
    }

    async fn read_record_on(
        &mut self,
        employee_id: u64,
        work_date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let record = sqlx::query_as::<_, AttendanceRecord>(select_record!(
            "WHERE employee_id = ? AND work_date = ? ORDER BY active DESC, id DESC LIMIT 1 FOR UPDATE"
        ))
        .bind(employee_id)
        .bind(work_date)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(record)
    }

    async fn read_open_break(&mut self, record_id: u64) -> StoreResult<Option<BreakInterval>> {
        let interval = sqlx::query_as::<_, BreakInterval>(select_break!(
            "WHERE attendance_id = ? AND break_end IS NULL AND active = 1 LIMIT 1 FOR UPDATE"
        ))
        .bind(record_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(interval)
    }

    async fn list_breaks(&mut self, record_id: u64) -> StoreResult<Vec<BreakInterval>> {
        let rows = sqlx::query_as::<_, BreakInterval>(select_break!(
            "WHERE attendance_id = ? AND active = 1 ORDER BY break_start, id"
        ))
        .bind(record_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows)
    }

    async fn create_record(&mut self, record: &AttendanceRecord) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_records
                (employee_id, work_date, shift_id, check_in, check_in_location_id,
                 check_out, check_out_location_id, break_minutes, lateness_minutes,
                 worked_minutes, active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(record.work_date)
        .bind(record.shift_id)
        .bind(record.check_in)
        .bind(record.check_in_location_id)
        .bind(record.check_out)
        .bind(record.check_out_location_id)
        .bind(record.break_minutes)
        .bind(record.lateness_minutes)
        .bind(record.worked_minutes)
        .bind(record.active)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn update_record(&mut self, record: &AttendanceRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE attendance_records
            SET work_date = ?, shift_id = ?, check_in = ?, check_in_location_id = ?,
                check_out = ?, check_out_location_id = ?, break_minutes = ?,
                lateness_minutes = ?, worked_minutes = ?, active = ?
            WHERE id = ?
            "#,
        )
        .bind(record.work_date)
        .bind(record.shift_id)
        .bind(record.check_in)
        .bind(record.check_in_location_id)
        .bind(record.check_out)
        .bind(record.check_out_location_id)
        .bind(record.break_minutes)
        .bind(record.lateness_minutes)
        .bind(record.worked_minutes)
        .bind(record.active)
        .bind(record.id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn create_break(&mut self, interval: &BreakInterval) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_breaks
                (attendance_id, break_start, break_end, duration_minutes, return_location_id, active)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(interval.attendance_id)
        .bind(interval.start)
        .bind(interval.end)
        .bind(interval.duration_minutes)
        .bind(interval.return_location_id)
        .bind(interval.active)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn update_break(&mut self, interval: &BreakInterval) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE attendance_breaks
            SET break_start = ?, break_end = ?, duration_minutes = ?,
                return_location_id = ?, active = ?
            WHERE id = ?
            "#,
        )
        .bind(interval.start)
        .bind(interval.end)
        .bind(interval.duration_minutes)
        .bind(interval.return_location_id)
        .bind(interval.active)
        .bind(interval.id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn deactivate_breaks(&mut self, record_id: u64) -> StoreResult<()> {
        sqlx::query("UPDATE attendance_breaks SET active = 0 WHERE attendance_id = ?")
            .bind(record_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
