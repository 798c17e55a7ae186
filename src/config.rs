use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Duration, FixedOffset, NaiveDateTime, NaiveTime, Utc};
use dotenvy::dotenv;

use crate::model::shift::BreakWindow;

const DEFAULT_AUTO_BREAKS: &str = "2=12:00-14:00;3=00:00-02:00";

/// Rules the attendance ledger runs with.
#[derive(Clone, Debug)]
pub struct AttendancePolicy {
    /// Used when a check-in names no shift; always allowed.
    pub default_shift_id: u64,
    pub earliest_break: NaiveTime,
    pub break_return_deadline: NaiveTime,
    pub early_check_in_window: Duration,
    /// shift id -> mandated break injected at check-in
    pub auto_breaks: HashMap<u64, BreakWindow>,
    pub wfh_location_id: u64,
    pub biometric_required: bool,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            default_shift_id: 1,
            earliest_break: hhmm(11, 30),
            break_return_deadline: hhmm(14, 0),
            early_check_in_window: Duration::hours(2),
            auto_breaks: parse_auto_breaks(DEFAULT_AUTO_BREAKS).unwrap_or_default(),
            wfh_location_id: 0,
            biometric_required: false,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    /// Local wall clock (WITA by default).
    pub utc_offset: FixedOffset,

    pub face_verify_url: Option<String>,
    pub face_verify_timeout_secs: u64,

    pub attendance: AttendancePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));

        let offset_minutes: i32 = parsed(&lookup, "TZ_OFFSET_MINUTES", 480)?;
        let utc_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow!("TZ_OFFSET_MINUTES out of range: {offset_minutes}"))?;

        let face_verify_url = lookup("FACE_VERIFY_URL").filter(|url| !url.trim().is_empty());

        let auto_breaks = match lookup("AUTO_BREAK_SHIFTS") {
            Some(raw) => parse_auto_breaks(&raw).context("invalid AUTO_BREAK_SHIFTS")?,
            None => parse_auto_breaks(DEFAULT_AUTO_BREAKS)?,
        };

        let attendance = AttendancePolicy {
            default_shift_id: parsed(&lookup, "DEFAULT_SHIFT_ID", 1)?,
            earliest_break: time_of_day(&lookup, "EARLIEST_BREAK", hhmm(11, 30))?,
            break_return_deadline: time_of_day(&lookup, "BREAK_RETURN_DEADLINE", hhmm(14, 0))?,
            early_check_in_window: early_window(parsed(&lookup, "EARLY_CHECK_IN_HOURS", 2)?)?,
            auto_breaks,
            wfh_location_id: parsed(&lookup, "WFH_LOCATION_ID", 0)?,
            biometric_required: face_verify_url.is_some(),
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            rate_protected_per_min: parsed(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,
            utc_offset,
            face_verify_url,
            face_verify_timeout_secs: parsed(&lookup, "FACE_VERIFY_TIMEOUT_SECS", 10)?,
            attendance,
        })
    }

    /// Current local date-time, naive.
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.utc_offset).naive_local()
    }
}

fn parsed<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key}: cannot parse {raw:?}: {e}")),
        None => Ok(default),
    }
}

/// Check-in lead time before a shift start, at most 23 hours.
fn early_window(hours: u8) -> Result<Duration> {
    if hours > 23 {
        bail!("EARLY_CHECK_IN_HOURS must be between 0 and 23, got {hours}");
    }
    Duration::try_hours(i64::from(hours)).context("EARLY_CHECK_IN_HOURS out of range")
}

fn time_of_day<F>(lookup: &F, key: &str, default: NaiveTime) -> Result<NaiveTime>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_hhmm(&raw).with_context(|| format!("{key} must be HH:MM")),
        None => Ok(default),
    }
}

fn hhmm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

pub fn parse_hhmm(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").with_context(|| format!("bad time {raw:?}"))
}

/// Parses `2=12:00-14:00;3=00:00-02:00`.
pub fn parse_auto_breaks(raw: &str) -> Result<HashMap<u64, BreakWindow>> {
    let mut windows = HashMap::new();

    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (shift, window) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("expected shift=HH:MM-HH:MM, got {entry:?}"))?;
        let (start, end) = window
            .split_once('-')
            .ok_or_else(|| anyhow!("expected HH:MM-HH:MM, got {window:?}"))?;

        let shift_id: u64 = shift
            .trim()
            .parse()
            .with_context(|| format!("bad shift id {shift:?}"))?;
        let start = parse_hhmm(start)?;
        let end = parse_hhmm(end)?;
        if start == end {
            bail!("empty break window for shift {shift_id}");
        }

        windows.insert(shift_id, BreakWindow { start, end });
    }

    Ok(windows)
}
