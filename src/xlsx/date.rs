//! Spreadsheet serial date conversion.
//!
//! Serial numbers count days from a fixed epoch; the fractional part is the
//! time of day. Workbooks use one of two systems:
//!
//! - **1900**: serial 1 is 1900-01-01. The format treats 1900 as a leap year,
//!   so serials from 61 on are counted from 1899-12-30 while smaller serials
//!   are counted from 1899-12-31. Serial 60, the nonexistent 1900-02-29, lands
//!   on 1900-03-01.
//! - **1904**: serial 0 is 1904-01-01.

use crate::error::{Error, Result};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// First serial of the 1900 system counted from 1899-12-30.
const FIRST_SHIFTED_SERIAL: i64 = 61;

/// Exclusive upper bounds (10000-01-01) per date system.
const MAX_SERIAL_1900: f64 = 2_958_466.0;
const MAX_SERIAL_1904: f64 = 2_957_003.0;

/// Date system of a workbook (`workbookPr/@date1904`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateSystem {
    /// Serial 1 = 1900-01-01
    #[default]
    V1900,
    /// Serial 0 = 1904-01-01
    V1904,
}

impl DateSystem {
    /// Select the system from the workbook's `date1904` flag.
    pub fn from_date1904(flag: bool) -> Self {
        if flag {
            DateSystem::V1904
        } else {
            DateSystem::V1900
        }
    }

    fn max_serial(self) -> f64 {
        match self {
            DateSystem::V1900 => MAX_SERIAL_1900,
            DateSystem::V1904 => MAX_SERIAL_1904,
        }
    }

    fn epoch_for(self, day: i64) -> Option<NaiveDate> {
        match self {
            DateSystem::V1900 if day < FIRST_SHIFTED_SERIAL => NaiveDate::from_ymd_opt(1899, 12, 31),
            DateSystem::V1900 => NaiveDate::from_ymd_opt(1899, 12, 30),
            DateSystem::V1904 => NaiveDate::from_ymd_opt(1904, 1, 1),
        }
    }
}

/// Convert a serial number to a date/time, rounded to the millisecond.
pub fn serial_to_datetime(serial: f64, system: DateSystem) -> Result<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial >= system.max_serial() {
        return Err(Error::InvalidDate(serial));
    }

    let total_millis = (serial * MILLIS_PER_DAY as f64).round() as i64;
    let day = total_millis.div_euclid(MILLIS_PER_DAY);
    let millis = total_millis.rem_euclid(MILLIS_PER_DAY);

    let date = system
        .epoch_for(day)
        .and_then(|epoch| epoch.checked_add_days(Days::new(day as u64)))
        .ok_or(Error::InvalidDate(serial))?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(
        (millis / 1000) as u32,
        ((millis % 1000) * 1_000_000) as u32,
    )
    .ok_or(Error::InvalidDate(serial))?;

    Ok(date.and_time(time))
}

/// Parse an ISO 8601 date literal as stored in `t="d"` cells.
///
/// Accepts a date, or a date and time with optional fraction and `Z` suffix.
pub fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    let text = text.strip_suffix('Z').unwrap_or(text);

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}
