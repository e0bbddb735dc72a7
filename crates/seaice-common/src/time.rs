//! Daily time axes expressed as days since 1970-01-01.

use chrono::{NaiveDate, TimeDelta};

use crate::error::{PrepError, PrepResult};

/// Tolerance when comparing day offsets stored as floats.
const DAY_EPSILON: f64 = 1e-6;

/// Reference date of every time axis (1970-01-01).
pub fn epoch() -> NaiveDate {
    NaiveDate::default()
}

/// Ordered day offsets of a source's native time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAxis {
    days: Vec<f64>,
}

impl DayAxis {
    pub fn new(days: Vec<f64>) -> Self {
        Self { days }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn days(&self) -> &[f64] {
        &self.days
    }

    /// Calendar date of the time step at `index`.
    pub fn date(&self, index: usize) -> PrepResult<NaiveDate> {
        let day = *self.days.get(index).ok_or_else(|| {
            PrepError::configuration(format!(
                "time index {} outside axis of length {}",
                index,
                self.days.len()
            ))
        })?;
        offset_to_date(day)
    }

    /// Dates of day `t` (at `index`) and of the following day.
    pub fn date_pair(&self, index: usize) -> PrepResult<(NaiveDate, NaiveDate)> {
        let day = self.date(index)?;
        let next = day
            .succ_opt()
            .ok_or_else(|| PrepError::configuration("date overflow"))?;
        Ok((day, next))
    }

    /// Require consecutive steps to be exactly one day apart.
    pub fn validate_daily(&self) -> PrepResult<()> {
        for (i, pair) in self.days.windows(2).enumerate() {
            let step = pair[1] - pair[0];
            if (step - 1.0).abs() > DAY_EPSILON {
                return Err(PrepError::configuration(format!(
                    "time axis is not daily: step {} between index {} and {}",
                    step,
                    i,
                    i + 1
                )));
            }
        }
        Ok(())
    }

    /// Require another axis to cover the same calendar days as this one.
    /// Stamps within a day (e.g. 00:00 vs 12:00) are equivalent.
    pub fn ensure_aligned(&self, other: &DayAxis, other_name: &str) -> PrepResult<()> {
        if self.len() != other.len() {
            return Err(PrepError::configuration(format!(
                "{} time axis has {} steps, expected {}",
                other_name,
                other.len(),
                self.len()
            )));
        }
        for (i, (&ours, &theirs)) in self.days.iter().zip(other.days.iter()).enumerate() {
            let expected = offset_to_date(ours)?;
            let found = offset_to_date(theirs)?;
            if expected != found {
                return Err(PrepError::configuration(format!(
                    "{} time axis diverges at index {}: {} vs {}",
                    other_name, i, found, expected
                )));
            }
        }
        Ok(())
    }
}

/// Convert a (possibly fractional) day offset to a calendar date.
pub fn offset_to_date(days: f64) -> PrepResult<NaiveDate> {
    if !days.is_finite() {
        return Err(PrepError::configuration(format!("invalid day offset {}", days)));
    }
    TimeDelta::try_days(days.floor() as i64)
        .and_then(|delta| epoch().checked_add_signed(delta))
        .ok_or_else(|| PrepError::configuration(format!("day offset {} out of range", days)))
}

/// Day offset of a calendar date.
pub fn date_to_offset(date: NaiveDate) -> f64 {
    (date - epoch()).num_days() as f64
}
