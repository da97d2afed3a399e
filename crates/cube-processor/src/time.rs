//! Decoding of CF-style `"<unit> since <epoch>"` time coordinates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use crate::error::{CubeError, Result};

/// Parsed time units of a coordinate variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUnits {
    millis_per_unit: f64,
    epoch: DateTime<Utc>,
}

impl TimeUnits {
    /// Parse a units string such as `"days since 1970-01-01"`.
    pub fn parse(units: &str) -> Result<Self> {
        let (unit, epoch) = units
            .split_once(" since ")
            .ok_or_else(|| CubeError::invalid_metadata(format!("unsupported time units: {}", units)))?;

        let millis_per_unit = match unit.trim().to_lowercase().as_str() {
            "days" | "day" | "d" => 86_400_000.0,
            "hours" | "hour" | "h" => 3_600_000.0,
            "minutes" | "minute" | "min" => 60_000.0,
            "seconds" | "second" | "s" => 1_000.0,
            "milliseconds" | "millisecond" | "ms" => 1.0,
            "microseconds" | "microsecond" | "us" => 1e-3,
            "nanoseconds" | "nanosecond" | "ns" => 1e-6,
            other => {
                return Err(CubeError::invalid_metadata(format!(
                    "unsupported time unit: {}",
                    other
                )))
            }
        };

        Ok(Self {
            millis_per_unit,
            epoch: parse_epoch(epoch.trim())?,
        })
    }

    /// Convert an offset in these units to a timestamp.
    pub fn decode(&self, value: f64) -> Result<DateTime<Utc>> {
        let millis = value * self.millis_per_unit;
        if !millis.is_finite() {
            return Err(CubeError::invalid_metadata(format!("invalid time value: {}", value)));
        }
        TimeDelta::try_milliseconds(millis.round() as i64)
            .and_then(|delta| self.epoch.checked_add_signed(delta))
            .ok_or_else(|| CubeError::invalid_metadata(format!("time value out of range: {}", value)))
    }
}

fn parse_epoch(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let s = s.trim_end_matches('Z').trim_end_matches(" UTC");
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| CubeError::invalid_metadata(format!("unparseable time epoch: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_days_since_epoch() {
        let units = TimeUnits::parse("days since 1970-01-01").unwrap();
        assert_eq!(
            units.decode(18262.5).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_epoch_formats() {
        let expected = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        for units in [
            "seconds since 2000-01-01 00:00:00",
            "seconds since 2000-01-01T00:00:00Z",
            "seconds since 2000-01-01T00:00:00.000",
        ] {
            assert_eq!(TimeUnits::parse(units).unwrap().decode(0.0).unwrap(), expected);
        }

        let hours = TimeUnits::parse("hours since 2000-01-01").unwrap();
        assert_eq!(
            hours.decode(36.0).unwrap(),
            Utc.with_ymd_and_hms(2000, 1, 2, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_invalid_units() {
        assert!(TimeUnits::parse("days").is_err());
        assert!(TimeUnits::parse("fortnights since 2000-01-01").is_err());
        assert!(TimeUnits::parse("days since yesterday").is_err());

        let units = TimeUnits::parse("days since 1970-01-01").unwrap();
        assert!(units.decode(f64::NAN).is_err());
    }
}
