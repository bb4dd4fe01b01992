// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_config::AppConfig;
use shared_database::StoreError;

// ==============================================================================
// SCHEDULING CONFIGURATION MODELS
// ==============================================================================

/// Weekly template from which bookable slots are generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start_of_day: NaiveTime,
    pub end_of_day: NaiveTime,
    #[serde(with = "duration_minutes")]
    pub slot_duration: Duration,
    pub weekdays: Vec<Weekday>,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start_of_day: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_of_day: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            slot_duration: Duration::minutes(60),
            weekdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }
}

impl WorkingHours {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            start_of_day: config.day_starts_at,
            end_of_day: config.day_ends_at,
            slot_duration: Duration::minutes(config.slot_duration_minutes as i64),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SchedulingError> {
        if self.start_of_day >= self.end_of_day {
            return Err(SchedulingError::InvalidInput(
                "working day must start before it ends".to_string(),
            ));
        }
        if self.slot_duration <= Duration::zero() {
            return Err(SchedulingError::InvalidInput(
                "slot duration must be positive".to_string(),
            ));
        }
        if self.slot_duration > self.end_of_day - self.start_of_day {
            return Err(SchedulingError::InvalidInput(
                "slot duration exceeds the working day".to_string(),
            ));
        }
        if self.weekdays.is_empty() {
            return Err(SchedulingError::InvalidInput(
                "at least one weekday must be included".to_string(),
            ));
        }
        Ok(())
    }

    pub fn includes(&self, weekday: Weekday) -> bool {
        self.weekdays.contains(&weekday)
    }
}

/// Inclusive range of UTC calendar dates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, SchedulingError> {
        if from > to {
            return Err(SchedulingError::InvalidInput(
                "date range must not end before it starts".to_string(),
            ));
        }
        Ok(Self { from, to })
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }

    /// The Monday-aligned week containing `day`.
    pub fn week_of(day: NaiveDate) -> Self {
        let monday = day - Duration::days(day.weekday().num_days_from_monday() as i64);
        Self {
            from: monday,
            to: monday + Duration::days(6),
        }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let to = self.to;
        self.from.iter_days().take_while(move |day| *day <= to)
    }
}

/// Business rules applied by the booking service.
#[derive(Debug, Clone)]
pub struct SchedulingPolicy {
    pub min_cancel_notice: Duration,
    pub max_notes_len: usize,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            min_cancel_notice: Duration::hours(24),
            max_notes_len: 255,
        }
    }
}

impl SchedulingPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            min_cancel_notice: Duration::hours(config.cancel_notice_hours as i64),
            ..Self::default()
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("slot not found")]
    SlotNotFound,

    #[error("appointment not found")]
    AppointmentNotFound,

    #[error("doctor not found")]
    DoctorNotFound,

    #[error("patient not found")]
    PatientNotFound,

    #[error("slot is no longer available")]
    SlotTaken,

    #[error("slot is still referenced by an appointment")]
    SlotReferenced,

    #[error("appointment is already finalized")]
    AlreadyFinalized,

    #[error("cancellation requires at least {required_hours} hours notice")]
    TooLate { required_hours: i64 },

    #[error("invalid scheduling input: {0}")]
    InvalidInput(String),

    #[error("storage failure: {0}")]
    Store(String),
}

impl From<StoreError> for SchedulingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SlotMissing => SchedulingError::SlotNotFound,
            // A slot that belongs to another doctor does not exist as far
            // as this caller is concerned.
            StoreError::DoctorMismatch => SchedulingError::SlotNotFound,
            StoreError::SlotTaken => SchedulingError::SlotTaken,
            StoreError::SlotReferenced => SchedulingError::SlotReferenced,
            StoreError::AppointmentMissing => SchedulingError::AppointmentNotFound,
            StoreError::NotScheduled => SchedulingError::AlreadyFinalized,
            StoreError::Unavailable(message) => SchedulingError::Store(message),
        }
    }
}

// ==============================================================================
// WIRE HELPERS
// ==============================================================================

/// Parse a wire timestamp into a UTC instant.
///
/// Only RFC 3339 instants carrying an explicit offset are accepted; naive
/// local timestamps are rejected rather than coerced.
pub fn parse_utc_instant(value: &str) -> Result<DateTime<Utc>, SchedulingError> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| {
            SchedulingError::InvalidInput(format!(
                "timestamp '{value}' must be an RFC 3339 instant with a UTC offset"
            ))
        })
}

mod duration_minutes {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_minutes())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let minutes = i64::deserialize(deserializer)?;
        Ok(Duration::minutes(minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn default_working_hours_are_valid() {
        assert!(WorkingHours::default().validate().is_ok());
    }

    #[test]
    fn oversized_slot_duration_is_rejected() {
        let hours = WorkingHours {
            slot_duration: Duration::hours(12),
            ..WorkingHours::default()
        };
        assert_matches!(hours.validate(), Err(SchedulingError::InvalidInput(_)));
    }

    #[test]
    fn week_of_aligns_to_monday() {
        // 2024-06-05 is a Wednesday.
        let range = DateRange::week_of(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap());
        assert_eq!(range.from, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(range.to, NaiveDate::from_ymd_opt(2024, 6, 9).unwrap());
        assert_eq!(range.days().count(), 7);
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let from = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_matches!(
            DateRange::new(from, to),
            Err(SchedulingError::InvalidInput(_))
        );
    }

    #[test]
    fn naive_timestamps_are_rejected() {
        assert_matches!(
            parse_utc_instant("2024-06-03T09:00:00"),
            Err(SchedulingError::InvalidInput(_))
        );
        let parsed = parse_utc_instant("2024-06-03T09:00:00Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-06-03T09:00:00+00:00");
    }
}
