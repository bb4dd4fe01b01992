// libs/scheduling-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{SchedulingStore, Slot};

use crate::directory::UserDirectory;
use crate::models::{DateRange, SchedulingError, WorkingHours};

/// Plan the bookable slots for a doctor over a date range.
///
/// Pure computation; persisting the result is the caller's concern. For
/// each included weekday one slot is produced per duration step from the
/// start of the working day, keeping only slots that end at or before the
/// end of the day (a trailing partial window yields no slot).
pub fn plan_slots(
    doctor_id: Uuid,
    range: DateRange,
    hours: &WorkingHours,
) -> Result<Vec<Slot>, SchedulingError> {
    hours.validate()?;

    let mut slots = Vec::new();
    for day in range.days() {
        if !hours.includes(day.weekday()) {
            continue;
        }

        let day_end = day.and_time(hours.end_of_day).and_utc();
        let mut current = day.and_time(hours.start_of_day).and_utc();
        while current + hours.slot_duration <= day_end {
            let slot_end = current + hours.slot_duration;
            slots.push(Slot::new(doctor_id, current, slot_end));
            current = slot_end;
        }
    }

    Ok(slots)
}

/// Slot generation and availability queries.
pub struct AvailabilityService {
    store: Arc<dyn SchedulingStore>,
    directory: Arc<dyn UserDirectory>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn SchedulingStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { store, directory }
    }

    /// Generate and persist slots for a doctor. Regenerating an overlapping
    /// range is idempotent: rows already present are skipped by the store's
    /// uniqueness constraint and only newly created rows are counted.
    pub async fn generate_slots(
        &self,
        doctor_id: Uuid,
        range: DateRange,
        hours: &WorkingHours,
    ) -> Result<u64, SchedulingError> {
        debug!("Generating slots for doctor {} from {} to {}", doctor_id, range.from, range.to);

        self.directory
            .find_doctor(doctor_id)
            .await?
            .ok_or(SchedulingError::DoctorNotFound)?;

        let planned = plan_slots(doctor_id, range, hours)?;
        let planned_count = planned.len();
        let created = self.store.insert_slots(planned).await?;

        info!(
            "Generated {} slots for doctor {} ({} already existed)",
            created,
            doctor_id,
            planned_count as u64 - created
        );
        Ok(created)
    }

    /// Available slots for a doctor, optionally restricted to one day.
    pub async fn list_available_slots(
        &self,
        doctor_id: Uuid,
        on: Option<NaiveDate>,
    ) -> Result<Vec<Slot>, SchedulingError> {
        debug!("Listing available slots for doctor {} on {:?}", doctor_id, on);
        Ok(self.store.available_slots(doctor_id, on).await?)
    }

    /// Administrative slot removal. Refused while any non-cancelled
    /// appointment still references the slot.
    pub async fn delete_slot(&self, slot_id: Uuid) -> Result<(), SchedulingError> {
        self.store.remove_slot(slot_id).await?;
        info!("Deleted slot {}", slot_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, NaiveTime, Weekday};

    fn workweek() -> DateRange {
        // Monday 2024-06-03 through Sunday 2024-06-09.
        DateRange::week_of(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap())
    }

    #[test]
    fn default_hours_fill_weekdays_only() {
        let doctor_id = Uuid::new_v4();
        let slots = plan_slots(doctor_id, workweek(), &WorkingHours::default()).unwrap();

        // 9 one-hour slots per day, Monday through Friday.
        assert_eq!(slots.len(), 45);
        assert!(slots.iter().all(|s| s.available));
        assert!(slots
            .iter()
            .all(|s| !matches!(s.start_utc.weekday(), Weekday::Sat | Weekday::Sun)));
    }

    #[test]
    fn slots_never_overlap_and_stay_in_window() {
        let doctor_id = Uuid::new_v4();
        let hours = WorkingHours::default();
        let mut slots = plan_slots(doctor_id, workweek(), &hours).unwrap();
        slots.sort_by_key(|s| s.start_utc);

        for pair in slots.windows(2) {
            assert!(pair[0].end_utc <= pair[1].start_utc);
        }
        for slot in &slots {
            assert!(slot.start_utc.time() >= hours.start_of_day);
            assert!(slot.end_utc.time() <= hours.end_of_day);
        }
    }

    #[test]
    fn trailing_partial_window_is_dropped() {
        let doctor_id = Uuid::new_v4();
        let hours = WorkingHours {
            start_of_day: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_of_day: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            slot_duration: Duration::minutes(50),
            ..WorkingHours::default()
        };
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

        let slots = plan_slots(doctor_id, DateRange::single_day(monday), &hours).unwrap();

        // 9:00-9:50 fits; 9:50-10:40 would overrun 10:30.
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].end_utc.time(), NaiveTime::from_hms_opt(9, 50, 0).unwrap());
    }

    #[test]
    fn invalid_hours_are_rejected() {
        let doctor_id = Uuid::new_v4();
        let hours = WorkingHours {
            weekdays: Vec::new(),
            ..WorkingHours::default()
        };
        assert_matches!(
            plan_slots(doctor_id, workweek(), &hours),
            Err(SchedulingError::InvalidInput(_))
        );
    }
}
