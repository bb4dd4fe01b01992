// libs/scheduling-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{
    Appointment, AppointmentFilter, NewAppointment, SchedulingStore, StoreError,
};

use crate::directory::UserDirectory;
use crate::models::{SchedulingError, SchedulingPolicy};

/// The booking and cancellation choke point.
///
/// Every mutation of slot availability or appointment status flows through
/// this service (or the expiry sweeper), so the relationship invariants are
/// enforced in exactly one place.
pub struct BookingService {
    store: Arc<dyn SchedulingStore>,
    directory: Arc<dyn UserDirectory>,
    policy: SchedulingPolicy,
}

impl BookingService {
    pub fn new(store: Arc<dyn SchedulingStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self::with_policy(store, directory, SchedulingPolicy::default())
    }

    pub fn with_policy(
        store: Arc<dyn SchedulingStore>,
        directory: Arc<dyn UserDirectory>,
        policy: SchedulingPolicy,
    ) -> Self {
        Self {
            store,
            directory,
            policy,
        }
    }

    /// Book a slot for a patient.
    ///
    /// The claim itself is a single store transaction: losing a race for
    /// the slot surfaces as `SlotTaken`, distinct from `SlotNotFound`, so
    /// callers can refresh availability and retry.
    pub async fn book(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        slot_id: Uuid,
        notes: Option<String>,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Booking slot {} for patient {} with doctor {}", slot_id, patient_id, doctor_id);

        if let Some(ref notes) = notes {
            if notes.chars().count() > self.policy.max_notes_len {
                return Err(SchedulingError::InvalidInput(format!(
                    "notes must not exceed {} characters",
                    self.policy.max_notes_len
                )));
            }
        }

        self.directory
            .find_doctor(doctor_id)
            .await?
            .ok_or(SchedulingError::DoctorNotFound)?;
        self.directory
            .find_patient(patient_id)
            .await?
            .ok_or(SchedulingError::PatientNotFound)?;

        let new = NewAppointment {
            doctor_id,
            patient_id,
            notes,
        };
        let appointment = match self.store.claim_slot(slot_id, new).await {
            Ok(appointment) => appointment,
            Err(StoreError::SlotTaken) => {
                warn!("Slot {} lost to a concurrent booking", slot_id);
                return Err(SchedulingError::SlotTaken);
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            "Booked appointment {} for patient {} with doctor {} at {}",
            appointment.id, patient_id, doctor_id, appointment.scheduled_at_utc
        );
        Ok(appointment)
    }

    /// Cancel a scheduled appointment, freeing its slot.
    ///
    /// `now_utc` comes from the caller so the notice-window rule can be
    /// exercised against any instant. The scheduled time is immutable, so
    /// checking the window outside the store transaction is race-free; a
    /// sweep that finalizes the appointment first simply surfaces as
    /// `AlreadyFinalized`.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        now_utc: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Cancelling appointment {}", appointment_id);

        let appointment = self
            .store
            .appointment(appointment_id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)?;

        if appointment.status.is_terminal() {
            return Err(SchedulingError::AlreadyFinalized);
        }

        if appointment.scheduled_at_utc - now_utc < self.policy.min_cancel_notice {
            let required_hours = self.policy.min_cancel_notice.num_hours();
            warn!(
                "Rejected cancellation of appointment {} inside the {}h notice window",
                appointment_id, required_hours
            );
            return Err(SchedulingError::TooLate { required_hours });
        }

        let cancelled = self.store.release_slot(appointment_id).await?;
        info!("Cancelled appointment {} and freed slot {}", cancelled.id, cancelled.slot_id);
        Ok(cancelled)
    }

    /// Fetch a single appointment.
    pub async fn appointment(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        self.store
            .appointment(appointment_id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)
    }

    /// List appointments by doctor, patient and/or status.
    pub async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.store.appointments(filter).await?)
    }
}
