// libs/shared/database/src/store.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::records::{Appointment, AppointmentFilter, Slot};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("slot not found")]
    SlotMissing,

    #[error("slot belongs to a different doctor")]
    DoctorMismatch,

    #[error("slot is already claimed")]
    SlotTaken,

    #[error("slot is referenced by a scheduled appointment")]
    SlotReferenced,

    #[error("appointment not found")]
    AppointmentMissing,

    #[error("appointment is no longer scheduled")]
    NotScheduled,

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Input for the claim transaction. The store fills in the appointment id
/// and copies `scheduled_at_utc` from the slot row under the slot lock.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub notes: Option<String>,
}

/// Transactional scheduling tables.
///
/// Two tables, `slots` and `appointments`, with all mutation funnelled
/// through three atomic operations: `claim_slot`, `release_slot` and
/// `complete_elapsed`. Implementations must serialize operations touching
/// the same row (row locking or an equivalent conflict check) so that a
/// read-then-write of `available` or `status` can never interleave two
/// winners, while operations on distinct rows stay independent.
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    /// Bulk-insert slots, skipping any row whose `(doctor_id, start_utc)`
    /// already exists. Returns the number of rows actually created.
    async fn insert_slots(&self, slots: Vec<Slot>) -> Result<u64, StoreError>;

    async fn slot(&self, slot_id: Uuid) -> Result<Option<Slot>, StoreError>;

    /// Available slots for a doctor, ordered by start time, optionally
    /// restricted to one UTC calendar day.
    async fn available_slots(
        &self,
        doctor_id: Uuid,
        on: Option<NaiveDate>,
    ) -> Result<Vec<Slot>, StoreError>;

    /// Remove a slot row. Fails with `SlotReferenced` while a scheduled
    /// appointment still points at it.
    async fn remove_slot(&self, slot_id: Uuid) -> Result<(), StoreError>;

    /// The booking transaction: under the slot row lock, verify the slot
    /// exists, belongs to `new.doctor_id` and is available, then flip it
    /// unavailable and insert the scheduled appointment. Both effects
    /// commit together; exactly one concurrent claim of a slot can win.
    async fn claim_slot(&self, slot_id: Uuid, new: NewAppointment)
        -> Result<Appointment, StoreError>;

    /// The cancellation transaction: under the appointment row lock,
    /// verify the appointment is still scheduled, mark it cancelled and,
    /// if the slot row still exists, make it available again. Both writes
    /// commit together or not at all.
    async fn release_slot(&self, appointment_id: Uuid) -> Result<Appointment, StoreError>;

    async fn appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError>;

    async fn appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// One sweep pass: every scheduled appointment with
    /// `scheduled_at_utc < now` becomes completed. Each row transition
    /// re-checks its precondition under the row lock, so the pass is
    /// idempotent and safe to retry after a partial failure. Returns the
    /// number of appointments completed.
    async fn complete_elapsed(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
