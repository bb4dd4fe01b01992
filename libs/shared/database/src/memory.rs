// libs/shared/database/src/memory.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::records::{Appointment, AppointmentFilter, AppointmentStatus, Slot};
use crate::store::{NewAppointment, SchedulingStore, StoreError};

type SharedSlot = Arc<RwLock<Slot>>;
type SharedAppointment = Arc<RwLock<Appointment>>;

/// In-memory reference implementation of [`SchedulingStore`].
///
/// Each row lives behind its own `RwLock`, so operations on the same slot
/// or appointment serialize on the row's write lock (the `SELECT ... FOR
/// UPDATE` of this engine) while operations on distinct rows proceed
/// independently. Map guards are dropped before any row lock is awaited.
///
/// Lock order: the release path nests appointment-row -> slot-row; the
/// claim and removal paths hold only a slot row. No path holds one row
/// lock while waiting for another in the opposite order.
pub struct MemoryStore {
    slots: DashMap<Uuid, SharedSlot>,
    appointments: DashMap<Uuid, SharedAppointment>,
    // UNIQUE (doctor_id, start_utc)
    slot_index: DashMap<(Uuid, DateTime<Utc>), Uuid>,
    // slot id -> the non-cancelled appointment referencing it
    active_claims: DashMap<Uuid, Uuid>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            appointments: DashMap::new(),
            slot_index: DashMap::new(),
            active_claims: DashMap::new(),
        }
    }

    fn shared_slot(&self, slot_id: Uuid) -> Option<SharedSlot> {
        self.slots.get(&slot_id).map(|e| e.value().clone())
    }

    fn shared_appointment(&self, appointment_id: Uuid) -> Option<SharedAppointment> {
        self.appointments.get(&appointment_id).map(|e| e.value().clone())
    }
}

#[async_trait]
impl SchedulingStore for MemoryStore {
    async fn insert_slots(&self, slots: Vec<Slot>) -> Result<u64, StoreError> {
        let mut created = 0u64;
        for slot in slots {
            match self.slot_index.entry((slot.doctor_id, slot.start_utc)) {
                dashmap::mapref::entry::Entry::Occupied(_) => {
                    debug!(doctor_id = %slot.doctor_id, start = %slot.start_utc,
                           "skipping duplicate slot");
                }
                dashmap::mapref::entry::Entry::Vacant(entry) => {
                    let id = slot.id;
                    entry.insert(id);
                    self.slots.insert(id, Arc::new(RwLock::new(slot)));
                    created += 1;
                }
            }
        }
        Ok(created)
    }

    async fn slot(&self, slot_id: Uuid) -> Result<Option<Slot>, StoreError> {
        match self.shared_slot(slot_id) {
            Some(shared) => Ok(Some(shared.read().await.clone())),
            None => Ok(None),
        }
    }

    async fn available_slots(
        &self,
        doctor_id: Uuid,
        on: Option<NaiveDate>,
    ) -> Result<Vec<Slot>, StoreError> {
        let shared: Vec<SharedSlot> = self.slots.iter().map(|e| e.value().clone()).collect();

        let mut rows = Vec::new();
        for slot in shared {
            let slot = slot.read().await;
            if slot.doctor_id != doctor_id || !slot.available {
                continue;
            }
            if on.is_some_and(|day| slot.start_utc.date_naive() != day) {
                continue;
            }
            rows.push(slot.clone());
        }

        rows.sort_by_key(|s| s.start_utc);
        Ok(rows)
    }

    async fn remove_slot(&self, slot_id: Uuid) -> Result<(), StoreError> {
        let shared = self.shared_slot(slot_id).ok_or(StoreError::SlotMissing)?;
        let slot = shared.write().await;

        if !self.slots.contains_key(&slot_id) {
            // Lost a race with another removal.
            return Err(StoreError::SlotMissing);
        }
        if self.active_claims.contains_key(&slot_id) {
            return Err(StoreError::SlotReferenced);
        }

        self.slot_index.remove(&(slot.doctor_id, slot.start_utc));
        self.slots.remove(&slot_id);
        Ok(())
    }

    async fn claim_slot(
        &self,
        slot_id: Uuid,
        new: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        let shared = self.shared_slot(slot_id).ok_or(StoreError::SlotMissing)?;
        let mut slot = shared.write().await;

        // The row may have been removed while we waited for its lock.
        if !self.slots.contains_key(&slot_id) {
            return Err(StoreError::SlotMissing);
        }
        if slot.doctor_id != new.doctor_id {
            return Err(StoreError::DoctorMismatch);
        }
        if !slot.available {
            return Err(StoreError::SlotTaken);
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            slot_id,
            doctor_id: new.doctor_id,
            patient_id: new.patient_id,
            scheduled_at_utc: slot.start_utc,
            status: AppointmentStatus::Scheduled,
            notes: new.notes,
        };

        // Still under the slot lock: both effects land together.
        self.appointments
            .insert(appointment.id, Arc::new(RwLock::new(appointment.clone())));
        self.active_claims.insert(slot_id, appointment.id);
        slot.available = false;

        Ok(appointment)
    }

    async fn release_slot(&self, appointment_id: Uuid) -> Result<Appointment, StoreError> {
        let shared = self
            .shared_appointment(appointment_id)
            .ok_or(StoreError::AppointmentMissing)?;
        let mut appointment = shared.write().await;

        if appointment.status != AppointmentStatus::Scheduled {
            return Err(StoreError::NotScheduled);
        }

        // Acquire the slot lock (when the row still exists) before touching
        // either row. With both locks held and no await point below, the
        // two writes are atomic to every reader and to a dropped caller.
        let slot_shared = self.shared_slot(appointment.slot_id);
        let mut slot_guard = match slot_shared.as_ref() {
            Some(shared) => Some(shared.write().await),
            None => None,
        };

        if let Some(slot) = slot_guard.as_mut() {
            slot.available = true;
        }
        self.active_claims.remove(&appointment.slot_id);
        appointment.status = AppointmentStatus::Cancelled;

        Ok(appointment.clone())
    }

    async fn appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        match self.shared_appointment(appointment_id) {
            Some(shared) => Ok(Some(shared.read().await.clone())),
            None => Ok(None),
        }
    }

    async fn appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, StoreError> {
        let shared: Vec<SharedAppointment> =
            self.appointments.iter().map(|e| e.value().clone()).collect();

        let mut rows = Vec::new();
        for appointment in shared {
            let appointment = appointment.read().await;
            if filter.matches(&appointment) {
                rows.push(appointment.clone());
            }
        }

        rows.sort_by_key(|a| a.scheduled_at_utc);
        Ok(rows)
    }

    async fn complete_elapsed(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let shared: Vec<SharedAppointment> =
            self.appointments.iter().map(|e| e.value().clone()).collect();

        let mut completed = 0u64;
        for appointment in shared {
            let mut appointment = appointment.write().await;
            // Re-checked under the row lock: a cancellation that won the
            // race leaves nothing to do here.
            if appointment.status != AppointmentStatus::Scheduled {
                continue;
            }
            if appointment.scheduled_at_utc >= now {
                continue;
            }
            appointment.status = AppointmentStatus::Completed;
            completed += 1;
        }

        Ok(completed)
    }
}
