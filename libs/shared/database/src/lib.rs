pub mod memory;
pub mod records;
pub mod store;

pub use memory::MemoryStore;
pub use records::{Appointment, AppointmentFilter, AppointmentStatus, Slot};
pub use store::{NewAppointment, SchedulingStore, StoreError};
