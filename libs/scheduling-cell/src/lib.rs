pub mod clock;
pub mod directory;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use clock::{SystemTimeSource, TimeSource};
pub use directory::{DoctorProfile, PatientProfile, UserDirectory};
pub use models::{
    parse_utc_instant, DateRange, SchedulingError, SchedulingPolicy, WorkingHours,
};
pub use services::availability::{plan_slots, AvailabilityService};
pub use services::booking::BookingService;
pub use services::sweeper::ExpirySweeper;
