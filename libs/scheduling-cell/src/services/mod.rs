pub mod availability;
pub mod booking;
pub mod sweeper;

pub use availability::AvailabilityService;
pub use booking::BookingService;
pub use sweeper::ExpirySweeper;
