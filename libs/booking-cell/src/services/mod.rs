pub mod booking;
pub mod conflict;
pub mod lifecycle;

pub use booking::BookingService;
pub use conflict::{intervals_overlap, ConflictService};
pub use lifecycle::AppointmentLifecycleService;
