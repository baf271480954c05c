pub mod availability;
pub mod schedule;
pub mod slots;

pub use availability::{
    AppointmentSource, AvailabilityService, AvailabilitySource, StoreAppointmentSource,
};
pub use schedule::ScheduleService;
pub use slots::{filter_available, generate_candidate_slots, DEFAULT_STEP_MINUTES};
