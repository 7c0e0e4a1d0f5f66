pub mod availability;
pub mod booking;
pub mod dashboard;
pub mod lifecycle;

pub use availability::{available_dates, default_grid, is_business_day, AvailabilityService};
pub use booking::{can_manage, BookingService};
pub use dashboard::DashboardService;
pub use lifecycle::{check_transition, valid_transitions, Transition};
