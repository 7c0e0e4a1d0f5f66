pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::{booking_admin_routes, booking_routes};
pub use services::{AvailabilityService, BookingService, DashboardService};
