pub mod citizen;
pub mod session;
pub mod staff;

pub use citizen::CitizenAuthService;
pub use session::{citizen_identifier, end_session, start_session, validate_new_password};
pub use staff::{bootstrap_admin, StaffAuthService};
