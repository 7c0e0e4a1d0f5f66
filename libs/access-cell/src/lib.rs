pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::access_routes;
pub use services::{authorize, navigation_for, session_middleware, AccessGate};
