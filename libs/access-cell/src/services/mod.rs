pub mod gate;

pub use gate::{authorize, navigation_for, session_middleware, AccessGate};
