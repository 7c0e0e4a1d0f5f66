pub mod auth;
pub mod error;
pub mod roles;

pub use roles::Role;
