pub mod auth;
pub mod investors;
pub mod payments;
