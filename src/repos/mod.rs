pub mod error;
pub mod notification_repo;
pub mod payment_repo;
pub mod profile_repo;
pub mod user_repo;
