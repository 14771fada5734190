pub mod auth_service;
pub mod cookie_store;
pub mod error;
pub mod password;
pub mod password_reset;
pub mod role_gate;
pub mod route_guard;
pub mod session;
pub mod session_resolver;
pub mod token_codec;

pub use auth_service::AuthService;
pub use error::{AuthError, VerificationError};
pub use session::{Role, SessionPayload};
