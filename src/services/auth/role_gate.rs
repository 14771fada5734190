use crate::services::auth::error::AuthError;
use crate::services::auth::session::{Role, SessionPayload};

/// Let the session through when its role is one of `required`.
///
/// An empty `required` set admits nobody.
pub fn authorize(session: SessionPayload, required: &[Role]) -> Result<SessionPayload, AuthError> {
    if required.contains(&session.role) {
        Ok(session)
    } else {
        Err(AuthError::Forbidden)
    }
}
