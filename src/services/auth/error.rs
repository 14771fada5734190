use thiserror::Error;

/// Token-level verification failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
}

/// Auth outcomes surfaced by resolver / gate / reset flow.
///
/// Everything except `Infrastructure` is a routine user-facing denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no session cookie")]
    NoSession,
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
    #[error("token payload is invalid")]
    InvalidPayload,
    #[error("role not permitted")]
    Forbidden,
    #[error("infrastructure failure")]
    Infrastructure,
}

impl AuthError {
    /// True for failures that mean "not logged in" (as opposed to wrong role).
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::NoSession
                | AuthError::Malformed
                | AuthError::SignatureInvalid
                | AuthError::Expired
                | AuthError::InvalidPayload
        )
    }
}

impl From<VerificationError> for AuthError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::Malformed => AuthError::Malformed,
            VerificationError::SignatureInvalid => AuthError::SignatureInvalid,
            VerificationError::Expired => AuthError::Expired,
        }
    }
}
