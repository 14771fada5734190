//! Route guard: resolver + role gate, with one fixed mapping of failures to
//! responses.
//!
//! Per request: Start → Verifying → PayloadValidated → Authorized, or Denied
//! from any step. Nothing is retried.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, error};

use crate::error::AppError;
use crate::services::auth::error::AuthError;
use crate::services::auth::role_gate;
use crate::services::auth::session::{Role, SessionPayload};
use crate::services::auth::session_resolver::SessionResolver;

pub const LOGIN_PATH: &str = "/login";
pub const FORBIDDEN_REDIRECT: &str = "/login?error=forbidden";

/// Who is asking: JSON API handlers get status codes, page views get redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardContext {
    Api,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    Forbidden,
    Infrastructure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardFailure {
    pub context: GuardContext,
    pub error: AuthError,
}

impl GuardFailure {
    pub fn denial(&self) -> Denial {
        match self.error {
            AuthError::Forbidden => Denial::Forbidden,
            AuthError::Infrastructure => Denial::Infrastructure,
            _ => Denial::Unauthenticated,
        }
    }
}

impl IntoResponse for GuardFailure {
    fn into_response(self) -> Response {
        match (self.context, self.denial()) {
            (_, Denial::Infrastructure) => AppError::Internal.into_response(),
            (GuardContext::Api, Denial::Unauthenticated) => AppError::Unauthorized.into_response(),
            (GuardContext::Api, Denial::Forbidden) => AppError::Forbidden.into_response(),
            (GuardContext::Page, Denial::Unauthenticated) => {
                Redirect::to(LOGIN_PATH).into_response()
            }
            (GuardContext::Page, Denial::Forbidden) => {
                Redirect::to(FORBIDDEN_REDIRECT).into_response()
            }
        }
    }
}

pub fn guard(
    resolver: &SessionResolver,
    jar: &CookieJar,
    required: &[Role],
    context: GuardContext,
) -> Result<SessionPayload, GuardFailure> {
    let deny = |error: AuthError| {
        if error == AuthError::Infrastructure {
            error!(?context, "auth guard hit an infrastructure failure");
        } else {
            debug!(?context, error = %error, "request denied");
        }
        GuardFailure { context, error }
    };

    let session = resolver.resolve(jar).map_err(deny)?;
    role_gate::authorize(session, required).map_err(deny)
}
