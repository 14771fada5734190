use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;
use chrono::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::services::auth::cookie_store::SessionCookies;
use crate::services::auth::error::AuthError;
use crate::services::auth::route_guard::{self, GuardContext, GuardFailure};
use crate::services::auth::session::{Role, SessionPayload};
use crate::services::auth::session_resolver::SessionResolver;
use crate::services::auth::token_codec::{Claims, TokenCodec};

/// Process-level auth entry point shared through `AppState`.
///
/// - issuing sessions (login / signup) writes the canonical cookie
/// - guarding routes goes through the resolver + role gate
#[derive(Clone, Debug)]
pub struct AuthService {
    codec: Arc<TokenCodec>,
    resolver: SessionResolver,
    cookies: SessionCookies,
    session_ttl_seconds: u64,
}

impl AuthService {
    pub fn new(codec: Arc<TokenCodec>, cookies: SessionCookies, session_ttl_seconds: u64) -> Self {
        let resolver = SessionResolver::new(codec.clone(), cookies);
        Self {
            codec,
            resolver,
            cookies,
            session_ttl_seconds,
        }
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    pub fn resolver(&self) -> &SessionResolver {
        &self.resolver
    }

    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    /// Sign a session token for the identity and put it in the cookie jar.
    pub fn issue_session(
        &self,
        jar: CookieJar,
        user_id: Uuid,
        email: &str,
        role: Role,
    ) -> Result<CookieJar, AuthError> {
        let ttl = Duration::seconds(i64::try_from(self.session_ttl_seconds).unwrap_or(i64::MAX));
        let token = self.codec.issue(&Claims::session(user_id, email, role), ttl)?;

        debug!(user_id = %user_id, role = %role, "session issued");
        Ok(self.cookies.write(jar, token, self.session_ttl_seconds))
    }

    /// Logout. The token itself stays valid until its `exp`; only the cookie goes away.
    pub fn end_session(&self, jar: CookieJar) -> CookieJar {
        self.cookies.clear(jar)
    }

    pub fn guard(
        &self,
        jar: &CookieJar,
        required: &[Role],
        context: GuardContext,
    ) -> Result<SessionPayload, GuardFailure> {
        route_guard::guard(&self.resolver, jar, required, context)
    }
}
