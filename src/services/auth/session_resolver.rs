//! Request → validated [`SessionPayload`].
//!
//! No authorization decision and no database access: identity and role come
//! only from the signed token.

use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;
use tracing::debug;
use uuid::Uuid;

use crate::services::auth::cookie_store::SessionCookies;
use crate::services::auth::error::AuthError;
use crate::services::auth::session::{Role, SessionPayload};
use crate::services::auth::token_codec::{TokenCodec, VerifiedToken};

#[derive(Clone, Debug)]
pub struct SessionResolver {
    codec: Arc<TokenCodec>,
    cookies: SessionCookies,
}

impl SessionResolver {
    pub fn new(codec: Arc<TokenCodec>, cookies: SessionCookies) -> Self {
        Self { codec, cookies }
    }

    pub fn resolve(&self, jar: &CookieJar) -> Result<SessionPayload, AuthError> {
        let token = self.cookies.read(jar).ok_or(AuthError::NoSession)?;
        self.resolve_token(&token)
    }

    /// Same checks as [`resolve`](Self::resolve) for a token obtained some other way.
    pub fn resolve_token(&self, token: &str) -> Result<SessionPayload, AuthError> {
        let verified = self.codec.verify(token)?;
        session_from_verified(verified)
    }
}

fn session_from_verified(verified: VerifiedToken) -> Result<SessionPayload, AuthError> {
    let VerifiedToken {
        claims,
        mistyped,
        issued_at,
        expires_at,
    } = verified;

    if let Some(claim) = mistyped {
        debug!(claim, "session token claim has the wrong type");
        return Err(AuthError::InvalidPayload);
    }

    // Reset tokens share the secret but are never sessions.
    if claims.purpose.is_some() || claims.rid.is_some() {
        return Err(AuthError::InvalidPayload);
    }

    let subject_id = claims
        .sub
        .as_deref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or(AuthError::InvalidPayload)?;

    let email = claims
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or(AuthError::InvalidPayload)?;

    let role = claims
        .role
        .as_deref()
        .and_then(|r| r.parse::<Role>().ok())
        .ok_or(AuthError::InvalidPayload)?;

    let issued_at = issued_at.ok_or(AuthError::InvalidPayload)?;

    Ok(SessionPayload {
        subject_id,
        email,
        role,
        issued_at,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::cookie_store::SESSION_COOKIE_NAME;
    use crate::services::auth::token_codec::Claims;
    use crate::services::auth::token_codec::tests::{
        codec, in_five_minutes, sign_raw, tamper_signature,
    };
    use axum_extra::extract::cookie::Cookie;
    use chrono::Duration;

    fn resolver() -> SessionResolver {
        SessionResolver::new(Arc::new(codec()), SessionCookies::new(false))
    }

    fn jar_with_token(token: String) -> CookieJar {
        CookieJar::new().add(Cookie::new(SESSION_COOKIE_NAME, token))
    }

    fn signed(claims: &Claims) -> String {
        codec().issue(claims, Duration::minutes(5)).unwrap()
    }

    #[test]
    fn valid_session_resolves() {
        let id = Uuid::new_v4();
        let token = signed(&Claims::session(id, "inv@example.com", Role::Investor));

        let session = resolver().resolve(&jar_with_token(token)).unwrap();
        assert_eq!(session.subject_id, id);
        assert_eq!(session.email, "inv@example.com");
        assert_eq!(session.role, Role::Investor);
    }

    #[test]
    fn missing_cookie_is_no_session() {
        assert_eq!(resolver().resolve(&CookieJar::new()), Err(AuthError::NoSession));
    }

    #[test]
    fn codec_failures_propagate_as_is() {
        let r = resolver();
        let good = signed(&Claims::session(Uuid::new_v4(), "a@example.com", Role::Admin));
        let expired = codec()
            .issue(
                &Claims::session(Uuid::new_v4(), "a@example.com", Role::Admin),
                Duration::seconds(-120),
            )
            .unwrap();

        assert_eq!(
            r.resolve(&jar_with_token(tamper_signature(&good))),
            Err(AuthError::SignatureInvalid)
        );
        assert_eq!(r.resolve(&jar_with_token(expired)), Err(AuthError::Expired));
        assert_eq!(
            r.resolve(&jar_with_token("garbage".into())),
            Err(AuthError::Malformed)
        );
    }

    #[test]
    fn missing_fields_are_invalid_payload() {
        let r = resolver();
        let full = Claims::session(Uuid::new_v4(), "a@example.com", Role::Admin);

        let cases = [
            Claims { sub: None, ..full.clone() },
            Claims { email: None, ..full.clone() },
            Claims { role: None, ..full.clone() },
            Claims { email: Some("  ".into()), ..full.clone() },
            Claims { sub: Some("not-a-uuid".into()), ..full.clone() },
            Claims { role: Some("superuser".into()), ..full.clone() },
            Claims::default(),
        ];

        for claims in cases {
            assert_eq!(
                r.resolve(&jar_with_token(signed(&claims))),
                Err(AuthError::InvalidPayload),
                "claims: {claims:?}"
            );
        }
    }

    #[test]
    fn wrongly_typed_fields_are_invalid_payload() {
        let r = resolver();
        let base = serde_json::json!({
            "sub": Uuid::new_v4().to_string(),
            "email": "a@example.com",
            "role": "admin",
            "iat": chrono::Utc::now().timestamp(),
            "exp": in_five_minutes(),
        });

        let overrides = [
            ("sub", serde_json::json!(42)),
            ("role", serde_json::json!(1)),
            ("email", serde_json::json!(["a@example.com"])),
            ("purpose", serde_json::json!(true)),
            ("rid", serde_json::json!({ "id": "x" })),
        ];

        for (field, value) in overrides {
            let mut body = base.clone();
            body[field] = value;
            assert_eq!(
                r.resolve(&jar_with_token(sign_raw(&body))),
                Err(AuthError::InvalidPayload),
                "field: {field}"
            );
        }

        // Untouched base is a valid admin session.
        assert_eq!(
            r.resolve(&jar_with_token(sign_raw(&base))).unwrap().role,
            Role::Admin
        );
    }

    #[test]
    fn reset_token_is_not_a_session() {
        let mut claims = Claims::password_reset(Uuid::new_v4(), "a@example.com", "rid");
        claims.role = Some("admin".into());

        assert_eq!(
            resolver().resolve(&jar_with_token(signed(&claims))),
            Err(AuthError::InvalidPayload)
        );
    }
}
