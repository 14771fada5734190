//! HS256 token codec.
//!
//! The codec only knows about signatures and expiry. Whether the claims make
//! sense (role, purpose, subject shape) is decided by its callers.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::JwtSecret;
use crate::services::auth::error::{AuthError, VerificationError};
use crate::services::auth::session::Role;

/// `purpose` claim carried by password-reset tokens.
pub const PURPOSE_PASSWORD_RESET: &str = "password-reset";

/// Caller-supplied claims. Every field is optional at this layer so that a
/// decoded token with a bad shape still reaches the resolver, which reports
/// it as an invalid payload instead of a malformed token. A claim of the
/// wrong JSON type is dropped here and named in [`VerifiedToken::mistyped`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Reset id, only on password-reset tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
}

impl Claims {
    pub fn session(subject_id: Uuid, email: &str, role: Role) -> Self {
        Self {
            sub: Some(subject_id.to_string()),
            email: Some(email.to_string()),
            role: Some(role.as_str().to_string()),
            purpose: None,
            rid: None,
        }
    }

    pub fn password_reset(subject_id: Uuid, email: &str, reset_id: &str) -> Self {
        Self {
            sub: Some(subject_id.to_string()),
            email: Some(email.to_string()),
            role: None,
            purpose: Some(PURPOSE_PASSWORD_RESET.to_string()),
            rid: Some(reset_id.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    #[serde(flatten)]
    claims: &'a Claims,
    iat: Option<i64>,
    exp: i64,
}

// Decoding side: claim values stay untyped until `into_claims`.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(flatten)]
    claims: RawClaims,
    #[serde(default)]
    iat: Option<i64>,
    exp: i64,
}

#[derive(Debug, Default, Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    email: Option<Value>,
    #[serde(default)]
    role: Option<Value>,
    #[serde(default)]
    purpose: Option<Value>,
    #[serde(default)]
    rid: Option<Value>,
}

impl RawClaims {
    fn into_claims(self) -> (Claims, Option<&'static str>) {
        let mut mistyped = None;
        let mut text = |name: &'static str, value: Option<Value>| match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(_) => {
                mistyped.get_or_insert(name);
                None
            }
        };

        let claims = Claims {
            sub: text("sub", self.sub),
            email: text("email", self.email),
            role: text("role", self.role),
            purpose: text("purpose", self.purpose),
            rid: text("rid", self.rid),
        };
        (claims, mistyped)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub claims: Claims,
    /// First claim that was present with a non-string value, if any.
    pub mistyped: Option<&'static str>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

/// Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenCodec {
    /// A codec can only exist with a validated secret, so there is no way to
    /// issue or verify tokens when `JWT_SECRET` was not configured.
    pub fn new(secret: &JwtSecret, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign `claims` with `iat = now` and `exp = now + ttl`.
    pub fn issue(&self, claims: &Claims, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let envelope = Envelope {
            claims,
            iat: Some(now.timestamp()),
            exp: (now + ttl).timestamp(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        jsonwebtoken::encode(&header, &envelope, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign token");
            AuthError::Infrastructure
        })
    }

    /// Check signature and expiry, then hand back the raw claims.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, VerificationError> {
        let data = jsonwebtoken::decode::<RawEnvelope>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                let mapped = match e.kind() {
                    ErrorKind::InvalidSignature => VerificationError::SignatureInvalid,
                    ErrorKind::ExpiredSignature => VerificationError::Expired,
                    _ => VerificationError::Malformed,
                };
                debug!(error = %e, kind = ?mapped, "token verification failed");
                mapped
            })?;

        let envelope = data.claims;
        let expires_at =
            DateTime::from_timestamp(envelope.exp, 0).ok_or(VerificationError::Malformed)?;
        let issued_at = match envelope.iat {
            Some(iat) => Some(DateTime::from_timestamp(iat, 0).ok_or(VerificationError::Malformed)?),
            None => None,
        };

        let (claims, mistyped) = envelope.claims.into_claims();

        Ok(VerifiedToken {
            claims,
            mistyped,
            issued_at,
            expires_at,
        })
    }
}
