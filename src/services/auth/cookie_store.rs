//! Session cookie adapter.
//!
//! Exactly one cookie name is used by every component that reads or writes
//! the session: [`SESSION_COOKIE_NAME`].

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const SESSION_COOKIE_NAME: &str = "bike_invest_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCookies {
    // Secure attribute is emitted only in production (plain http in dev).
    secure: bool,
}

impl SessionCookies {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Raw token under the canonical name, if any. Empty values count as absent.
    pub fn read(&self, jar: &CookieJar) -> Option<String> {
        jar.get(SESSION_COOKIE_NAME)
            .map(|c| c.value().trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn write(&self, jar: CookieJar, token: String, max_age_seconds: u64) -> CookieJar {
        let mut cookie = self.base(token);
        cookie.set_max_age(time::Duration::seconds(
            i64::try_from(max_age_seconds).unwrap_or(i64::MAX),
        ));
        jar.add(cookie)
    }

    /// Overwrites the cookie with an empty, already-expired value.
    ///
    /// Added rather than `remove`d so the removal is emitted even when the
    /// request carried no cookie.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        let mut cookie = self.base(String::new());
        cookie.make_removal();
        jar.add(cookie)
    }

    fn base(&self, value: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .build()
    }
}
