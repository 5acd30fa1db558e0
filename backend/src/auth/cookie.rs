//! Refresh-token cookie
//!
//! The refresh token only ever travels in an HTTP-only cookie scoped to `/`.
//! Outside production the cookie is `SameSite=Lax` and not `Secure` so it
//! works over plain http on localhost; in production it is
//! `SameSite=None; Secure` so a frontend on another origin can send it.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const REFRESH_COOKIE: &str = "refreshToken";
pub const ACCESS_COOKIE: &str = "accessToken";

/// Attributes for the refresh cookie
#[derive(Debug, Clone, Copy)]
pub struct RefreshCookie {
    secure: bool,
    same_site: SameSite,
    max_age_secs: i64,
}

impl RefreshCookie {
    pub fn new(production: bool, max_age_secs: i64) -> Self {
        Self {
            secure: production,
            same_site: if production { SameSite::None } else { SameSite::Lax },
            max_age_secs,
        }
    }

    /// Add the refresh cookie carrying `token`
    pub fn set(&self, jar: CookieJar, token: String) -> CookieJar {
        jar.add(
            Cookie::build((REFRESH_COOKIE, token))
                .http_only(true)
                .secure(self.secure)
                .same_site(self.same_site)
                .path("/")
                .max_age(time::Duration::seconds(self.max_age_secs))
                .build(),
        )
    }

    /// Expire the refresh cookie, whether or not the request carried one
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        let mut cookie = Cookie::build((REFRESH_COOKIE, ""))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .path("/")
            .build();
        cookie.make_removal();
        jar.add(cookie)
    }
}

/// Refresh token presented in the request cookie, if any
pub fn refresh_token_from(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
