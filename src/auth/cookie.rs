use axum_extra::extract::cookie::{Cookie, SameSite};

use super::models::RefreshTokenModel;

pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Cookie carrying the refresh token, expiring together with it
pub fn refresh_token_cookie(token: &RefreshTokenModel, ttl: chrono::Duration) -> Cookie<'static> {
    Cookie::build((REFRESH_TOKEN_COOKIE, token.token.clone()))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::seconds(ttl.num_seconds().max(0)))
        .build()
}

/// Identifies the refresh cookie for `CookieJar::remove`; the path must match
/// the one it was set with
pub fn refresh_token_removal() -> Cookie<'static> {
    Cookie::build(REFRESH_TOKEN_COOKIE).path("/").build()
}
