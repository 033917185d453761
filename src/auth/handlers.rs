use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Extension, Json,
};
use axum_extra::extract::CookieJar;
use tracing::{info, instrument};

use super::{
    cookie::{refresh_token_cookie, refresh_token_removal},
    types::{AccessClaims, IdentityResponse, LoginRequest, RegisterRequest, RegisterResponse},
};
use crate::shared::{AppError, AppState};

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::incorrect_data(rejection.body_text(), "handler.bind_json"))
}

/// HTTP handler for registering a new user
///
/// POST /register
/// Returns the public projection of the created identity
#[instrument(name = "register", skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, AppError> {
    let request = json_body(body)?;
    let user = state.auth_service.register(request).await?;

    info!(user_id = %user.id, "Registration handled");
    Ok(Json(user))
}

/// HTTP handler for credential login
///
/// POST /login
/// Returns the access token in the body and the refresh token as an HttpOnly cookie
#[instrument(name = "login", skip(state, headers, jar, body))]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = json_body(body)?;
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let outcome = state.auth_service.login(request, user_agent).await?;
    let cookie = refresh_token_cookie(
        &outcome.refresh_token,
        state.auth_service.token_issuer().refresh_ttl(),
    );

    info!(user_id = %outcome.response.id, "Login handled");
    Ok((jar.add(cookie), Json(outcome.response)))
}

/// HTTP handler for logout, requires a bearer token
///
/// POST /logout
/// Revokes the stored refresh token and clears the cookie
#[instrument(name = "logout", skip(state, claims, jar), fields(user_id = %claims.sub))]
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    jar: CookieJar,
) -> Result<CookieJar, AppError> {
    state.auth_service.logout(claims.sub).await?;
    Ok(jar.remove(refresh_token_removal()))
}

/// HTTP handler returning the caller's identity, requires a bearer token
///
/// GET /me
pub async fn me(Extension(claims): Extension<AccessClaims>) -> Json<IdentityResponse> {
    Json(IdentityResponse::from(claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::{LoginResponse, Role};
    use crate::auth::{router, token::TokenIssuer};
    use crate::shared::test_utils::{AppStateBuilder, TEST_SECRET};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
        Router,
    };
    use axum_extra::extract::cookie::{Cookie, SameSite};
    use chrono::Duration;
    use serde_json::Value;
    use tower::ServiceExt; // for `oneshot`

    const REGISTER_BODY: &str = r#"{"email":"a@b.com","login":"sw1ft","password":"Aa1!aaaa","name":"A","age":20,"gender":"Male"}"#;

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn register_and_login(app: &Router) -> (LoginResponse, String) {
        let response = app
            .clone()
            .oneshot(post_json("/register", REGISTER_BODY))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(post_json(
                "/login",
                r#"{"login":"sw1ft","password":"Aa1!aaaa"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (serde_json::from_slice(&body).unwrap(), cookie)
    }

    #[tokio::test]
    async fn test_register_handler() {
        let app = router(AppStateBuilder::new().build());

        let response = app.oneshot(post_json("/register", REGISTER_BODY)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(body["id"].is_string());
        assert_eq!(body["email"], "a@b.com");
        assert_eq!(body["role"], "User");
        assert_eq!(body["verified"], false);
        assert!(body.get("password").is_none());
        assert!(body.get("login").is_none());
    }

    #[tokio::test]
    async fn test_register_conflict() {
        let app = router(AppStateBuilder::new().build());

        app.clone()
            .oneshot(post_json("/register", REGISTER_BODY))
            .await
            .unwrap();
        let response = app.oneshot(post_json("/register", REGISTER_BODY)).await.unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["code"], "user_already_exists");
    }

    #[tokio::test]
    async fn test_register_malformed_json() {
        let app = router(AppStateBuilder::new().build());

        let response = app
            .oneshot(post_json("/register", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "incorrect_data");
    }

    #[tokio::test]
    async fn test_register_invalid_gender() {
        let app = router(AppStateBuilder::new().build());
        let body = REGISTER_BODY.replace("Male", "Robot");

        let response = app.oneshot(post_json("/register", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_sets_refresh_cookie() {
        let app = router(AppStateBuilder::new().build());

        let (login, cookie) = register_and_login(&app).await;

        assert!(login.token.contains('.'));
        assert_eq!(login.role, Role::User);
        assert!(cookie.starts_with("refresh_token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Max-Age=2592000"));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let app = router(AppStateBuilder::new().build());
        app.clone()
            .oneshot(post_json("/register", REGISTER_BODY))
            .await
            .unwrap();

        let response = app
            .oneshot(post_json("/login", r#"{"login":"sw1ft","password":"wrong"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_json(response).await["code"], "user_not_found");
    }

    #[tokio::test]
    async fn test_me_requires_bearer_token() {
        let app = router(AppStateBuilder::new().build());

        let request = Request::builder()
            .method("GET")
            .uri("/me")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "unauthorized");
    }

    #[tokio::test]
    async fn test_me_returns_identity() {
        let app = router(AppStateBuilder::new().build());
        let (login, _) = register_and_login(&app).await;

        let request = Request::builder()
            .method("GET")
            .uri("/me")
            .header("Authorization", format!("Bearer {}", login.token))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["id"], login.id.to_string());
        assert_eq!(body["gender"], "Male");
    }

    #[tokio::test]
    async fn test_expired_access_token_rejected() {
        let issuer = TokenIssuer::new(TEST_SECRET)
            .unwrap()
            .with_access_ttl(Duration::minutes(-1));
        let app = router(AppStateBuilder::new().with_token_issuer(issuer).build());
        let (login, _) = register_and_login(&app).await;

        let request = Request::builder()
            .method("GET")
            .uri("/me")
            .header("Authorization", format!("Bearer {}", login.token))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_cookie_has_security_attributes() {
        let app = router(AppStateBuilder::new().build());
        let (_, set_cookie) = register_and_login(&app).await;

        let cookie = Cookie::parse(set_cookie).unwrap();
        assert_eq!(cookie.name(), "refresh_token");
        assert_eq!(cookie.value().len(), 64);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let app = router(AppStateBuilder::new().build());
        let (login, set_cookie) = register_and_login(&app).await;
        let sent = Cookie::parse(set_cookie).unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/logout")
            .header("Authorization", format!("Bearer {}", login.token))
            .header(header::COOKIE, format!("{}={}", sent.name(), sent.value()))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cleared = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        let cleared = Cookie::parse(cleared.to_string()).unwrap();
        assert_eq!(cleared.name(), "refresh_token");
        assert_eq!(cleared.value(), "");
        assert_eq!(cleared.path(), Some("/"));
        assert_eq!(cleared.max_age(), Some(time::Duration::ZERO));
    }
}
