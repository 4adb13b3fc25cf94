//! REST endpoints for registration, login and logout.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::{AuthManager, bearer_token};
use crate::error::AuthError;
use crate::server::{error_response, invalid_body};

/// Shared state for auth routes.
#[derive(Clone)]
pub struct AuthRouteState {
    pub auth: Arc<AuthManager>,
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// POST /api/auth/register
async fn register(
    State(state): State<AuthRouteState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    match state.auth.sign_up(&body.email, &body.password).await {
        Ok(_) => Json(json!({
            "success": true,
            "message": "Registration successful. You can now sign in."
        }))
        .into_response(),
        Err(
            e @ (AuthError::MissingCredentials
            | AuthError::InvalidEmail
            | AuthError::WeakPassword { .. }),
        ) => error_response(StatusCode::BAD_REQUEST, e.to_string(), None),
        Err(e) => error_response(
            StatusCode::BAD_REQUEST,
            "Registration failed",
            Some(e.to_string()),
        ),
    }
}

/// POST /api/auth/login
async fn login(
    State(state): State<AuthRouteState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    if let Err(e) = AuthManager::validate_credentials(&body.email, &body.password) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string(), None);
    }

    match state.auth.sign_in(&body.email, &body.password).await {
        Ok(session) => Json(json!({
            "success": true,
            "user": session.user,
            "accessToken": session.access_token,
        }))
        .into_response(),
        Err(e) => error_response(
            StatusCode::UNAUTHORIZED,
            "Login failed",
            Some(e.to_string()),
        ),
    }
}

/// POST /api/auth/logout
async fn logout(State(state): State<AuthRouteState>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized", None);
    };

    match state.auth.sign_out(token).await {
        Ok(_) => Json(json!({"success": true})).into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Logout failed",
            Some(e.to_string()),
        ),
    }
}

/// Build the auth REST routes.
pub fn auth_routes(state: AuthRouteState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::store::LibSqlBackend;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn router() -> Router {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let auth = AuthManager::with_rounds(Arc::new(db), NonZeroU32::new(1_000).unwrap());
        auth_routes(AuthRouteState {
            auth: Arc::new(auth),
        })
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn register_then_login() {
        let app = router().await;
        let creds = json!({"email": "ann@example.com", "password": "secret"});

        let (status, body) = post_json(&app, "/api/auth/register", creds.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = post_json(&app, "/api/auth/login", creds).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "ann@example.com");
        assert!(body["accessToken"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[tokio::test]
    async fn register_validation_errors() {
        let app = router().await;

        let (status, body) = post_json(&app, "/api/auth/register", json!({"email": "a@b.co"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email and password are required");

        let (status, body) = post_json(
            &app,
            "/api/auth/register",
            json!({"email": "a@b.co", "password": "123"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Password must be at least 6 characters long");
    }

    #[tokio::test]
    async fn duplicate_registration_fails() {
        let app = router().await;
        let creds = json!({"email": "ann@example.com", "password": "secret"});
        post_json(&app, "/api/auth/register", creds.clone()).await;

        let (status, body) = post_json(&app, "/api/auth/register", creds).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Registration failed");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn bad_login_is_unauthorized() {
        let app = router().await;
        let (status, body) = post_json(
            &app,
            "/api/auth/login",
            json!({"email": "nobody@example.com", "password": "secret"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["details"], "Invalid login credentials");

        let (status, _) = post_json(&app, "/api/auth/login", json!({"email": "bad", "password": "x"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logout_requires_bearer() {
        let app = router().await;
        let (status, _) = post_json(&app, "/api/auth/logout", json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
