//! HTTP server assembly: shared services, the merged router, and the JSON
//! error shape every route uses.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::analysis::EmailAnalyzer;
use crate::analysis::routes::{AnalysisRouteState, analysis_routes};
use crate::auth::AuthManager;
use crate::auth::routes::{AuthRouteState, auth_routes};
use crate::contacts::TrustedContacts;
use crate::contacts::routes::{ContactRouteState, contact_routes};
use crate::error::AuthError;
use crate::llm::ProviderManager;
use crate::store::Database;

/// Services shared by all routes.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: EmailAnalyzer,
    pub auth: Arc<AuthManager>,
    pub contacts: Arc<TrustedContacts>,
}

impl AppState {
    /// Wire the services over one database and provider manager.
    pub fn new(db: Arc<dyn Database>, providers: Arc<ProviderManager>) -> Self {
        Self::with_auth(
            Arc::clone(&db),
            providers,
            Arc::new(AuthManager::new(db)),
        )
    }

    /// Same as [`new`](Self::new) with a prebuilt [`AuthManager`].
    pub fn with_auth(
        db: Arc<dyn Database>,
        providers: Arc<ProviderManager>,
        auth: Arc<AuthManager>,
    ) -> Self {
        Self {
            analyzer: EmailAnalyzer::new(providers),
            auth,
            contacts: Arc::new(TrustedContacts::new(db)),
        }
    }
}

/// `{ "error": ..., "details"?: ... }` with the given status.
pub fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: Option<String>,
) -> Response {
    let body = match details {
        Some(details) => json!({"error": error.into(), "details": details}),
        None => json!({"error": error.into()}),
    };
    (status, Json(body)).into_response()
}

/// The JSON error body for a request payload that did not parse.
pub fn invalid_body(rejection: JsonRejection) -> Response {
    error_response(
        rejection.status(),
        "Invalid request body",
        Some(rejection.body_text()),
    )
}

/// 401 for a missing or foreign token, 500 when the lookup itself failed.
pub fn auth_failure(e: AuthError) -> Response {
    match e {
        AuthError::Unauthorized => error_response(StatusCode::UNAUTHORIZED, "Unauthorized", None),
        other => {
            tracing::warn!(error = %other, "Session lookup failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                Some(other.to_string()),
            )
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "scam-guard"
    }))
}

/// All routes, with permissive CORS for the browser front end.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth_routes(AuthRouteState {
            auth: Arc::clone(&state.auth),
        }))
        .merge(contact_routes(ContactRouteState {
            contacts: Arc::clone(&state.contacts),
            auth: Arc::clone(&state.auth),
        }))
        .merge(analysis_routes(AnalysisRouteState {
            analyzer: state.analyzer,
            auth: state.auth,
            contacts: state.contacts,
        }))
        .layer(CorsLayer::permissive())
}
