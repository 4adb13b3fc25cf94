//! REST endpoints for email analysis and provider status.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::warn;

use super::analyzer::EmailAnalyzer;
use super::{parser, verdict};
use crate::auth::AuthManager;
use crate::contacts::TrustedContacts;
use crate::error::AuthError;
use crate::server::{error_response, invalid_body};

/// Shared state for analysis routes.
#[derive(Clone)]
pub struct AnalysisRouteState {
    pub analyzer: EmailAnalyzer,
    pub auth: Arc<AuthManager>,
    pub contacts: Arc<TrustedContacts>,
}

/// Contact descriptions for an authorized user. Lookup problems other than
/// a token mismatch only cost the personalization.
async fn contacts_for(
    state: &AnalysisRouteState,
    headers: &HeaderMap,
    user_id: &str,
) -> Result<Vec<String>, Response> {
    let user = match state.auth.authorize(headers, user_id).await {
        Ok(user) => user,
        Err(AuthError::Unauthorized) => {
            return Err(error_response(StatusCode::UNAUTHORIZED, "Unauthorized", None));
        }
        Err(e) => {
            warn!(error = %e, "Could not resolve user, analyzing without contacts");
            return Ok(Vec::new());
        }
    };

    match state.contacts.descriptions(user.id).await {
        Ok(descriptions) => Ok(descriptions),
        Err(e) => {
            warn!(user_id = %user.id, error = %e, "Could not load trusted contacts");
            Ok(Vec::new())
        }
    }
}

/// POST /api/analyze
///
/// Body: `{ "emailContent": string, "userId"?: string }`.
async fn analyze(
    State(state): State<AnalysisRouteState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    let Some(content) = body.get("emailContent").and_then(Value::as_str) else {
        return error_response(StatusCode::BAD_REQUEST, "Email content is required", None);
    };
    if content.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Email content cannot be empty", None);
    }

    let email = parser::parse(content);

    let user_id = body
        .get("userId")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty());
    let trusted_contacts = match user_id {
        Some(user_id) => match contacts_for(&state, &headers, user_id).await {
            Ok(contacts) => contacts,
            Err(response) => return response,
        },
        None => Vec::new(),
    };

    let response = state.analyzer.analyze_email(&email, &trusted_contacts).await;
    let result = match (response.success, response.result) {
        (true, Some(result)) => result,
        _ => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Analysis failed",
                response.error,
            );
        }
    };

    let config = verdict::config_for(result.verdict);
    let provider = state.analyzer.provider_info().await;

    Json(json!({
        "success": true,
        "analysis": {
            "verdict": result.verdict,
            "color": result.color,
            "confidence": result.confidence,
            "explanation": result.explanation,
            "actions": result.actions,
            "riskFactors": result.risk_factors,
            "isScam": result.is_scam,
            "requiresHumanHelp": config.requires_human_help,
            "requiresLifeline": config.requires_lifeline,
            "priority": config.priority,
            "processingTime": response.processing_time,
            "aiProvider": provider.name,
            "suspiciousPatterns": parser::suspicious_patterns(&email),
            "emailComponents": {
                "senderEmail": email.sender_email,
                "senderName": email.sender_name,
                "subject": email.subject,
                "hasBody": email.body.is_some(),
            },
        }
    }))
    .into_response()
}

/// GET /api/analyze
async fn status(State(state): State<AnalysisRouteState>) -> impl IntoResponse {
    let provider = state.analyzer.provider_info().await;
    Json(json!({
        "success": true,
        "provider": {
            "name": provider.name,
            "configured": provider.configured,
            "available": true,
        },
        "features": {
            "authentication": true,
            "trustedContacts": true,
            "multiProvider": true,
            "emailParsing": true,
        }
    }))
}

/// GET /api/analyze/test
///
/// Sends one probe message through the active provider.
async fn test_connection(State(state): State<AnalysisRouteState>) -> impl IntoResponse {
    Json(state.analyzer.providers().test_connection().await)
}

/// Build the analysis REST routes.
pub fn analysis_routes(state: AnalysisRouteState) -> Router {
    Router::new()
        .route("/api/analyze", get(status).post(analyze))
        .route("/api/analyze/test", get(test_connection))
        .with_state(state)
}
