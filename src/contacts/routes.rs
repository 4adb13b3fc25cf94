//! REST endpoints for managing trusted contacts.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::TrustedContacts;
use super::model::{ContactUpdate, NewContact};
use crate::auth::AuthManager;
use crate::error::ContactError;
use crate::server::{auth_failure, error_response, invalid_body};

/// Shared state for trusted-contact routes.
#[derive(Clone)]
pub struct ContactRouteState {
    pub contacts: Arc<TrustedContacts>,
    pub auth: Arc<AuthManager>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddContactRequest {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    relationship: String,
}

/// Status for a service error, with `context` as the headline for
/// server-side failures.
fn contact_failure(e: ContactError, context: &str) -> Response {
    match e {
        ContactError::MissingFields
        | ContactError::InvalidRelationship(_)
        | ContactError::MissingContactMethod => {
            error_response(StatusCode::BAD_REQUEST, e.to_string(), None)
        }
        ContactError::NotFound(_) => error_response(StatusCode::NOT_FOUND, e.to_string(), None),
        ContactError::Database(_) => {
            tracing::warn!(error = %e, "{context}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                context,
                Some(e.to_string()),
            )
        }
    }
}

/// Parse a user id the caller has already been authorized for.
fn parse_user_id(raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "Invalid user ID", None))
}

/// GET /api/trusted-contacts?userId=
async fn list_contacts(
    State(state): State<ContactRouteState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    let Some(user_id) = query.user_id.filter(|id| !id.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "User ID is required", None);
    };
    if let Err(e) = state.auth.authorize(&headers, &user_id).await {
        return auth_failure(e);
    }
    let user_id = match parse_user_id(&user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.contacts.list(user_id).await {
        Ok(contacts) => Json(json!({"success": true, "contacts": contacts})).into_response(),
        Err(e) => contact_failure(e, "Failed to get trusted contacts"),
    }
}

/// POST /api/trusted-contacts
async fn add_contact(
    State(state): State<ContactRouteState>,
    headers: HeaderMap,
    body: Result<Json<AddContactRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    if [&body.user_id, &body.name, &body.relationship]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return contact_failure(ContactError::MissingFields, "Failed to add trusted contact");
    }
    if let Err(e) = state.auth.authorize(&headers, &body.user_id).await {
        return auth_failure(e);
    }
    let user_id = match parse_user_id(&body.user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let contact = NewContact {
        name: body.name,
        phone: body.phone,
        email: body.email,
        relationship: body.relationship,
    };
    match state.contacts.add(user_id, contact).await {
        Ok(contact) => Json(json!({
            "success": true,
            "message": "Trusted contact added successfully",
            "contact": contact,
        }))
        .into_response(),
        Err(e) => contact_failure(e, "Failed to add trusted contact"),
    }
}

/// Load a contact and require the bearer token to belong to its owner.
async fn owned_contact(
    state: &ContactRouteState,
    headers: &HeaderMap,
    id: &str,
) -> Result<Uuid, Response> {
    let user = state
        .auth
        .user_from_headers(headers)
        .await
        .map_err(auth_failure)?;
    let id = Uuid::parse_str(id)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "Invalid contact ID", None))?;
    let contact = state
        .contacts
        .get(id)
        .await
        .map_err(|e| contact_failure(e, "Failed to load trusted contact"))?;
    if contact.user_id != user.id {
        return Err(error_response(StatusCode::UNAUTHORIZED, "Unauthorized", None));
    }
    Ok(id)
}

/// PATCH /api/trusted-contacts/{id}
async fn update_contact(
    State(state): State<ContactRouteState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    update: Result<Json<ContactUpdate>, JsonRejection>,
) -> Response {
    let Json(update) = match update {
        Ok(update) => update,
        Err(rejection) => return invalid_body(rejection),
    };
    let id = match owned_contact(&state, &headers, &id).await {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.contacts.update(id, update).await {
        Ok(contact) => Json(json!({"success": true, "contact": contact})).into_response(),
        Err(e) => contact_failure(e, "Failed to update trusted contact"),
    }
}

/// DELETE /api/trusted-contacts/{id}
async fn delete_contact(
    State(state): State<ContactRouteState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let id = match owned_contact(&state, &headers, &id).await {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.contacts.delete(id).await {
        Ok(()) => Json(json!({"success": true})).into_response(),
        Err(e) => contact_failure(e, "Failed to delete trusted contact"),
    }
}

/// Build the trusted-contact REST routes.
pub fn contact_routes(state: ContactRouteState) -> Router {
    Router::new()
        .route(
            "/api/trusted-contacts",
            get(list_contacts).post(add_contact),
        )
        .route(
            "/api/trusted-contacts/{id}",
            patch(update_contact).delete(delete_contact),
        )
        .with_state(state)
}
