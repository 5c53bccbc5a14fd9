//! HTTP surface: notification intake, subscription management and health.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::error::MailboxError;
use crate::mailbox::SubscriptionManager;
use crate::mailbox::subscriptions::{DEFAULT_EXTENSION_DAYS, DEFAULT_FOLDER};
use crate::pipeline::{DraftWorkflow, NotificationPayload};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<DraftWorkflow>,
    pub subscriptions: Arc<dyn SubscriptionManager>,
}

/// Build the Axum router.
pub fn routes(workflow: Arc<DraftWorkflow>, subscriptions: Arc<dyn SubscriptionManager>) -> Router {
    let state = AppState {
        workflow,
        subscriptions,
    };

    Router::new()
        .route("/api/health", get(health))
        .route("/api/graph-notifications", post(graph_notifications))
        .route("/api/list-subscriptions", get(list_subscriptions))
        .route("/api/create-subscription", post(create_subscription))
        .route("/api/renew-subscription", patch(renew_subscription))
        .route("/api/delete-subscription", delete(delete_subscription))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "success",
        "time": chrono::Utc::now().to_rfc3339(),
    }))
}

// ── Notifications ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct NotificationQuery {
    #[serde(rename = "validationToken")]
    validation_token: Option<String>,
}

/// Echo the subscription handshake token, or accept a notification batch and
/// hand each notification to its own workflow task.
async fn graph_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
    body: Bytes,
) -> Response {
    if let Some(token) = query.validation_token {
        info!("Subscription validation token received");
        return (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/plain"),
                (header::CACHE_CONTROL, "no-store"),
                (header::PRAGMA, "no-cache"),
            ],
            token,
        )
            .into_response();
    }

    let payload: NotificationPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Invalid notification payload");
            return (StatusCode::BAD_REQUEST, "Invalid JSON payload").into_response();
        }
    };

    // Outcomes are only logged; the sender gets an immediate 202.
    drop(state.workflow.dispatch(payload));
    (StatusCode::ACCEPTED, "Notification received").into_response()
}

// ── Subscriptions ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CreateSubscriptionRequest {
    notification_url: String,
    #[serde(default)]
    folder: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RenewSubscriptionRequest {
    subscription_id: String,
    #[serde(default)]
    extension_days: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DeleteSubscriptionRequest {
    subscription_id: String,
}

fn subscription_error(action: &str, e: MailboxError) -> Response {
    error!(action, error = %e, "Subscription request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"detail": format!("Error {action} subscription: {e}")})),
    )
        .into_response()
}

async fn list_subscriptions(State(state): State<AppState>) -> Response {
    match state.subscriptions.list().await {
        Ok(subscriptions) => {
            Json(serde_json::json!({ "subscriptions": subscriptions })).into_response()
        }
        Err(e) => subscription_error("listing", e),
    }
}

async fn create_subscription(
    State(state): State<AppState>,
    Json(body): Json<CreateSubscriptionRequest>,
) -> Response {
    let folder = body.folder.as_deref().unwrap_or(DEFAULT_FOLDER);
    match state.subscriptions.create(&body.notification_url, folder).await {
        Ok(subscription) => (StatusCode::CREATED, Json(subscription)).into_response(),
        Err(e) => subscription_error("creating", e),
    }
}

async fn renew_subscription(
    State(state): State<AppState>,
    Json(body): Json<RenewSubscriptionRequest>,
) -> Response {
    let days = body.extension_days.unwrap_or(DEFAULT_EXTENSION_DAYS);
    match state.subscriptions.renew(&body.subscription_id, days).await {
        Ok(subscription) => Json(subscription).into_response(),
        Err(e) => subscription_error("renewing", e),
    }
}

async fn delete_subscription(
    State(state): State<AppState>,
    Json(body): Json<DeleteSubscriptionRequest>,
) -> Response {
    match state.subscriptions.delete(&body.subscription_id).await {
        Ok(()) => Json(serde_json::json!({
            "status": "deleted",
            "subscription_id": body.subscription_id,
        }))
        .into_response(),
        Err(e) => subscription_error("deleting", e),
    }
}
