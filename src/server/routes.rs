//! HTTP routes
//!
//! - `POST /channel` creates a channel
//! - `GET /channel/{channel_id}?password=..` joins it over a WebSocket
//! - `GET /health` reports server statistics

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::registry::{Channel, ChannelId, MemberHandle};
use crate::session::Session;
use crate::stats::ServerStats;

use super::error::ApiError;
use super::socket;
use super::state::{AppState, SessionPermit};

/// Body of a create request
#[derive(Debug, Deserialize)]
pub struct CreateChannelRequest {
    pub password: String,
}

/// Body of a create response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateChannelResponse {
    pub channel_id: ChannelId,
}

/// Query of a join request
#[derive(Debug, Deserialize)]
pub struct JoinChannelQuery {
    #[serde(default)]
    pub password: String,
}

/// Body of a health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub stats: ServerStats,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/channel", post(create_channel))
        .route("/channel/{channel_id}", get(join_channel))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn create_channel(
    State(state): State<AppState>,
    body: Result<Json<CreateChannelRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateChannelResponse>), ApiError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected create request");
        ApiError::BadRequest(rejection.body_text())
    })?;

    let channel_id = state.registry.create_channel(request.password).await;

    Ok((
        StatusCode::CREATED,
        Json(CreateChannelResponse { channel_id }),
    ))
}

async fn join_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<JoinChannelQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let channel_id = ChannelId::new(channel_id);

    let channel = state
        .registry
        .authorize(&channel_id, &query.password)
        .await
        .map_err(|e| {
            tracing::info!(channel = %channel_id, error = %e, "Failed join attempt");
            ApiError::Unauthorized
        })?;

    let ws = ws.map_err(ApiError::NotUpgradable)?;

    let permit = state.sessions.try_acquire().ok_or_else(|| {
        tracing::warn!(channel = %channel_id, "Join rejected: connection limit reached");
        ApiError::Unavailable
    })?;

    let capacity = state.registry.config().member_queue_capacity;
    let password = query.password;
    let failed_channel = channel_id.clone();

    let response = ws
        .on_failed_upgrade(move |e| {
            tracing::error!(channel = %failed_channel, error = %e, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| run_session(socket, channel, password, capacity, permit));

    Ok(response)
}

async fn run_session(
    socket: WebSocket,
    channel: Arc<Channel>,
    password: String,
    capacity: usize,
    _permit: SessionPermit,
) {
    let (handle, queue) = MemberHandle::channel(capacity);

    let member_id = match channel.join(&password, handle).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(channel = %channel.id(), error = %e, "Join failed after upgrade");
            return;
        }
    };

    let (sink, stream) = socket.split();

    Session::new(channel, member_id)
        .run(socket::inbound(stream), socket::outbound(sink), queue)
        .await;
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        stats: state.stats().await,
    })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    use super::*;
    use crate::registry::ChannelRegistry;

    fn app() -> (Router, Arc<ChannelRegistry>) {
        let registry = Arc::new(ChannelRegistry::new());
        let state = AppState::new(Arc::clone(&registry), 0);
        (router(state), registry)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_channel() {
        let (app, registry) = app();

        let response = app
            .oneshot(
                Request::post("/channel")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"password":"secret"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        let id = ChannelId::new(json["channel_id"].as_str().unwrap());
        assert!(registry.authorize(&id, "secret").await.is_ok());
    }

    #[tokio::test]
    async fn test_create_channel_malformed_body() {
        let (app, registry) = app();

        let response = app
            .oneshot(
                Request::post("/channel")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
        assert_eq!(registry.channel_count().await, 0);
    }

    #[tokio::test]
    async fn test_join_unknown_and_wrong_password_look_alike() {
        let (app, registry) = app();
        let id = registry.create_channel("secret").await;

        let wrong = app
            .clone()
            .oneshot(
                Request::get(format!("/channel/{}?password=wrong", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let missing = app
            .oneshot(
                Request::get("/channel/does-not-exist?password=secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(wrong).await, body_json(missing).await);
    }

    #[tokio::test]
    async fn test_join_without_upgrade_headers() {
        let (app, registry) = app();
        let id = registry.create_channel("secret").await;

        let response = app
            .oneshot(
                Request::get(format!("/channel/{}?password=secret", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, registry) = app();
        registry.create_channel("").await;

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["channels"], 1);
    }
}
