//! HTTP API server implementation

use axum::{
    extract::{Json, Query, State},
    http::{header::COOKIE, header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::errors::GatewayError;
use crate::core::identity::{self, Identity, ANON_COOKIE_MAX_AGE};
use crate::core::models::{ChatQuery, TranslateOutcome, TranslateQuery};
use crate::core::service::GatewayService;

/// Application state
#[derive(Clone)]
pub struct AppState {
    service: GatewayService,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

/// Successful translate response
#[derive(Serialize)]
struct TranslateResponse {
    ok: bool,
    result: TranslateOutcome,
}

/// Query parameters for the history endpoint
#[derive(Deserialize)]
struct HistoryParams {
    #[serde(rename = "conversationId")]
    conversation_id: Option<String>,
}

/// Structured error payload
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    used: Option<u32>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, kind, limit, used) = match &self {
            GatewayError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "not_authenticated", None, None)
            }
            GatewayError::LimitExceeded { limit, used } => (
                StatusCode::TOO_MANY_REQUESTS,
                "limit_exceeded",
                Some(*limit),
                Some(*used),
            ),
            GatewayError::InvalidInput { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_input", None, None)
            }
            GatewayError::UpstreamUnavailable { .. } => {
                (StatusCode::BAD_GATEWAY, "upstream_error", None, None)
            }
            GatewayError::MalformedUpstreamOutput { .. } => (
                StatusCode::BAD_GATEWAY,
                "malformed_upstream_output",
                None,
                None,
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                None,
                None,
            ),
        };

        let message = match &self {
            GatewayError::LimitExceeded { limit, .. } => format!(
                "You reached the free plan limit of {} for today. \
Subscribe to Premium for unlimited access.",
                limit
            ),
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: kind.to_string(),
            message,
            limit,
            used,
        };
        (status, Json(body)).into_response()
    }
}

/// Resolve the caller from the request's Cookie header
async fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Identity {
    let cookie_header = headers.get(COOKIE).and_then(|v| v.to_str().ok());
    let config = state.service.config();
    identity::resolve(
        state.service.store().as_ref(),
        cookie_header,
        &config.session_cookie,
        &config.anon_cookie,
    )
    .await
}

/// Attach the one-year anonymous-id cookie when the id was minted just now
fn with_anon_cookie(mut response: Response, state: &AppState, identity: &Identity) -> Response {
    if let Some(anon_id) = identity.fresh_anon_id() {
        let cookie = format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Lax",
            state.service.config().anon_cookie,
            anon_id,
            ANON_COOKIE_MAX_AGE
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!("failed to build anon cookie: {}", e),
        }
    }
    response
}

/// Health check handler
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "darija-gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Translate handler; anonymous callers are tracked by cookie
async fn translate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(query): Json<TranslateQuery>,
) -> Response {
    let identity = resolve_identity(&state, &headers).await;

    let response = match state.service.translate(&identity, &query).await {
        Ok(result) => Json(TranslateResponse { ok: true, result }).into_response(),
        Err(e) => {
            warn!("translate failed: {}", e);
            e.into_response()
        }
    };

    with_anon_cookie(response, &state, &identity)
}

/// Chat handler; requires an authenticated session
async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(query): Json<ChatQuery>,
) -> Response {
    let identity = resolve_identity(&state, &headers).await;

    match state.service.chat(&identity, &query).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => {
            warn!("chat failed: {}", e);
            e.into_response()
        }
    }
}

/// Conversation read-back handler
async fn chat_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<HistoryParams>,
) -> Response {
    let identity = resolve_identity(&state, &headers).await;

    match state
        .service
        .history(&identity, params.conversation_id.as_deref())
        .await
    {
        Ok(history) => Json(history).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Quota snapshot handler, for client upgrade prompts
async fn usage(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let identity = resolve_identity(&state, &headers).await;
    let snapshot = state.service.usage(&identity).await;
    let response = Json(snapshot).into_response();
    with_anon_cookie(response, &state, &identity)
}

/// Build the router for a service
pub fn router(service: GatewayService) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/", get(health_check))
        .route("/api/translate", post(translate))
        .route("/api/chat", post(chat).get(chat_history))
        .route("/api/usage", get(usage))
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_server(service: GatewayService, host: String, port: u16) -> anyhow::Result<()> {
    let app = router(service);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            GatewayError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::LimitExceeded { limit: 15, used: 15 }
                .into_response()
                .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            GatewayError::InvalidInput {
                message: "text is required".to_string()
            }
            .into_response()
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::UpstreamUnavailable {
                status: 500,
                detail: "down".to_string()
            }
            .into_response()
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::MalformedUpstreamOutput {
                detail: "not json".to_string()
            }
            .into_response()
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::StoreError {
                message: "backend".to_string()
            }
            .into_response()
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
