//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, panic capture)
//! - Put the shared-secret guard in front of the relay route only
//! - Cap the relay body size behind the guard
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::health::health;
use crate::http::request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
use crate::http::response::panic_response;
use crate::observability::tracing::make_request_span;
use crate::relay::{RelayError, RelayPipeline, SynthesisRequest};
use crate::relay::upstream::ClientInitError;
use crate::security::{require_proxy_secret, SharedSecretGuard};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub pipeline: Arc<RelayPipeline>,
    pub guard: SharedSecretGuard,
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
    config: Arc<RelayConfig>,
}

impl RelayServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ClientInitError> {
        let config = Arc::new(config);
        let state = AppState {
            pipeline: Arc::new(RelayPipeline::new(config.clone())?),
            guard: SharedSecretGuard::new(config.security.proxy_secret()),
            config: config.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The body limit only takes effect when the handler buffers the body,
    /// which happens after the guard has admitted the caller.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let relay_routes = Router::new()
            .route("/eleven/tts", post(synthesize_handler))
            .route_layer(middleware::from_fn_with_state(
                state.guard.clone(),
                require_proxy_secret,
            ))
            .layer(DefaultBodyLimit::max(config.security.max_body_bytes));

        Router::new()
            .route("/health", get(health))
            .merge(relay_routes)
            .fallback(not_found)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(CatchPanicLayer::custom(panic_response)),
            )
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// `POST /eleven/tts`. The guard has already admitted the caller.
async fn synthesize_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = headers.request_id();
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let error = body_rejection(rejection, state.config.security.max_body_bytes);
            tracing::debug!(request_id = %request_id, error = %error, "Request body refused");
            return error.into_response();
        }
    };

    match SynthesisRequest::from_json_bytes(&body) {
        Ok(request) => state.pipeline.handle(request, request_id).await,
        Err(error) => {
            tracing::debug!(request_id = %request_id, error = %error, "Undecodable request body");
            error.into_response()
        }
    }
}

fn body_rejection(rejection: BytesRejection, limit: usize) -> RelayError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RelayError::BodyTooLarge { limit }
    } else {
        RelayError::BadJson(rejection.body_text())
    }
}

async fn not_found() -> Response {
    RelayError::NotFound.into_response()
}
