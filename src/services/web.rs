//! Axum-based HTTP server for the device registry API.
//!
//! Provides REST endpoints for:
//! - GET `/api/{collection}` - List device representations
//! - POST `/api/{collection}` - Create a device
//! - GET `/api/{collection}/{id}` - One device representation
//! - PATCH `/api/{collection}/{id}` - Apply a state update
//! - DELETE `/api/{collection}/{id}` - Switch off and remove a device
//! - GET `/api/system` - System status
//! - DELETE `/api/system` - Accept a deferred shutdown
//! - POST `/api/system/restart` - Accept a deferred restart
//! - PATCH `/api/system` - Upload a file to local storage
//! - GET `/api/schema` - OpenAPI document
//! - GET `/` - API explorer UI (serves index.html)
//!
//! Collections are `signals` and `turnouts`; anything else under `/api/`
//! is a 404. Error responses carry no body: the status code is the whole
//! contract. Both a rejected creation and a rejected state update map to
//! 400, unknown ids map to 404, resolved before body validation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::WebConfig;
use crate::devices::catalog::Collection;
use crate::devices::DeviceConfig;
use crate::registry::RegistryError;
use crate::traits::LineBank;

use super::shared::{ShutdownKind, TracksideState};
use super::{schema, system};

// ============================================================================
// Route Handlers
// ============================================================================

/// Map a registry failure to its status code.
///
/// Validation failures and conflicts are both client errors with no
/// distinguishing body; the id namespace is the only 404 source.
fn registry_status(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::InvalidConfig(_)
        | RegistryError::Conflict(_)
        | RegistryError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
    }
}

/// GET /api/{collection} - List representations in insertion order
async fn list_devices<B: LineBank + 'static>(
    State(state): State<Arc<TracksideState<B>>>,
    Path(collection): Path<String>,
) -> Response {
    let Some(collection) = Collection::from_path(&collection) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let core = state.lock().await;
    Json(core.registry(collection).representations()).into_response()
}

/// POST /api/{collection} - Validate, construct, and register a device
async fn create_device<B: LineBank + 'static>(
    State(state): State<Arc<TracksideState<B>>>,
    Path(collection): Path<String>,
    body: Bytes,
) -> Response {
    let Some(collection) = Collection::from_path(&collection) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Ok(config) = serde_json::from_slice::<DeviceConfig>(&body) else {
        tracing::debug!(collection = collection.as_str(), "unparseable create body");
        return StatusCode::BAD_REQUEST.into_response();
    };

    let mut core = state.lock().await;
    let core = &mut *core;
    let registry = match collection {
        Collection::Signals => &mut core.signals,
        Collection::Turnouts => &mut core.turnouts,
    };
    match registry.create(config, &mut core.bank).await {
        Ok(repr) => Json(repr).into_response(),
        Err(err) => {
            tracing::debug!(collection = collection.as_str(), error = %err, "create rejected");
            registry_status(&err).into_response()
        }
    }
}

/// GET /api/{collection}/{id} - One representation
async fn get_device<B: LineBank + 'static>(
    State(state): State<Arc<TracksideState<B>>>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let Some(collection) = Collection::from_path(&collection) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let core = state.lock().await;
    match core.registry(collection).get(&id) {
        Some(device) => Json(device.representation()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// PATCH /api/{collection}/{id} - Apply a state update
async fn update_device<B: LineBank + 'static>(
    State(state): State<Arc<TracksideState<B>>>,
    Path((collection, id)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let Some(collection) = Collection::from_path(&collection) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    // An unparseable body still resolves the id first: Null fails device
    // validation, so a missing id wins with 404 over the 400
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);

    let mut core = state.lock().await;
    let registry = match collection {
        Collection::Signals => &mut core.signals,
        Collection::Turnouts => &mut core.turnouts,
    };
    match registry.update(&id, &body).await {
        Ok(repr) => Json(repr).into_response(),
        Err(err) => {
            tracing::debug!(collection = collection.as_str(), id, error = %err, "update rejected");
            registry_status(&err).into_response()
        }
    }
}

/// DELETE /api/{collection}/{id} - Switch off and remove
async fn delete_device<B: LineBank + 'static>(
    State(state): State<Arc<TracksideState<B>>>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let Some(collection) = Collection::from_path(&collection) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mut core = state.lock().await;
    let registry = match collection {
        Collection::Signals => &mut core.signals,
        Collection::Turnouts => &mut core.turnouts,
    };
    match registry.delete(&id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => registry_status(&err).into_response(),
    }
}

/// GET / - Serve the API explorer UI
async fn index() -> impl IntoResponse {
    Html(include_str!("../../www/index.html"))
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}

// ============================================================================
// Request Activity Middleware
// ============================================================================

/// Holds an activity guard for the lifetime of each request.
///
/// The guard drives the in-flight counter and the busy LED; dropping it on
/// the way out balances the count even when a handler short-circuits.
async fn track_activity<B: LineBank + 'static>(
    State(state): State<Arc<TracksideState<B>>>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = state.activity().begin();
    next.run(request).await
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_permissive: true,
        }
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router<B: LineBank + 'static>(
    state: Arc<TracksideState<B>>,
    config: &WebServerConfig,
) -> Router {
    let mut router = Router::new()
        // System routes (static segments win over the collection capture)
        .route(
            "/api/system",
            get(system::status::<B>)
                .delete(system::shutdown::<B>)
                .patch(system::upload::<B>),
        )
        .route("/api/system/restart", axum::routing::post(system::restart::<B>))
        .route("/api/schema", get(schema::get_schema))
        // Collection routes
        .route(
            "/api/:collection",
            get(list_devices::<B>).post(create_device::<B>),
        )
        .route(
            "/api/:collection/:id",
            get(get_device::<B>)
                .patch(update_device::<B>)
                .delete(delete_device::<B>),
        )
        // Web UI
        .route("/", get(index))
        // Fallback
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            track_activity::<B>,
        ))
        .with_state(state);

    // Add CORS if requested
    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server with shared state.
///
/// Serves until the shutdown coordinator broadcasts a kind, then drains
/// in-flight connections and returns the kind so the caller can decide
/// between exiting and rebuilding.
pub async fn run_server<B: LineBank + 'static>(
    state: Arc<TracksideState<B>>,
    config: WebServerConfig,
) -> Result<ShutdownKind, std::io::Error> {
    let router = build_router(Arc::clone(&state), &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    println!("Trackside API listening on http://{}", config.addr);

    let mut shutdown = state.subscribe_shutdown();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(Option::is_some).await;
        })
        .await?;

    let kind = (*state.subscribe_shutdown().borrow()).unwrap_or(ShutdownKind::Halt);
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_server_config_default() {
        let config = WebServerConfig::default();
        assert_eq!(config.addr.port(), 8080);
        assert!(config.cors_permissive);
    }

    #[test]
    fn web_server_config_from_web_config() {
        let config = WebServerConfig::from_config(&WebConfig::default().with_port(9000).with_cors(false));
        assert_eq!(config.addr.port(), 9000);
        assert!(!config.cors_permissive);
    }

    #[test]
    fn registry_error_mapping() {
        assert_eq!(
            registry_status(&RegistryError::NotFound("1".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            registry_status(&RegistryError::Conflict("1".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            registry_status(&RegistryError::InvalidTransition("1".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            registry_status(&RegistryError::InvalidConfig("bad".into())),
            StatusCode::BAD_REQUEST
        );
    }
}
