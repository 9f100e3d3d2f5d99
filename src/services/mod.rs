//! Network-facing services for the trackside controller.
//!
//! - `shared`: process-wide state, the activity tracker, and the shutdown
//!   coordinator
//! - `web`: the axum router, collection handlers, and server loop
//! - `system`: status, shutdown, restart, and file-upload handlers
//! - `schema`: OpenAPI document assembly

pub mod schema;
pub mod shared;
pub mod system;
pub mod web;

pub use shared::{ActivityGuard, ActivityTracker, ShutdownKind, TracksideCore, TracksideState};
pub use web::{build_router, run_server, WebServerConfig};
