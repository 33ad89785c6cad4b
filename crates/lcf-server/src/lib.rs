//! Life Canvas Flow diagram API.
//!
//! A small JSON CRUD service for saved diagrams. The editor runs in the
//! browser; this server only stores and validates diagram content.

pub mod config;
pub mod error;
pub mod routes;
pub mod store;

use axum::Router;
use std::sync::Arc;
use store::DiagramStore;
use tower_http::cors::{Any, CorsLayer};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DiagramStore>,
}

impl AppState {
    pub fn new(store: impl DiagramStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// The full application: API routes, state and middleware.
pub fn build_router(state: AppState) -> Router {
    routes::create_router()
        .with_state(state)
        .layer(cors_layer())
}
