//! REST API routes, mounted under `/api`.
//!
//! - `GET /api/health`
//! - `GET /api/diagrams?userId=N`
//! - `POST /api/diagrams`
//! - `GET /api/diagrams/{id}`
//! - `PUT /api/diagrams/{id}`
//! - `DELETE /api/diagrams/{id}`

use crate::AppState;
use axum::{Router, routing::get};

pub mod diagrams;
pub mod health;

pub fn create_router() -> Router<AppState> {
    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/diagrams",
            get(diagrams::list_diagrams).post(diagrams::create_diagram),
        )
        .route(
            "/diagrams/{id}",
            get(diagrams::get_diagram)
                .put(diagrams::update_diagram)
                .delete(diagrams::delete_diagram),
        );

    Router::new().nest("/api", api_routes)
}
