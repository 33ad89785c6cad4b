//! Diagram CRUD endpoints.
//!
//! Content is checked with the same rules the editor applies on load
//! (finite geometry, unique ids, no dangling or self-referencing
//! connections, no repeated source/target pairs) before it is stored.

use crate::AppState;
use crate::error::{AppError, Result};
use crate::store::{DiagramRecord, NewDiagram};
use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::Json,
};
use lcf_core::WireContent;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiagramRequest {
    name: String,
    #[serde(default)]
    user_id: Option<i64>,
    content: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDiagramRequest {
    name: String,
    content: serde_json::Value,
}

/// Parse and validate diagram content. Ids stay plain strings so that
/// request data never reaches the process-wide id interner.
fn parse_content(value: serde_json::Value) -> Result<WireContent> {
    WireContent::parse_value(value).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn parse_name(name: String) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Diagram name is required".to_string()));
    }
    Ok(name.to_string())
}

/// A path id that is not a number cannot name a diagram.
fn diagram_id(path: std::result::Result<Path<i64>, PathRejection>) -> Result<i64> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::diagram_not_found())
}

fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(body)| body)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// GET /api/diagrams?userId=N
pub async fn list_diagrams(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DiagramRecord>>> {
    let user_id = query
        .user_id
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|id| *id != 0)
        .ok_or_else(|| AppError::BadRequest("User ID is required".to_string()))?;

    Ok(Json(state.store.list_by_user(user_id)?))
}

/// GET /api/diagrams/{id}
pub async fn get_diagram(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<DiagramRecord>> {
    let id = diagram_id(path)?;
    state
        .store
        .get(id)?
        .map(Json)
        .ok_or_else(AppError::diagram_not_found)
}

/// POST /api/diagrams
pub async fn create_diagram(
    State(state): State<AppState>,
    body: std::result::Result<Json<CreateDiagramRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DiagramRecord>)> {
    let req = json_body(body)?;
    let new = NewDiagram {
        name: parse_name(req.name)?,
        user_id: req.user_id,
        content: parse_content(req.content)?,
    };
    let record = state.store.create(new)?;
    log::info!(
        "created diagram {} ({} nodes)",
        record.id,
        record.content.nodes.len()
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/diagrams/{id}
pub async fn update_diagram(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<UpdateDiagramRequest>, JsonRejection>,
) -> Result<Json<DiagramRecord>> {
    let id = diagram_id(path)?;
    let req = json_body(body)?;
    let name = parse_name(req.name)?;
    let content = parse_content(req.content)?;
    let record = state
        .store
        .update(id, name, content)?
        .ok_or_else(AppError::diagram_not_found)?;
    log::info!("updated diagram {id}");
    Ok(Json(record))
}

/// DELETE /api/diagrams/{id}
pub async fn delete_diagram(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<StatusCode> {
    let id = diagram_id(path)?;
    if !state.store.delete(id)? {
        return Err(AppError::diagram_not_found());
    }
    log::info!("deleted diagram {id}");
    Ok(StatusCode::NO_CONTENT)
}
