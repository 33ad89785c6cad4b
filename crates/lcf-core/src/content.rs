//! Persisted diagram content: the JSON blob stored by the backend.
//!
//! ```json
//! { "nodes": [...], "connections": [...],
//!   "canvasScale": 1, "canvasPosition": { "x": 0, "y": 0 } }
//! ```
//!
//! Only node/connection identity, geometry and style are persisted.
//! Connection curves are recomputed after loading.

use crate::id::NodeId;
use crate::model::{Connection, Node, Point};
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

fn default_scale() -> f64 {
    1.0
}

/// Whole-diagram content as exchanged with the persistence API.
///
/// The editor works with interned [`NodeId`]s. Services that only check
/// and store content use [`WireContent`], whose ids stay plain strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramContent<I = NodeId> {
    pub nodes: Vec<Node<I>>,
    pub connections: Vec<Connection<I>>,
    #[serde(default = "default_scale")]
    pub canvas_scale: f64,
    #[serde(default)]
    pub canvas_position: Point,
}

/// Content with uninterned string ids.
pub type WireContent = DiagramContent<String>;

impl<I> Default for DiagramContent<I> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            canvas_scale: default_scale(),
            canvas_position: Point::ZERO,
        }
    }
}

/// Why a diagram content blob was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContentError {
    #[error("node {id}: {field} must be a finite number")]
    NonFinite { id: String, field: &'static str },

    #[error("node {id}: width and height must be positive (got {width} x {height})")]
    InvalidExtent { id: String, width: f64, height: f64 },

    #[error("duplicate node id {0}")]
    DuplicateNode(String),

    #[error("duplicate connection id {0}")]
    DuplicateConnection(String),

    #[error("connection {connection} references missing node {node}")]
    DanglingEndpoint { connection: String, node: String },

    #[error("connection {0} connects a node to itself")]
    SelfLoop(String),

    #[error("{from} is connected to {to} more than once")]
    DuplicatePair { from: String, to: String },

    #[error("canvasScale must be a positive number (got {0})")]
    InvalidScale(f64),

    #[error("canvasPosition must be finite")]
    InvalidPosition,

    #[error("malformed content: {0}")]
    Malformed(String),
}

impl DiagramContent {
    /// Parse and validate a JSON content blob.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let content: DiagramContent =
            serde_json::from_str(json).map_err(|e| ContentError::Malformed(e.to_string()))?;
        content.validate()?;
        Ok(content)
    }

    /// Parse and validate an already-decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ContentError> {
        let content: DiagramContent =
            serde_json::from_value(value).map_err(|e| ContentError::Malformed(e.to_string()))?;
        content.validate()?;
        Ok(content)
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl WireContent {
    /// Parse and validate a JSON value without touching the id interner.
    pub fn parse_value(value: serde_json::Value) -> Result<Self, ContentError> {
        let content: WireContent =
            serde_json::from_value(value).map_err(|e| ContentError::Malformed(e.to_string()))?;
        content.validate()?;
        Ok(content)
    }
}

impl<I: Eq + Hash + Display> DiagramContent<I> {
    /// Check structural invariants: finite geometry, positive extents,
    /// unique ids, and at most one connection per ordered pair of two
    /// distinct existing nodes.
    pub fn validate(&self) -> Result<(), ContentError> {
        if !self.canvas_scale.is_finite() || self.canvas_scale <= 0.0 {
            return Err(ContentError::InvalidScale(self.canvas_scale));
        }
        if !self.canvas_position.is_finite() {
            return Err(ContentError::InvalidPosition);
        }

        let mut node_ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            for (field, v) in [
                ("x", node.x),
                ("y", node.y),
                ("width", node.width),
                ("height", node.height),
                ("borderWidth", node.border_width),
            ] {
                if !v.is_finite() {
                    let id = node.id.to_string();
                    return Err(ContentError::NonFinite { id, field });
                }
            }
            if node.width <= 0.0 || node.height <= 0.0 {
                return Err(ContentError::InvalidExtent {
                    id: node.id.to_string(),
                    width: node.width,
                    height: node.height,
                });
            }
            if !node_ids.insert(&node.id) {
                return Err(ContentError::DuplicateNode(node.id.to_string()));
            }
        }

        // Nodes and connections share one id space.
        let mut conn_ids = HashSet::with_capacity(self.connections.len());
        let mut pairs = HashSet::with_capacity(self.connections.len());
        for conn in &self.connections {
            if node_ids.contains(&conn.id) || !conn_ids.insert(&conn.id) {
                return Err(ContentError::DuplicateConnection(conn.id.to_string()));
            }
            if conn.source == conn.target {
                return Err(ContentError::SelfLoop(conn.id.to_string()));
            }
            for endpoint in [&conn.source, &conn.target] {
                if !node_ids.contains(endpoint) {
                    return Err(ContentError::DanglingEndpoint {
                        connection: conn.id.to_string(),
                        node: endpoint.to_string(),
                    });
                }
            }
            if !pairs.insert((&conn.source, &conn.target)) {
                return Err(ContentError::DuplicatePair {
                    from: conn.source.to_string(),
                    to: conn.target.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            scale: self.canvas_scale,
            x: self.canvas_position.x,
            y: self.canvas_position.y,
        }
    }
}
