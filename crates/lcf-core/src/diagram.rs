//! The diagram container.
//!
//! Nodes live in a `petgraph` stable graph and connections are its edges,
//! so removing a node removes every connection touching it. Paint order
//! and connection order are tracked separately because `StableDiGraph`
//! reuses freed indices.

use crate::content::{ContentError, DiagramContent};
use crate::geometry::{self, ConnectionPath};
use crate::id::NodeId;
use crate::model::{Bounds, Connection, ConnectionColor, Node, NodeShape, Point};
use crate::viewport::Viewport;
use petgraph::Direction;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableDiGraph;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Why a diagram operation was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiagramError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("unknown connection {0}")]
    UnknownConnection(NodeId),

    #[error("node {0} cannot be connected to itself")]
    SelfLoop(NodeId),

    #[error("{from} is already connected to {to}")]
    DuplicateConnection { from: NodeId, to: NodeId },

    #[error("id {0} is already in use")]
    DuplicateId(NodeId),

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Nodes plus the connections between them.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    /// Nodes as graph vertices, connections as directed edges.
    pub graph: StableDiGraph<Node, Connection>,

    id_index: HashMap<NodeId, NodeIndex>,
    edge_index: HashMap<NodeId, EdgeIndex>,

    /// Paint order, back to front. Last is topmost.
    z_order: Vec<NodeId>,
    conn_order: Vec<NodeId>,
}

impl Diagram {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.z_order.len()
    }

    pub fn connection_count(&self) -> usize {
        self.conn_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z_order.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id) || self.edge_index.contains_key(&id)
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Insert a node on top of the paint order.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, DiagramError> {
        let id = node.id;
        if self.contains(id) {
            return Err(DiagramError::DuplicateId(id));
        }
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        self.z_order.push(id);
        log::debug!("added node {id}");
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    fn require_node_mut(&mut self, id: NodeId) -> Result<&mut Node, DiagramError> {
        self.node_mut(id).ok_or(DiagramError::UnknownNode(id))
    }

    /// Nodes in paint order (back to front).
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> + Clone + '_ {
        self.z_order
            .iter()
            .filter_map(|id| self.id_index.get(id).map(|idx| &self.graph[*idx]))
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.z_order
    }

    pub fn move_node(&mut self, id: NodeId, dx: f64, dy: f64) -> Result<(), DiagramError> {
        self.require_node_mut(id)?.translate(dx, dy);
        Ok(())
    }

    /// Move a node so its top-left corner is at `pos`.
    pub fn set_node_position(&mut self, id: NodeId, pos: Point) -> Result<(), DiagramError> {
        let node = self.require_node_mut(id)?;
        node.x = pos.x;
        node.y = pos.y;
        Ok(())
    }

    pub fn resize_node(&mut self, id: NodeId, width: f64, height: f64) -> Result<(), DiagramError> {
        self.require_node_mut(id)?.resize(width, height);
        Ok(())
    }

    pub fn set_shape(&mut self, id: NodeId, shape: NodeShape) -> Result<(), DiagramError> {
        self.require_node_mut(id)?.shape = shape;
        Ok(())
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), DiagramError> {
        self.require_node_mut(id)?.text = text.into();
        Ok(())
    }

    /// Remove a node and every connection touching it.
    /// Returns the node and the connections that went with it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(Node, Vec<Connection>), DiagramError> {
        let idx = *self.id_index.get(&id).ok_or(DiagramError::UnknownNode(id))?;

        let mut dropped: Vec<Connection> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.weight().clone())
            .collect();
        // Report dropped connections in insertion order.
        dropped.sort_by_key(|c| self.conn_order.iter().position(|id| *id == c.id));

        let node = self
            .graph
            .remove_node(idx)
            .ok_or(DiagramError::UnknownNode(id))?;
        self.id_index.remove(&id);
        self.z_order.retain(|n| *n != id);
        for conn in &dropped {
            self.edge_index.remove(&conn.id);
        }
        self.conn_order.retain(|c| !dropped.iter().any(|d| d.id == *c));

        log::debug!("removed node {id} and {} connection(s)", dropped.len());
        Ok((node, dropped))
    }

    /// Move a node to the top of the paint order.
    pub fn bring_to_front(&mut self, id: NodeId) -> bool {
        match self.z_order.iter().position(|n| *n == id) {
            Some(pos) if pos + 1 < self.z_order.len() => {
                let id = self.z_order.remove(pos);
                self.z_order.push(id);
                true
            }
            _ => false,
        }
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Insert a connection between two existing, distinct nodes.
    pub fn add_connection(&mut self, conn: Connection) -> Result<NodeId, DiagramError> {
        let id = conn.id;
        if self.contains(id) {
            return Err(DiagramError::DuplicateId(id));
        }
        if conn.source == conn.target {
            return Err(DiagramError::SelfLoop(conn.source));
        }
        let s = *self
            .id_index
            .get(&conn.source)
            .ok_or(DiagramError::UnknownNode(conn.source))?;
        let t = *self
            .id_index
            .get(&conn.target)
            .ok_or(DiagramError::UnknownNode(conn.target))?;
        if self.graph.find_edge(s, t).is_some() {
            return Err(DiagramError::DuplicateConnection {
                from: conn.source,
                to: conn.target,
            });
        }

        log::debug!("connected {} -> {} ({id})", conn.source, conn.target);
        let edge = self.graph.add_edge(s, t, conn);
        self.edge_index.insert(id, edge);
        self.conn_order.push(id);
        Ok(id)
    }

    /// Connect two nodes with a freshly generated connection id.
    pub fn connect(
        &mut self,
        source: NodeId,
        target: NodeId,
        color: ConnectionColor,
    ) -> Result<NodeId, DiagramError> {
        self.add_connection(Connection::new(source, target, color))
    }

    pub fn connection(&self, id: NodeId) -> Option<&Connection> {
        self.edge_index.get(&id).map(|e| &self.graph[*e])
    }

    pub fn set_connection_color(
        &mut self,
        id: NodeId,
        color: ConnectionColor,
    ) -> Result<(), DiagramError> {
        let edge = *self
            .edge_index
            .get(&id)
            .ok_or(DiagramError::UnknownConnection(id))?;
        self.graph[edge].color = color;
        Ok(())
    }

    pub fn remove_connection(&mut self, id: NodeId) -> Result<Connection, DiagramError> {
        let edge = self
            .edge_index
            .remove(&id)
            .ok_or(DiagramError::UnknownConnection(id))?;
        self.conn_order.retain(|c| *c != id);
        let conn = self
            .graph
            .remove_edge(edge)
            .ok_or(DiagramError::UnknownConnection(id))?;
        log::debug!("removed connection {id}");
        Ok(conn)
    }

    /// Connections in creation order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.conn_order
            .iter()
            .filter_map(|id| self.edge_index.get(id).map(|e| &self.graph[*e]))
    }

    /// Ids of the connections touching `node`, in either direction.
    pub fn connections_of(&self, node: NodeId) -> SmallVec<[NodeId; 8]> {
        let Some(&idx) = self.id_index.get(&node) else {
            return SmallVec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.weight().id)
            .collect()
    }

    /// Source and target nodes of a connection.
    pub fn endpoints(&self, id: NodeId) -> Option<(&Node, &Node)> {
        let conn = self.connection(id)?;
        Some((self.node(conn.source)?, self.node(conn.target)?))
    }

    /// Current curve of a connection, derived from its endpoint nodes.
    pub fn connection_path(&self, id: NodeId) -> Option<ConnectionPath> {
        let (source, target) = self.endpoints(id)?;
        Some(geometry::connection_points(source, target))
    }

    /// Bounding box of every node, or `None` for an empty diagram.
    pub fn bounds(&self) -> Option<Bounds> {
        self.nodes()
            .map(Node::bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    // ─── Wire format ─────────────────────────────────────────────────────

    /// Build a diagram from persisted content, validating it first.
    pub fn from_content(content: &DiagramContent) -> Result<(Self, Viewport), DiagramError> {
        content.validate()?;
        let mut diagram = Diagram::new();
        for node in &content.nodes {
            diagram.add_node(node.clone())?;
        }
        for conn in &content.connections {
            diagram.add_connection(conn.clone())?;
        }
        Ok((diagram, content.viewport()))
    }

    pub fn to_content(&self, viewport: &Viewport) -> DiagramContent {
        DiagramContent {
            nodes: self.nodes().cloned().collect(),
            connections: self.connections().cloned().collect(),
            canvas_scale: viewport.scale,
            canvas_position: Point::new(viewport.x, viewport.y),
        }
    }
}
