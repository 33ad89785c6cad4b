//! Editor engine: the single owner of mutable diagram state.
//!
//! Every edit goes through [`DiagramEngine::apply`] as a
//! [`DiagramMutation`]. Geometric node edits recompute the cached curve of
//! each connection touching that node, and nothing else, so dragging
//! stays cheap on large diagrams.

use crate::tools::ToolContext;
use lcf_core::geometry::{ConnectionPath, connection_points};
use lcf_core::placement::place_node;
use lcf_core::{
    ConnectionColor, Diagram, DiagramContent, DiagramError, Node, NodeId, NodeShape, Point,
    Viewport,
};
use lcf_render::paint::PathSource;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Offset applied to each successive paste.
pub const PASTE_OFFSET: f64 = 20.0;

// ─── Selection ───────────────────────────────────────────────────────────

/// What the user has selected: some nodes, or a single connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selection {
    #[default]
    None,
    Nodes(Vec<NodeId>),
    Connection(NodeId),
}

impl Selection {
    pub fn node(id: NodeId) -> Self {
        Selection::Nodes(vec![id])
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Selection::None => true,
            Selection::Nodes(ids) => ids.is_empty(),
            Selection::Connection(_) => false,
        }
    }

    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Selection::Nodes(ids) => ids,
            _ => &[],
        }
    }

    pub fn connection(&self) -> Option<NodeId> {
        match self {
            Selection::Connection(id) => Some(*id),
            _ => None,
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        match self {
            Selection::None => false,
            Selection::Nodes(ids) => ids.contains(&id),
            Selection::Connection(c) => *c == id,
        }
    }

    /// Every selected id, nodes or connection.
    pub fn ids(&self) -> Vec<NodeId> {
        match self {
            Selection::None => Vec::new(),
            Selection::Nodes(ids) => ids.clone(),
            Selection::Connection(id) => vec![*id],
        }
    }

    /// Add a node, or remove it if already selected. Drops a selected
    /// connection.
    pub fn toggle_node(&mut self, id: NodeId) {
        match self {
            Selection::Nodes(ids) => {
                if let Some(pos) = ids.iter().position(|n| *n == id) {
                    ids.remove(pos);
                } else {
                    ids.push(id);
                }
            }
            _ => *self = Selection::node(id),
        }
    }

    /// Forget a deleted item.
    fn forget(&mut self, id: NodeId) {
        match self {
            Selection::Nodes(ids) => ids.retain(|n| *n != id),
            Selection::Connection(c) if *c == id => *self = Selection::None,
            _ => {}
        }
        if self.is_empty() {
            *self = Selection::None;
        }
    }
}

// ─── Mutations ───────────────────────────────────────────────────────────

/// Presentation fields to overwrite on a node; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStyle {
    pub border_color: Option<String>,
    pub border_width: Option<f64>,
    pub background_color: Option<String>,
    pub has_border: Option<bool>,
    pub has_double_outline: Option<bool>,
}

impl NodeStyle {
    fn apply(&self, node: &mut Node) {
        if let Some(c) = &self.border_color {
            node.border_color = c.clone();
        }
        if let Some(w) = self.border_width
            && w.is_finite()
            && w >= 0.0
        {
            node.border_width = w;
        }
        if let Some(c) = &self.background_color {
            node.background_color = c.clone();
        }
        if self.has_border.is_some() {
            node.has_border = self.has_border;
        }
        if self.has_double_outline.is_some() {
            node.has_double_outline = self.has_double_outline;
        }
    }
}

/// A single edit to the diagram or view.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagramMutation {
    /// Insert a node; it is nudged off any node it would overlap.
    AddNode { node: Node },
    MoveNode { id: NodeId, dx: f64, dy: f64 },
    ResizeNode { id: NodeId, width: f64, height: f64 },
    SetShape { id: NodeId, shape: NodeShape },
    SetText { id: NodeId, text: String },
    SetNodeStyle { id: NodeId, style: NodeStyle },
    /// Remove a node and every connection touching it.
    RemoveNode { id: NodeId },
    AddConnection {
        source: NodeId,
        target: NodeId,
        color: ConnectionColor,
    },
    SetConnectionColor { id: NodeId, color: ConnectionColor },
    RemoveConnection { id: NodeId },
    /// Pan by a screen-space delta.
    PanView { dx: f64, dy: f64 },
    /// Zoom around a screen-space anchor.
    ZoomView { factor: f64, anchor: Point },
    /// Back to scale 1 with no pan.
    ResetView,
}

// ─── Engine ──────────────────────────────────────────────────────────────

/// Owns the diagram, the view and all editor-side state.
#[derive(Debug, Clone, Default)]
pub struct DiagramEngine {
    diagram: Diagram,
    viewport: Viewport,
    pub selection: Selection,
    /// Color given to newly created connections.
    pub active_color: ConnectionColor,

    /// Cached curve per connection id.
    paths: HashMap<NodeId, ConnectionPath>,
    /// Connections whose curves the last geometric edit recomputed.
    recomputed: SmallVec<[NodeId; 8]>,

    clipboard: Vec<Node>,
    /// Set on every successful mutation, cleared by `mark_saved`.
    dirty: bool,
}

impl DiagramEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load persisted content, replacing the current diagram.
    pub fn from_content(content: &DiagramContent) -> Result<Self, DiagramError> {
        let mut engine = Self::new();
        engine.load(content)?;
        Ok(engine)
    }

    /// Replace the current diagram with persisted content.
    /// On error the current diagram is left untouched.
    pub fn load(&mut self, content: &DiagramContent) -> Result<(), DiagramError> {
        let (diagram, viewport) = Diagram::from_content(content)?;
        self.diagram = diagram;
        self.viewport = viewport;
        self.selection = Selection::None;
        self.rebuild_paths();
        self.dirty = false;
        log::info!(
            "loaded diagram: {} nodes, {} connections",
            self.diagram.node_count(),
            self.diagram.connection_count()
        );
        Ok(())
    }

    pub fn load_json(&mut self, json: &str) -> Result<(), DiagramError> {
        let content = DiagramContent::from_json(json)?;
        self.load(&content)
    }

    pub fn to_content(&self) -> DiagramContent {
        self.diagram.to_content(&self.viewport)
    }

    pub fn to_json(&self) -> String {
        self.to_content().to_json()
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Split borrow handed to the active tool for one input event.
    pub fn tool_context(&mut self) -> ToolContext<'_> {
        ToolContext {
            diagram: &self.diagram,
            viewport: &self.viewport,
            selection: &mut self.selection,
            active_color: self.active_color,
            finished: false,
        }
    }

    /// Cached curve of a connection.
    pub fn path(&self, id: NodeId) -> Option<ConnectionPath> {
        self.paths.get(&id).copied()
    }

    /// Connections recomputed by the most recent geometric node edit.
    pub fn last_recomputed(&self) -> &[NodeId] {
        &self.recomputed
    }

    fn rebuild_paths(&mut self) {
        self.paths.clear();
        for conn in self.diagram.connections() {
            if let Some(path) = self.diagram.connection_path(conn.id) {
                self.paths.insert(conn.id, path);
            }
        }
    }

    /// Recompute the curve of every connection touching `node`.
    fn refresh_paths(&mut self, node: NodeId) {
        self.recomputed = self.diagram.connections_of(node);
        for id in &self.recomputed {
            if let Some((source, target)) = self.diagram.endpoints(*id) {
                self.paths.insert(*id, connection_points(source, target));
            }
        }
    }

    fn insert_node(&mut self, mut node: Node, place: bool) -> Result<NodeId, DiagramError> {
        if place {
            let start = Point::new(node.x, node.y);
            place_node(self.diagram.nodes(), &mut node, start);
        }
        self.diagram.add_node(node)
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Apply one mutation. On error nothing changes.
    pub fn apply(&mut self, mutation: DiagramMutation) -> Result<(), DiagramError> {
        log::debug!("apply {mutation:?}");
        match mutation {
            DiagramMutation::AddNode { node } => {
                self.insert_node(node, true)?;
            }
            DiagramMutation::MoveNode { id, dx, dy } => {
                self.diagram.move_node(id, dx, dy)?;
                self.refresh_paths(id);
            }
            DiagramMutation::ResizeNode { id, width, height } => {
                self.diagram.resize_node(id, width, height)?;
                self.refresh_paths(id);
            }
            DiagramMutation::SetShape { id, shape } => {
                self.diagram.set_shape(id, shape)?;
                self.refresh_paths(id);
            }
            DiagramMutation::SetText { id, text } => {
                self.diagram.set_text(id, text)?;
            }
            DiagramMutation::SetNodeStyle { id, style } => {
                let node = self
                    .diagram
                    .node_mut(id)
                    .ok_or(DiagramError::UnknownNode(id))?;
                style.apply(node);
            }
            DiagramMutation::RemoveNode { id } => {
                let (_, dropped) = self.diagram.remove_node(id)?;
                self.selection.forget(id);
                for conn in dropped {
                    self.paths.remove(&conn.id);
                    self.selection.forget(conn.id);
                }
            }
            DiagramMutation::AddConnection {
                source,
                target,
                color,
            } => {
                let id = self.diagram.connect(source, target, color)?;
                if let Some(path) = self.diagram.connection_path(id) {
                    self.paths.insert(id, path);
                }
            }
            DiagramMutation::SetConnectionColor { id, color } => {
                self.diagram.set_connection_color(id, color)?;
            }
            DiagramMutation::RemoveConnection { id } => {
                self.diagram.remove_connection(id)?;
                self.paths.remove(&id);
                self.selection.forget(id);
            }
            DiagramMutation::PanView { dx, dy } => {
                self.viewport.pan(dx, dy);
            }
            DiagramMutation::ZoomView { factor, anchor } => {
                self.viewport.zoom_at(factor, anchor);
            }
            DiagramMutation::ResetView => self.viewport.reset(),
        }
        self.dirty = true;
        Ok(())
    }

    /// Apply a batch of mutations from one input event. Failures are
    /// logged and skipped. Returns true if anything changed.
    pub fn apply_all(&mut self, mutations: Vec<DiagramMutation>) -> bool {
        let mut changed = false;
        for m in mutations {
            match self.apply(m) {
                Ok(()) => changed = true,
                Err(e) => log::warn!("mutation rejected: {e}"),
            }
        }
        changed
    }

    /// Delete whatever is selected. Returns true if anything was removed.
    pub fn delete_selection(&mut self) -> bool {
        let mutations = match &self.selection {
            Selection::None => return false,
            Selection::Nodes(ids) => ids
                .iter()
                .map(|id| DiagramMutation::RemoveNode { id: *id })
                .collect(),
            Selection::Connection(id) => vec![DiagramMutation::RemoveConnection { id: *id }],
        };
        let changed = self.apply_all(mutations);
        self.selection = Selection::None;
        changed
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Copy the selected nodes. Connections are not copied.
    pub fn copy(&mut self) -> usize {
        let nodes: Vec<Node> = self
            .selection
            .nodes()
            .iter()
            .filter_map(|id| self.diagram.node(*id).cloned())
            .collect();
        if nodes.is_empty() {
            return 0;
        }
        self.clipboard = nodes;
        self.clipboard.len()
    }

    pub fn cut(&mut self) -> usize {
        let n = self.copy();
        if n > 0 {
            self.delete_selection();
        }
        n
    }

    /// Paste the clipboard with fresh ids, offset from the last paste,
    /// and select the pasted nodes.
    pub fn paste(&mut self) -> usize {
        if self.clipboard.is_empty() {
            return 0;
        }
        let mut pasted = Vec::with_capacity(self.clipboard.len());
        for entry in &mut self.clipboard {
            entry.translate(PASTE_OFFSET, PASTE_OFFSET);
        }
        let copies: Vec<Node> = self
            .clipboard
            .iter()
            .map(|n| Node {
                id: NodeId::node(),
                ..n.clone()
            })
            .collect();
        for node in copies {
            match self.insert_node(node, false) {
                Ok(id) => pasted.push(id),
                Err(e) => log::warn!("paste failed: {e}"),
            }
        }
        if !pasted.is_empty() {
            self.dirty = true;
        }
        let count = pasted.len();
        self.selection = Selection::Nodes(pasted);
        count
    }

    pub fn has_clipboard(&self) -> bool {
        !self.clipboard.is_empty()
    }
}

impl PathSource for DiagramEngine {
    fn connection_path(&self, id: NodeId) -> Option<ConnectionPath> {
        self.path(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine_with_two() -> (DiagramEngine, NodeId, NodeId) {
        let mut engine = DiagramEngine::new();
        let a = Node::new(NodeId::node(), NodeShape::Rectangle, 0.0, 0.0, 100.0, 50.0);
        let b = Node::new(NodeId::node(), NodeShape::Circle, 300.0, 0.0, 60.0, 60.0);
        let (ia, ib) = (a.id, b.id);
        engine.apply(DiagramMutation::AddNode { node: a }).unwrap();
        engine.apply(DiagramMutation::AddNode { node: b }).unwrap();
        (engine, ia, ib)
    }

    #[test]
    fn selection_toggle_and_forget() {
        let a = NodeId::node();
        let b = NodeId::node();
        let mut s = Selection::None;
        s.toggle_node(a);
        s.toggle_node(b);
        assert_eq!(s.nodes(), &[a, b]);
        s.toggle_node(a);
        assert_eq!(s.nodes(), &[b]);
        s.forget(b);
        assert_eq!(s, Selection::None);
    }

    #[test]
    fn style_patch_keeps_unset_fields() {
        let mut n = Node::new(NodeId::node(), NodeShape::Cloud, 0.0, 0.0, 160.0, 80.0);
        NodeStyle {
            background_color: Some("#222222".into()),
            border_width: Some(f64::NAN),
            has_double_outline: Some(true),
            ..NodeStyle::default()
        }
        .apply(&mut n);
        assert_eq!(n.background_color, "#222222");
        assert_eq!(n.border_width, 2.0);
        assert_eq!(n.border_color, "#4CAF50");
        assert_eq!(n.has_double_outline, Some(true));
    }

    #[test]
    fn connection_path_cached_on_add() {
        let (mut engine, a, b) = engine_with_two();
        engine
            .apply(DiagramMutation::AddConnection {
                source: a,
                target: b,
                color: ConnectionColor::Yellow,
            })
            .unwrap();
        let conn = engine.diagram().connections().next().map(|c| c.id).unwrap();
        assert_eq!(engine.path(conn), engine.diagram().connection_path(conn));
        assert!(engine.is_dirty());
    }

    #[test]
    fn failed_mutation_is_reported() {
        let (mut engine, a, _) = engine_with_two();
        assert_eq!(
            engine.apply(DiagramMutation::AddConnection {
                source: a,
                target: a,
                color: ConnectionColor::Green,
            }),
            Err(DiagramError::SelfLoop(a))
        );
        assert!(!engine.apply_all(vec![DiagramMutation::MoveNode {
            id: NodeId::intern("engine_missing"),
            dx: 1.0,
            dy: 1.0,
        }]));
    }
}
