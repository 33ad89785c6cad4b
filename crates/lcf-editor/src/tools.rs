//! Tool system for canvas interactions.
//!
//! Each tool translates pointer events into `DiagramMutation`s that the
//! editor applies through the `DiagramEngine`. Tools see pointer
//! positions in model coordinates, except the pan tool which works in
//! screen pixels.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Select Tool | Shape Tools | Connect Tool |
//! |----------|-------------|-------------|--------------|
//! | **Shift** | Toggle node in selection / extend marquee | none | none |

use crate::engine::{DiagramMutation, Selection};
use crate::input::InputEvent;
use lcf_core::geometry::{ConnectionPath, connection_points, connection_to_point};
use lcf_core::model::{Bounds, ConnectionColor, Node, NodeShape, Point};
use lcf_core::{Diagram, NodeId, Viewport};
use lcf_render::hit::{CONNECTION_TOLERANCE, HitTarget, hit_test, hit_test_item, hit_test_rect};

/// A marquee smaller than this (screen pixels) counts as a plain click.
const MIN_MARQUEE: f64 = 2.0;

/// The active tool determines how pointer events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Rectangle,
    Circle,
    Cloud,
    Connect,
    Pan,
}

impl ToolKind {
    /// Parse the name used by the browser toolbar.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "select" => Some(ToolKind::Select),
            "rectangle" => Some(ToolKind::Rectangle),
            "circle" => Some(ToolKind::Circle),
            "cloud" => Some(ToolKind::Cloud),
            "connect" => Some(ToolKind::Connect),
            "pan" => Some(ToolKind::Pan),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Circle => "circle",
            ToolKind::Cloud => "cloud",
            ToolKind::Connect => "connect",
            ToolKind::Pan => "pan",
        }
    }

    /// Shape placed by this tool, if it is a shape tool.
    pub fn shape(self) -> Option<NodeShape> {
        match self {
            ToolKind::Rectangle => Some(NodeShape::Rectangle),
            ToolKind::Circle => Some(NodeShape::Circle),
            ToolKind::Cloud => Some(NodeShape::Cloud),
            _ => None,
        }
    }
}

/// What a tool can see and touch while handling one event.
pub struct ToolContext<'a> {
    pub diagram: &'a Diagram,
    pub viewport: &'a Viewport,
    pub selection: &'a mut Selection,
    pub active_color: ConnectionColor,
    /// Set by one-shot tools to hand control back to the select tool.
    pub finished: bool,
}

impl ToolContext<'_> {
    /// Pointer position in model coordinates.
    pub fn model_point(&self, event: &InputEvent) -> Option<Point> {
        event
            .position()
            .map(|(x, y)| self.viewport.screen_to_model(Point::new(x, y)))
    }

    /// Pick tolerance in model units, constant on screen.
    fn tolerance(&self) -> f64 {
        CONNECTION_TOLERANCE / self.viewport.scale
    }
}

/// Trait for tools that handle input and produce mutations.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle a pointer event, returning zero or more mutations.
    fn handle(&mut self, event: &InputEvent, cx: &mut ToolContext<'_>) -> Vec<DiagramMutation>;

    /// In-progress connection to draw, if any.
    fn preview(&self) -> Option<(ConnectionPath, ConnectionColor)> {
        None
    }

    /// Rubber-band rectangle to draw, if any (model coordinates).
    fn marquee(&self) -> Option<Bounds> {
        None
    }

    /// Drop any in-progress gesture.
    fn reset(&mut self) {}
}

// ─── Select Tool ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SelectTool {
    /// Dragging the selected nodes.
    dragging: bool,
    last: Point,
    /// Set when pointer-down hits empty space.
    marquee_start: Option<Point>,
    marquee_rect: Option<Bounds>,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn handle(&mut self, event: &InputEvent, cx: &mut ToolContext<'_>) -> Vec<DiagramMutation> {
        let Some(at) = cx.model_point(event) else {
            return vec![];
        };
        match event {
            InputEvent::PointerDown { modifiers, .. } => {
                self.marquee_start = None;
                self.marquee_rect = None;

                match hit_test_item(cx.diagram, at, cx.tolerance()) {
                    Some(HitTarget::Node(id)) => {
                        if modifiers.shift {
                            cx.selection.toggle_node(id);
                        } else if !cx.selection.contains(id) {
                            *cx.selection = Selection::node(id);
                        }
                        // Clicking an already-selected node keeps the group for dragging.
                        self.dragging = true;
                        self.last = at;
                    }
                    Some(HitTarget::Connection(id)) => {
                        *cx.selection = Selection::Connection(id);
                        self.dragging = false;
                    }
                    None => {
                        if !modifiers.shift {
                            *cx.selection = Selection::None;
                        }
                        self.dragging = false;
                        self.marquee_start = Some(at);
                        self.marquee_rect = Some(Bounds::new(at.x, at.y, 0.0, 0.0));
                    }
                }
                vec![]
            }
            InputEvent::PointerMove { .. } => {
                if let Some(start) = self.marquee_start {
                    self.marquee_rect = Some(Bounds::from_corners(start, at));
                    return vec![];
                }
                if self.dragging {
                    let (dx, dy) = (at.x - self.last.x, at.y - self.last.y);
                    self.last = at;
                    return cx
                        .selection
                        .nodes()
                        .iter()
                        .map(|id| DiagramMutation::MoveNode { id: *id, dx, dy })
                        .collect();
                }
                vec![]
            }
            InputEvent::PointerUp { modifiers, .. } => {
                if let Some(rect) = self.marquee_rect.take() {
                    let min = MIN_MARQUEE / cx.viewport.scale;
                    if rect.width >= min || rect.height >= min {
                        let hits = hit_test_rect(cx.diagram, rect);
                        if modifiers.shift {
                            for id in hits {
                                if !cx.selection.contains(id) {
                                    cx.selection.toggle_node(id);
                                }
                            }
                        } else if !hits.is_empty() {
                            *cx.selection = Selection::Nodes(hits);
                        }
                    }
                }
                self.marquee_start = None;
                self.dragging = false;
                vec![]
            }
            _ => vec![],
        }
    }

    fn marquee(&self) -> Option<Bounds> {
        self.marquee_rect
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

// ─── Shape Tool ──────────────────────────────────────────────────────────

/// Click on empty canvas to place a default-sized node centered on the
/// pointer. One-shot: hands back to the select tool afterwards.
#[derive(Debug)]
pub struct ShapeTool {
    pub shape: NodeShape,
}

impl ShapeTool {
    pub fn new(shape: NodeShape) -> Self {
        Self { shape }
    }
}

impl Tool for ShapeTool {
    fn kind(&self) -> ToolKind {
        match self.shape {
            NodeShape::Rectangle => ToolKind::Rectangle,
            NodeShape::Circle => ToolKind::Circle,
            NodeShape::Cloud => ToolKind::Cloud,
        }
    }

    fn handle(&mut self, event: &InputEvent, cx: &mut ToolContext<'_>) -> Vec<DiagramMutation> {
        let InputEvent::PointerDown { .. } = event else {
            return vec![];
        };
        let Some(at) = cx.model_point(event) else {
            return vec![];
        };

        if let Some(id) = hit_test(cx.diagram, at) {
            *cx.selection = Selection::node(id);
            return vec![];
        }

        let node = Node::centered_at(self.shape, at);
        *cx.selection = Selection::node(node.id);
        cx.finished = true;
        vec![DiagramMutation::AddNode { node }]
    }
}

// ─── Connect Tool ────────────────────────────────────────────────────────

/// Press on a node, drag, release on another node.
#[derive(Debug, Default)]
pub struct ConnectTool {
    source: Option<NodeId>,
    preview: Option<(ConnectionPath, ConnectionColor)>,
}

impl ConnectTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node the current drag started from.
    pub fn source(&self) -> Option<NodeId> {
        self.source
    }
}

impl Tool for ConnectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Connect
    }

    fn handle(&mut self, event: &InputEvent, cx: &mut ToolContext<'_>) -> Vec<DiagramMutation> {
        let Some(at) = cx.model_point(event) else {
            return vec![];
        };
        match event {
            InputEvent::PointerDown { .. } => {
                self.source = hit_test(cx.diagram, at);
                self.preview = self
                    .source
                    .and_then(|id| cx.diagram.node(id))
                    .map(|n| (ConnectionPath::collapsed(n.center()), cx.active_color));
                vec![]
            }
            InputEvent::PointerMove { .. } => {
                let Some(source) = self.source.and_then(|id| cx.diagram.node(id)) else {
                    return vec![];
                };
                // Snap to a hovered target node.
                let path = match hit_test(cx.diagram, at).and_then(|id| cx.diagram.node(id)) {
                    Some(target) if target.id != source.id => connection_points(source, target),
                    _ => connection_to_point(source, at),
                };
                self.preview = Some((path, cx.active_color));
                vec![]
            }
            InputEvent::PointerUp { .. } => {
                let source = self.source.take();
                self.preview = None;
                match (source, hit_test(cx.diagram, at)) {
                    (Some(source), Some(target)) if source != target => {
                        vec![DiagramMutation::AddConnection {
                            source,
                            target,
                            color: cx.active_color,
                        }]
                    }
                    _ => {
                        log::debug!("connect gesture cancelled");
                        vec![]
                    }
                }
            }
            _ => vec![],
        }
    }

    fn preview(&self) -> Option<(ConnectionPath, ConnectionColor)> {
        self.preview
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

// ─── Pan Tool ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct PanTool {
    /// Last pointer position in screen pixels while dragging.
    last: Option<(f64, f64)>,
}

impl PanTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for PanTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pan
    }

    fn handle(&mut self, event: &InputEvent, _cx: &mut ToolContext<'_>) -> Vec<DiagramMutation> {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                self.last = Some((*x, *y));
                vec![]
            }
            InputEvent::PointerMove { x, y, .. } => match self.last {
                Some((lx, ly)) => {
                    self.last = Some((*x, *y));
                    vec![DiagramMutation::PanView {
                        dx: x - lx,
                        dy: y - ly,
                    }]
                }
                None => vec![],
            },
            InputEvent::PointerUp { .. } => {
                self.last = None;
                vec![]
            }
            _ => vec![],
        }
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use pretty_assertions::assert_eq;

    const NONE: Modifiers = Modifiers::NONE;

    fn diagram() -> (Diagram, NodeId, NodeId) {
        let mut d = Diagram::new();
        let a = d
            .add_node(Node::new(NodeId::node(), NodeShape::Rectangle, 0.0, 0.0, 100.0, 50.0))
            .unwrap();
        let b = d
            .add_node(Node::new(NodeId::node(), NodeShape::Circle, 300.0, 0.0, 60.0, 60.0))
            .unwrap();
        (d, a, b)
    }

    fn run(
        tool: &mut dyn Tool,
        d: &Diagram,
        vp: &Viewport,
        sel: &mut Selection,
        event: InputEvent,
    ) -> (Vec<DiagramMutation>, bool) {
        let mut cx = ToolContext {
            diagram: d,
            viewport: vp,
            selection: sel,
            active_color: ConnectionColor::Purple,
            finished: false,
        };
        let out = tool.handle(&event, &mut cx);
        (out, cx.finished)
    }

    #[test]
    fn tool_names_roundtrip() {
        for kind in [
            ToolKind::Select,
            ToolKind::Rectangle,
            ToolKind::Circle,
            ToolKind::Cloud,
            ToolKind::Connect,
            ToolKind::Pan,
        ] {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("pen"), None);
    }

    #[test]
    fn select_click_and_drag() {
        let (d, a, _) = diagram();
        let vp = Viewport::default();
        let mut sel = Selection::None;
        let mut tool = SelectTool::new();

        run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_down(10.0, 10.0, NONE));
        assert_eq!(sel, Selection::node(a));

        let event = InputEvent::pointer_move(15.0, 12.0, NONE);
        let (out, _) = run(&mut tool, &d, &vp, &mut sel, event);
        assert_eq!(out, vec![DiagramMutation::MoveNode { id: a, dx: 5.0, dy: 2.0 }]);

        run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_up(15.0, 12.0, NONE));
        let event = InputEvent::pointer_move(20.0, 20.0, NONE);
        let (out, _) = run(&mut tool, &d, &vp, &mut sel, event);
        assert!(out.is_empty());
    }

    #[test]
    fn select_drag_respects_zoom() {
        let (d, a, _) = diagram();
        let vp = Viewport {
            scale: 2.0,
            x: 0.0,
            y: 0.0,
        };
        let mut sel = Selection::None;
        let mut tool = SelectTool::new();
        run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_down(20.0, 20.0, NONE));
        let event = InputEvent::pointer_move(40.0, 20.0, NONE);
        let (out, _) = run(&mut tool, &d, &vp, &mut sel, event);
        assert_eq!(out, vec![DiagramMutation::MoveNode { id: a, dx: 10.0, dy: 0.0 }]);
    }

    #[test]
    fn marquee_selects_nodes() {
        let (d, a, b) = diagram();
        let vp = Viewport::default();
        let mut sel = Selection::None;
        let mut tool = SelectTool::new();

        run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_down(-20.0, -20.0, NONE));
        run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_move(400.0, 100.0, NONE));
        assert_eq!(tool.marquee(), Some(Bounds::new(-20.0, -20.0, 420.0, 120.0)));
        run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_up(400.0, 100.0, NONE));
        assert_eq!(sel, Selection::Nodes(vec![a, b]));
        assert_eq!(tool.marquee(), None);
    }

    #[test]
    fn click_on_empty_clears_selection() {
        let (d, a, _) = diagram();
        let vp = Viewport::default();
        let mut sel = Selection::node(a);
        let mut tool = SelectTool::new();
        run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_down(700.0, 700.0, NONE));
        run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_up(700.0, 700.0, NONE));
        assert_eq!(sel, Selection::None);
    }

    #[test]
    fn shape_tool_places_centered_node() {
        let (d, _, _) = diagram();
        let vp = Viewport::default();
        let mut sel = Selection::None;
        let mut tool = ShapeTool::new(NodeShape::Cloud);
        let event = InputEvent::pointer_down(500.0, 400.0, NONE);
        let (out, finished) = run(&mut tool, &d, &vp, &mut sel, event);
        assert!(finished);
        let [DiagramMutation::AddNode { node }] = out.as_slice() else {
            panic!("expected one AddNode, got {out:?}");
        };
        assert_eq!(node.shape, NodeShape::Cloud);
        assert_eq!(node.center(), Point::new(500.0, 400.0));
        assert_eq!(sel, Selection::node(node.id));
    }

    #[test]
    fn connect_tool_creates_connection_with_active_color() {
        let (d, a, b) = diagram();
        let vp = Viewport::default();
        let mut sel = Selection::None;
        let mut tool = ConnectTool::new();

        run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_down(50.0, 25.0, NONE));
        assert_eq!(tool.source(), Some(a));

        run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_move(200.0, 25.0, NONE));
        let (path, color) = tool.preview().unwrap();
        assert_eq!(color, ConnectionColor::Purple);
        assert_eq!(path.start, Point::new(100.0, 25.0));
        assert_eq!(path.end, Point::new(200.0, 25.0));

        let (out, _) = run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_up(330.0, 30.0, NONE));
        assert_eq!(
            out,
            vec![DiagramMutation::AddConnection {
                source: a,
                target: b,
                color: ConnectionColor::Purple,
            }]
        );
        assert!(tool.preview().is_none());
    }

    #[test]
    fn connect_released_on_source_is_cancelled() {
        let (d, _, _) = diagram();
        let vp = Viewport::default();
        let mut sel = Selection::None;
        let mut tool = ConnectTool::new();
        run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_down(50.0, 25.0, NONE));
        let (out, _) = run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_up(60.0, 25.0, NONE));
        assert!(out.is_empty());
        assert_eq!(tool.source(), None);
    }

    #[test]
    fn pan_tool_emits_screen_deltas() {
        let (d, _, _) = diagram();
        let vp = Viewport {
            scale: 3.0,
            x: 0.0,
            y: 0.0,
        };
        let mut sel = Selection::None;
        let mut tool = PanTool::new();
        run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_down(10.0, 10.0, NONE));
        let (out, _) = run(&mut tool, &d, &vp, &mut sel, InputEvent::pointer_move(25.0, 5.0, NONE));
        assert_eq!(out, vec![DiagramMutation::PanView { dx: 15.0, dy: -5.0 }]);
    }
}
