//! Diagram → backend-neutral drawing commands.
//!
//! Builds a flat list of [`DrawOp`]s from `kurbo` paths. The browser
//! renderer replays it onto a Canvas2D context; SVG export reuses the same
//! outline and curve builders so both backends agree on geometry.

use crate::hit::{to_cubic, to_kurbo};
use kurbo::{BezPath, Circle, Ellipse, Rect, RoundedRect, Shape};
use lcf_core::geometry::ConnectionPath;
use lcf_core::model::{Bounds, ConnectionColor, Node, NodeShape};
use lcf_core::{Diagram, NodeId};
use std::f64::consts::TAU;

/// Flattening tolerance when converting kurbo shapes to paths.
const PATH_TOLERANCE: f64 = 0.1;

/// Corner radius of rectangle nodes.
pub const RECT_CORNER_RADIUS: f64 = 4.0;

/// Gap between a node and its second outline / selection ring.
const DOUBLE_OUTLINE_GAP: f64 = 4.0;
const SELECTION_GAP: f64 = 3.0;

const CLOUD_LOBES: usize = 8;
/// Lobe valleys sit on the connection boundary ellipse (0.4 of the extent).
const CLOUD_VALLEY: f64 = 0.4;
const CLOUD_BULGE: f64 = 1.25;

const CONNECTION_WIDTH: f64 = 2.0;
const SELECTED_CONNECTION_WIDTH: f64 = 3.0;

/// Theme-dependent colors for both renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasTheme {
    pub bg: &'static str,
    pub grid: &'static str,
    pub node_fill: &'static str,
    pub text: &'static str,
    pub selection: &'static str,
    pub marquee_fill: &'static str,
    pub font_family: &'static str,
    pub font_size: f64,
}

impl CanvasTheme {
    /// Dark theme, the editor default.
    pub fn dark() -> Self {
        Self {
            bg: "#121212",
            grid: "rgba(255, 255, 255, 0.04)",
            node_fill: "#1A1A1A",
            text: "#FAFAFA",
            selection: "#4FC3F7",
            marquee_fill: "rgba(79, 195, 247, 0.08)",
            font_family: "Poppins, sans-serif",
            font_size: 14.0,
        }
    }

    /// Light theme for printing and export.
    pub fn light() -> Self {
        Self {
            bg: "#F5F5F7",
            grid: "rgba(0, 0, 0, 0.05)",
            node_fill: "#FFFFFF",
            text: "#1D1D1F",
            selection: "#0A84FF",
            marquee_fill: "rgba(10, 132, 255, 0.08)",
            font_family: "Poppins, sans-serif",
            font_size: 14.0,
        }
    }
}

impl Default for CanvasTheme {
    fn default() -> Self {
        Self::dark()
    }
}

/// One drawing command, in model coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Fill {
        path: BezPath,
        color: String,
    },
    Stroke {
        path: BezPath,
        color: String,
        width: f64,
        dashed: bool,
    },
    Text {
        at: kurbo::Point,
        text: String,
        color: String,
        size: f64,
    },
}

/// Where the draw list gets connection curves from.
///
/// A bare [`Diagram`] derives them on demand; the editor serves its
/// live cache instead.
pub trait PathSource {
    fn connection_path(&self, id: NodeId) -> Option<ConnectionPath>;
}

impl PathSource for Diagram {
    fn connection_path(&self, id: NodeId) -> Option<ConnectionPath> {
        Diagram::connection_path(self, id)
    }
}

/// Editor state drawn on top of the diagram.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    pub selected: Vec<NodeId>,
    /// In-progress connection while the connect tool is dragging.
    pub preview: Option<(ConnectionPath, ConnectionColor)>,
    pub marquee: Option<Bounds>,
}

impl Overlay {
    fn is_selected(&self, id: NodeId) -> bool {
        self.selected.contains(&id)
    }
}

// ─── Outlines ────────────────────────────────────────────────────────────

fn to_rect(b: Bounds) -> Rect {
    Rect::new(b.x, b.y, b.x + b.width, b.y + b.height)
}

/// Bumpy cloud outline: cubic lobes around an ellipse.
pub fn cloud_path(b: Bounds) -> BezPath {
    let c = b.center();
    let (rx, ry) = (b.width * CLOUD_VALLEY, b.height * CLOUD_VALLEY);
    let step = TAU / CLOUD_LOBES as f64;
    let at = |angle: f64, k: f64| {
        kurbo::Point::new(c.x + rx * k * angle.cos(), c.y + ry * k * angle.sin())
    };

    let mut path = BezPath::new();
    path.move_to(at(0.0, 1.0));
    for i in 0..CLOUD_LOBES {
        let a0 = i as f64 * step;
        let a1 = a0 + step;
        path.curve_to(
            at(a0 + step * 0.15, CLOUD_BULGE),
            at(a1 - step * 0.15, CLOUD_BULGE),
            at(a1, 1.0),
        );
    }
    path.close_path();
    path
}

/// Silhouette of `node` grown outward by `gap`.
pub fn node_outline(node: &Node, gap: f64) -> BezPath {
    let b = node.bounds().padded(gap);
    match node.shape {
        NodeShape::Rectangle => RoundedRect::from_rect(to_rect(b), RECT_CORNER_RADIUS + gap)
            .to_path(PATH_TOLERANCE),
        NodeShape::Circle => {
            Circle::new(to_kurbo(node.center()), node.radius() + gap).to_path(PATH_TOLERANCE)
        }
        NodeShape::Cloud => cloud_path(b),
    }
}

/// Selection ring for a cloud, which is looser than its outline.
fn selection_outline(node: &Node) -> BezPath {
    match node.shape {
        NodeShape::Cloud => {
            let b = node.bounds();
            Ellipse::new(
                to_kurbo(b.center()),
                (b.width / 2.0 + SELECTION_GAP, b.height / 2.0 + SELECTION_GAP),
                0.0,
            )
            .to_path(PATH_TOLERANCE)
        }
        _ => node_outline(node, SELECTION_GAP),
    }
}

pub fn connection_bez(path: &ConnectionPath) -> BezPath {
    let mut bez = BezPath::new();
    let cubic = to_cubic(path);
    bez.move_to(cubic.p0);
    bez.curve_to(cubic.p1, cubic.p2, cubic.p3);
    bez
}

pub fn arrow_bez(path: &ConnectionPath) -> BezPath {
    let [tip, w1, w2] = path.arrow();
    let mut bez = BezPath::new();
    bez.move_to(to_kurbo(tip));
    bez.line_to(to_kurbo(w1));
    bez.line_to(to_kurbo(w2));
    bez.close_path();
    bez
}

/// Fill color for a node: `transparent` falls back to the theme fill.
pub fn node_fill<'a>(node: &'a Node, theme: &'a CanvasTheme) -> &'a str {
    if node.background_color.is_empty() || node.background_color == "transparent" {
        theme.node_fill
    } else {
        &node.background_color
    }
}

// ─── Draw list ───────────────────────────────────────────────────────────

fn push_connection(
    ops: &mut Vec<DrawOp>,
    path: &ConnectionPath,
    color: ConnectionColor,
    width: f64,
    dashed: bool,
) {
    if path.is_collapsed() {
        return;
    }
    ops.push(DrawOp::Stroke {
        path: connection_bez(path),
        color: color.hex().to_string(),
        width,
        dashed,
    });
    ops.push(DrawOp::Fill {
        path: arrow_bez(path),
        color: color.hex().to_string(),
    });
}

fn push_node(ops: &mut Vec<DrawOp>, node: &Node, theme: &CanvasTheme, selected: bool) {
    let outline = node_outline(node, 0.0);
    ops.push(DrawOp::Fill {
        path: outline.clone(),
        color: node_fill(node, theme).to_string(),
    });
    if node.has_border != Some(false) {
        ops.push(DrawOp::Stroke {
            path: outline,
            color: node.border_color.clone(),
            width: node.border_width,
            dashed: false,
        });
    }
    if node.has_double_outline == Some(true) {
        ops.push(DrawOp::Stroke {
            path: node_outline(node, DOUBLE_OUTLINE_GAP),
            color: node.border_color.clone(),
            width: 1.0,
            dashed: false,
        });
    }
    if selected {
        ops.push(DrawOp::Stroke {
            path: selection_outline(node),
            color: theme.selection.to_string(),
            width: 2.0,
            dashed: true,
        });
    }
    if !node.text.is_empty() {
        ops.push(DrawOp::Text {
            at: to_kurbo(node.center()),
            text: node.text.clone(),
            color: theme.text.to_string(),
            size: theme.font_size,
        });
    }
}

/// Build the draw list: connections below nodes, overlay on top.
pub fn build_draw_list(
    diagram: &Diagram,
    paths: &impl PathSource,
    theme: &CanvasTheme,
    overlay: &Overlay,
) -> Vec<DrawOp> {
    let mut ops = Vec::with_capacity(diagram.node_count() * 3 + diagram.connection_count() * 2);

    for conn in diagram.connections() {
        let Some(path) = paths.connection_path(conn.id) else {
            log::warn!("connection {} has a missing endpoint", conn.id);
            continue;
        };
        let width = if overlay.is_selected(conn.id) {
            SELECTED_CONNECTION_WIDTH
        } else {
            CONNECTION_WIDTH
        };
        push_connection(&mut ops, &path, conn.color, width, false);
    }

    for node in diagram.nodes() {
        push_node(&mut ops, node, theme, overlay.is_selected(node.id));
    }

    if let Some((path, color)) = &overlay.preview {
        push_connection(&mut ops, path, *color, CONNECTION_WIDTH, true);
    }

    if let Some(m) = overlay.marquee {
        let rect = to_rect(m).to_path(PATH_TOLERANCE);
        ops.push(DrawOp::Fill {
            path: rect.clone(),
            color: theme.marquee_fill.to_string(),
        });
        ops.push(DrawOp::Stroke {
            path: rect,
            color: theme.selection.to_string(),
            width: 1.0,
            dashed: true,
        });
    }

    ops
}
