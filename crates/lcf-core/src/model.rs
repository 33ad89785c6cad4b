//! Core data model for Life Canvas Flow diagrams.
//!
//! A diagram is a set of shaped, positioned [`Node`]s and directed, colored
//! [`Connection`]s between them. Connection curves are never stored here:
//! they are derived from the two endpoint nodes by the geometry engine.

use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Smallest width/height a node may have. Degenerate extents clamp to this.
pub const MIN_NODE_EXTENT: f64 = 1.0;

/// Clamp a width/height to a usable, finite, positive value.
pub fn clamp_extent(v: f64) -> f64 {
    if v.is_finite() && v >= MIN_NODE_EXTENT {
        v
    } else {
        MIN_NODE_EXTENT
    }
}

// ─── Points & Bounds ─────────────────────────────────────────────────────

/// A point (or vector) in diagram model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Angle of the vector from `self` to `other`, in radians.
    pub fn angle_to(self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Linear interpolation: `t = 0` → self, `t = 1` → other.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if this bounds intersects another (AABB overlap, open intervals).
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Grow every side by `pad`.
    pub fn padded(&self, pad: f64) -> Bounds {
        Bounds::new(
            self.x - pad,
            self.y - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }

    /// Smallest bounds covering both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        Bounds::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Build normalized bounds from two opposite corners.
    pub fn from_corners(a: Point, b: Point) -> Bounds {
        Bounds::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (b.x - a.x).abs(),
            (b.y - a.y).abs(),
        )
    }
}

// ─── Shapes ──────────────────────────────────────────────────────────────

/// The visual silhouette of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    #[default]
    Rectangle,
    Circle,
    Cloud,
}

impl NodeShape {
    pub const ALL: [NodeShape; 3] = [NodeShape::Rectangle, NodeShape::Circle, NodeShape::Cloud];

    /// Default `(width, height)` for a freshly placed node.
    pub fn default_size(self) -> (f64, f64) {
        match self {
            NodeShape::Rectangle => (120.0, 60.0),
            NodeShape::Circle => (60.0, 60.0),
            NodeShape::Cloud => (160.0, 80.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeShape::Rectangle => "rectangle",
            NodeShape::Circle => "circle",
            NodeShape::Cloud => "cloud",
        }
    }
}

impl fmt::Display for NodeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Connection palette ──────────────────────────────────────────────────

/// Closed palette of semantic connection colors.
///
/// Serialized as the hex value, matching the persisted diagram format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionColor {
    /// Standard relationship.
    #[default]
    #[serde(rename = "#4CAF50")]
    Green,
    /// Warning / conflict.
    #[serde(rename = "#F44336")]
    Red,
    /// Informational.
    #[serde(rename = "#2196F3")]
    Blue,
    /// Priority.
    #[serde(rename = "#FFC107")]
    Yellow,
    /// Personal.
    #[serde(rename = "#9C27B0")]
    Purple,
}

impl ConnectionColor {
    pub const ALL: [ConnectionColor; 5] = [
        ConnectionColor::Green,
        ConnectionColor::Red,
        ConnectionColor::Blue,
        ConnectionColor::Yellow,
        ConnectionColor::Purple,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            ConnectionColor::Green => "#4CAF50",
            ConnectionColor::Red => "#F44336",
            ConnectionColor::Blue => "#2196F3",
            ConnectionColor::Yellow => "#FFC107",
            ConnectionColor::Purple => "#9C27B0",
        }
    }

    /// Human-readable category shown in the color legend.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionColor::Green => "Standard",
            ConnectionColor::Red => "Warning",
            ConnectionColor::Blue => "Info",
            ConnectionColor::Yellow => "Priority",
            ConnectionColor::Purple => "Personal",
        }
    }

    /// Case-insensitive lookup by hex value (with or without `#`).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        Self::ALL
            .into_iter()
            .find(|c| c.hex()[1..].eq_ignore_ascii_case(hex))
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

fn default_border_color() -> String {
    "#4CAF50".to_string()
}

fn default_border_width() -> f64 {
    2.0
}

fn default_background_color() -> String {
    "transparent".to_string()
}

/// A shaped, positioned entity on the diagram.
///
/// `I` is the id representation; the editor always uses [`NodeId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node<I = NodeId> {
    pub id: I,
    #[serde(rename = "type")]
    pub shape: NodeShape,
    /// Top-left corner, model coordinates.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_border_color")]
    pub border_color: String,
    #[serde(default = "default_border_width")]
    pub border_width: f64,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_border: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_double_outline: Option<bool>,
}

impl Node {
    /// Create a node. Non-positive or non-finite extents are clamped.
    pub fn new(id: NodeId, shape: NodeShape, x: f64, y: f64, width: f64, height: f64) -> Self {
        if clamp_extent(width) != width || clamp_extent(height) != height {
            log::warn!("node {id}: degenerate extent {width}x{height} clamped");
        }
        Self {
            id,
            shape,
            x,
            y,
            width: clamp_extent(width),
            height: clamp_extent(height),
            text: String::new(),
            border_color: default_border_color(),
            border_width: default_border_width(),
            background_color: default_background_color(),
            has_border: None,
            has_double_outline: None,
        }
    }

    /// A default-sized node of `shape` centered on `center`, with a fresh id.
    pub fn centered_at(shape: NodeShape, center: Point) -> Self {
        let (w, h) = shape.default_size();
        Self::new(
            NodeId::node(),
            shape,
            center.x - w / 2.0,
            center.y - h / 2.0,
            w,
            h,
        )
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    pub fn half_extents(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    /// Circle radius convention: `min(width, height) / 2`.
    pub fn radius(&self) -> f64 {
        self.width.min(self.height) / 2.0
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Resize in place, clamping degenerate extents.
    pub fn resize(&mut self, width: f64, height: f64) {
        if clamp_extent(width) != width || clamp_extent(height) != height {
            log::warn!("node {}: degenerate resize {width}x{height} clamped", self.id);
        }
        self.width = clamp_extent(width);
        self.height = clamp_extent(height);
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

/// A directed, colored connection between two nodes.
///
/// Only identity and style are stored; the curve is derived on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection<I = NodeId> {
    pub id: I,
    #[serde(rename = "from", alias = "sourceId")]
    pub source: I,
    #[serde(rename = "to", alias = "targetId")]
    pub target: I,
    #[serde(default)]
    pub color: ConnectionColor,
}

impl Connection {
    /// New connection with a fresh id.
    pub fn new(source: NodeId, target: NodeId, color: ConnectionColor) -> Self {
        Self {
            id: NodeId::connection(),
            source,
            target,
            color,
        }
    }

    /// Whether `node` is either endpoint.
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}
