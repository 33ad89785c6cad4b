//! Connection geometry engine.
//!
//! Pure functions that turn two nodes into a directed curve between their
//! visual boundaries:
//!
//! 1. [`edge_intersection`]: where a ray from a node's center crosses its
//!    silhouette (rectangle edge, circle radius, cloud ellipse).
//! 2. [`connection_points`]: source/target boundary points joined by a
//!    cubic bezier whose control points sit at 1/3 and 2/3 of the chord.
//! 3. [`arrow_head`]: the filled triangle at the terminal end.
//!
//! Nothing here allocates or keeps state; equal inputs give bit-identical
//! outputs. Degenerate inputs fall back to finite values instead of NaN.

use crate::model::{MIN_NODE_EXTENT, Node, NodeShape, Point};
use std::f64::consts::PI;

/// Cloud boundary ellipse, as a fraction of the half extents
/// (0.4 of the full width/height).
pub const CLOUD_BOUNDARY_FACTOR: f64 = 0.8;

/// Default arrowhead length.
pub const ARROW_SIZE: f64 = 10.0;

/// Default half-angle between the arrowhead wings and the shaft, radians.
pub const ARROW_SPREAD: f64 = 0.5;

/// Below this, a sin/cos component is treated as zero (axis-aligned ray).
const AXIS_EPSILON: f64 = 1e-12;

/// Centers closer than this are considered coincident.
const COINCIDENT_EPSILON: f64 = 1e-9;

/// Sign that treats `0.0` as positive, so axis rays never collapse to the center.
fn sign(v: f64) -> f64 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

fn usable_half(v: f64) -> f64 {
    if v.is_finite() && v >= MIN_NODE_EXTENT / 2.0 {
        v
    } else {
        MIN_NODE_EXTENT / 2.0
    }
}

/// Point where a ray from `center` at `angle` crosses the boundary of a
/// shape with the given half extents.
pub fn edge_intersection(
    center: Point,
    angle: f64,
    shape: NodeShape,
    half_width: f64,
    half_height: f64,
) -> Point {
    let hw = usable_half(half_width);
    let hh = usable_half(half_height);
    let (sin, cos) = angle.sin_cos();

    match shape {
        NodeShape::Circle => {
            let r = hw.min(hh);
            Point::new(center.x + r * cos, center.y + r * sin)
        }
        NodeShape::Cloud => {
            let a = hw * CLOUD_BOUNDARY_FACTOR;
            let b = hh * CLOUD_BOUNDARY_FACTOR;
            // tan(t) = (a / b) * tan(angle), quadrant taken from the ray itself.
            let t = (a * sin).atan2(b * cos);
            Point::new(center.x + a * t.cos(), center.y + b * t.sin())
        }
        NodeShape::Rectangle => rect_intersection(center, sin, cos, hw, hh),
    }
}

fn rect_intersection(center: Point, sin: f64, cos: f64, hw: f64, hh: f64) -> Point {
    let raw = if sin.abs() < AXIS_EPSILON {
        Point::new(center.x + sign(cos) * hw, center.y)
    } else if cos.abs() < AXIS_EPSILON {
        Point::new(center.x, center.y + sign(sin) * hh)
    } else if sin.abs() * hw > cos.abs() * hh {
        // Steeper than the diagonal: top or bottom edge.
        let s = sign(sin);
        Point::new(center.x + (cos / sin) * s * hh, center.y + s * hh)
    } else {
        let s = sign(cos);
        Point::new(center.x + s * hw, center.y + (sin / cos) * s * hw)
    };

    Point::new(
        raw.x.clamp(center.x - hw, center.x + hw),
        raw.y.clamp(center.y - hh, center.y + hh),
    )
}

/// Boundary point of `node` along `angle` from its center.
pub fn boundary_point(node: &Node, angle: f64) -> Point {
    let (hw, hh) = node.half_extents();
    edge_intersection(node.center(), angle, node.shape, hw, hh)
}

/// Point-in-silhouette test used for pointer hit testing.
///
/// Circles use the true radius; rectangles and clouds use their bounding box.
pub fn node_contains(node: &Node, p: Point) -> bool {
    match node.shape {
        NodeShape::Circle => node.center().distance(p) <= node.radius(),
        NodeShape::Rectangle | NodeShape::Cloud => node.bounds().contains(p),
    }
}

// ─── Curves ──────────────────────────────────────────────────────────────

/// A cubic bezier connection curve: start, two controls, end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionPath {
    pub start: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub end: Point,
}

impl ConnectionPath {
    /// Cubic curve with controls at 1/3 and 2/3 of the chord.
    pub fn between(start: Point, end: Point) -> Self {
        Self {
            start,
            ctrl1: start.lerp(end, 1.0 / 3.0),
            ctrl2: start.lerp(end, 2.0 / 3.0),
            end,
        }
    }

    /// All four points at `p`.
    pub fn collapsed(p: Point) -> Self {
        Self {
            start: p,
            ctrl1: p,
            ctrl2: p,
            end: p,
        }
    }

    /// `[start.x, start.y, c1.x, c1.y, c2.x, c2.y, end.x, end.y]`
    pub fn to_flat(&self) -> [f64; 8] {
        [
            self.start.x,
            self.start.y,
            self.ctrl1.x,
            self.ctrl1.y,
            self.ctrl2.x,
            self.ctrl2.y,
            self.end.x,
            self.end.y,
        ]
    }

    pub fn is_collapsed(&self) -> bool {
        self.start.distance(self.end) < COINCIDENT_EPSILON
    }

    /// Direction of travel at the end point, radians.
    pub fn end_angle(&self) -> f64 {
        if self.ctrl2.distance(self.end) < COINCIDENT_EPSILON {
            self.start.angle_to(self.end)
        } else {
            self.ctrl2.angle_to(self.end)
        }
    }

    /// Arrowhead at the end point with default size and spread.
    pub fn arrow(&self) -> [Point; 3] {
        arrow_head(self.end, self.end_angle(), ARROW_SIZE, ARROW_SPREAD)
    }

    /// Evaluate the curve at `t ∈ [0, 1]`.
    pub fn eval(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point::new(
            a * self.start.x + b * self.ctrl1.x + c * self.ctrl2.x + d * self.end.x,
            a * self.start.y + b * self.ctrl1.y + c * self.ctrl2.y + d * self.end.y,
        )
    }
}

/// Curve from `source`'s boundary to `target`'s boundary.
///
/// When the centers coincide (including `source == target`) the curve
/// collapses to the shared center.
pub fn connection_points(source: &Node, target: &Node) -> ConnectionPath {
    let sc = source.center();
    let tc = target.center();
    if sc.distance(tc) < COINCIDENT_EPSILON {
        log::warn!(
            "connection {} -> {}: coincident centers, curve collapsed",
            source.id,
            target.id
        );
        return ConnectionPath::collapsed(sc);
    }

    let angle = sc.angle_to(tc);
    let start = boundary_point(source, angle);
    let end = boundary_point(target, angle + PI);
    ConnectionPath::between(start, end)
}

/// In-progress curve from `source`'s boundary to a free pointer position.
pub fn connection_to_point(source: &Node, point: Point) -> ConnectionPath {
    let sc = source.center();
    if sc.distance(point) < COINCIDENT_EPSILON || !point.is_finite() {
        return ConnectionPath::collapsed(sc);
    }
    let start = boundary_point(source, sc.angle_to(point));
    ConnectionPath::between(start, point)
}

/// Filled arrowhead triangle: `[tip, wing1, wing2]`.
pub fn arrow_head(tip: Point, incoming_angle: f64, size: f64, spread: f64) -> [Point; 3] {
    let wing = |a: f64| Point::new(tip.x - size * a.cos(), tip.y - size * a.sin());
    [tip, wing(incoming_angle - spread), wing(incoming_angle + spread)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    const EPS: f64 = 1e-9;

    fn node(shape: NodeShape, x: f64, y: f64, w: f64, h: f64) -> Node {
        Node::new(NodeId::node(), shape, x, y, w, h)
    }

    fn assert_close(a: Point, b: Point) {
        assert!(a.distance(b) < EPS, "expected {b:?}, got {a:?}");
    }

    #[test]
    fn circle_boundary_is_at_radius() {
        let c = Point::new(30.0, 30.0);
        for i in 0..64 {
            let angle = i as f64 * (2.0 * PI / 64.0) - PI;
            let p = edge_intersection(c, angle, NodeShape::Circle, 30.0, 30.0);
            assert!((p.distance(c) - 30.0).abs() < EPS);
        }
    }

    #[test]
    fn circle_with_unequal_extents_uses_min() {
        let p = edge_intersection(Point::ZERO, 0.0, NodeShape::Circle, 50.0, 20.0);
        assert_close(p, Point::new(20.0, 0.0));
    }

    #[test]
    fn rectangle_axis_rays() {
        let c = Point::new(50.0, 25.0);
        let hit = |a| edge_intersection(c, a, NodeShape::Rectangle, 50.0, 25.0);
        assert_close(hit(0.0), Point::new(100.0, 25.0));
        assert_close(hit(FRAC_PI_2), Point::new(50.0, 50.0));
        assert_close(hit(PI), Point::new(0.0, 25.0));
        assert_close(hit(-FRAC_PI_2), Point::new(50.0, 0.0));
        assert_close(hit(3.0 * FRAC_PI_2), Point::new(50.0, 0.0));
    }

    #[test]
    fn rectangle_boundary_lies_on_perimeter() {
        let c = Point::new(50.0, 25.0);
        for i in 0..360 {
            let angle = (i as f64).to_radians();
            let p = edge_intersection(c, angle, NodeShape::Rectangle, 50.0, 25.0);
            assert!(p.is_finite());
            let on_vertical = (p.x - 0.0).abs() < EPS || (p.x - 100.0).abs() < EPS;
            let on_horizontal = (p.y - 0.0).abs() < EPS || (p.y - 50.0).abs() < EPS;
            assert!(on_vertical || on_horizontal, "angle {i}: {p:?} off perimeter");
            assert!((-EPS..=100.0 + EPS).contains(&p.x));
            assert!((-EPS..=50.0 + EPS).contains(&p.y));
        }
    }

    #[test]
    fn rectangle_diagonal_hits_corner() {
        let p = edge_intersection(Point::ZERO, FRAC_PI_4, NodeShape::Rectangle, 10.0, 10.0);
        assert_close(p, Point::new(10.0, 10.0));
    }

    #[test]
    fn cloud_boundary_on_scaled_ellipse() {
        let c = Point::new(80.0, 40.0);
        let (a, b) = (80.0 * CLOUD_BOUNDARY_FACTOR, 40.0 * CLOUD_BOUNDARY_FACTOR);
        for i in 0..72 {
            let angle = (i as f64 * 5.0).to_radians();
            let p = edge_intersection(c, angle, NodeShape::Cloud, 80.0, 40.0);
            let dx = (p.x - c.x) / a;
            let dy = (p.y - c.y) / b;
            assert!((dx * dx + dy * dy - 1.0).abs() < 1e-9);
            // Same quadrant as the ray.
            assert!((p.x - c.x) * angle.cos() >= -EPS);
            assert!((p.y - c.y) * angle.sin() >= -EPS);
        }
        assert_close(
            edge_intersection(c, 0.0, NodeShape::Cloud, 80.0, 40.0),
            Point::new(80.0 + 64.0, 40.0),
        );
    }

    #[test]
    fn degenerate_extent_stays_finite() {
        for shape in NodeShape::ALL {
            let p = edge_intersection(Point::ZERO, 1.0, shape, 0.0, f64::NAN);
            assert!(p.is_finite(), "{shape}: {p:?}");
        }
    }

    #[test]
    fn horizontal_rectangles() {
        let a = node(NodeShape::Rectangle, 0.0, 0.0, 100.0, 50.0);
        let b = node(NodeShape::Rectangle, 300.0, 0.0, 100.0, 50.0);
        let path = connection_points(&a, &b);
        assert_close(path.start, Point::new(100.0, 25.0));
        assert_close(path.end, Point::new(300.0, 25.0));
        assert_close(path.ctrl1, Point::new(100.0 + 200.0 / 3.0, 25.0));
        assert_close(path.ctrl2, Point::new(100.0 + 400.0 / 3.0, 25.0));
    }

    #[test]
    fn horizontal_circles() {
        let a = node(NodeShape::Circle, 0.0, 0.0, 60.0, 60.0);
        let b = node(NodeShape::Circle, 160.0, 0.0, 60.0, 60.0);
        let path = connection_points(&a, &b);
        assert_close(path.start, Point::new(60.0, 30.0));
        assert_close(path.end, Point::new(160.0, 30.0));
    }

    #[test]
    fn flat_layout_matches_points() {
        let a = node(NodeShape::Rectangle, 0.0, 0.0, 100.0, 50.0);
        let b = node(NodeShape::Circle, 0.0, 200.0, 60.0, 60.0);
        let path = connection_points(&a, &b);
        let flat = path.to_flat();
        assert_eq!(flat[0], path.start.x);
        assert_eq!(flat[3], path.ctrl1.y);
        assert_eq!(flat[6], path.end.x);
        assert_eq!(flat[7], path.end.y);
    }

    #[test]
    fn coincident_centers_collapse() {
        let a = node(NodeShape::Rectangle, 0.0, 0.0, 100.0, 50.0);
        let path = connection_points(&a, &a);
        assert!(path.is_collapsed());
        assert_eq!(path, ConnectionPath::collapsed(a.center()));
        assert!(path.arrow().iter().all(|p| p.is_finite()));
    }

    #[test]
    fn free_point_preview() {
        let a = node(NodeShape::Rectangle, 0.0, 0.0, 100.0, 50.0);
        let path = connection_to_point(&a, Point::new(300.0, 25.0));
        assert_close(path.start, Point::new(100.0, 25.0));
        assert_eq!(path.end, Point::new(300.0, 25.0));
    }

    #[test]
    fn arrow_head_wings() {
        let [tip, w1, w2] = arrow_head(Point::new(100.0, 0.0), 0.0, 10.0, 0.5);
        assert_eq!(tip, Point::new(100.0, 0.0));
        assert_close(w1, Point::new(100.0 - 10.0 * 0.5f64.cos(), 10.0 * 0.5f64.sin()));
        assert_close(w2, Point::new(100.0 - 10.0 * 0.5f64.cos(), -10.0 * 0.5f64.sin()));
        assert!((tip.distance(w1) - 10.0).abs() < EPS);
    }

    #[test]
    fn curve_eval_endpoints() {
        let path = ConnectionPath::between(Point::new(0.0, 0.0), Point::new(90.0, 30.0));
        assert_close(path.eval(0.0), path.start);
        assert_close(path.eval(1.0), path.end);
        assert_close(path.eval(0.5), Point::new(45.0, 15.0));
    }

    #[test]
    fn node_contains_circle_and_box() {
        let c = node(NodeShape::Circle, 0.0, 0.0, 60.0, 60.0);
        assert!(node_contains(&c, Point::new(30.0, 30.0)));
        assert!(!node_contains(&c, Point::new(30.0 + 31.0, 30.0)));
        // Bounding-box corner is outside the circle.
        assert!(!node_contains(&c, Point::new(1.0, 1.0)));

        let cloud = node(NodeShape::Cloud, 0.0, 0.0, 160.0, 80.0);
        assert!(node_contains(&cloud, Point::new(1.0, 1.0)));
        assert!(node_contains(&cloud, Point::new(160.0, 80.0)));
        assert!(!node_contains(&cloud, Point::new(161.0, 80.0)));
    }
}
