//! Hit testing: point → node or connection lookup.
//!
//! Walks the diagram front-to-back (last painted = topmost). Nodes sit
//! above connections, so a node under the pointer always wins.

use kurbo::{CubicBez, Line, ParamCurveNearest, PathEl, Shape};
use lcf_core::geometry::{ConnectionPath, node_contains};
use lcf_core::model::{Bounds, Point};
use lcf_core::{Diagram, NodeId};

/// Default pick distance for connection curves, in model units.
pub const CONNECTION_TOLERANCE: f64 = 6.0;

/// Accuracy passed to kurbo's nearest-point solver.
const NEAREST_ACCURACY: f64 = 1e-3;

/// Flattening tolerance for curved connections.
const FLATTEN_TOLERANCE: f64 = 0.1;

/// Off-chord distance under which a control point counts as on the chord.
const CHORD_EPSILON: f64 = 1e-6;

/// What sits under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Node(NodeId),
    Connection(NodeId),
}

pub(crate) fn to_kurbo(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x, p.y)
}

pub(crate) fn to_cubic(path: &ConnectionPath) -> CubicBez {
    CubicBez::new(
        to_kurbo(path.start),
        to_kurbo(path.ctrl1),
        to_kurbo(path.ctrl2),
        to_kurbo(path.end),
    )
}

fn off_chord(line: Line, p: kurbo::Point) -> f64 {
    let d = line.p1 - line.p0;
    let len = d.hypot();
    if len < CHORD_EPSILON {
        return (p - line.p0).hypot();
    }
    (d.cross(p - line.p0) / len).abs()
}

/// Squared distance from `p` to a connection curve.
///
/// Curves whose controls lie on the chord are measured against the
/// straight segment; anything else against its flattened polyline.
pub fn distance_sq_to_path(path: &ConnectionPath, p: Point) -> f64 {
    let target = to_kurbo(p);
    let chord = Line::new(to_kurbo(path.start), to_kurbo(path.end));
    if off_chord(chord, to_kurbo(path.ctrl1)) < CHORD_EPSILON
        && off_chord(chord, to_kurbo(path.ctrl2)) < CHORD_EPSILON
    {
        return chord.nearest(target, NEAREST_ACCURACY).distance_sq;
    }

    let mut best = f64::INFINITY;
    let mut last = chord.p0;
    let curve = to_cubic(path).path_elements(FLATTEN_TOLERANCE);
    kurbo::flatten(curve, FLATTEN_TOLERANCE, |el| match el {
        PathEl::MoveTo(q) => last = q,
        PathEl::LineTo(q) => {
            best = best.min(Line::new(last, q).nearest(target, NEAREST_ACCURACY).distance_sq);
            last = q;
        }
        _ => {}
    });
    best
}

/// Find the topmost node at `p`.
/// Returns `None` if no node is hit (background).
pub fn hit_test(diagram: &Diagram, p: Point) -> Option<NodeId> {
    diagram
        .nodes()
        .rev()
        .find(|node| node_contains(node, p))
        .map(|node| node.id)
}

/// Find the most recently created connection whose curve passes within
/// `tolerance` of `p`.
pub fn hit_test_connection(diagram: &Diagram, p: Point, tolerance: f64) -> Option<NodeId> {
    let max_sq = tolerance * tolerance;
    let ids: Vec<NodeId> = diagram.connections().map(|c| c.id).collect();
    ids.into_iter().rev().find(|id| {
        diagram
            .connection_path(*id)
            .is_some_and(|path| !path.is_collapsed() && distance_sq_to_path(&path, p) <= max_sq)
    })
}

/// Node first, then connection.
pub fn hit_test_item(diagram: &Diagram, p: Point, tolerance: f64) -> Option<HitTarget> {
    hit_test(diagram, p)
        .map(HitTarget::Node)
        .or_else(|| hit_test_connection(diagram, p, tolerance).map(HitTarget::Connection))
}

/// All nodes whose bounds intersect `rect`, in paint order.
/// Used for marquee (box) selection.
pub fn hit_test_rect(diagram: &Diagram, rect: Bounds) -> Vec<NodeId> {
    diagram
        .nodes()
        .filter(|node| node.bounds().intersects(&rect))
        .map(|node| node.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcf_core::{ConnectionColor, Node, NodeShape};
    use pretty_assertions::assert_eq;

    fn sample() -> (Diagram, NodeId, NodeId, NodeId) {
        let mut d = Diagram::new();
        let a = d
            .add_node(Node::new(NodeId::node(), NodeShape::Rectangle, 0.0, 0.0, 100.0, 50.0))
            .unwrap();
        let b = d
            .add_node(Node::new(NodeId::node(), NodeShape::Circle, 300.0, 0.0, 60.0, 60.0))
            .unwrap();
        // Overlaps `a`, painted above it.
        let top = d
            .add_node(Node::new(NodeId::node(), NodeShape::Cloud, 50.0, 10.0, 80.0, 40.0))
            .unwrap();
        (d, a, b, top)
    }

    #[test]
    fn topmost_node_wins() {
        let (d, a, _, top) = sample();
        assert_eq!(hit_test(&d, Point::new(60.0, 20.0)), Some(top));
        assert_eq!(hit_test(&d, Point::new(10.0, 10.0)), Some(a));
        assert_eq!(hit_test(&d, Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn circle_corner_misses() {
        let (d, _, b, _) = sample();
        assert_eq!(hit_test(&d, Point::new(330.0, 30.0)), Some(b));
        assert_eq!(hit_test(&d, Point::new(302.0, 2.0)), None);
    }

    #[test]
    fn connection_pick_within_tolerance() {
        let (mut d, a, b, _) = sample();
        let c = d.connect(a, b, ConnectionColor::Red).unwrap();
        let path = d.connection_path(c).unwrap();
        let mid = path.eval(0.5);
        assert_eq!(
            hit_test_connection(&d, Point::new(mid.x, mid.y + 3.0), CONNECTION_TOLERANCE),
            Some(c)
        );
        assert_eq!(
            hit_test_connection(&d, Point::new(mid.x, mid.y + 30.0), CONNECTION_TOLERANCE),
            None
        );
        assert_eq!(
            hit_test_item(&d, mid, CONNECTION_TOLERANCE),
            Some(HitTarget::Connection(c))
        );
    }

    #[test]
    fn steep_connection_is_pickable() {
        let mut d = Diagram::new();
        let gym = d
            .add_node(Node::new(NodeId::node(), NodeShape::Circle, 300.0, 0.0, 60.0, 60.0))
            .unwrap();
        let sleep = d
            .add_node(Node::new(NodeId::node(), NodeShape::Cloud, 300.0, 200.0, 160.0, 80.0))
            .unwrap();
        let c = d.connect(gym, sleep, ConnectionColor::Purple).unwrap();
        let path = d.connection_path(c).unwrap();
        for t in [0.1, 0.5, 0.9] {
            let on = path.eval(t);
            assert!(distance_sq_to_path(&path, on) < 1e-9, "t={t}");
            assert_eq!(hit_test_connection(&d, on, CONNECTION_TOLERANCE), Some(c), "t={t}");
        }
        let mid = path.eval(0.5);
        assert_eq!(
            hit_test_connection(&d, Point::new(mid.x + 20.0, mid.y), CONNECTION_TOLERANCE),
            None
        );
    }

    #[test]
    fn bent_curve_measured_along_its_shape() {
        let path = ConnectionPath {
            start: Point::new(0.0, 0.0),
            ctrl1: Point::new(0.0, 100.0),
            ctrl2: Point::new(100.0, 100.0),
            end: Point::new(100.0, 0.0),
        };
        let apex = path.eval(0.5);
        assert!(distance_sq_to_path(&path, apex) < 0.1);
        // The chord midpoint is far from the bent curve.
        assert!(distance_sq_to_path(&path, Point::new(50.0, 0.0)) > 50.0 * 50.0);
    }

    #[test]
    fn marquee_collects_intersecting() {
        let (d, a, _, top) = sample();
        let marquee = Bounds::from_corners(Point::new(-10.0, -10.0), Point::new(60.0, 60.0));
        let hits = hit_test_rect(&d, marquee);
        assert_eq!(hits, vec![a, top]);
        assert!(hit_test_rect(&d, Bounds::new(1000.0, 1000.0, 5.0, 5.0)).is_empty());
    }
}
