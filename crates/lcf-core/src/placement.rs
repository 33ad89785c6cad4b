//! Overlap detection and best-effort placement of new nodes.
//!
//! New nodes are nudged away from existing ones with a bounded spiral
//! search. This is a heuristic, not a packing algorithm: if nothing free
//! turns up within the search cap, the requested position is used as-is.

use crate::id::NodeId;
use crate::model::{Node, NodeShape, Point};
use std::f64::consts::PI;

/// Padding used when checking a candidate slot against existing nodes.
pub const PLACEMENT_PADDING: f64 = 20.0;

const SPIRAL_STEP: f64 = 30.0;
const SPIRAL_ANGLE_STEP: f64 = PI / 8.0;
const SPIRAL_MAX_RADIUS: f64 = 500.0;

/// Whether two nodes' padded silhouettes intersect.
///
/// Two circles compare padded radii (`width / 2 + padding`); every other
/// pairing compares padded bounding boxes, touching edges included.
pub fn nodes_overlap(a: &Node, b: &Node, padding: f64) -> bool {
    if a.shape == NodeShape::Circle && b.shape == NodeShape::Circle {
        let r1 = a.width / 2.0 + padding;
        let r2 = b.width / 2.0 + padding;
        return a.center().distance(b.center()) < r1 + r2;
    }

    let pa = a.bounds().padded(padding);
    let pb = b.bounds().padded(padding);
    !(pa.x + pa.width < pb.x
        || pa.x > pb.x + pb.width
        || pa.y + pa.height < pb.y
        || pa.y > pb.y + pb.height)
}

fn overlaps_any<'a>(candidate: &Node, nodes: impl IntoIterator<Item = &'a Node>) -> bool {
    nodes
        .into_iter()
        .any(|n| nodes_overlap(candidate, n, PLACEMENT_PADDING))
}

/// Find a top-left position near `start` where a default-sized node of
/// `shape` does not overlap any of `nodes`.
pub fn find_available_position<'a, I>(nodes: I, shape: NodeShape, start: Point) -> Point
where
    I: IntoIterator<Item = &'a Node> + Clone,
{
    let (w, h) = shape.default_size();
    // The candidate's id is never compared, every node in `nodes` counts.
    let mut candidate = Node::new(NodeId::intern(""), shape, start.x, start.y, w, h);
    spiral_search(&mut candidate, start, |c| overlaps_any(c, nodes.clone()))
}

/// Move `node` (keeping its size) to the first free spiral slot around
/// `start`. Returns the chosen top-left; `node` is left at that position.
///
/// `nodes` may contain `node` itself; it is skipped by id.
pub fn place_node<'a, I>(nodes: I, node: &mut Node, start: Point) -> Point
where
    I: IntoIterator<Item = &'a Node> + Clone,
{
    let id = node.id;
    spiral_search(node, start, |c| {
        overlaps_any(c, nodes.clone().into_iter().filter(|n| n.id != id))
    })
}

fn spiral_search(node: &mut Node, start: Point, blocked: impl Fn(&Node) -> bool) -> Point {
    node.x = start.x;
    node.y = start.y;
    if !blocked(&*node) {
        return start;
    }

    let mut radius = SPIRAL_STEP;
    let mut angle = 0.0f64;
    while radius < SPIRAL_MAX_RADIUS {
        angle += SPIRAL_ANGLE_STEP;
        radius += SPIRAL_STEP / (2.0 * PI);
        node.x = start.x + radius * angle.cos();
        node.y = start.y + radius * angle.sin();
        if !blocked(&*node) {
            log::debug!("placed {} at ({:.1}, {:.1})", node.id, node.x, node.y);
            return Point::new(node.x, node.y);
        }
    }

    log::debug!("no free slot near ({}, {}), keeping requested position", start.x, start.y);
    node.x = start.x;
    node.y = start.y;
    start
}
