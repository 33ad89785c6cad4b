pub mod content;
pub mod diagram;
pub mod geometry;
pub mod id;
pub mod model;
pub mod placement;
pub mod viewport;

pub use content::{ContentError, DiagramContent, WireContent};
pub use diagram::{Diagram, DiagramError};
pub use geometry::{
    ConnectionPath, arrow_head, boundary_point, connection_points, connection_to_point,
    edge_intersection, node_contains,
};
pub use id::NodeId;
pub use model::*;
pub use placement::{find_available_position, nodes_overlap, place_node};
pub use viewport::Viewport;
