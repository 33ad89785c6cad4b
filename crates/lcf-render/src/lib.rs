pub mod hit;
pub mod paint;
pub mod svg;

pub use hit::{HitTarget, hit_test, hit_test_connection, hit_test_item, hit_test_rect};
pub use paint::{CanvasTheme, DrawOp, Overlay, PathSource, build_draw_list};
pub use svg::render_svg;
