//! SVG export.
//!
//! Produces a standalone document sized to the diagram's content bounds
//! plus padding. Curves come from the same [`ConnectionPath`] the canvas
//! renderer uses, so the export matches what is on screen.

use crate::paint::{CanvasTheme, RECT_CORNER_RADIUS, cloud_path, node_fill};
use lcf_core::geometry::ConnectionPath;
use lcf_core::model::{Bounds, Node, NodeShape};
use lcf_core::Diagram;
use std::fmt::Write;

/// Space around the content bounds.
pub const SVG_PADDING: f64 = 16.0;

const EMPTY_WIDTH: f64 = 800.0;
const EMPTY_HEIGHT: f64 = 600.0;

/// Escape text for use in SVG element content and attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Short decimal form: integers print without a fraction.
fn num(v: f64) -> String {
    let r = (v * 100.0).round() / 100.0;
    if r == r.trunc() {
        format!("{}", r as i64)
    } else {
        format!("{r}")
    }
}

fn export_bounds(diagram: &Diagram) -> Bounds {
    diagram
        .bounds()
        .unwrap_or(Bounds::new(0.0, 0.0, EMPTY_WIDTH, EMPTY_HEIGHT))
        .padded(SVG_PADDING)
}

/// Render the whole diagram as an SVG document.
pub fn render_svg(diagram: &Diagram, theme: &CanvasTheme) -> String {
    let view = export_bounds(diagram);
    let mut svg = String::new();

    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"{x} {y} {w} {h}\">",
        x = num(view.x),
        y = num(view.y),
        w = num(view.width),
        h = num(view.height),
    );
    let _ = writeln!(
        svg,
        "<style>\n  text {{ font-family: {}; font-size: {}px; }}\n</style>",
        theme.font_family,
        num(theme.font_size)
    );
    let _ = writeln!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
        num(view.x),
        num(view.y),
        num(view.width),
        num(view.height),
        theme.bg
    );

    for conn in diagram.connections() {
        if let Some(path) = diagram.connection_path(conn.id) {
            render_connection_svg(&mut svg, &path, conn.color.hex());
        }
    }
    for node in diagram.nodes() {
        render_node_svg(&mut svg, node, theme);
    }

    svg.push_str("</svg>\n");
    svg
}

fn render_connection_svg(out: &mut String, path: &ConnectionPath, color: &str) {
    if path.is_collapsed() {
        return;
    }
    let _ = writeln!(
        out,
        "<path d=\"M {} {} C {} {}, {} {}, {} {}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"2\"/>",
        num(path.start.x),
        num(path.start.y),
        num(path.ctrl1.x),
        num(path.ctrl1.y),
        num(path.ctrl2.x),
        num(path.ctrl2.y),
        num(path.end.x),
        num(path.end.y),
    );
    let points: Vec<String> = path
        .arrow()
        .iter()
        .map(|p| format!("{},{}", num(p.x), num(p.y)))
        .collect();
    let _ = writeln!(out, "<polygon points=\"{}\" fill=\"{color}\"/>", points.join(" "));
}

fn render_node_svg(out: &mut String, node: &Node, theme: &CanvasTheme) {
    let fill = escape_xml(node_fill(node, theme));
    let stroke = if node.has_border == Some(false) {
        "none".to_string()
    } else {
        escape_xml(&node.border_color)
    };
    let paint = format!(
        "fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{}\"",
        num(node.border_width)
    );

    match node.shape {
        NodeShape::Rectangle => {
            let _ = writeln!(
                out,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" {paint}/>",
                num(node.x),
                num(node.y),
                num(node.width),
                num(node.height),
                num(RECT_CORNER_RADIUS)
            );
        }
        NodeShape::Circle => {
            let c = node.center();
            let _ = writeln!(
                out,
                "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" {paint}/>",
                num(c.x),
                num(c.y),
                num(node.radius())
            );
        }
        NodeShape::Cloud => {
            let _ = writeln!(
                out,
                "<path d=\"{}\" {paint}/>",
                cloud_path(node.bounds()).to_svg()
            );
        }
    }

    if !node.text.is_empty() {
        let c = node.center();
        let _ = writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\" fill=\"{}\">{}</text>",
            num(c.x),
            num(c.y),
            theme.text,
            escape_xml(&node.text)
        );
    }
}
