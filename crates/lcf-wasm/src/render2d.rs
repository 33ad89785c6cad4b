//! Canvas2D renderer.
//!
//! Replays the backend-neutral draw list from `lcf-render` onto an HTML
//! `<canvas>` through `CanvasRenderingContext2d`, under the viewport
//! transform. The background and dot grid are drawn in screen space.

use kurbo::{BezPath, PathEl};
use lcf_core::Viewport;
use lcf_render::paint::{CanvasTheme, DrawOp};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

const GRID_SPACING: f64 = 20.0;
const DASH: f64 = 4.0;

/// Clear the canvas and draw one frame.
pub fn render_frame(
    ctx: &CanvasRenderingContext2d,
    ops: &[DrawOp],
    viewport: &Viewport,
    canvas_width: f64,
    canvas_height: f64,
    theme: &CanvasTheme,
) {
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);
    draw_grid(ctx, viewport, canvas_width, canvas_height, theme);

    let _ = ctx.set_transform(
        viewport.scale,
        0.0,
        0.0,
        viewport.scale,
        viewport.x,
        viewport.y,
    );
    ctx.set_font(&format!("{}px {}", theme.font_size, theme.font_family));
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");

    for op in ops {
        draw_op(ctx, op, viewport.scale);
    }

    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
}

fn draw_op(ctx: &CanvasRenderingContext2d, op: &DrawOp, scale: f64) {
    match op {
        DrawOp::Fill { path, color } => {
            trace_path(ctx, path);
            ctx.set_fill_style_str(color);
            ctx.fill();
        }
        DrawOp::Stroke {
            path,
            color,
            width,
            dashed,
        } => {
            ctx.save();
            trace_path(ctx, path);
            ctx.set_stroke_style_str(color);
            ctx.set_line_width(*width);
            if *dashed {
                // Keep the dash pattern constant on screen.
                let dash = DASH / scale;
                let _ = ctx.set_line_dash(&js_sys::Array::of2(
                    &JsValue::from_f64(dash),
                    &JsValue::from_f64(dash),
                ));
            }
            ctx.stroke();
            ctx.restore();
        }
        DrawOp::Text {
            at,
            text,
            color,
            size,
        } => {
            ctx.set_fill_style_str(color);
            for (i, line) in text.lines().enumerate() {
                let lines = text.lines().count() as f64;
                let y = at.y + (i as f64 - (lines - 1.0) / 2.0) * size * 1.2;
                let _ = ctx.fill_text(line, at.x, y);
            }
        }
    }
}

fn trace_path(ctx: &CanvasRenderingContext2d, path: &BezPath) {
    ctx.begin_path();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => ctx.move_to(p.x, p.y),
            PathEl::LineTo(p) => ctx.line_to(p.x, p.y),
            PathEl::QuadTo(c, p) => ctx.quadratic_curve_to(c.x, c.y, p.x, p.y),
            PathEl::CurveTo(c1, c2, p) => ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
            PathEl::ClosePath => ctx.close_path(),
        }
    }
}

/// Dot grid that pans and scales with the view.
fn draw_grid(
    ctx: &CanvasRenderingContext2d,
    viewport: &Viewport,
    width: f64,
    height: f64,
    theme: &CanvasTheme,
) {
    let spacing = GRID_SPACING * viewport.scale;
    if spacing < 4.0 {
        return;
    }
    ctx.set_fill_style_str(theme.grid);
    let mut x = viewport.x.rem_euclid(spacing);
    while x < width {
        let mut y = viewport.y.rem_euclid(spacing);
        while y < height {
            ctx.fill_rect(x, y, 1.0, 1.0);
            y += spacing;
        }
        x += spacing;
    }
}
