//! WASM bridge for Life Canvas Flow: exposes the editor session to the
//! browser page.
//!
//! Compiled via `wasm-pack build --target web`. The page owns the
//! `<canvas>` element, forwards pointer, wheel and key events, and calls
//! `render` whenever a handler returns `true`. Saving is the page's job:
//! it reads `to_json()` and sends it to the diagram API.

mod render2d;

use lcf_core::{ConnectionColor, DiagramContent, NodeId, NodeShape};
use lcf_editor::{DiagramMutation, EditorSession, InputEvent, Modifiers, Selection, ToolKind};
use lcf_render::CanvasTheme;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The browser-facing canvas controller.
#[wasm_bindgen]
pub struct LifeCanvas {
    session: EditorSession,
    dark_mode: bool,
}

#[wasm_bindgen]
impl LifeCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        console_setup();
        Self {
            session: EditorSession::new(width, height),
            dark_mode: true,
        }
    }

    /// Replace the diagram with stored content JSON.
    /// Returns `false` and keeps the current diagram if it is invalid.
    pub fn load_json(&mut self, json: &str) -> bool {
        match self.session.engine.load_json(json) {
            Ok(()) => {
                self.session.set_tool(ToolKind::Select);
                true
            }
            Err(e) => {
                log::error!("load failed: {e}");
                false
            }
        }
    }

    /// Current diagram content as JSON, ready to persist.
    pub fn to_json(&self) -> String {
        self.session.engine.to_json()
    }

    pub fn is_dirty(&self) -> bool {
        self.session.engine.is_dirty()
    }

    pub fn mark_saved(&mut self) {
        self.session.engine.mark_saved();
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let theme = self.theme();
        let (width, height) = self.session.size();
        let ops = self.session.draw_list(&theme);
        render2d::render_frame(
            ctx,
            &ops,
            self.session.engine.viewport(),
            width,
            height,
            &theme,
        );
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.session.resize(width, height);
    }

    /// Standalone SVG document of the whole diagram.
    pub fn export_svg(&self) -> String {
        self.session.export_svg(&self.theme())
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Returns true if the canvas needs a redraw.
    pub fn handle_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let mods = Modifiers::new(shift, ctrl, alt, meta);
        self.session.handle(&InputEvent::pointer_down(x, y, mods))
    }

    pub fn handle_pointer_move(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let mods = Modifiers::new(shift, ctrl, alt, meta);
        self.session.handle(&InputEvent::pointer_move(x, y, mods))
    }

    pub fn handle_pointer_up(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let mods = Modifiers::new(shift, ctrl, alt, meta);
        self.session.handle(&InputEvent::pointer_up(x, y, mods))
    }

    pub fn handle_wheel(&mut self, x: f64, y: f64, delta_y: f64) -> bool {
        self.session.handle_wheel(x, y, delta_y)
    }

    /// Keyboard shortcut. Returns true if it was handled, so the page can
    /// call `preventDefault`.
    pub fn handle_key(
        &mut self,
        key: &str,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        self.session
            .handle_key(key, Modifiers::new(shift, ctrl, alt, meta))
    }

    // ─── Toolbar ─────────────────────────────────────────────────────────

    /// Switch tool by name: `select`, `rectangle`, `circle`, `cloud`,
    /// `connect` or `pan`.
    pub fn set_tool(&mut self, name: &str) -> bool {
        match ToolKind::from_name(name) {
            Some(kind) => {
                self.session.set_tool(kind);
                true
            }
            None => false,
        }
    }

    pub fn get_tool(&self) -> String {
        self.session.active_tool().name().to_string()
    }

    /// Color for new connections; also recolors a selected connection.
    pub fn set_active_color(&mut self, hex: &str) -> bool {
        let Some(color) = ConnectionColor::from_hex(hex) else {
            return false;
        };
        self.session.engine.active_color = color;
        if let Some(id) = self.session.engine.selection.connection() {
            let _ = self
                .session
                .engine
                .apply(DiagramMutation::SetConnectionColor { id, color });
        }
        true
    }

    pub fn get_active_color(&self) -> String {
        self.session.engine.active_color.hex().to_string()
    }

    /// The connection palette as JSON: `[{"hex":"#4CAF50","label":"Standard"}, ...]`.
    pub fn palette(&self) -> String {
        let entries: Vec<serde_json::Value> = ConnectionColor::ALL
            .iter()
            .map(|c| serde_json::json!({ "hex": c.hex(), "label": c.label() }))
            .collect();
        serde_json::Value::Array(entries).to_string()
    }

    pub fn delete_selected(&mut self) -> bool {
        self.session.engine.delete_selection()
    }

    pub fn zoom_level(&self) -> f64 {
        self.session.engine.viewport().scale
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Selection as JSON: `{"kind":"nodes","ids":[...]}`,
    /// `{"kind":"connection","ids":[id]}` or `{"kind":"none","ids":[]}`.
    pub fn get_selection(&self) -> String {
        let selection = &self.session.engine.selection;
        let kind = match selection {
            Selection::None => "none",
            Selection::Nodes(_) => "nodes",
            Selection::Connection(_) => "connection",
        };
        let ids = selection.ids();
        let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        serde_json::json!({ "kind": kind, "ids": ids }).to_string()
    }

    /// Properties of one node as JSON, or an empty string if unknown.
    pub fn get_node(&self, id: &str) -> String {
        NodeId::lookup(id)
            .and_then(|id| self.session.engine.diagram().node(id))
            .and_then(|node| serde_json::to_string(node).ok())
            .unwrap_or_default()
    }

    pub fn set_node_text(&mut self, id: &str, text: &str) -> bool {
        self.apply_to_node(id, |id| DiagramMutation::SetText {
            id,
            text: text.to_string(),
        })
    }

    pub fn set_node_shape(&mut self, id: &str, shape: &str) -> bool {
        let shape = match shape {
            "rectangle" => NodeShape::Rectangle,
            "circle" => NodeShape::Circle,
            "cloud" => NodeShape::Cloud,
            _ => return false,
        };
        self.apply_to_node(id, |id| DiagramMutation::SetShape { id, shape })
    }

    pub fn resize_node(&mut self, id: &str, width: f64, height: f64) -> bool {
        self.apply_to_node(id, |id| DiagramMutation::ResizeNode { id, width, height })
    }
}

impl LifeCanvas {
    fn theme(&self) -> CanvasTheme {
        if self.dark_mode {
            CanvasTheme::dark()
        } else {
            CanvasTheme::light()
        }
    }

    fn apply_to_node(
        &mut self,
        id: &str,
        mutation: impl FnOnce(NodeId) -> DiagramMutation,
    ) -> bool {
        let Some(id) = NodeId::lookup(id) else {
            return false;
        };
        match self.session.engine.apply(mutation(id)) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }
}

// ─── Logging ─────────────────────────────────────────────────────────────

#[cfg(target_arch = "wasm32")]
struct ConsoleLogger;

#[cfg(target_arch = "wasm32")]
impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            log::Level::Info => web_sys::console::info_1(&msg),
            _ => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

#[cfg(target_arch = "wasm32")]
static LOGGER: ConsoleLogger = ConsoleLogger;

/// Route panics and `log` records to the browser console.
fn console_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SETUP: Once = Once::new();
        SETUP.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Life Canvas Flow panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Info);
            }
        });
    }
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// Validate diagram content JSON.
/// Returns `{"ok":true}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate(json: &str) -> String {
    let result = DiagramContent::from_json(json)
        .map_err(|e| e.to_string())
        .and_then(|content| {
            lcf_core::Diagram::from_content(&content)
                .map(|_| ())
                .map_err(|e| e.to_string())
        });
    match result {
        Ok(()) => serde_json::json!({ "ok": true }).to_string(),
        Err(e) => serde_json::json!({ "ok": false, "error": e }).to_string(),
    }
}

/// Render stored content JSON straight to SVG, without a canvas.
/// Returns an empty string if the content is invalid.
#[wasm_bindgen]
pub fn content_to_svg(json: &str, dark: bool) -> String {
    let theme = if dark {
        CanvasTheme::dark()
    } else {
        CanvasTheme::light()
    };
    DiagramContent::from_json(json)
        .ok()
        .and_then(|content| lcf_core::Diagram::from_content(&content).ok())
        .map(|(diagram, _)| lcf_render::render_svg(&diagram, &theme))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TWO_NODES: &str = r##"{
        "nodes": [
            { "id": "wasm_a", "type": "rectangle", "x": 0, "y": 0, "width": 100, "height": 50 },
            { "id": "wasm_b", "type": "circle", "x": 300, "y": 0, "width": 60, "height": 60 }
        ],
        "connections": [ { "id": "wasm_c", "from": "wasm_a", "to": "wasm_b", "color": "#FFC107" } ]
    }"##;

    #[test]
    fn validate_reports_errors() {
        assert_eq!(validate(TWO_NODES), r#"{"ok":true}"#);
        let bad = validate(r#"{"nodes":[],"connections":[{"id":"x","from":"a","to":"b"}]}"#);
        assert!(bad.contains(r#""ok":false"#), "{bad}");
        assert!(bad.contains("missing node"), "{bad}");
    }

    #[test]
    fn selection_json_follows_clicks() {
        let mut canvas = LifeCanvas::new(800.0, 600.0);
        assert!(canvas.load_json(TWO_NODES));
        assert_eq!(canvas.get_selection(), r#"{"ids":[],"kind":"none"}"#);

        canvas.handle_pointer_down(50.0, 25.0, false, false, false, false);
        canvas.handle_pointer_up(50.0, 25.0, false, false, false, false);
        assert_eq!(canvas.get_selection(), r#"{"ids":["wasm_a"],"kind":"nodes"}"#);
    }

    #[test]
    fn recolor_selected_connection() {
        let mut canvas = LifeCanvas::new(800.0, 600.0);
        assert!(canvas.load_json(TWO_NODES));
        // Midpoint of the straight a→b curve.
        canvas.handle_pointer_down(200.0, 27.5, false, false, false, false);
        canvas.handle_pointer_up(200.0, 27.5, false, false, false, false);
        assert!(canvas.get_selection().contains("connection"));

        assert!(canvas.set_active_color("#f44336"));
        assert!(canvas.to_json().contains("#F44336"));
        assert!(!canvas.set_active_color("#123456"));
    }

    #[test]
    fn tool_names_roundtrip() {
        let mut canvas = LifeCanvas::new(800.0, 600.0);
        assert!(canvas.set_tool("cloud"));
        assert_eq!(canvas.get_tool(), "cloud");
        assert!(!canvas.set_tool("lasso"));
        assert_eq!(canvas.get_tool(), "cloud");
    }
}
