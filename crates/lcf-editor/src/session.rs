//! Editor session: routes input to the engine and the active tool.
//!
//! This is the platform-neutral controller the browser bridge wraps.
//! Every `handle_*` method returns `true` when the canvas needs a redraw.

use crate::engine::{DiagramEngine, DiagramMutation, Selection};
use crate::input::{InputEvent, Modifiers};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{ConnectTool, PanTool, SelectTool, ShapeTool, Tool, ToolKind};
use lcf_core::model::{NodeShape, Point};
use lcf_core::viewport::ZOOM_STEP;
use lcf_render::paint::{CanvasTheme, DrawOp, Overlay, build_draw_list};
use lcf_render::svg::render_svg;

pub struct EditorSession {
    pub engine: DiagramEngine,
    active_tool: ToolKind,
    select_tool: SelectTool,
    shape_tool: ShapeTool,
    connect_tool: ConnectTool,
    pan_tool: PanTool,
    /// Canvas element size in pixels, used as the keyboard zoom anchor.
    width: f64,
    height: f64,
}

impl EditorSession {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_engine(DiagramEngine::new(), width, height)
    }

    pub fn with_engine(engine: DiagramEngine, width: f64, height: f64) -> Self {
        Self {
            engine,
            active_tool: ToolKind::Select,
            select_tool: SelectTool::new(),
            shape_tool: ShapeTool::new(NodeShape::Rectangle),
            connect_tool: ConnectTool::new(),
            pan_tool: PanTool::new(),
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn active_tool(&self) -> ToolKind {
        self.active_tool
    }

    /// Switch tools, dropping any in-progress gesture.
    pub fn set_tool(&mut self, kind: ToolKind) {
        self.select_tool.reset();
        self.connect_tool.reset();
        self.pan_tool.reset();
        if let Some(shape) = kind.shape() {
            self.shape_tool.shape = shape;
        }
        if self.active_tool != kind {
            log::debug!("tool {} -> {}", self.active_tool.name(), kind.name());
        }
        self.active_tool = kind;
    }

    fn tool(&self) -> &dyn Tool {
        match self.active_tool {
            ToolKind::Select => &self.select_tool,
            ToolKind::Rectangle | ToolKind::Circle | ToolKind::Cloud => &self.shape_tool,
            ToolKind::Connect => &self.connect_tool,
            ToolKind::Pan => &self.pan_tool,
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Handle any input event.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Wheel { x, y, delta_y } => self.handle_wheel(*x, *y, *delta_y),
            InputEvent::Key { key, modifiers } => self.handle_key(key, *modifiers),
            _ => self.handle_pointer(event),
        }
    }

    fn handle_pointer(&mut self, event: &InputEvent) -> bool {
        let selection_before = self.engine.selection.clone();
        let mut cx = self.engine.tool_context();
        let tool: &mut dyn Tool = match self.active_tool {
            ToolKind::Select => &mut self.select_tool,
            ToolKind::Rectangle | ToolKind::Circle | ToolKind::Cloud => &mut self.shape_tool,
            ToolKind::Connect => &mut self.connect_tool,
            ToolKind::Pan => &mut self.pan_tool,
        };
        let mutations = tool.handle(event, &mut cx);
        let finished = cx.finished;

        let changed = self.engine.apply_all(mutations);
        if finished {
            self.set_tool(ToolKind::Select);
        }
        let overlay_active = self.tool().preview().is_some() || self.tool().marquee().is_some();
        changed || finished || overlay_active || self.engine.selection != selection_before
    }

    /// Wheel zooms around the pointer: up zooms in, down zooms out.
    pub fn handle_wheel(&mut self, x: f64, y: f64, delta_y: f64) -> bool {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return false;
        }
        let factor = if delta_y < 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
        self.engine
            .apply(DiagramMutation::ZoomView {
                factor,
                anchor: Point::new(x, y),
            })
            .is_ok()
    }

    /// Resolve and run a keyboard shortcut. Returns true if handled.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> bool {
        match ShortcutMap::resolve(key, modifiers) {
            Some(action) => self.run_action(action),
            None => false,
        }
    }

    pub fn run_action(&mut self, action: ShortcutAction) -> bool {
        log::debug!("shortcut {action:?}");
        let center = Point::new(self.width / 2.0, self.height / 2.0);
        match action {
            ShortcutAction::ToolSelect => self.switch(ToolKind::Select),
            ShortcutAction::ToolRectangle => self.switch(ToolKind::Rectangle),
            ShortcutAction::ToolCircle => self.switch(ToolKind::Circle),
            ShortcutAction::ToolCloud => self.switch(ToolKind::Cloud),
            ShortcutAction::ToolConnect => self.switch(ToolKind::Connect),
            ShortcutAction::ToolPan => self.switch(ToolKind::Pan),
            ShortcutAction::Delete => self.engine.delete_selection(),
            ShortcutAction::Copy => self.engine.copy() > 0,
            ShortcutAction::Cut => self.engine.cut() > 0,
            ShortcutAction::Paste => self.engine.paste() > 0,
            ShortcutAction::ZoomIn => self.zoom(ZOOM_STEP, center),
            ShortcutAction::ZoomOut => self.zoom(1.0 / ZOOM_STEP, center),
            ShortcutAction::ZoomReset => self.engine.apply(DiagramMutation::ResetView).is_ok(),
            ShortcutAction::Deselect => {
                self.set_tool(self.active_tool);
                let had = !self.engine.selection.is_empty();
                self.engine.selection = Selection::None;
                had
            }
        }
    }

    fn switch(&mut self, kind: ToolKind) -> bool {
        self.set_tool(kind);
        true
    }

    fn zoom(&mut self, factor: f64, anchor: Point) -> bool {
        self.engine
            .apply(DiagramMutation::ZoomView { factor, anchor })
            .is_ok()
    }

    // ─── Output ──────────────────────────────────────────────────────────

    pub fn overlay(&self) -> Overlay {
        let tool = self.tool();
        Overlay {
            selected: self.engine.selection.ids(),
            preview: tool.preview(),
            marquee: tool.marquee(),
        }
    }

    /// Draw list in model coordinates; apply the viewport transform when
    /// replaying it.
    pub fn draw_list(&self, theme: &CanvasTheme) -> Vec<DrawOp> {
        build_draw_list(self.engine.diagram(), &self.engine, theme, &self.overlay())
    }

    pub fn export_svg(&self, theme: &CanvasTheme) -> String {
        render_svg(self.engine.diagram(), theme)
    }
}
