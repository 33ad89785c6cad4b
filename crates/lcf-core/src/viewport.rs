//! Canvas pan/zoom transform.
//!
//! Maps between screen (pointer) coordinates and diagram model
//! coordinates: `screen = model * scale + offset`.

use crate::model::Point;
use serde::{Deserialize, Serialize};

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 5.0;
/// Multiplicative step for one wheel notch / zoom shortcut.
pub const ZOOM_STEP: f64 = 1.1;

/// The canvas view: zoom factor and pan offset (in screen pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            x: 0.0,
            y: 0.0,
        }
    }
}

impl Viewport {
    pub fn screen_to_model(&self, p: Point) -> Point {
        Point::new((p.x - self.x) / self.scale, (p.y - self.y) / self.scale)
    }

    pub fn model_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.x, p.y * self.scale + self.y)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Zoom by `factor` keeping the model point under `anchor` (screen
    /// coordinates) fixed. The resulting scale is clamped.
    pub fn zoom_at(&mut self, factor: f64, anchor: Point) {
        if !factor.is_finite() || factor <= 0.0 {
            log::warn!("ignoring zoom factor {factor}");
            return;
        }
        let before = self.screen_to_model(anchor);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.x = anchor.x - before.x * self.scale;
        self.y = anchor.y - before.y * self.scale;
    }

    pub fn zoom_in(&mut self, anchor: Point) {
        self.zoom_at(ZOOM_STEP, anchor);
    }

    pub fn zoom_out(&mut self, anchor: Point) {
        self.zoom_at(1.0 / ZOOM_STEP, anchor);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
