//! Free-floating text annotations.

use crate::model::geometry::{Point, Rect};
use crate::model::ids::TextBoxId;

#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub id: TextBoxId,
    /// Top-left corner.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rich text as entered in the editor.
    pub html: String,
}

impl TextBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64, html: impl Into<String>) -> Self {
        Self {
            id: TextBoxId::generate(),
            x,
            y,
            width,
            height,
            html: html.into(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, point: Point) {
        self.x = point.x;
        self.y = point.y;
    }
}

/// Partial update for text boxes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBoxPatch {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub html: Option<String>,
}

impl TextBoxPatch {
    pub fn apply_to(self, text_box: &mut TextBox) {
        if let Some(value) = self.width {
            text_box.width = value.max(0.0);
        }
        if let Some(value) = self.height {
            text_box.height = value.max(0.0);
        }
        if let Some(value) = self.html {
            text_box.html = value;
        }
    }
}
