//! Surface-agnostic rendering
//!
//! The draw pass only issues calls on a [`RenderSurface`]; whether those end
//! up on a Canvas2D context, in a recorded list or nowhere is the surface's
//! business. Calls are synchronous within the frame that makes them.

pub mod draw;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

use glam::Vec2;

pub use draw::{draw_arena, draw_grid, draw_score_table};

/// RGBA, components in 0..=1
pub type Color = [f32; 4];

/// Turn an 8-bit RGB tint into a color with the given alpha
pub fn rgb(tint: [u8; 3], alpha: f32) -> Color {
    [
        tint[0] as f32 / 255.0,
        tint[1] as f32 / 255.0,
        tint[2] as f32 / 255.0,
        alpha,
    ]
}

/// Text anchoring along x
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Sink for draw calls
pub trait RenderSurface {
    /// Logical size of the drawable area
    fn size(&self) -> Vec2;
    fn clear(&mut self, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Color);
    /// Closed outline through `points`
    fn stroke_polygon(&mut self, points: &[Vec2], width: f32, color: Color);
    fn text(&mut self, pos: Vec2, text: &str, size: f32, align: Align, color: Color);
}

/// Anything that knows how to put itself on a surface
pub trait Drawable {
    fn draw(&self, surface: &mut dyn RenderSurface);
}

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear(Color),
    Circle { center: Vec2, radius: f32, color: Color },
    Rect { min: Vec2, size: Vec2, color: Color },
    Polygon { points: Vec<Vec2>, width: f32, color: Color },
    Text { pos: Vec2, text: String, size: f32, align: Align, color: Color },
}

/// Surface that records calls instead of drawing them (headless runs, tests)
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub size: Vec2,
    pub cmds: Vec<DrawCmd>,
}

impl DrawList {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            cmds: Vec::new(),
        }
    }

    /// Text drawn since the last clear, in order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.cmds.iter().filter_map(|c| match c {
            DrawCmd::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl RenderSurface for DrawList {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.cmds.clear();
        self.cmds.push(DrawCmd::Clear(color));
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.cmds.push(DrawCmd::Circle {
            center,
            radius,
            color,
        });
    }

    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Color) {
        self.cmds.push(DrawCmd::Rect { min, size, color });
    }

    fn stroke_polygon(&mut self, points: &[Vec2], width: f32, color: Color) {
        self.cmds.push(DrawCmd::Polygon {
            points: points.to_vec(),
            width,
            color,
        });
    }

    fn text(&mut self, pos: Vec2, text: &str, size: f32, align: Align, color: Color) {
        self.cmds.push(DrawCmd::Text {
            pos,
            text: text.to_string(),
            size,
            align,
            color,
        });
    }
}
