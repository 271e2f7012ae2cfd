//! Drawing surface seam used by the frame renderer.
use image::RgbaImage;

use crate::processing::layout::Rect;

/// The 2D drawing operations the renderer relies on.
///
/// Implementations must not fail: a draw that cannot be honoured is dropped.
pub trait DrawSurface {
    /// Clears the whole surface to transparent.
    fn clear(&mut self);

    /// Matches the surface to a new viewport size.
    fn resize(&mut self, _width: u32, _height: u32) {}

    /// Sets the global alpha applied to subsequent draws.
    fn set_alpha(&mut self, alpha: f64);

    /// Draws the `src` region of `image` scaled into `dst`.
    /// `frame_id` is the 1-based sequence number of the bitmap.
    fn draw_image(&mut self, frame_id: usize, image: &RgbaImage, src: Rect, dst: Rect);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    SetAlpha(f64),
    DrawImage { frame_id: usize, src: Rect, dst: Rect },
}

/// Surface that records commands instead of rasterizing them.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Returns and forgets everything recorded so far.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// `(frame_id, alpha)` for every image draw, in order.
    pub fn drawn_frames(&self) -> Vec<(usize, f64)> {
        let mut alpha = 1.0;
        let mut out = Vec::new();
        for cmd in &self.commands {
            match cmd {
                DrawCommand::Clear => {}
                DrawCommand::SetAlpha(a) => alpha = *a,
                DrawCommand::DrawImage { frame_id, .. } => out.push((*frame_id, alpha)),
            }
        }
        out
    }
}

impl DrawSurface for RecordingSurface {
    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.commands.push(DrawCommand::SetAlpha(alpha));
    }

    fn draw_image(&mut self, frame_id: usize, _image: &RgbaImage, src: Rect, dst: Rect) {
        self.commands
            .push(DrawCommand::DrawImage { frame_id, src, dst });
    }
}
