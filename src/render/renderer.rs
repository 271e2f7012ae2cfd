//! Maps progress onto one or two frames and issues contain-fit draws.
use serde::Deserialize;
use tracing::trace;

use crate::frames::{Frame, FrameSequence};
use crate::processing::layout::{Rect, contain};
use crate::progress::{continuous_blend, discrete_index};
use crate::render::surface::DrawSurface;

/// Below this weight only the lower frame is drawn.
pub const BLEND_FLOOR: f64 = 0.01;
/// Above this weight only the upper frame is drawn.
pub const BLEND_CEILING: f64 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Single nearest frame at full opacity.
    Discrete,
    /// Two neighbouring frames alpha-blended.
    Continuous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone)]
pub struct FrameRenderer {
    viewport: Viewport,
}

impl FrameRenderer {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn draw<S: DrawSurface + ?Sized>(
        &self,
        surface: &mut S,
        frames: &FrameSequence,
        progress: f64,
        mode: RenderMode,
    ) {
        surface.clear();
        match mode {
            RenderMode::Discrete => self.draw_discrete(surface, frames, progress),
            RenderMode::Continuous => self.draw_continuous(surface, frames, progress),
        }
        surface.set_alpha(1.0);
    }

    fn draw_discrete<S: DrawSurface + ?Sized>(
        &self,
        surface: &mut S,
        frames: &FrameSequence,
        progress: f64,
    ) {
        let index = discrete_index(progress, frames.len());
        let Some(frame) = frames.loaded(index).or_else(|| frames.loaded(0)) else {
            trace!(index, "no drawable frame");
            return;
        };
        surface.set_alpha(1.0);
        self.draw_frame(surface, frame);
    }

    fn draw_continuous<S: DrawSurface + ?Sized>(
        &self,
        surface: &mut S,
        frames: &FrameSequence,
        progress: f64,
    ) {
        let blend = continuous_blend(progress, frames.len());
        if blend.weight < BLEND_FLOOR {
            self.draw_at(surface, frames, blend.lower, 1.0);
        } else if blend.weight > BLEND_CEILING {
            self.draw_at(surface, frames, blend.upper, 1.0);
        } else {
            self.draw_at(surface, frames, blend.lower, 1.0);
            if blend.lower != blend.upper {
                self.draw_at(surface, frames, blend.upper, blend.weight);
            }
        }
    }

    fn draw_at<S: DrawSurface + ?Sized>(
        &self,
        surface: &mut S,
        frames: &FrameSequence,
        index: usize,
        alpha: f64,
    ) {
        if let Some(frame) = frames.loaded(index) {
            surface.set_alpha(alpha);
            self.draw_frame(surface, frame);
        }
    }

    fn draw_frame<S: DrawSurface + ?Sized>(&self, surface: &mut S, frame: &Frame) {
        let Some(image) = frame.image() else {
            return;
        };
        let (w, h) = image.dimensions();
        let placement = contain(w, h, self.viewport.width, self.viewport.height);
        surface.draw_image(frame.id(), image, Rect::of_size(w, h), placement.dest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::FramePattern;
    use crate::render::surface::{DrawCommand, RecordingSurface};
    use image::RgbaImage;
    use std::sync::Arc;

    fn sequence(count: usize, loaded: &[usize]) -> FrameSequence {
        let mut seq = FrameSequence::new(count, &FramePattern::default());
        for &index in loaded {
            seq.mark_loaded(index, Arc::new(RgbaImage::new(200, 100)))
                .unwrap();
        }
        seq
    }

    fn render(seq: &FrameSequence, progress: f64, mode: RenderMode) -> RecordingSurface {
        let renderer = FrameRenderer::new(Viewport::new(100, 100));
        let mut surface = RecordingSurface::new();
        renderer.draw(&mut surface, seq, progress, mode);
        surface
    }

    #[test]
    fn discrete_draws_one_frame_letterboxed() {
        let seq = sequence(4, &[0, 1, 2, 3]);
        let surface = render(&seq, 0.5, RenderMode::Discrete);
        assert_eq!(
            surface.commands(),
            &[
                DrawCommand::Clear,
                DrawCommand::SetAlpha(1.0),
                DrawCommand::DrawImage {
                    frame_id: 3,
                    src: Rect::new(0.0, 0.0, 200.0, 100.0),
                    dst: Rect::new(0.0, 25.0, 100.0, 50.0),
                },
                DrawCommand::SetAlpha(1.0),
            ]
        );
    }

    #[test]
    fn discrete_falls_back_to_first_frame() {
        let seq = sequence(4, &[0]);
        assert_eq!(render(&seq, 0.9, RenderMode::Discrete).drawn_frames(), vec![(1, 1.0)]);

        let seq = sequence(4, &[2]);
        let surface = render(&seq, 0.9, RenderMode::Discrete);
        assert!(surface.drawn_frames().is_empty());
        assert_eq!(surface.commands().first(), Some(&DrawCommand::Clear));
    }

    #[test]
    fn continuous_blends_upper_frame_on_top() {
        let seq = sequence(3, &[0, 1, 2]);
        // float index 0.5 -> frames 1 and 2 (ids), upper at half opacity.
        let drawn = render(&seq, 0.25, RenderMode::Continuous).drawn_frames();
        assert_eq!(drawn.len(), 2);
        assert_eq!(drawn[0], (1, 1.0));
        assert_eq!(drawn[1].0, 2);
        assert!((drawn[1].1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn continuous_thresholds_avoid_double_draw() {
        let seq = sequence(2, &[0, 1]);
        assert_eq!(render(&seq, 0.005, RenderMode::Continuous).drawn_frames(), vec![(1, 1.0)]);
        assert_eq!(render(&seq, 0.995, RenderMode::Continuous).drawn_frames(), vec![(2, 1.0)]);
        assert_eq!(render(&seq, 1.0, RenderMode::Continuous).drawn_frames(), vec![(2, 1.0)]);
    }

    #[test]
    fn continuous_skips_missing_frames() {
        let seq = sequence(3, &[1]);
        let drawn = render(&seq, 0.25, RenderMode::Continuous).drawn_frames();
        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].0, 2);
        assert!((drawn[0].1 - 0.5).abs() < 1e-12);

        let empty = sequence(3, &[]);
        let surface = render(&empty, 0.6, RenderMode::Continuous);
        assert_eq!(
            surface.commands(),
            &[DrawCommand::Clear, DrawCommand::SetAlpha(1.0)]
        );
    }
}
