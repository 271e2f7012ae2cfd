//! Render cadence: redraw-on-scroll or per-tick smoothed progress.
use crate::progress::{clamp_progress, discrete_index};
use crate::render::renderer::RenderMode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionMode {
    /// Render only when the nearest frame changes.
    Discrete,
    /// Ease toward the scroll target every tick and always render.
    Continuous { smoothing: f64 },
}

impl MotionMode {
    pub fn render_mode(&self) -> RenderMode {
        match self {
            Self::Discrete => RenderMode::Discrete,
            Self::Continuous { .. } => RenderMode::Continuous,
        }
    }
}

/// What the viewer should present after an input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Update {
    pub progress: f64,
    /// False when only lighting/overlays need refreshing.
    pub redraw: bool,
}

#[derive(Debug, Clone)]
pub struct MotionController {
    mode: MotionMode,
    frame_count: usize,
    target: f64,
    smoothed: f64,
    last_index: Option<usize>,
}

impl MotionController {
    pub fn new(mode: MotionMode, frame_count: usize) -> Self {
        Self {
            mode,
            frame_count,
            target: 0.0,
            smoothed: 0.0,
            last_index: None,
        }
    }

    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn smoothed(&self) -> f64 {
        self.smoothed
    }

    /// Called once at readiness. Discrete mode renders right away; continuous
    /// mode leaves the first render to the tick loop.
    pub fn start(&mut self) -> Option<Update> {
        match self.mode {
            MotionMode::Discrete => {
                self.last_index = Some(discrete_index(self.target, self.frame_count));
                Some(Update {
                    progress: self.target,
                    redraw: true,
                })
            }
            MotionMode::Continuous { .. } => None,
        }
    }

    pub fn on_scroll(&mut self, progress: f64) -> Option<Update> {
        self.target = clamp_progress(progress);
        match self.mode {
            MotionMode::Discrete => {
                let index = discrete_index(self.target, self.frame_count);
                let redraw = self.last_index != Some(index);
                if redraw {
                    self.last_index = Some(index);
                }
                Some(Update {
                    progress: self.target,
                    redraw,
                })
            }
            MotionMode::Continuous { .. } => None,
        }
    }

    pub fn on_resize(&mut self) -> Option<Update> {
        match self.mode {
            MotionMode::Discrete => Some(Update {
                progress: self.target,
                redraw: true,
            }),
            MotionMode::Continuous { .. } => None,
        }
    }

    /// A frame finished loading. Discrete mode redraws when it is the one on
    /// screen or the frame-0 fallback.
    pub fn on_frame_loaded(&mut self, index: usize) -> Option<Update> {
        match self.mode {
            MotionMode::Discrete => {
                let shown = self.last_index?;
                (index == shown || index == 0).then_some(Update {
                    progress: self.target,
                    redraw: true,
                })
            }
            MotionMode::Continuous { .. } => None,
        }
    }

    /// One display refresh. `smoothed += (target - smoothed) * k`.
    pub fn tick(&mut self) -> Option<Update> {
        match self.mode {
            MotionMode::Discrete => None,
            MotionMode::Continuous { smoothing } => {
                self.smoothed += (self.target - self.smoothed) * smoothing;
                Some(Update {
                    progress: self.smoothed,
                    redraw: true,
                })
            }
        }
    }
}
