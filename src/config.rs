use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::frames::{FramePattern, FrameSequence, INDEX_PLACEHOLDER};
use crate::motion::MotionMode;
use crate::render::renderer::{RenderMode, Viewport};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Frame count and naming pattern.
    pub frames: FramesOptions,
    /// Preload timeout and fetch concurrency.
    pub preload: PreloadOptions,
    /// Animation strategy.
    pub motion: MotionOptions,
    /// Initial drawing surface size in pixels.
    pub viewport: ViewportOptions,
    /// Geometry of the scrolling page.
    pub page: PageOptions,
    /// Scroll and resize events replayed by the headless host.
    pub scroll_script: Vec<ScriptStep>,
    /// How long the host keeps animating after the script finishes.
    #[serde(with = "humantime_serde")]
    pub linger: Duration,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(self.frames.count > 0, "frames.count must be greater than zero");
        ensure!(
            self.frames.pattern.contains(INDEX_PLACEHOLDER),
            "frames.pattern must contain {INDEX_PLACEHOLDER}"
        );
        ensure!(
            self.preload.timeout > Duration::ZERO,
            "preload.timeout must be positive"
        );
        ensure!(
            self.preload.max_concurrent_fetches > 0,
            "preload.max-concurrent-fetches must be greater than zero"
        );
        ensure!(
            self.motion.smoothing > 0.0 && self.motion.smoothing <= 1.0,
            "motion.smoothing must be in (0, 1]"
        );
        ensure!(
            self.motion.tick_interval > Duration::ZERO,
            "motion.tick-interval must be positive"
        );
        ensure!(
            self.viewport.width > 0 && self.viewport.height > 0,
            "viewport dimensions must be non-zero"
        );
        ensure!(
            self.page.scroll_height.is_finite() && self.page.scroll_height >= 0.0,
            "page.scroll-height must be a non-negative number"
        );
        for (idx, step) in self.scroll_script.iter().enumerate() {
            step.validate()
                .with_context(|| format!("invalid scroll-script step {idx}"))?;
        }
        Ok(self)
    }

    pub fn frame_pattern(&self) -> Result<FramePattern> {
        Ok(FramePattern::new(self.frames.pattern.clone())?)
    }

    /// Fresh pending sequence for the configured frames.
    pub fn frame_sequence(&self) -> Result<FrameSequence> {
        Ok(FrameSequence::new(self.frames.count, &self.frame_pattern()?))
    }

    pub fn motion_mode(&self) -> MotionMode {
        match self.motion.mode {
            RenderMode::Discrete => MotionMode::Discrete,
            RenderMode::Continuous => MotionMode::Continuous {
                smoothing: self.motion.smoothing,
            },
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport.width, self.viewport.height)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            frames: FramesOptions::default(),
            preload: PreloadOptions::default(),
            motion: MotionOptions::default(),
            viewport: ViewportOptions::default(),
            page: PageOptions::default(),
            scroll_script: Vec::new(),
            linger: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FramesOptions {
    pub count: usize,
    /// `{index}` is replaced by the 1-based frame number.
    pub pattern: String,
}

impl Default for FramesOptions {
    fn default() -> Self {
        Self {
            count: 40,
            pattern: FramePattern::default().as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PreloadOptions {
    /// Readiness is forced after this long even if frames are outstanding.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Pause between all frames resolving and the first render.
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,
    pub max_concurrent_fetches: usize,
}

impl Default for PreloadOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(3000),
            settle_delay: Duration::from_millis(500),
            max_concurrent_fetches: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MotionOptions {
    pub mode: RenderMode,
    /// Fraction of the remaining distance covered per tick (continuous only).
    pub smoothing: f64,
    /// Display refresh period (continuous only).
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
}

impl Default for MotionOptions {
    fn default() -> Self {
        Self {
            mode: RenderMode::Continuous,
            smoothing: 0.15,
            tick_interval: Duration::from_millis(16),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ViewportOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PageOptions {
    /// Total height of the scroll container in pixels.
    pub scroll_height: f64,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            scroll_height: 7200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ScriptStep {
    /// Scroll the page so its top edge sits at `to` pixels.
    Scroll {
        #[serde(with = "humantime_serde")]
        after: Duration,
        to: f64,
    },
    Resize {
        #[serde(with = "humantime_serde")]
        after: Duration,
        width: u32,
        height: u32,
    },
}

impl ScriptStep {
    /// Delay since the previous step.
    pub fn after(&self) -> Duration {
        match self {
            Self::Scroll { after, .. } | Self::Resize { after, .. } => *after,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Scroll { to, .. } => {
                ensure!(to.is_finite(), "scroll target must be finite");
            }
            Self::Resize { width, height, .. } => {
                ensure!(*width > 0 && *height > 0, "resize dimensions must be non-zero");
            }
        }
        Ok(())
    }
}
