use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;

/// Request to fetch the frame at a 0-based sequence index.
#[derive(Debug, Clone)]
pub struct LoadFrame {
    pub index: usize,
    pub locator: PathBuf,
}

/// Outcome of one fetch, delivered to the frame store owner.
#[derive(Debug)]
pub enum FrameResolved {
    Loaded { index: usize, image: Arc<RgbaImage> },
    Failed { index: usize },
}

impl FrameResolved {
    pub fn index(&self) -> usize {
        match self {
            Self::Loaded { index, .. } | Self::Failed { index } => *index,
        }
    }
}

/// Aggregate preload counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreloadStatus {
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl PreloadStatus {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Successes and failures both count as accounted for.
    pub fn resolved(&self) -> usize {
        self.loaded + self.failed
    }

    pub fn is_settled(&self) -> bool {
        self.resolved() >= self.total
    }

    /// Progress-bar width in percent.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.resolved() as f64 / self.total as f64 * 100.0
    }
}

/// Why startup was considered complete. Fires at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Every fetch resolved.
    Settled(PreloadStatus),
    /// The preload timeout elapsed first.
    TimedOut(PreloadStatus),
}

impl Readiness {
    pub fn status(&self) -> PreloadStatus {
        match self {
            Self::Settled(status) | Self::TimedOut(status) => *status,
        }
    }
}

/// Host page input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageEvent {
    Scrolled {
        scroll_top: f64,
        scrollable_height: f64,
    },
    Resized {
        width: u32,
        height: u32,
    },
}
