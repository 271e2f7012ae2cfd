//! Ordered frame sequence and per-frame load state.
//!
//! The sequence length is fixed at construction. Each frame starts `Pending`
//! and resolves exactly once to `Loaded` or `Failed`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;

use crate::error::Error;

/// Placeholder replaced by the 1-based frame number in a [`FramePattern`].
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Naming pattern that maps a 1-based frame number to its source locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePattern(String);

impl FramePattern {
    pub fn new(pattern: impl Into<String>) -> Result<Self, Error> {
        let pattern = pattern.into();
        if !pattern.contains(INDEX_PLACEHOLDER) {
            return Err(Error::BadPattern(pattern));
        }
        Ok(Self(pattern))
    }

    pub fn locator_for(&self, id: usize) -> PathBuf {
        PathBuf::from(self.0.replace(INDEX_PLACEHOLDER, &id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FramePattern {
    fn default() -> Self {
        Self("./assets/frames/frame-001 ({index}).jpg".to_string())
    }
}

#[derive(Debug, Clone)]
pub enum LoadState {
    Pending,
    Loaded(Arc<RgbaImage>),
    Failed,
}

impl LoadState {
    fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Loaded(_) => "loaded",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    id: usize,
    locator: PathBuf,
    state: LoadState,
}

impl Frame {
    /// 1-based sequence number.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn locator(&self) -> &Path {
        &self.locator
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Decoded bitmap when the frame loaded successfully.
    pub fn image(&self) -> Option<&RgbaImage> {
        match &self.state {
            LoadState::Loaded(image) => Some(image.as_ref()),
            _ => None,
        }
    }

    /// Natural size in pixels, known only once loaded.
    pub fn natural_size(&self) -> Option<(u32, u32)> {
        self.image().map(|img| img.dimensions())
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded(_))
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self.state, LoadState::Pending)
    }

    fn resolve(&mut self, next: LoadState) -> Result<(), Error> {
        if self.is_resolved() {
            return Err(Error::AlreadyResolved {
                id: self.id,
                state: self.state.name(),
            });
        }
        self.state = next;
        Ok(())
    }
}

/// Fixed-length, 0-indexed collection of frames.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    /// Creates `count` pending frames with locators derived from `pattern`.
    pub fn new(count: usize, pattern: &FramePattern) -> Self {
        let frames = (1..=count)
            .map(|id| Frame {
                id,
                locator: pattern.locator_for(id),
                state: LoadState::Pending,
            })
            .collect();
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    /// The frame at `index` if it is drawable.
    pub fn loaded(&self, index: usize) -> Option<&Frame> {
        self.get(index).filter(|frame| frame.is_loaded())
    }

    pub fn mark_loaded(&mut self, index: usize, image: Arc<RgbaImage>) -> Result<(), Error> {
        self.frame_mut(index)?.resolve(LoadState::Loaded(image))
    }

    pub fn mark_failed(&mut self, index: usize) -> Result<(), Error> {
        self.frame_mut(index)?.resolve(LoadState::Failed)
    }

    pub fn loaded_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_loaded()).count()
    }

    pub fn resolved_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_resolved()).count()
    }

    /// True once every frame has left `Pending`.
    pub fn is_settled(&self) -> bool {
        self.resolved_count() == self.len()
    }

    fn frame_mut(&mut self, index: usize) -> Result<&mut Frame, Error> {
        let len = self.frames.len();
        self.frames
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })
    }
}

impl fmt::Display for FrameSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames ({} loaded, {} resolved)",
            self.len(),
            self.loaded_count(),
            self.resolved_count()
        )
    }
}
