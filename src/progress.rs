//! Scroll offset to progress, and progress to frame indices.
//!
//! Discrete selection partitions progress into `N` equal buckets. Continuous
//! selection walks the `N - 1` steps between frames and reports the
//! fractional weight of the upper frame. The two are intentionally distinct.

/// Normalizes a scroll offset against the scrollable height.
///
/// Degenerate geometry (non-positive or NaN height, NaN offset) maps to 0.
pub fn raw_offset_to_progress(scroll_top: f64, scrollable_height: f64) -> f64 {
    if scrollable_height.is_nan() || scrollable_height <= 0.0 {
        return 0.0;
    }
    clamp_progress(scroll_top / scrollable_height)
}

/// Clamps to [0, 1], treating NaN as 0.
pub fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

/// Scrollable height of a container: content height minus the viewport.
pub fn scrollable_height(content_height: f64, viewport_height: f64) -> f64 {
    content_height - viewport_height
}

/// Nearest-bucket frame index: `min(N - 1, floor(p * N))`.
pub fn discrete_index(progress: f64, frame_count: usize) -> usize {
    let last = frame_count.saturating_sub(1);
    let bucket = (clamp_progress(progress) * frame_count as f64).floor() as usize;
    bucket.min(last)
}

/// Two neighbouring frames and the weight of `upper` over `lower`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blend {
    pub lower: usize,
    pub upper: usize,
    /// In `[0, 1)`.
    pub weight: f64,
}

/// Interpolated selection over `N - 1` steps.
pub fn continuous_blend(progress: f64, frame_count: usize) -> Blend {
    let last = frame_count.saturating_sub(1);
    let float_index = clamp_progress(progress) * last as f64;
    let lower = float_index.floor();
    Blend {
        lower: lower as usize,
        upper: (float_index.ceil() as usize).min(last),
        weight: float_index - lower,
    }
}
