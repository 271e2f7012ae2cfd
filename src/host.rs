//! Page-side outputs: loading indicator, ambient light and overlays.
use std::collections::HashMap;

use tracing::{debug, info, trace};

use crate::overlay::{LIGHT_ELEMENT, Lighting, Overlay};

/// Element whose width tracks preload progress.
pub const PROGRESS_ELEMENT: &str = "progress-fill";
/// Element hidden once animation starts.
pub const LOADER_ELEMENT: &str = "loader";

/// Receives the non-canvas outputs of the animation.
pub trait PageHost {
    /// Width of the progress bar, in percent.
    fn set_loading_progress(&mut self, percent: f64);

    fn hide_loader(&mut self);

    fn set_lighting(&mut self, lighting: &Lighting);

    fn set_overlay_active(&mut self, overlay: Overlay, active: bool);
}

/// Reflects page outputs as tracing events.
#[derive(Debug, Default)]
pub struct TracingHost {
    loader_hidden: bool,
    overlays: HashMap<Overlay, bool>,
    lighting: Option<Lighting>,
}

impl TracingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loader_hidden(&self) -> bool {
        self.loader_hidden
    }

    pub fn lighting(&self) -> Option<Lighting> {
        self.lighting
    }

    pub fn overlay_active(&self, overlay: Overlay) -> bool {
        self.overlays.get(&overlay).copied().unwrap_or(false)
    }
}

impl PageHost for TracingHost {
    fn set_loading_progress(&mut self, percent: f64) {
        debug!(element = PROGRESS_ELEMENT, width = %format_args!("{percent}%"), "preload progress");
    }

    fn hide_loader(&mut self) {
        if !self.loader_hidden {
            info!(element = LOADER_ELEMENT, "loader hidden");
        }
        self.loader_hidden = true;
    }

    fn set_lighting(&mut self, lighting: &Lighting) {
        trace!(
            element = LIGHT_ELEMENT,
            opacity = lighting.opacity,
            transform = %lighting.transform(),
            "lighting"
        );
        self.lighting = Some(*lighting);
    }

    fn set_overlay_active(&mut self, overlay: Overlay, active: bool) {
        let previous = self.overlays.insert(overlay, active).unwrap_or(false);
        if previous != active {
            info!(element = overlay.element_id(), active, "overlay toggled");
        }
    }
}
