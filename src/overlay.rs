//! Ambient lighting and text-overlay visibility as functions of progress.
use std::fmt;

use crate::host::PageHost;

/// Element carrying the ambient light styles.
pub const LIGHT_ELEMENT: &str = "ambient-light";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub opacity: f64,
    pub scale: f64,
}

impl Lighting {
    /// CSS transform keeping the light centered while it grows.
    pub fn transform(&self) -> String {
        format!("translate(-50%, -50%) scale({})", self.scale)
    }
}

/// Piecewise-linear light intensity: dim idle, power up, peak, dim again.
pub fn lighting_for(progress: f64) -> Lighting {
    let opacity = if progress < 0.2 {
        0.3 + progress * 0.5
    } else if progress < 0.5 {
        0.4 + (progress - 0.2) * 1.5
    } else if progress < 0.8 {
        0.85 - (progress - 0.5) * 0.5
    } else {
        0.7 - (progress - 0.8) * 1.5
    };
    Lighting {
        opacity,
        scale: 1.0 + progress * 0.2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    Intro,
    Expansion,
    Exploded,
    CallToAction,
}

impl Overlay {
    pub const ALL: [Self; 4] = [
        Self::Intro,
        Self::Expansion,
        Self::Exploded,
        Self::CallToAction,
    ];

    pub fn element_id(&self) -> &'static str {
        match self {
            Self::Intro => "overlay-1",
            Self::Expansion => "overlay-2",
            Self::Exploded => "overlay-3",
            Self::CallToAction => "overlay-4",
        }
    }

    /// Visibility band on progress expressed in percent. The bands leave
    /// gaps at 20-25, 50-55 and 80-85 where no overlay shows.
    pub fn is_active(&self, progress: f64) -> bool {
        let p = progress * 100.0;
        match self {
            Self::Intro => (0.0..20.0).contains(&p),
            Self::Expansion => p > 25.0 && p < 50.0,
            Self::Exploded => p > 55.0 && p < 80.0,
            Self::CallToAction => p > 85.0 && p <= 100.0,
        }
    }
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayFlags(pub [bool; 4]);

impl OverlayFlags {
    pub fn get(&self, overlay: Overlay) -> bool {
        self.0[overlay as usize]
    }
}

pub fn overlay_flags_for(progress: f64) -> OverlayFlags {
    OverlayFlags(Overlay::ALL.map(|overlay| overlay.is_active(progress)))
}

/// Pushes lighting and overlay state for a progress value to the page.
#[derive(Debug, Default, Clone, Copy)]
pub struct OverlayPresenter;

impl OverlayPresenter {
    pub fn present<H: PageHost + ?Sized>(&self, host: &mut H, progress: f64) {
        host.set_lighting(&lighting_for(progress));
        let flags = overlay_flags_for(progress);
        for overlay in Overlay::ALL {
            host.set_overlay_active(overlay, flags.get(overlay));
        }
    }
}
