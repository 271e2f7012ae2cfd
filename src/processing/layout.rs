/// Axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whole-image source rectangle.
    pub fn of_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, f64::from(width), f64::from(height))
    }
}

/// Contain-fit placement of an image inside a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f64,
    pub dest: Rect,
}

/// Scales `src` to fit entirely within `viewport`, preserving aspect ratio,
/// and centers it (letterboxed on the short axis).
pub fn contain(src_w: u32, src_h: u32, viewport_w: u32, viewport_h: u32) -> Placement {
    let iw = f64::from(src_w.max(1));
    let ih = f64::from(src_h.max(1));
    let vw = f64::from(viewport_w);
    let vh = f64::from(viewport_h);
    let scale = (vw / iw).min(vh / ih);
    let width = iw * scale;
    let height = ih * scale;
    Placement {
        scale,
        dest: Rect::new((vw - width) / 2.0, (vh - height) / 2.0, width, height),
    }
}
