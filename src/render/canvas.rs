//! Software drawing surface backed by an RGBA8 buffer.
use std::path::Path;

use anyhow::{Result, ensure};
use fast_image_resize as fir;
use image::RgbaImage;
use tracing::{debug, warn};

use crate::error::Error;
use crate::processing::layout::Rect;
use crate::render::surface::DrawSurface;

/// Viewport-sized canvas composited with straight-alpha source-over.
#[derive(Debug, Clone)]
pub struct RgbaCanvas {
    pixels: RgbaImage,
    alpha: f64,
}

impl RgbaCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            alpha: 1.0,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn save_png(&self, path: &Path) -> Result<(), Error> {
        self.pixels
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(Error::from)
    }

    fn composite(&mut self, layer: &RgbaImage, left: i64, top: i64) {
        let alpha = self.alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let (cw, ch) = (i64::from(self.pixels.width()), i64::from(self.pixels.height()));
        for (lx, ly, src) in layer.enumerate_pixels() {
            let x = left + i64::from(lx);
            let y = top + i64::from(ly);
            if x < 0 || y < 0 || x >= cw || y >= ch {
                continue;
            }
            let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
            let sa = f64::from(src[3]) / 255.0 * alpha;
            let da = f64::from(dst[3]) / 255.0;
            let out_a = sa + da * (1.0 - sa);
            if out_a <= 0.0 {
                continue;
            }
            for c in 0..3 {
                let sc = f64::from(src[c]);
                let dc = f64::from(dst[c]);
                let v = (sc * sa + dc * da * (1.0 - sa)) / out_a;
                dst[c] = v.round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

impl DrawSurface for RgbaCanvas {
    fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            px.0 = [0, 0, 0, 0];
        }
    }

    /// Resizing discards the current contents, like a canvas element does.
    fn resize(&mut self, width: u32, height: u32) {
        if self.pixels.dimensions() != (width, height) {
            self.pixels = RgbaImage::new(width, height);
        }
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    fn draw_image(&mut self, frame_id: usize, image: &RgbaImage, src: Rect, dst: Rect) {
        let width = dst.width.round();
        let height = dst.height.round();
        if width < 1.0 || height < 1.0 {
            return;
        }
        let layer = match scale_region(image, src, width as u32, height as u32) {
            Ok(layer) => layer,
            Err(err) => {
                warn!(frame = frame_id, "dropping draw: {err:#}");
                return;
            }
        };
        debug!(
            frame = frame_id,
            alpha = self.alpha,
            x = dst.x,
            y = dst.y,
            w = width,
            h = height,
            "draw"
        );
        self.composite(&layer, dst.x.round() as i64, dst.y.round() as i64);
    }
}

/// Crops `src` out of `image` and resamples it to `width` x `height`.
fn scale_region(image: &RgbaImage, src: Rect, width: u32, height: u32) -> Result<RgbaImage> {
    let (iw, ih) = (f64::from(image.width()), f64::from(image.height()));
    let left = src.x.clamp(0.0, iw);
    let top = src.y.clamp(0.0, ih);
    let crop_w = src.width.min(iw - left);
    let crop_h = src.height.min(ih - top);
    ensure!(crop_w > 0.0 && crop_h > 0.0, "source region is empty");

    let view = fir::images::ImageRef::new(
        image.width(),
        image.height(),
        image.as_raw(),
        fir::PixelType::U8x4,
    )?;
    let mut layer = RgbaImage::new(width, height);
    {
        let mut out = fir::images::Image::from_slice_u8(width, height, &mut layer, fir::PixelType::U8x4)?;
        let options = fir::ResizeOptions::new()
            .crop(left, top, crop_w, crop_h)
            .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
        fir::Resizer::new().resize(&view, &mut out, &options)?;
    }
    Ok(layer)
}
