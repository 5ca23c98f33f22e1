use std::path::Path;

use image::{ImageReader, RgbaImage};
use tracing::trace;

use crate::error::Result;
use crate::hash;

/// A named RGBA bitmap plus the trim window into its original frame.
///
/// `width`/`height` are the extents of the (possibly trimmed) pixel data.
/// `frame_x`/`frame_y` locate that data inside the untrimmed image, whose
/// extents are `frame_w`/`frame_h`; without trimming the frame is the
/// identity window.
pub struct Bitmap {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub frame_x: u32,
    pub frame_y: u32,
    pub frame_w: u32,
    pub frame_h: u32,
    pub pixels: RgbaImage,
    /// Content fingerprint over width, height and RGBA bytes. Used as a
    /// duplicate-lookup accelerator; equality still requires `equals`.
    pub hash_value: u64,
}

impl Bitmap {
    /// Decodes a PNG and runs the configured preprocessing.
    pub fn load(
        path: impl AsRef<Path>,
        name: impl Into<String>,
        premultiply: bool,
        trim: bool,
    ) -> Result<Bitmap> {
        let path = path.as_ref();
        trace!(path = %path.display(), "loading bitmap");
        let rgba = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?
            .to_rgba8();
        Ok(Self::from_rgba(name, rgba, premultiply, trim))
    }

    /// Builds a bitmap from an in-memory RGBA buffer.
    pub fn from_rgba(
        name: impl Into<String>,
        rgba: RgbaImage,
        premultiply: bool,
        trim: bool,
    ) -> Bitmap {
        let (orig_w, orig_h) = rgba.dimensions();

        let (mut pixels, frame_x, frame_y) = if trim {
            match opaque_bounds(&rgba) {
                Some((x1, y1, x2, y2)) => {
                    let w = x2 - x1 + 1;
                    let h = y2 - y1 + 1;
                    let cropped = image::imageops::crop_imm(&rgba, x1, y1, w, h).to_image();
                    (cropped, x1, y1)
                }
                // Fully transparent: keep a 1x1 window at the original top-left.
                None => (image::imageops::crop_imm(&rgba, 0, 0, 1, 1).to_image(), 0, 0),
            }
        } else {
            (rgba, 0, 0)
        };

        if premultiply {
            premultiply_in_place(&mut pixels);
        }

        let (width, height) = pixels.dimensions();
        let mut hash_value = 0u64;
        hash::combine(&mut hash_value, width as u64);
        hash::combine(&mut hash_value, height as u64);
        hash::fold_bytes(&mut hash_value, pixels.as_raw());

        Bitmap {
            name: name.into(),
            width,
            height,
            frame_x,
            frame_y,
            frame_w: orig_w,
            frame_h: orig_h,
            pixels,
            hash_value,
        }
    }

    /// Bitwise pixel equality. `hash_value` equality is only a filter.
    pub fn equals(&self, other: &Bitmap) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.pixels.as_raw() == other.pixels.as_raw()
    }
}

/// Smallest window containing every pixel with alpha > 0, as inclusive
/// `(x1, y1, x2, y2)`. `None` when the image is fully transparent.
fn opaque_bounds(rgba: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = rgba.dimensions();
    let mut x1 = w;
    let mut y1 = h;
    let mut x2 = 0;
    let mut y2 = 0;
    for (x, y, px) in rgba.enumerate_pixels() {
        if px[3] > 0 {
            x1 = x1.min(x);
            y1 = y1.min(y);
            x2 = x2.max(x);
            y2 = y2.max(y);
        }
    }
    if x1 > x2 {
        None
    } else {
        Some((x1, y1, x2, y2))
    }
}

/// Scales each color channel by alpha: `round(c * a / 255)`.
fn premultiply_in_place(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let a = px[3] as u32;
        for c in 0..3 {
            px[c] = ((px[c] as u32 * a + 127) / 255) as u8;
        }
    }
}
