//! Page rendering: blits placed bitmaps into an RGBA canvas.

use image::RgbaImage;

use crate::bitmap::Bitmap;
use crate::packer::Packer;

/// Composes a packer's page into a fresh canvas. Duplicate placements are
/// skipped; their pixels are already on the page.
pub fn render_page(packer: &Packer) -> RgbaImage {
    let mut canvas = RgbaImage::new(packer.width, packer.height);
    for (bitmap, point) in packer.bitmaps.iter().zip(&packer.points) {
        if point.dup_id.is_some() {
            continue;
        }
        if point.rot {
            copy_pixels_rot(bitmap, &mut canvas, point.x, point.y);
        } else {
            copy_pixels(bitmap, &mut canvas, point.x, point.y);
        }
        if packer.stretch > 0 {
            let (w, h) = if point.rot {
                (bitmap.height, bitmap.width)
            } else {
                (bitmap.width, bitmap.height)
            };
            stretch_pixels(&mut canvas, point.x, point.y, w, h, packer.stretch);
        }
    }
    canvas
}

/// Blits `src` with its top-left at `(x, y)`.
pub fn copy_pixels(src: &Bitmap, canvas: &mut RgbaImage, x: u32, y: u32) {
    let (cw, ch) = canvas.dimensions();
    for (sx, sy, px) in src.pixels.enumerate_pixels() {
        let dx = x + sx;
        let dy = y + sy;
        if dx < cw && dy < ch {
            canvas.put_pixel(dx, dy, *px);
        }
    }
}

/// Blits `src` rotated 90° clockwise: source `(sx, sy)` lands at
/// `(x + (src.height - 1 - sy), y + sx)`.
pub fn copy_pixels_rot(src: &Bitmap, canvas: &mut RgbaImage, x: u32, y: u32) {
    let (cw, ch) = canvas.dimensions();
    for (sx, sy, px) in src.pixels.enumerate_pixels() {
        let dx = x + (src.height - 1 - sy);
        let dy = y + sx;
        if dx < cw && dy < ch {
            canvas.put_pixel(dx, dy, *px);
        }
    }
}

/// Extends the `s`-pixel border around the placed rectangle `(x, y, w, h)`
/// by replicating the outermost row/column (edge clamp), corners included.
pub fn stretch_pixels(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, s: u32) {
    if w == 0 || h == 0 {
        return;
    }
    let (cw, ch) = canvas.dimensions();
    let x2 = x + w - 1;
    let y2 = y + h - 1;
    for e in 1..=s {
        // top and bottom rows
        for xx in x..=x2.min(cw.saturating_sub(1)) {
            if y >= e {
                let px = *canvas.get_pixel(xx, y);
                canvas.put_pixel(xx, y - e, px);
            }
            if y2 + e < ch {
                let px = *canvas.get_pixel(xx, y2);
                canvas.put_pixel(xx, y2 + e, px);
            }
        }
        // left and right columns
        for yy in y..=y2.min(ch.saturating_sub(1)) {
            if x >= e {
                let px = *canvas.get_pixel(x, yy);
                canvas.put_pixel(x - e, yy, px);
            }
            if x2 + e < cw {
                let px = *canvas.get_pixel(x2, yy);
                canvas.put_pixel(x2 + e, yy, px);
            }
        }
    }
    // corners replicate the nearest corner pixel
    for ex in 1..=s {
        for ey in 1..=s {
            if x >= ex && y >= ey {
                let px = *canvas.get_pixel(x, y);
                canvas.put_pixel(x - ex, y - ey, px);
            }
            if x2 + ex < cw && y >= ey {
                let px = *canvas.get_pixel(x2, y);
                canvas.put_pixel(x2 + ex, y - ey, px);
            }
            if x >= ex && y2 + ey < ch {
                let px = *canvas.get_pixel(x, y2);
                canvas.put_pixel(x - ex, y2 + ey, px);
            }
            if x2 + ex < cw && y2 + ey < ch {
                let px = *canvas.get_pixel(x2, y2);
                canvas.put_pixel(x2 + ex, y2 + ey, px);
            }
        }
    }
}
