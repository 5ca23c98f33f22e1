use crunch_core::Bitmap;
use image::{Rgba, RgbaImage};

#[test]
fn trim_finds_the_opaque_window() {
    let mut img = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 0]));
    for x in 5..=9 {
        for y in 7..=11 {
            img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
        }
    }
    let b = Bitmap::from_rgba("windowed", img, false, true);
    assert_eq!((b.width, b.height), (5, 5));
    assert_eq!((b.frame_x, b.frame_y), (5, 7));
    assert_eq!((b.frame_w, b.frame_h), (32, 32));
}

#[test]
fn fully_transparent_trims_to_one_pixel_at_origin() {
    let img = RgbaImage::from_pixel(16, 16, Rgba([10, 20, 30, 0]));
    let b = Bitmap::from_rgba("empty", img, false, true);
    assert_eq!((b.width, b.height), (1, 1));
    assert_eq!((b.frame_x, b.frame_y), (0, 0));
    assert_eq!((b.frame_w, b.frame_h), (16, 16));
}

#[test]
fn without_trim_the_frame_is_the_identity_window() {
    let img = RgbaImage::from_pixel(12, 8, Rgba([0, 0, 0, 0]));
    let b = Bitmap::from_rgba("asis", img, false, false);
    assert_eq!((b.width, b.height), (12, 8));
    assert_eq!((b.frame_x, b.frame_y), (0, 0));
    assert_eq!((b.frame_w, b.frame_h), (12, 8));
}

#[test]
fn trim_respects_a_single_opaque_pixel() {
    let mut img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
    img.put_pixel(9, 9, Rgba([1, 1, 1, 1]));
    let b = Bitmap::from_rgba("corner", img, false, true);
    assert_eq!((b.width, b.height), (1, 1));
    assert_eq!((b.frame_x, b.frame_y), (9, 9));
}

#[test]
fn premultiply_rounds_channels_by_alpha() {
    let img = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 128]));
    let b = Bitmap::from_rgba("premul", img, true, false);
    assert_eq!(b.pixels.get_pixel(0, 0), &Rgba([100, 50, 25, 128]));

    let opaque = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 255]));
    let b = Bitmap::from_rgba("opaque", opaque, true, false);
    assert_eq!(b.pixels.get_pixel(0, 0), &Rgba([200, 100, 50, 255]));

    let clear = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 0]));
    let b = Bitmap::from_rgba("clear", clear, true, false);
    assert_eq!(b.pixels.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
}

#[test]
fn equals_requires_matching_dimensions_and_bytes() {
    let a = Bitmap::from_rgba("a", RgbaImage::from_pixel(4, 4, Rgba([5, 5, 5, 255])), false, false);
    let b = Bitmap::from_rgba("b", RgbaImage::from_pixel(4, 4, Rgba([5, 5, 5, 255])), false, false);
    assert!(a.equals(&b));
    assert_eq!(a.hash_value, b.hash_value);

    let mut img = RgbaImage::from_pixel(4, 4, Rgba([5, 5, 5, 255]));
    img.put_pixel(2, 2, Rgba([6, 5, 5, 255]));
    let c = Bitmap::from_rgba("c", img, false, false);
    assert!(!a.equals(&c));
    assert_ne!(a.hash_value, c.hash_value);

    let d = Bitmap::from_rgba("d", RgbaImage::from_pixel(2, 8, Rgba([5, 5, 5, 255])), false, false);
    assert!(!a.equals(&d));
}

#[test]
fn hash_covers_dimensions_not_just_bytes() {
    // same byte stream, different shapes
    let wide = Bitmap::from_rgba("w", RgbaImage::from_pixel(8, 2, Rgba([9, 9, 9, 255])), false, false);
    let tall = Bitmap::from_rgba("t", RgbaImage::from_pixel(2, 8, Rgba([9, 9, 9, 255])), false, false);
    assert_ne!(wide.hash_value, tall.hash_value);
}
