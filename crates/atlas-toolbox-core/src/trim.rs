use crate::model::Rect;
use image::RgbaImage;

/// Minimal bounding box of pixels with alpha above `threshold`, in original
/// image coordinates. Returns `None` when every pixel is at or below the
/// threshold (fully transparent sprite). Pure; callers decide the policy for
/// the `None` case.
pub fn trim_rect(rgba: &RgbaImage, threshold: u8) -> Option<Rect> {
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let opaque_col = |x: u32, y1: u32, y2: u32| (y1..=y2).any(|y| rgba.get_pixel(x, y)[3] > threshold);
    let opaque_row = |y: u32, x1: u32, x2: u32| (x1..=x2).any(|x| rgba.get_pixel(x, y)[3] > threshold);

    let mut x1 = 0;
    while x1 < w && !opaque_col(x1, 0, h - 1) {
        x1 += 1;
    }
    if x1 >= w {
        return None;
    }
    let mut x2 = w - 1;
    while x2 > x1 && !opaque_col(x2, 0, h - 1) {
        x2 -= 1;
    }
    let mut y1 = 0;
    while y1 < h && !opaque_row(y1, x1, x2) {
        y1 += 1;
    }
    let mut y2 = h - 1;
    while y2 > y1 && !opaque_row(y2, x1, x2) {
        y2 -= 1;
    }
    Some(Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1))
}

/// Copy the trimmed sub-rect out of the original image.
pub fn crop(rgba: &RgbaImage, r: &Rect) -> RgbaImage {
    let mut out = RgbaImage::new(r.w, r.h);
    for y in 0..r.h {
        for x in 0..r.w {
            out.put_pixel(x, y, *rgba.get_pixel(r.x + x, r.y + y));
        }
    }
    out
}
