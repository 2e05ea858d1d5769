use crate::model::Rect;
use image::RgbaImage;

/// Blit the `src_rect` portion of `src` into `canvas` with its top-left at
/// `(dx, dy)`, rotating 90° clockwise when `rotated`. Pixels falling outside
/// the canvas are dropped.
pub fn blit_rgba(
    src: &RgbaImage,
    canvas: &mut RgbaImage,
    dx: u32,
    dy: u32,
    src_rect: &Rect,
    rotated: bool,
) {
    let (cw, ch) = canvas.dimensions();
    let (rw, rh) = if rotated {
        (src_rect.h, src_rect.w)
    } else {
        (src_rect.w, src_rect.h)
    };
    for yy in 0..rh {
        for xx in 0..rw {
            let (sx, sy) = if rotated {
                // 90° CW: destination column xx reads source row from the
                // bottom up.
                (src_rect.x + yy, src_rect.y + (src_rect.h - 1 - xx))
            } else {
                (src_rect.x + xx, src_rect.y + yy)
            };
            if dx + xx < cw && dy + yy < ch {
                canvas.put_pixel(dx + xx, dy + yy, *src.get_pixel(sx, sy));
            }
        }
    }
}
