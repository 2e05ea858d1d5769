use crate::dedup::apply_flip;
use crate::error::{AtlasError, Result};
use crate::model::{Atlas, Frame};
use crate::pipeline::InputSprite;
use image::{DynamicImage, RgbaImage};

/// Rebuild the original sprite bitmaps from a packed atlas page, undoing
/// rotation, flip aliasing and trimming. Feeding the result back into
/// `pack_sprites` regenerates the atlas under a new configuration.
pub fn extract_sprites(atlas: &Atlas, page: &RgbaImage) -> Result<Vec<InputSprite>> {
    let (pw, ph) = page.dimensions();
    if pw < atlas.width || ph < atlas.height {
        return Err(AtlasError::InvalidConfig(format!(
            "page bitmap {}x{} smaller than atlas {}x{}",
            pw, ph, atlas.width, atlas.height
        )));
    }
    atlas
        .frames
        .iter()
        .map(|f| {
            let image = extract_frame(f, page)?;
            Ok(InputSprite {
                key: f.key.clone(),
                image: DynamicImage::ImageRgba8(image),
            })
        })
        .collect()
}

/// Rebuild one sprite at its original (untrimmed) size.
pub fn extract_frame(frame: &Frame, page: &RgbaImage) -> Result<RgbaImage> {
    let r = &frame.frame;
    let (pw, ph) = page.dimensions();
    if r.x + r.w > pw || r.y + r.h > ph {
        return Err(AtlasError::InvalidConfig(format!(
            "frame `{}` rect {:?} outside page {}x{}",
            frame.key, r, pw, ph
        )));
    }

    // Stored content, post-rotation orientation.
    let mut stored = RgbaImage::new(r.w, r.h);
    for y in 0..r.h {
        for x in 0..r.w {
            stored.put_pixel(x, y, *page.get_pixel(r.x + x, r.y + y));
        }
    }
    // Undo the quarter-turn: stored (x, y) came from content (y, h - 1 - x).
    let content = if frame.rotated {
        let (cw, chh) = (r.h, r.w);
        let mut out = RgbaImage::new(cw, chh);
        for y in 0..chh {
            for x in 0..cw {
                out.put_pixel(x, y, *stored.get_pixel(chh - 1 - y, x));
            }
        }
        out
    } else {
        stored
    };
    let content = apply_flip(&content, frame.flip);

    if content.dimensions() != (frame.source.w, frame.source.h) {
        return Err(AtlasError::InvalidConfig(format!(
            "frame `{}` content {}x{} does not match source rect {:?}",
            frame.key,
            content.width(),
            content.height(),
            frame.source
        )));
    }
    let mut original = RgbaImage::new(frame.source_size.0, frame.source_size.1);
    for y in 0..frame.source.h {
        for x in 0..frame.source.w {
            original.put_pixel(
                frame.source.x + x,
                frame.source.y + y,
                *content.get_pixel(x, y),
            );
        }
    }
    Ok(original)
}
