use atlas_toolbox_core::dedup::apply_flip;
use atlas_toolbox_core::prelude::*;
use image::{DynamicImage, Rgba, RgbaImage};

/// Asymmetric 8x8 test bitmap.
fn hero() -> RgbaImage {
    let mut img = RgbaImage::new(8, 8);
    for y in 0..8u32 {
        for x in 0..8u32 {
            img.put_pixel(x, y, Rgba([(x * 31) as u8, (y * 17) as u8, x as u8 ^ y as u8, 255]));
        }
    }
    img
}

fn sprite(key: &str, img: RgbaImage) -> InputSprite {
    InputSprite {
        key: key.into(),
        image: DynamicImage::ImageRgba8(img),
    }
}

fn cfg() -> PackerConfig {
    PackerConfig::builder()
        .texture_padding(0)
        .trim(false)
        .allow_flip_dedup(true)
        .build()
}

#[test]
fn mirror_pair_shares_one_stored_rect() {
    let left = hero();
    let right = apply_flip(&left, FlipTransform::Horizontal);
    let out = pack_sprites(
        vec![sprite("hero_l", left), sprite("hero_r", right)],
        cfg(),
    )
    .expect("pack");

    assert_eq!(out.atlas.frames.len(), 2);
    let canon = out.atlas.frames.iter().find(|f| f.key == "hero_l").unwrap();
    let alias = out.atlas.frames.iter().find(|f| f.key == "hero_r").unwrap();

    // First-encountered sprite stays canonical.
    assert!(canon.flip_of.is_none());
    assert_eq!(canon.flip, FlipTransform::None);
    assert_eq!(alias.flip_of.as_deref(), Some("hero_l"));
    assert_eq!(alias.flip, FlipTransform::Horizontal);
    // One stored bitmap: both placements reference the same atlas rect.
    assert_eq!(alias.frame, canon.frame);

    let stats = out.stats();
    assert_eq!(stats.num_frames, 2);
    assert_eq!(stats.num_aliases, 1);
    assert_eq!(stats.used_area, 64);
}

#[test]
fn alias_round_trip_reproduces_variant() {
    let left = hero();
    let right = apply_flip(&left, FlipTransform::Horizontal);
    let out = pack_sprites(
        vec![sprite("hero_l", left), sprite("hero_r", right.clone())],
        cfg(),
    )
    .expect("pack");
    let alias = out.atlas.frames.iter().find(|f| f.key == "hero_r").unwrap();

    // Cut the stored rect back out of the page and apply the recorded flip.
    let mut stored = RgbaImage::new(alias.frame.w, alias.frame.h);
    for y in 0..alias.frame.h {
        for x in 0..alias.frame.w {
            stored.put_pixel(x, y, *out.rgba.get_pixel(alias.frame.x + x, alias.frame.y + y));
        }
    }
    let rebuilt = apply_flip(&stored, alias.flip);
    assert_eq!(rebuilt.as_raw(), right.as_raw());
}

#[test]
fn vertical_and_both_variants_are_detected() {
    let base = hero();
    let out = pack_sprites(
        vec![
            sprite("a", base.clone()),
            sprite("b", apply_flip(&base, FlipTransform::Vertical)),
            sprite("c", apply_flip(&base, FlipTransform::Both)),
        ],
        cfg(),
    )
    .expect("pack");
    let b = out.atlas.frames.iter().find(|f| f.key == "b").unwrap();
    let c = out.atlas.frames.iter().find(|f| f.key == "c").unwrap();
    assert_eq!(b.flip, FlipTransform::Vertical);
    assert_eq!(c.flip, FlipTransform::Both);
    assert_eq!(out.stats().num_aliases, 2);
}

#[test]
fn dedup_disabled_stores_both_bitmaps() {
    let left = hero();
    let right = apply_flip(&left, FlipTransform::Horizontal);
    let mut c = cfg();
    c.allow_flip_dedup = false;
    let out = pack_sprites(
        vec![sprite("hero_l", left), sprite("hero_r", right)],
        c,
    )
    .expect("pack");
    let [f0, f1] = [&out.atlas.frames[0], &out.atlas.frames[1]];
    assert!(f0.flip_of.is_none() && f1.flip_of.is_none());
    assert_ne!(f0.frame, f1.frame);
    assert_eq!(out.stats().used_area, 128);
}

#[test]
fn dedup_happens_after_trimming() {
    // Same content at different offsets inside the canvas; post-trim the
    // bitmaps are identical, so the second becomes an identity alias.
    let core = hero();
    let mut a = RgbaImage::new(16, 16);
    let mut b = RgbaImage::new(20, 12);
    for y in 0..8u32 {
        for x in 0..8u32 {
            a.put_pixel(2 + x, 3 + y, *core.get_pixel(x, y));
            b.put_pixel(10 + x, 1 + y, *core.get_pixel(x, y));
        }
    }
    let mut c = cfg();
    c.trim = true;
    let out = pack_sprites(vec![sprite("a", a), sprite("b", b)], c).expect("pack");
    let fb = out.atlas.frames.iter().find(|f| f.key == "b").unwrap();
    assert_eq!(fb.flip_of.as_deref(), Some("a"));
    assert_eq!(fb.flip, FlipTransform::None);
    // Each alias keeps its own trim offsets for reconstruction.
    assert_eq!(fb.source, Rect::new(10, 1, 8, 8));
    assert_eq!(fb.source_size, (20, 12));
}
