use atlas_toolbox_core::prelude::*;
use image::{DynamicImage, Rgba, RgbaImage};

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> DynamicImage {
    let mut img = RgbaImage::new(w, h);
    for p in img.pixels_mut() {
        *p = Rgba(rgba);
    }
    DynamicImage::ImageRgba8(img)
}

fn sprite(key: &str, image: DynamicImage) -> InputSprite {
    InputSprite {
        key: key.into(),
        image,
    }
}

#[test]
fn composed_page_matches_sources() {
    let cfg = PackerConfig::builder().texture_padding(0).trim(false).build();
    let red = [200, 10, 10, 255];
    let blue = [10, 10, 200, 255];
    let out = pack_sprites(
        vec![
            sprite("red", solid(8, 8, red)),
            sprite("blue", solid(4, 4, blue)),
        ],
        cfg,
    )
    .expect("pack");

    assert_eq!(out.rgba.dimensions(), (out.atlas.width, out.atlas.height));
    let mut red_count = 0;
    let mut blue_count = 0;
    for p in out.rgba.pixels() {
        if p.0 == red {
            red_count += 1;
        } else if p.0 == blue {
            blue_count += 1;
        } else {
            assert_eq!(p.0[3], 0, "unexpected opaque pixel {:?}", p.0);
        }
    }
    assert_eq!(red_count, 64);
    assert_eq!(blue_count, 16);

    for f in &out.atlas.frames {
        let expect = if f.key == "red" { red } else { blue };
        for y in 0..f.frame.h {
            for x in 0..f.frame.w {
                assert_eq!(out.rgba.get_pixel(f.frame.x + x, f.frame.y + y).0, expect);
            }
        }
    }
}

#[test]
fn rotated_placement_is_a_quarter_turn_clockwise() {
    // A 2x6 sprite only fits an 8x4 page on its side.
    let mut img = RgbaImage::new(2, 6);
    for y in 0..6u32 {
        for x in 0..2u32 {
            img.put_pixel(x, y, Rgba([(10 + x * 100) as u8, (10 + y * 40) as u8, 0, 255]));
        }
    }
    let cfg = PackerConfig::builder()
        .texture_padding(0)
        .trim(false)
        .allow_rotation(true)
        .manual_size(8, 4)
        .build();
    let out = pack_sprites(
        vec![sprite("tall", DynamicImage::ImageRgba8(img.clone()))],
        cfg,
    )
    .expect("pack");
    let f = &out.atlas.frames[0];
    assert!(f.rotated);
    assert_eq!((f.frame.w, f.frame.h), (6, 2));

    // Source pixel (sx, sy) lands at (h - 1 - sy, sx) inside the rotated
    // frame.
    for sy in 0..6u32 {
        for sx in 0..2u32 {
            let dst_x = f.frame.x + (6 - 1 - sy);
            let dst_y = f.frame.y + sx;
            assert_eq!(
                out.rgba.get_pixel(dst_x, dst_y).0,
                img.get_pixel(sx, sy).0,
                "source ({sx},{sy})"
            );
        }
    }
}

#[test]
fn layout_only_runs_produce_no_pixels() {
    let cfg = PackerConfig::builder().texture_padding(0).build();
    let atlas = pack_layout(vec![("a", 8, 8), ("b", 4, 4)], cfg).expect("pack");
    assert_eq!(atlas.frames.len(), 2);
}
