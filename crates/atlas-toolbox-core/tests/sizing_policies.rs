use atlas_toolbox_core::AtlasError;
use atlas_toolbox_core::prelude::*;
use rand::{Rng, SeedableRng};

fn is_pow2(v: u32) -> bool {
    v != 0 && (v & (v - 1)) == 0
}

#[test]
fn automatic_covers_total_sprite_area() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(2024);
    let mut items: Vec<(String, u32, u32)> = Vec::new();
    let mut total = 0u64;
    for i in 0..150u32 {
        let w = rng.gen_range(1..=48);
        let h = rng.gen_range(1..=48);
        total += w as u64 * h as u64;
        items.push((format!("r{}", i), w, h));
    }
    let cfg = PackerConfig::builder().texture_padding(0).build();
    let atlas = pack_layout(items, cfg).expect("pack");
    assert!(atlas.width as u64 * atlas.height as u64 >= total);
}

#[test]
fn pow2_rounds_each_axis_independently() {
    let cfg = PackerConfig::builder().texture_padding(0).pow2(true).build();
    let atlas = pack_layout(vec![("big", 300, 200)], cfg).expect("pack");
    assert_eq!((atlas.width, atlas.height), (512, 256));
}

#[test]
fn pow2_dimensions_cover_content() {
    let cfg = PackerConfig::builder().texture_padding(3).pow2(true).build();
    let atlas = pack_layout(
        vec![("a", 100, 40), ("b", 60, 60), ("c", 30, 90)],
        cfg,
    )
    .expect("pack");
    assert!(is_pow2(atlas.width));
    assert!(is_pow2(atlas.height));
    for f in &atlas.frames {
        assert!(f.frame.right() + 1 <= atlas.width);
        assert!(f.frame.bottom() + 1 <= atlas.height);
    }
}

#[test]
fn min_max_range_too_small_is_reported() {
    let cfg = PackerConfig::builder()
        .texture_padding(0)
        .min_max_size(64, 64)
        .build();
    match pack_layout(vec![("big", 100, 100)], cfg) {
        Err(AtlasError::NoFittingSize { min, max }) => {
            assert_eq!((min, max), (64, 64));
        }
        other => panic!("expected NoFittingSize, got {:?}", other.map(|a| (a.width, a.height))),
    }
}

#[test]
fn min_max_raises_small_content_to_min() {
    let cfg = PackerConfig::builder()
        .texture_padding(0)
        .min_max_size(128, 512)
        .build();
    let atlas = pack_layout(vec![("dot", 10, 10)], cfg).expect("pack");
    assert_eq!((atlas.width, atlas.height), (128, 128));
}

#[test]
fn manual_size_is_exact_and_never_resized() {
    let cfg = PackerConfig::builder()
        .texture_padding(0)
        .manual_size(256, 192)
        .build();
    let atlas = pack_layout(vec![("dot", 10, 10)], cfg).expect("pack");
    assert_eq!((atlas.width, atlas.height), (256, 192));
}

#[test]
fn manual_too_small_reports_insufficient_space() {
    let cfg = PackerConfig::builder()
        .texture_padding(0)
        .manual_size(16, 16)
        .build();
    match pack_layout(vec![("a", 12, 12), ("b", 32, 32)], cfg) {
        Err(AtlasError::InsufficientSpace {
            width,
            height,
            placed,
            total,
        }) => {
            assert_eq!((width, height), (16, 16));
            assert!(placed < total);
            assert_eq!(total, 2);
        }
        other => panic!("expected InsufficientSpace, got {:?}", other.map(|a| (a.width, a.height))),
    }
}

#[test]
fn oversized_sprite_exhausts_the_search() {
    let cfg = PackerConfig::builder().texture_padding(0).build();
    match pack_layout(vec![("vast", 20000, 4)], cfg) {
        Err(AtlasError::SizeSearchExhausted { max_dimension }) => {
            assert_eq!(max_dimension, 16384);
        }
        other => panic!("expected SizeSearchExhausted, got {:?}", other.map(|a| (a.width, a.height))),
    }
}

#[test]
fn automatic_shrinks_to_content_bounding_box() {
    // One wide strip: the page must hug the content, not the search
    // envelope.
    let cfg = PackerConfig::builder().texture_padding(0).build();
    let atlas = pack_layout(vec![("strip", 120, 8)], cfg).expect("pack");
    assert_eq!((atlas.width, atlas.height), (120, 8));
}

#[test]
fn invalid_ranges_are_rejected() {
    let cfg = PackerConfig::builder().min_max_size(512, 64).build();
    assert!(matches!(
        pack_layout(vec![("a", 8, 8)], cfg),
        Err(AtlasError::InvalidConfig(_))
    ));
    let cfg = PackerConfig::builder().manual_size(0, 128).build();
    assert!(matches!(
        pack_layout(vec![("a", 8, 8)], cfg),
        Err(AtlasError::InvalidConfig(_))
    ));
}

#[test]
fn empty_input_is_rejected() {
    let items: Vec<(String, u32, u32)> = Vec::new();
    assert!(matches!(
        pack_layout(items, PackerConfig::default()),
        Err(AtlasError::Empty)
    ));
}
