use atlas_toolbox_core::prelude::*;

/// Four 32x32 sprites, 2 px padding, Simple Row into a fixed 128x128 page:
/// everything placed, nothing overlapping, a quarter of the page used.
#[test]
fn four_tiles_on_a_fixed_page() {
    let cfg = PackerConfig::builder()
        .method(PackMethod::SimpleRow)
        .manual_size(128, 128)
        .texture_padding(2)
        .build();
    let items = vec![
        ("tile0", 32, 32),
        ("tile1", 32, 32),
        ("tile2", 32, 32),
        ("tile3", 32, 32),
    ];
    let atlas = pack_layout(items, cfg).expect("pack");

    assert_eq!((atlas.width, atlas.height), (128, 128));
    assert_eq!(atlas.frames.len(), 4);
    for i in 0..atlas.frames.len() {
        for j in (i + 1)..atlas.frames.len() {
            let a = &atlas.frames[i].frame;
            let b = &atlas.frames[j].frame;
            let overlap = !(a.x >= b.x + b.w
                || b.x >= a.x + a.w
                || a.y >= b.y + b.h
                || b.y >= a.y + a.h);
            assert!(!overlap);
        }
    }
    let stats = atlas.stats();
    assert!((stats.occupancy - 0.25).abs() < 1e-9);
}

/// Simple Row fills left to right in input order and wraps on width.
#[test]
fn rows_wrap_in_input_order() {
    let cfg = PackerConfig::builder()
        .method(PackMethod::SimpleRow)
        .manual_size(100, 100)
        .texture_padding(0)
        .build();
    let items = vec![("a", 40, 10), ("b", 40, 20), ("c", 40, 10)];
    let atlas = pack_layout(items, cfg).expect("pack");
    let get = |k: &str| atlas.frames.iter().find(|f| f.key == k).unwrap().frame;
    assert_eq!(get("a"), Rect::new(0, 0, 40, 10));
    assert_eq!(get("b"), Rect::new(40, 0, 40, 20));
    // Row height is the tallest sprite seen in the row.
    assert_eq!(get("c"), Rect::new(0, 20, 40, 10));
}

/// A wider page keeps all four tiles on one row.
#[test]
fn single_row_when_width_allows() {
    let cfg = PackerConfig::builder()
        .method(PackMethod::SimpleRow)
        .manual_size(160, 64)
        .texture_padding(0)
        .build();
    let items = vec![("a", 32, 32), ("b", 32, 32), ("c", 32, 32), ("d", 32, 32)];
    let atlas = pack_layout(items, cfg).expect("pack");
    assert!(atlas.frames.iter().all(|f| f.frame.y == 0));
}
