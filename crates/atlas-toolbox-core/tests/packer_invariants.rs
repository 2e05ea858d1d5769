use atlas_toolbox_core::prelude::*;
use rand::{Rng, SeedableRng};

const METHODS: [PackMethod; 6] = [
    PackMethod::MaxRects,
    PackMethod::Guillotine,
    PackMethod::Shelf,
    PackMethod::ShelfFfdh,
    PackMethod::Skyline,
    PackMethod::SimpleRow,
];

fn random_items(seed: u64, n: usize) -> Vec<(String, u32, u32)> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let w = rng.gen_range(4..=64);
            let h = rng.gen_range(4..=64);
            (format!("r{}", i), w, h)
        })
        .collect()
}

fn cfg(method: PackMethod) -> PackerConfig {
    PackerConfig::builder()
        .method(method)
        .texture_padding(2)
        .allow_rotation(method != PackMethod::SimpleRow)
        .build()
}

fn assert_disjoint(frames: &[Frame]) {
    for i in 0..frames.len() {
        for j in (i + 1)..frames.len() {
            let a = &frames[i].frame;
            let b = &frames[j].frame;
            let overlap = !(a.x >= b.x + b.w
                || b.x >= a.x + a.w
                || a.y >= b.y + b.h
                || b.y >= a.y + a.h);
            assert!(
                !overlap,
                "frames overlap: {} {:?} vs {} {:?}",
                frames[i].key, a, frames[j].key, b
            );
        }
    }
}

#[test]
fn all_methods_place_every_sprite_disjoint_and_in_bounds() {
    for method in METHODS {
        let atlas = pack_layout(random_items(42, 120), cfg(method)).expect("pack");
        assert_eq!(atlas.frames.len(), 120, "{method} dropped sprites");
        assert_disjoint(&atlas.frames);
        for f in &atlas.frames {
            assert!(
                f.frame.right() + 1 <= atlas.width && f.frame.bottom() + 1 <= atlas.height,
                "{method}: frame {:?} outside {}x{}",
                f.frame,
                atlas.width,
                atlas.height
            );
        }
    }
}

#[test]
fn identical_inputs_yield_identical_placements() {
    for method in METHODS {
        let a = pack_layout(random_items(7, 80), cfg(method)).expect("pack");
        let b = pack_layout(random_items(7, 80), cfg(method)).expect("pack");
        assert_eq!(a.width, b.width);
        assert_eq!(a.height, b.height);
        assert_eq!(a.frames.len(), b.frames.len());
        for (fa, fb) in a.frames.iter().zip(b.frames.iter()) {
            assert_eq!(fa.key, fb.key);
            assert_eq!(fa.frame, fb.frame, "{method} placement differs");
            assert_eq!(fa.rotated, fb.rotated);
        }
    }
}

#[test]
fn padding_is_respected_between_frames() {
    let pad = 4u32;
    for method in METHODS {
        let mut c = cfg(method);
        c.texture_padding = pad;
        let atlas = pack_layout(random_items(11, 40), c).expect("pack");
        // Reserved slots are content rects grown by half padding on each
        // side; they must stay disjoint.
        let half = pad / 2;
        for i in 0..atlas.frames.len() {
            for j in (i + 1)..atlas.frames.len() {
                let a = &atlas.frames[i].frame;
                let b = &atlas.frames[j].frame;
                let (ax1, ay1) = (a.x - half, a.y - half);
                let (bx1, by1) = (b.x - half, b.y - half);
                let overlap = !(ax1 + a.w + pad <= bx1
                    || bx1 + b.w + pad <= ax1
                    || ay1 + a.h + pad <= by1
                    || by1 + b.h + pad <= ay1);
                assert!(!overlap, "{method}: padded slots overlap");
            }
        }
    }
}

#[test]
fn rotation_disabled_never_rotates() {
    for method in METHODS {
        let mut c = cfg(method);
        c.allow_rotation = false;
        let atlas = pack_layout(random_items(3, 60), c).expect("pack");
        assert!(atlas.frames.iter().all(|f| !f.rotated), "{method} rotated");
    }
}

#[test]
fn simple_row_never_rotates() {
    let mut c = cfg(PackMethod::SimpleRow);
    c.allow_rotation = true;
    let atlas = pack_layout(random_items(9, 60), c).expect("pack");
    assert!(atlas.frames.iter().all(|f| !f.rotated));
}
