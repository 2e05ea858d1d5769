use atlas_toolbox_core::prelude::*;
use rand::{Rng, SeedableRng};

const PORTFOLIO: [PackMethod; 6] = [
    PackMethod::MaxRects,
    PackMethod::Skyline,
    PackMethod::Guillotine,
    PackMethod::ShelfFfdh,
    PackMethod::Shelf,
    PackMethod::SimpleRow,
];

fn random_items(seed: u64, n: usize) -> Vec<(String, u32, u32)> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let w = rng.gen_range(8..=56);
            let h = rng.gen_range(8..=56);
            (format!("s{}", i), w, h)
        })
        .collect()
}

fn cfg(method: PackMethod) -> PackerConfig {
    PackerConfig::builder()
        .method(method)
        .texture_padding(2)
        .build()
}

#[test]
fn auto_is_at_least_as_efficient_as_every_method() {
    let auto = pack_layout(random_items(5, 90), cfg(PackMethod::Auto)).expect("pack");
    let auto_area = auto.width as u64 * auto.height as u64;
    assert!(PORTFOLIO.contains(&auto.method));
    for method in PORTFOLIO {
        let single = pack_layout(random_items(5, 90), cfg(method)).expect("pack");
        let area = single.width as u64 * single.height as u64;
        assert!(
            auto_area <= area,
            "auto ({}, {} px²) lost to {} ({} px²)",
            auto.method,
            auto_area,
            method,
            area
        );
    }
}

#[test]
fn auto_is_deterministic() {
    let a = pack_layout(random_items(17, 60), cfg(PackMethod::Auto)).expect("pack");
    let b = pack_layout(random_items(17, 60), cfg(PackMethod::Auto)).expect("pack");
    assert_eq!(a.method, b.method);
    assert_eq!((a.width, a.height), (b.width, b.height));
    for (fa, fb) in a.frames.iter().zip(b.frames.iter()) {
        assert_eq!(fa.frame, fb.frame);
    }
}

#[test]
fn auto_reports_the_winning_method() {
    // A single sprite ties every method on efficiency, so the fixed
    // priority order decides.
    let atlas = pack_layout(vec![("only", 30, 20)], cfg(PackMethod::Auto)).expect("pack");
    assert_eq!(atlas.method, PackMethod::MaxRects);
}

#[test]
fn maxrects_auto_heuristic_is_tried() {
    let mut c = cfg(PackMethod::MaxRects);
    c.mr_heuristic = MaxRectsHeuristic::Auto;
    let best = pack_layout(random_items(23, 70), c).expect("pack");
    for heuristic in [
        MaxRectsHeuristic::BestAreaFit,
        MaxRectsHeuristic::BestShortSideFit,
        MaxRectsHeuristic::BottomLeft,
    ] {
        let mut c = cfg(PackMethod::MaxRects);
        c.mr_heuristic = heuristic;
        let single = pack_layout(random_items(23, 70), c).expect("pack");
        assert!(
            best.width as u64 * best.height as u64
                <= single.width as u64 * single.height as u64
        );
    }
}

#[test]
fn manual_size_errors_surface_from_auto() {
    let mut c = cfg(PackMethod::Auto);
    c.size = SizePolicy::Manual {
        width: 16,
        height: 16,
    };
    assert!(pack_layout(vec![("big", 64, 64)], c).is_err());
}
