use crate::config::{PackerConfig, SizePolicy};
use crate::error::AtlasError;
use crate::model::{Frame, Rect};

/// Hard per-axis cap on atlas dimensions; the automatic search never tests
/// anything larger.
pub const MAX_ATLAS_DIMENSION: u32 = 16384;

/// Next power of two >= `v` (1 for 0).
pub fn next_pow2(mut v: u32) -> u32 {
    if v <= 1 {
        return 1;
    }
    v -= 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v + 1
}

/// Space demand of the prepared sprite set, padding included.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Demand {
    pub total_area: u64,
    /// Widest single reservation.
    pub max_w: u32,
    /// Tallest single reservation.
    pub max_h: u32,
    /// Largest short side over all reservations; a hard per-axis floor when
    /// rotation is allowed.
    pub max_min_side: u32,
}

impl Demand {
    pub fn of(rects: &[Rect], padding: u32) -> Self {
        let mut d = Demand {
            total_area: 0,
            max_w: 0,
            max_h: 0,
            max_min_side: 0,
        };
        for r in rects {
            let (w, h) = (r.w + padding, r.h + padding);
            d.total_area += w as u64 * h as u64;
            d.max_w = d.max_w.max(w);
            d.max_h = d.max_h.max(h);
            d.max_min_side = d.max_min_side.max(w.min(h));
        }
        d
    }
}

fn ceil_sqrt(area: u64) -> u32 {
    let mut v = (area as f64).sqrt().ceil() as u64;
    while v * v < area {
        v += 1;
    }
    v.min(u32::MAX as u64) as u32
}

/// Candidate page sizes to attempt, smallest first. The seed is the per-axis
/// lower bound (square root of total area, raised to the largest single
/// reservation); each failure doubles the smaller axis until both axes reach
/// the policy's upper bound. An empty list means no size in range can fit.
pub(crate) fn candidate_sizes(cfg: &PackerConfig, demand: &Demand) -> Vec<(u32, u32)> {
    let border = cfg.border_padding.saturating_mul(2);
    let side = ceil_sqrt(demand.total_area);
    let (floor_w, floor_h) = if cfg.allow_rotation {
        (demand.max_min_side, demand.max_min_side)
    } else {
        (demand.max_w, demand.max_h)
    };
    let seed_w = side.max(floor_w).saturating_add(border);
    let seed_h = side.max(floor_h).saturating_add(border);

    match cfg.size {
        SizePolicy::Manual { width, height } => vec![(width, height)],
        SizePolicy::Automatic => {
            grow_sequence(seed_w, seed_h, 1, MAX_ATLAS_DIMENSION, cfg.power_of_two)
        }
        SizePolicy::MinMax { min, max } => {
            grow_sequence(seed_w, seed_h, min, max, cfg.power_of_two)
        }
    }
}

/// Error for a failed search under the given policy.
pub(crate) fn exhausted_error(cfg: &PackerConfig, placed: usize, total: usize) -> AtlasError {
    match cfg.size {
        SizePolicy::Manual { width, height } => AtlasError::InsufficientSpace {
            width,
            height,
            placed,
            total,
        },
        SizePolicy::MinMax { min, max } => AtlasError::NoFittingSize { min, max },
        SizePolicy::Automatic => AtlasError::SizeSearchExhausted {
            max_dimension: MAX_ATLAS_DIMENSION,
        },
    }
}

fn grow_sequence(seed_w: u32, seed_h: u32, lo: u32, hi: u32, pow2: bool) -> Vec<(u32, u32)> {
    // Under power-of-two sizing every candidate must itself be a power of
    // two, so the usable upper bound is the largest one inside the range.
    let cap = if pow2 { prev_pow2(hi) } else { hi };
    let norm = |v: u32| -> u32 {
        let v = v.max(lo);
        if pow2 { next_pow2(v) } else { v }
    };
    let mut w = norm(seed_w);
    let mut h = norm(seed_h);
    if w > cap || h > cap {
        return Vec::new();
    }
    let mut out = vec![(w, h)];
    loop {
        if w <= h && w < cap {
            w = norm(w.saturating_mul(2)).min(cap);
        } else if h < cap {
            h = norm(h.saturating_mul(2)).min(cap);
        } else if w < cap {
            w = norm(w.saturating_mul(2)).min(cap);
        } else {
            break;
        }
        out.push((w, h));
    }
    out
}

/// Largest power of two <= `v` (0 for 0).
fn prev_pow2(v: u32) -> u32 {
    if v == 0 {
        return 0;
    }
    1 << (31 - v.leading_zeros())
}

/// Final page dimensions for a successful pack at envelope `(env_w, env_h)`.
/// Manual sizes are kept exactly; otherwise the page shrinks to the
/// placement bounding box (plus trailing padding and border), raised to the
/// policy minimum and rounded per axis under power-of-two sizing.
pub(crate) fn finish_page_size<K>(
    frames: &[Frame<K>],
    cfg: &PackerConfig,
    env_w: u32,
    env_h: u32,
) -> (u32, u32) {
    if let SizePolicy::Manual { width, height } = cfg.size {
        return (width, height);
    }
    let pad_rem = cfg.texture_padding - cfg.texture_padding / 2;
    let mut page_w = 0u32;
    let mut page_h = 0u32;
    for f in frames {
        if f.is_alias() {
            continue;
        }
        page_w = page_w.max(f.frame.right() + 1 + pad_rem + cfg.border_padding);
        page_h = page_h.max(f.frame.bottom() + 1 + pad_rem + cfg.border_padding);
    }
    if let SizePolicy::MinMax { min, .. } = cfg.size {
        page_w = page_w.max(min);
        page_h = page_h.max(min);
    }
    if cfg.power_of_two {
        page_w = next_pow2(page_w.max(1));
        page_h = next_pow2(page_h.max(1));
    }
    (page_w.min(env_w), page_h.min(env_h))
}
