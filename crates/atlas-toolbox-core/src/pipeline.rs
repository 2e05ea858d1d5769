use crate::config::{
    MaxRectsHeuristic, PackMethod, PackerConfig, SortOrder, TransparentPolicy,
};
use crate::dedup::{DedupOutcome, SpriteDeduplicator};
use crate::error::{AtlasError, Result};
use crate::model::{Atlas, FlipTransform, Frame, Meta, Rect};
use crate::packer::make_packer;
use crate::progress::{PackPhase, ProgressEvent, RunContext};
use crate::sizer::{self, Demand};
use crate::{compose, trim};
use image::{DynamicImage, RgbaImage};
use std::time::Instant;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// In-memory sprite to pack (key + decoded image).
pub struct InputSprite {
    pub key: String,
    pub image: DynamicImage,
}

/// Output of a packing run: atlas metadata and the composed RGBA page.
pub struct PackOutput {
    pub atlas: Atlas,
    pub rgba: RgbaImage,
}

impl PackOutput {
    /// Convenience delegation to `atlas.stats()`.
    pub fn stats(&self) -> crate::model::PackStats {
        self.atlas.stats()
    }
}

/// Prepared sprite: trimmed dimensions plus reconstruction metadata.
struct Prep {
    key: String,
    /// Full original bitmap; `None` in layout-only runs.
    rgba: Option<RgbaImage>,
    /// Packing dimensions (post-trim).
    rect: Rect,
    trimmed: bool,
    /// Trimmed sub-rect within the original image.
    source: Rect,
    orig_size: (u32, u32),
    /// Canonical prep index + transform when this sprite is a flip variant.
    alias: Option<(usize, FlipTransform)>,
}

/// Packs `inputs` into a single atlas page using configuration `cfg`.
///
/// Stages run in order (trim, dedup, size, pack, compose); any failure is
/// terminal for the run and no partial atlas is emitted.
pub fn pack_sprites(inputs: Vec<InputSprite>, cfg: PackerConfig) -> Result<PackOutput> {
    pack_sprites_with(inputs, cfg, &RunContext::new())
}

#[instrument(skip_all, fields(sprites = inputs.len(), method = %cfg.method))]
pub fn pack_sprites_with(
    inputs: Vec<InputSprite>,
    cfg: PackerConfig,
    ctx: &RunContext,
) -> Result<PackOutput> {
    cfg.validate()?;
    if inputs.is_empty() {
        return Err(AtlasError::Empty);
    }
    let start = Instant::now();
    ctx.emit(ProgressEvent::RunStarted {
        sprites: inputs.len(),
    });

    ctx.checkpoint()?;
    ctx.emit(ProgressEvent::PhaseStarted {
        phase: PackPhase::Trimming,
    });
    let mut preps = prepare_inputs(inputs, &cfg, ctx)?;
    if preps.is_empty() {
        return Err(AtlasError::Empty);
    }

    ctx.checkpoint()?;
    if cfg.allow_flip_dedup {
        ctx.emit(ProgressEvent::PhaseStarted {
            phase: PackPhase::Deduplicating,
        });
        mark_aliases(&mut preps);
    }

    ctx.checkpoint()?;
    ctx.emit(ProgressEvent::PhaseStarted {
        phase: PackPhase::Sizing,
    });
    let (frames, width, height, method) = layout_preps(&preps, &cfg, ctx)?;

    ctx.checkpoint()?;
    ctx.emit(ProgressEvent::PhaseStarted {
        phase: PackPhase::Compositing,
    });
    let rgba = compose_page(&preps, &frames, width, height);

    let atlas = Atlas {
        width,
        height,
        method,
        frames,
        meta: make_meta(&cfg),
    };
    ctx.emit(ProgressEvent::RunFinished {
        elapsed: start.elapsed(),
        width,
        height,
        occupancy: atlas.stats().occupancy,
    });
    Ok(PackOutput { atlas, rgba })
}

/// Packs bare sizes into a page without touching pixel data. Trimming and
/// flip-deduplication do not apply; sizing and method selection behave as in
/// `pack_sprites`.
pub fn pack_layout<K: Into<String>>(
    inputs: Vec<(K, u32, u32)>,
    cfg: PackerConfig,
) -> Result<Atlas> {
    pack_layout_with(inputs, cfg, &RunContext::new())
}

pub fn pack_layout_with<K: Into<String>>(
    inputs: Vec<(K, u32, u32)>,
    cfg: PackerConfig,
    ctx: &RunContext,
) -> Result<Atlas> {
    cfg.validate()?;
    if inputs.is_empty() {
        return Err(AtlasError::Empty);
    }
    let preps: Vec<Prep> = inputs
        .into_iter()
        .map(|(k, w, h)| Prep {
            key: k.into(),
            rgba: None,
            rect: Rect::new(0, 0, w, h),
            trimmed: false,
            source: Rect::new(0, 0, w, h),
            orig_size: (w, h),
            alias: None,
        })
        .collect();
    let (frames, width, height, method) = layout_preps(&preps, &cfg, ctx)?;
    Ok(Atlas {
        width,
        height,
        method,
        frames,
        meta: make_meta(&cfg),
    })
}

// ---------- stage: trim ----------

fn prepare_inputs(
    inputs: Vec<InputSprite>,
    cfg: &PackerConfig,
    ctx: &RunContext,
) -> Result<Vec<Prep>> {
    let total = inputs.len();
    let mut out = Vec::with_capacity(total);
    for (i, inp) in inputs.into_iter().enumerate() {
        let rgba = inp.image.to_rgba8();
        let (iw, ih) = rgba.dimensions();
        let full = Rect::new(0, 0, iw, ih);
        let (rect, trimmed, source) = if cfg.trim {
            match trim::trim_rect(&rgba, cfg.trim_threshold) {
                Some(r) => (Rect::new(0, 0, r.w, r.h), r != full, r),
                None => match cfg.transparent_policy {
                    TransparentPolicy::Keep => (full, false, full),
                    TransparentPolicy::Skip => {
                        debug!(key = %inp.key, "skipping fully transparent sprite");
                        ctx.emit(ProgressEvent::SpriteProcessed {
                            key: inp.key,
                            done: i + 1,
                            total,
                        });
                        continue;
                    }
                    TransparentPolicy::Abort => {
                        return Err(AtlasError::EmptySprite { key: inp.key });
                    }
                },
            }
        } else {
            (full, false, full)
        };
        ctx.emit(ProgressEvent::SpriteProcessed {
            key: inp.key.clone(),
            done: i + 1,
            total,
        });
        out.push(Prep {
            key: inp.key,
            rgba: Some(rgba),
            rect,
            trimmed,
            source,
            orig_size: (iw, ih),
            alias: None,
        });
    }
    Ok(out)
}

// ---------- stage: dedup ----------

fn mark_aliases(preps: &mut [Prep]) {
    let mut dedup = SpriteDeduplicator::new();
    // Maps the deduplicator's canonical indices back to prep indices.
    let mut canonical_preps: Vec<usize> = Vec::new();
    for i in 0..preps.len() {
        let Some(rgba) = preps[i].rgba.as_ref() else {
            canonical_preps.push(i);
            continue;
        };
        let cropped = trim::crop(rgba, &preps[i].source);
        match dedup.classify(&cropped) {
            DedupOutcome::Canonical(_) => canonical_preps.push(i),
            DedupOutcome::AliasOf(idx, t) => {
                preps[i].alias = Some((canonical_preps[idx], t));
            }
        }
    }
}

// ---------- stage: size + pack ----------

fn effective_sort(method: PackMethod, cfg: &PackerConfig) -> SortOrder {
    match method {
        // Simple Row is defined over the input order.
        PackMethod::SimpleRow => SortOrder::None,
        // FFDH is only first-fit *decreasing height* with this sort.
        PackMethod::ShelfFfdh => SortOrder::HeightDesc,
        _ => cfg.sort_order,
    }
}

fn sorted_indices(preps: &[Prep], order: SortOrder) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..preps.len()).filter(|&i| preps[i].alias.is_none()).collect();
    match order {
        SortOrder::None => {}
        SortOrder::NameAsc => idx.sort_by(|&a, &b| preps[a].key.cmp(&preps[b].key)),
        SortOrder::AreaDesc => idx.sort_by(|&a, &b| {
            preps[b]
                .rect
                .area()
                .cmp(&preps[a].rect.area())
                .then_with(|| preps[a].key.cmp(&preps[b].key))
        }),
        SortOrder::MaxSideDesc => idx.sort_by(|&a, &b| {
            (preps[b].rect.w.max(preps[b].rect.h))
                .cmp(&(preps[a].rect.w.max(preps[a].rect.h)))
                .then_with(|| preps[a].key.cmp(&preps[b].key))
        }),
        SortOrder::HeightDesc => idx.sort_by(|&a, &b| {
            preps[b]
                .rect
                .h
                .cmp(&preps[a].rect.h)
                .then_with(|| preps[a].key.cmp(&preps[b].key))
        }),
        SortOrder::WidthDesc => idx.sort_by(|&a, &b| {
            preps[b]
                .rect
                .w
                .cmp(&preps[a].rect.w)
                .then_with(|| preps[a].key.cmp(&preps[b].key))
        }),
    }
    idx
}

struct Candidate {
    frames: Vec<Frame>,
    width: u32,
    height: u32,
    method: PackMethod,
    priority: usize,
}

impl Candidate {
    fn page_area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
    fn used_area(&self) -> u64 {
        self.frames.iter().map(|f| f.frame.area()).sum()
    }
    /// True when `self` beats `other`: higher efficiency, then smaller page,
    /// then the fixed method priority. Efficiency is compared exactly by
    /// cross-multiplication.
    fn beats(&self, other: &Candidate) -> bool {
        let l = self.used_area() as u128 * other.page_area() as u128;
        let r = other.used_area() as u128 * self.page_area() as u128;
        if l != r {
            return l > r;
        }
        if self.page_area() != other.page_area() {
            return self.page_area() < other.page_area();
        }
        self.priority < other.priority
    }
}

fn method_candidates(cfg: &PackerConfig) -> Vec<(PackMethod, MaxRectsHeuristic)> {
    let expand_mr = |m: PackMethod| -> Vec<(PackMethod, MaxRectsHeuristic)> {
        if m == PackMethod::MaxRects && cfg.mr_heuristic == MaxRectsHeuristic::Auto {
            vec![
                (m, MaxRectsHeuristic::BestAreaFit),
                (m, MaxRectsHeuristic::BestShortSideFit),
                (m, MaxRectsHeuristic::BottomLeft),
            ]
        } else {
            vec![(m, cfg.mr_heuristic)]
        }
    };
    match cfg.method {
        PackMethod::Auto => PackMethod::PRIORITY
            .iter()
            .flat_map(|&m| expand_mr(m))
            .collect(),
        m => expand_mr(m),
    }
}

fn layout_preps(
    preps: &[Prep],
    cfg: &PackerConfig,
    ctx: &RunContext,
) -> Result<(Vec<Frame>, u32, u32, PackMethod)> {
    let candidates = method_candidates(cfg);
    let single = candidates.len() == 1;

    let attempt = |(prio, &(method, heur)): (usize, &(PackMethod, MaxRectsHeuristic))| {
        attempt_method(preps, method, heur, prio, cfg)
    };

    ctx.emit(ProgressEvent::PhaseStarted {
        phase: PackPhase::Packing,
    });
    let best: Result<Candidate> = if single {
        attempt((0, &candidates[0]))
    } else {
        pick_best(&candidates, cfg, &attempt)
    };
    let best = best?;
    ctx.checkpoint()?;

    debug!(
        method = %best.method,
        width = best.width,
        height = best.height,
        "layout selected"
    );
    let frames = resolve_aliases(preps, best.frames);
    Ok((frames, best.width, best.height, best.method))
}

fn pick_best(
    candidates: &[(PackMethod, MaxRectsHeuristic)],
    cfg: &PackerConfig,
    attempt: &(dyn Fn((usize, &(PackMethod, MaxRectsHeuristic))) -> Result<Candidate> + Sync),
) -> Result<Candidate> {
    #[cfg(feature = "parallel")]
    {
        if cfg.parallel {
            let results: Vec<Candidate> = candidates
                .par_iter()
                .enumerate()
                .filter_map(|pair| attempt(pair).ok())
                .collect();
            return results
                .into_iter()
                .reduce(|best, c| if c.beats(&best) { c } else { best })
                .map(Ok)
                .unwrap_or_else(|| attempt((0, &candidates[0])));
        }
    }

    let budget_ms = cfg.time_budget_ms.unwrap_or(0);
    let start = Instant::now();
    let mut best: Option<Candidate> = None;
    let mut first_err: Option<AtlasError> = None;
    for (prio, cand) in candidates.iter().enumerate() {
        if prio > 0 && budget_ms > 0 && start.elapsed().as_millis() as u64 > budget_ms {
            debug!(evaluated = prio, "auto portfolio time budget exhausted");
            break;
        }
        match attempt((prio, cand)) {
            Ok(c) => {
                let better = best.as_ref().map(|b| c.beats(b)).unwrap_or(true);
                if better {
                    best = Some(c);
                }
            }
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }
    match best {
        Some(b) => Ok(b),
        None => Err(first_err.unwrap_or(AtlasError::Empty)),
    }
}

fn attempt_method(
    preps: &[Prep],
    method: PackMethod,
    heuristic: MaxRectsHeuristic,
    priority: usize,
    cfg: &PackerConfig,
) -> Result<Candidate> {
    let order = sorted_indices(preps, effective_sort(method, cfg));
    let rects: Vec<Rect> = order.iter().map(|&i| preps[i].rect).collect();
    let demand = Demand::of(&rects, cfg.texture_padding);

    let sizes = sizer::candidate_sizes(cfg, &demand);
    let mut most_placed = 0usize;
    for (env_w, env_h) in sizes {
        match try_pack_at(preps, &order, method, heuristic, env_w, env_h, cfg) {
            Ok(frames) => {
                let (width, height) = sizer::finish_page_size(&frames, cfg, env_w, env_h);
                return Ok(Candidate {
                    frames,
                    width,
                    height,
                    method,
                    priority,
                });
            }
            Err(placed) => most_placed = most_placed.max(placed),
        }
    }
    Err(sizer::exhausted_error(cfg, most_placed, order.len()))
}

/// Pack every canonical prep, in `order`, into a `w`x`h` page. `Err` carries
/// the number of sprites placed before the first miss.
fn try_pack_at(
    preps: &[Prep],
    order: &[usize],
    method: PackMethod,
    heuristic: MaxRectsHeuristic,
    w: u32,
    h: u32,
    cfg: &PackerConfig,
) -> std::result::Result<Vec<Frame>, usize> {
    let mut packer = make_packer(method, heuristic, w, h, cfg);
    let mut frames = Vec::with_capacity(order.len());
    for (placed, &idx) in order.iter().enumerate() {
        let p = &preps[idx];
        match packer.pack(p.key.clone(), &p.rect) {
            Some(mut f) => {
                f.trimmed = p.trimmed;
                f.source = p.source;
                f.source_size = p.orig_size;
                frames.push(f);
            }
            None => return Err(placed),
        }
    }
    Ok(frames)
}

/// Emit the final frame list in input order; alias frames share their
/// canonical frame's placed rect and record the flip transform.
fn resolve_aliases(preps: &[Prep], packed: Vec<Frame>) -> Vec<Frame> {
    let mut by_key: std::collections::HashMap<&str, &Frame> = std::collections::HashMap::new();
    for f in &packed {
        by_key.insert(f.key.as_str(), f);
    }
    let mut out = Vec::with_capacity(preps.len());
    for p in preps {
        match p.alias {
            None => {
                if let Some(f) = by_key.get(p.key.as_str()) {
                    out.push((*f).clone());
                }
            }
            Some((canon_idx, t)) => {
                let canon_key = preps[canon_idx].key.as_str();
                if let Some(cf) = by_key.get(canon_key) {
                    out.push(Frame {
                        key: p.key.clone(),
                        frame: cf.frame,
                        rotated: cf.rotated,
                        trimmed: p.trimmed,
                        flip: t,
                        flip_of: Some(cf.key.clone()),
                        source: p.source,
                        source_size: p.orig_size,
                    });
                }
            }
        }
    }
    out
}

// ---------- stage: compose ----------

fn compose_page(preps: &[Prep], frames: &[Frame], width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(width, height);
    let by_key: std::collections::HashMap<&str, &Prep> =
        preps.iter().map(|p| (p.key.as_str(), p)).collect();
    for f in frames {
        if f.is_alias() {
            continue;
        }
        let Some(p) = by_key.get(f.key.as_str()) else {
            continue;
        };
        let Some(rgba) = p.rgba.as_ref() else {
            continue;
        };
        compose::blit_rgba(rgba, &mut canvas, f.frame.x, f.frame.y, &p.source, f.rotated);
    }
    canvas
}

fn make_meta(cfg: &PackerConfig) -> Meta {
    Meta {
        schema_version: "1".into(),
        app: "atlas-toolbox".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        format: "RGBA8888".into(),
        scale: 1.0,
        power_of_two: cfg.power_of_two,
        padding: (cfg.border_padding, cfg.texture_padding),
        allow_rotation: cfg.allow_rotation,
        allow_flip: cfg.allow_flip_dedup,
        trim_mode: if cfg.trim { "trim" } else { "none" }.into(),
    }
}
