use super::{PageSpec, Packer};
use crate::config::{MaxRectsHeuristic, PackerConfig};
use crate::model::{Frame, Rect};

/// Free-rectangle list packer. After every placement the intersecting free
/// rects are split subtractively and contained leftovers pruned, keeping the
/// list maximal.
pub struct MaxRectsPacker {
    spec: PageSpec,
    free: Vec<Rect>,
    heuristic: MaxRectsHeuristic,
}

impl MaxRectsPacker {
    pub fn new(width: u32, height: u32, heuristic: MaxRectsHeuristic, cfg: &PackerConfig) -> Self {
        let spec = PageSpec::new(width, height, cfg);
        // `Auto` is resolved by the pipeline; score with the default here.
        let heuristic = match heuristic {
            MaxRectsHeuristic::Auto => MaxRectsHeuristic::BestAreaFit,
            other => other,
        };
        Self {
            spec,
            free: vec![spec.border],
            heuristic,
        }
    }

    fn right_ex(r: &Rect) -> u32 {
        r.x + r.w
    }
    fn bottom_ex(r: &Rect) -> u32 {
        r.y + r.h
    }

    fn intersects(a: &Rect, b: &Rect) -> bool {
        !(a.x >= Self::right_ex(b)
            || b.x >= Self::right_ex(a)
            || a.y >= Self::bottom_ex(b)
            || b.y >= Self::bottom_ex(a))
    }

    /// Subtract `node` from every intersecting free rect, then prune.
    fn place_rect(&mut self, node: &Rect) {
        let mut next: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for fr in self.free.iter() {
            if !Self::intersects(fr, node) {
                next.push(*fr);
                continue;
            }
            let fr_x2 = Self::right_ex(fr);
            let fr_y2 = Self::bottom_ex(fr);
            let ix1 = fr.x.max(node.x);
            let iy1 = fr.y.max(node.y);
            let ix2 = fr_x2.min(Self::right_ex(node));
            let iy2 = fr_y2.min(Self::bottom_ex(node));

            if iy1 > fr.y {
                next.push(Rect::new(fr.x, fr.y, fr.w, iy1 - fr.y));
            }
            if iy2 < fr_y2 {
                next.push(Rect::new(fr.x, iy2, fr.w, fr_y2 - iy2));
            }
            let band_h = iy2.saturating_sub(iy1);
            if band_h > 0 {
                if ix1 > fr.x {
                    next.push(Rect::new(fr.x, iy1, ix1 - fr.x, band_h));
                }
                if ix2 < fr_x2 {
                    next.push(Rect::new(ix2, iy1, fr_x2 - ix2, band_h));
                }
            }
        }
        self.free = next;
        self.prune_free_list();
    }

    /// Drop free rects fully contained in another.
    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut removed = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains(&a) {
                    removed = true;
                    break;
                }
                if a.contains(&b) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if removed {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn score(&self, fr: &Rect, w: u32, h: u32) -> (i64, i64) {
        let leftover_h = (fr.w as i64 - w as i64).abs();
        let leftover_v = (fr.h as i64 - h as i64).abs();
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        let area_fit = fr.area() as i64 - (w as u64 * h as u64) as i64;
        match self.heuristic {
            MaxRectsHeuristic::BestAreaFit | MaxRectsHeuristic::Auto => (area_fit, short_fit),
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BottomLeft => (fr.y as i64, fr.x as i64),
        }
    }

    fn find_position(&self, w: u32, h: u32) -> Option<(Rect, bool)> {
        let mut best: Option<(Rect, bool)> = None;
        let mut best_score = (i64::MAX, i64::MAX);
        // Tie-break on the resulting top edge, then the left edge, to keep
        // placement deterministic across equal scores.
        let mut best_tie = (u32::MAX, u32::MAX);

        let both = [(w, h, false), (h, w, true)];
        let orientations = if self.spec.allow_rotation && w != h {
            &both[..]
        } else {
            &both[..1]
        };
        for fr in &self.free {
            for &(cw, ch, rot) in orientations {
                if fr.w < cw || fr.h < ch {
                    continue;
                }
                if fr.w == cw && fr.h == ch {
                    // Perfect fit wins outright.
                    return Some((Rect::new(fr.x, fr.y, cw, ch), rot));
                }
                let score = self.score(fr, cw, ch);
                let tie = (fr.y.saturating_add(ch), fr.x);
                if score < best_score || (score == best_score && tie < best_tie) {
                    best_score = score;
                    best_tie = tie;
                    best = Some((Rect::new(fr.x, fr.y, cw, ch), rot));
                }
            }
        }
        best
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }
}

impl<K: Clone> Packer<K> for MaxRectsPacker {
    fn can_pack(&self, rect: &Rect) -> bool {
        let (w, h) = self.spec.reserve(rect);
        self.find_position(w, h).is_some()
    }

    fn pack(&mut self, key: K, rect: &Rect) -> Option<Frame<K>> {
        let (w, h) = self.spec.reserve(rect);
        let (slot, rotated) = self.find_position(w, h)?;
        self.place_rect(&slot);
        Some(self.spec.frame_in(key, rect, &slot, rotated))
    }
}
