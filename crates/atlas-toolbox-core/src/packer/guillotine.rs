use super::{PageSpec, Packer};
use crate::config::PackerConfig;
use crate::model::{Frame, Rect};

/// Guillotine splitting packer. Each placement cuts the chosen free rect in
/// two along the axis with the shorter leftover; the resulting free rects
/// stay disjoint by construction and are never merged back, trading packing
/// density for speed.
pub struct GuillotinePacker {
    spec: PageSpec,
    free: Vec<Rect>,
}

impl GuillotinePacker {
    pub fn new(width: u32, height: u32, cfg: &PackerConfig) -> Self {
        let spec = PageSpec::new(width, height, cfg);
        Self {
            spec,
            free: vec![spec.border],
        }
    }

    /// Best-area-fit score; smaller leftover area wins, short side breaks
    /// ties.
    fn score(fr: &Rect, w: u32, h: u32) -> (i64, i64) {
        let area_fit = fr.area() as i64 - (w as u64 * h as u64) as i64;
        let leftover_h = (fr.w as i64 - w as i64).abs();
        let leftover_v = (fr.h as i64 - h as i64).abs();
        (area_fit, leftover_h.min(leftover_v))
    }

    fn choose(&self, w: u32, h: u32) -> Option<(usize, Rect, bool)> {
        let mut best: Option<(usize, Rect, bool)> = None;
        let mut best_score = (i64::MAX, i64::MAX);
        let both = [(w, h, false), (h, w, true)];
        let orientations = if self.spec.allow_rotation && w != h {
            &both[..]
        } else {
            &both[..1]
        };
        for (i, fr) in self.free.iter().enumerate() {
            for &(cw, ch, rot) in orientations {
                if fr.w >= cw && fr.h >= ch {
                    let s = Self::score(fr, cw, ch);
                    if s < best_score {
                        best_score = s;
                        best = Some((i, Rect::new(fr.x, fr.y, cw, ch), rot));
                    }
                }
            }
        }
        best
    }

    /// Cut the leftover of `fr` around `placed` into a bottom and a right
    /// rect, giving the full leftover strip to the axis with less of it.
    fn split(fr: &Rect, placed: &Rect) -> (Option<Rect>, Option<Rect>) {
        let w_right = (fr.x + fr.w).saturating_sub(placed.x + placed.w);
        let h_bottom = (fr.y + fr.h).saturating_sub(placed.y + placed.h);
        let split_horizontal = h_bottom < w_right;

        let mut bottom = Rect::new(fr.x, placed.y + placed.h, 0, h_bottom);
        let mut right = Rect::new(placed.x + placed.w, fr.y, w_right, 0);
        if split_horizontal {
            bottom.w = fr.w;
            right.h = placed.h;
        } else {
            bottom.w = placed.w;
            right.h = fr.h;
        }
        let keep = |r: Rect| (r.w > 0 && r.h > 0).then_some(r);
        (keep(bottom), keep(right))
    }

    fn place(&mut self, idx: usize, placed: &Rect) {
        let fr = self.free.swap_remove(idx);
        let (a, b) = Self::split(&fr, placed);
        self.free.extend(a);
        self.free.extend(b);
    }
}

impl<K: Clone> Packer<K> for GuillotinePacker {
    fn can_pack(&self, rect: &Rect) -> bool {
        let (w, h) = self.spec.reserve(rect);
        self.choose(w, h).is_some()
    }

    fn pack(&mut self, key: K, rect: &Rect) -> Option<Frame<K>> {
        let (w, h) = self.spec.reserve(rect);
        let (idx, slot, rotated) = self.choose(w, h)?;
        self.place(idx, &slot);
        Some(self.spec.frame_in(key, rect, &slot, rotated))
    }
}
