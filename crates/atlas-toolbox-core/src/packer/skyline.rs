use super::{PageSpec, Packer};
use crate::config::PackerConfig;
use crate::model::{Frame, Rect};

#[derive(Clone, Copy, Debug)]
struct SkylineNode {
    x: u32,
    y: u32,
    w: u32,
}

impl SkylineNode {
    #[inline]
    fn left(&self) -> u32 {
        self.x
    }
    #[inline]
    fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
}

/// Piecewise height-profile packer. Sprites drop onto the lowest skyline
/// segment wide enough to hold them (bottom-left rule); the profile is split
/// at the placement and equal-height neighbours merged afterwards.
pub struct SkylinePacker {
    spec: PageSpec,
    skylines: Vec<SkylineNode>,
}

impl SkylinePacker {
    pub fn new(width: u32, height: u32, cfg: &PackerConfig) -> Self {
        let spec = PageSpec::new(width, height, cfg);
        Self {
            spec,
            skylines: vec![SkylineNode {
                x: spec.border.x,
                y: spec.border.y,
                w: spec.border.w,
            }],
        }
    }

    /// Resting rect for a `w`x`h` placement starting at segment `i`, or
    /// `None` if it leaves the border. The rect's y is the maximum height of
    /// every segment it spans.
    fn can_put(&self, mut i: usize, w: u32, h: u32) -> Option<Rect> {
        let mut rect = Rect::new(self.skylines[i].x, 0, w, h);
        let mut width_left = rect.w;
        loop {
            rect.y = rect.y.max(self.skylines[i].y);
            if !self.spec.border.contains(&rect) {
                return None;
            }
            if self.skylines[i].w >= width_left {
                return Some(rect);
            }
            width_left -= self.skylines[i].w;
            i += 1;
            if i >= self.skylines.len() {
                return None;
            }
        }
    }

    fn find_skyline(&self, w: u32, h: u32) -> Option<(usize, Rect, bool)> {
        let mut best_bottom = u32::MAX;
        let mut best_width = u32::MAX;
        let mut best: Option<(usize, Rect, bool)> = None;

        let both = [(w, h, false), (h, w, true)];
        let orientations = if self.spec.allow_rotation && w != h {
            &both[..]
        } else {
            &both[..1]
        };
        for i in 0..self.skylines.len() {
            for &(cw, ch, rot) in orientations {
                if let Some(r) = self.can_put(i, cw, ch) {
                    if r.bottom() < best_bottom
                        || (r.bottom() == best_bottom && self.skylines[i].w < best_width)
                    {
                        best_bottom = r.bottom();
                        best_width = self.skylines[i].w;
                        best = Some((i, r, rot));
                    }
                }
            }
        }
        best
    }

    fn split(&mut self, index: usize, rect: &Rect) {
        // Clamp the new segment to the border bottom so a placement touching
        // the bottom edge cannot push the profile past the page.
        let new_y = rect
            .bottom()
            .saturating_add(1)
            .min(self.spec.border.bottom());
        let node = SkylineNode {
            x: rect.x,
            y: new_y,
            w: rect.w,
        };
        debug_assert!(node.right() <= self.spec.border.right());

        self.skylines.insert(index, node);
        let i = index + 1;
        while i < self.skylines.len() {
            if self.skylines[i - 1].left() <= self.skylines[i].left()
                && self.skylines[i].left() <= self.skylines[i - 1].right()
            {
                let shrink = self.skylines[i - 1].right() - self.skylines[i].left() + 1;
                if self.skylines[i].w <= shrink {
                    self.skylines.remove(i);
                } else {
                    self.skylines[i].x += shrink;
                    self.skylines[i].w -= shrink;
                    break;
                }
            } else {
                break;
            }
        }
    }

    fn merge(&mut self) {
        let mut i = 1;
        while i < self.skylines.len() {
            if self.skylines[i - 1].y == self.skylines[i].y {
                self.skylines[i - 1].w = self.skylines[i - 1].w.saturating_add(self.skylines[i].w);
                self.skylines.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

impl<K: Clone> Packer<K> for SkylinePacker {
    fn can_pack(&self, rect: &Rect) -> bool {
        let (w, h) = self.spec.reserve(rect);
        self.find_skyline(w, h).is_some()
    }

    fn pack(&mut self, key: K, rect: &Rect) -> Option<Frame<K>> {
        let (w, h) = self.spec.reserve(rect);
        let (i, slot, rotated) = self.find_skyline(w, h)?;
        self.split(i, &slot);
        self.merge();
        Some(self.spec.frame_in(key, rect, &slot, rotated))
    }
}
