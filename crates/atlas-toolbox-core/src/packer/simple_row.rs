use super::{PageSpec, Packer};
use crate::config::PackerConfig;
use crate::model::{Frame, Rect};

/// Naive row packer: sprites go left to right in input order, wrapping to a
/// new row when the page width runs out. Row height is the tallest sprite
/// seen in the row so far. Never rotates; no optimization.
pub struct SimpleRowPacker {
    spec: PageSpec,
    cursor_x: u32,
    cursor_y: u32,
    row_h: u32,
}

impl SimpleRowPacker {
    pub fn new(width: u32, height: u32, cfg: &PackerConfig) -> Self {
        let spec = PageSpec::new(width, height, cfg);
        Self {
            spec,
            cursor_x: spec.border.x,
            cursor_y: spec.border.y,
            row_h: 0,
        }
    }

    /// Slot for the next `w`x`h` reservation, plus the wrapped cursor state.
    fn choose(&self, w: u32, h: u32) -> Option<(Rect, u32, u32)> {
        let border = &self.spec.border;
        let right = border.x + border.w;
        let bottom = border.y + border.h;

        let (x, y) = if self.cursor_x + w <= right {
            (self.cursor_x, self.cursor_y)
        } else {
            (border.x, self.cursor_y + self.row_h)
        };
        (x + w <= right && y + h <= bottom).then(|| (Rect::new(x, y, w, h), x, y))
    }
}

impl<K: Clone> Packer<K> for SimpleRowPacker {
    fn can_pack(&self, rect: &Rect) -> bool {
        let (w, h) = self.spec.reserve(rect);
        self.choose(w, h).is_some()
    }

    fn pack(&mut self, key: K, rect: &Rect) -> Option<Frame<K>> {
        let (w, h) = self.spec.reserve(rect);
        let (slot, x, y) = self.choose(w, h)?;
        if y != self.cursor_y {
            // wrapped
            self.cursor_y = y;
            self.row_h = 0;
        }
        self.cursor_x = x + w;
        self.row_h = self.row_h.max(h);
        Some(self.spec.frame_in(key, rect, &slot, false))
    }
}
