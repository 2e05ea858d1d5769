use super::{PageSpec, Packer};
use crate::config::PackerConfig;
use crate::model::{Frame, Rect};

/// How a sprite is matched against existing shelves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShelfMode {
    /// Only the most recently opened shelf accepts sprites; a miss opens a
    /// new shelf below it.
    NextFit,
    /// First-fit decreasing height: any existing shelf tall enough may take
    /// the sprite before a new one is opened. Callers sort inputs by height
    /// descending so shelf heights stay monotone.
    FirstFit,
}

#[derive(Debug, Clone, Copy)]
struct Shelf {
    y: u32,
    h: u32,
    cursor: u32,
}

/// Row-based packer. A shelf's height is fixed by the sprite that opened it;
/// sprites are appended left to right and a new shelf opens below the stack
/// when none accepts the sprite.
pub struct ShelfPacker {
    spec: PageSpec,
    mode: ShelfMode,
    shelves: Vec<Shelf>,
    next_y: u32,
}

impl ShelfPacker {
    pub fn new(width: u32, height: u32, mode: ShelfMode, cfg: &PackerConfig) -> Self {
        let spec = PageSpec::new(width, height, cfg);
        Self {
            spec,
            mode,
            shelves: Vec::new(),
            next_y: spec.border.y,
        }
    }

    fn fits_on(&self, sh: &Shelf, w: u32, h: u32) -> bool {
        h <= sh.h && sh.cursor + w <= self.spec.border.x + self.spec.border.w
    }

    /// Slot for a `w`x`h` reservation on an existing shelf.
    fn choose_existing(&self, w: u32, h: u32) -> Option<Rect> {
        match self.mode {
            ShelfMode::NextFit => self
                .shelves
                .last()
                .filter(|sh| self.fits_on(sh, w, h))
                .map(|sh| Rect::new(sh.cursor, sh.y, w, h)),
            ShelfMode::FirstFit => self
                .shelves
                .iter()
                .find(|sh| self.fits_on(sh, w, h))
                .map(|sh| Rect::new(sh.cursor, sh.y, w, h)),
        }
    }

    /// Slot opening a new shelf below the current stack.
    fn choose_new(&self, w: u32, h: u32) -> Option<Rect> {
        let border = &self.spec.border;
        (w <= border.w && self.next_y + h <= border.y + border.h)
            .then(|| Rect::new(border.x, self.next_y, w, h))
    }

    fn choose(&self, w: u32, h: u32) -> Option<(Rect, bool)> {
        let mut orientations: Vec<(u32, u32, bool)> = vec![(w, h, false)];
        if self.spec.allow_rotation && w != h {
            orientations.push((h, w, true));
        }
        for &(cw, ch, rot) in &orientations {
            if let Some(r) = self.choose_existing(cw, ch) {
                return Some((r, rot));
            }
        }
        // A new shelf costs its full height, so lay the sprite flat when
        // rotation is allowed.
        if self.spec.allow_rotation && h > w {
            orientations.reverse();
        }
        for &(cw, ch, rot) in &orientations {
            if let Some(r) = self.choose_new(cw, ch) {
                return Some((r, rot));
            }
        }
        None
    }

    fn place(&mut self, slot: &Rect) {
        if let Some(sh) = self
            .shelves
            .iter_mut()
            .find(|sh| sh.y == slot.y && slot.h <= sh.h && sh.cursor == slot.x)
        {
            sh.cursor += slot.w;
            return;
        }
        self.shelves.push(Shelf {
            y: slot.y,
            h: slot.h,
            cursor: slot.x + slot.w,
        });
        self.next_y = self.next_y.max(slot.y + slot.h);
    }
}

impl<K: Clone> Packer<K> for ShelfPacker {
    fn can_pack(&self, rect: &Rect) -> bool {
        let (w, h) = self.spec.reserve(rect);
        self.choose(w, h).is_some()
    }

    fn pack(&mut self, key: K, rect: &Rect) -> Option<Frame<K>> {
        let (w, h) = self.spec.reserve(rect);
        let (slot, rotated) = self.choose(w, h)?;
        self.place(&slot);
        Some(self.spec.frame_in(key, rect, &slot, rotated))
    }
}
