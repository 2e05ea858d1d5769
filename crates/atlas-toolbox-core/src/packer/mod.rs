use crate::config::{MaxRectsHeuristic, PackMethod, PackerConfig};
use crate::model::{FlipTransform, Frame, Rect};

pub mod guillotine;
pub mod maxrects;
pub mod shelf;
pub mod simple_row;
pub mod skyline;

/// A packer places rectangles into a fixed-size page.
///
/// Implementations must keep placements disjoint, inside the page border,
/// and maintain the configured padding between neighbouring content.
/// `pack` may return `None` if the rectangle cannot be placed.
pub trait Packer<K> {
    fn can_pack(&self, rect: &Rect) -> bool;
    fn pack(&mut self, key: K, rect: &Rect) -> Option<Frame<K>>;
}

/// Shared page geometry: usable interior plus the spacing knobs every
/// algorithm applies the same way.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageSpec {
    pub border: Rect,
    pub padding: u32,
    pub allow_rotation: bool,
}

impl PageSpec {
    pub fn new(width: u32, height: u32, cfg: &PackerConfig) -> Self {
        let pad = cfg.border_padding;
        let w = width.saturating_sub(pad.saturating_mul(2));
        let h = height.saturating_sub(pad.saturating_mul(2));
        Self {
            border: Rect::new(pad, pad, w, h),
            padding: cfg.texture_padding,
            allow_rotation: cfg.allow_rotation,
        }
    }

    /// Slot size reserved for a sprite, padding included.
    pub fn reserve(&self, rect: &Rect) -> (u32, u32) {
        (rect.w + self.padding, rect.h + self.padding)
    }

    /// Content frame inside a reserved slot. Content sits at a symmetric
    /// half-padding offset; `frame` carries post-rotation dimensions.
    pub fn frame_in<K>(&self, key: K, rect: &Rect, slot: &Rect, rotated: bool) -> Frame<K> {
        let off = self.padding / 2;
        let (fw, fh) = if rotated {
            (rect.h, rect.w)
        } else {
            (rect.w, rect.h)
        };
        Frame {
            key,
            frame: Rect::new(slot.x.saturating_add(off), slot.y.saturating_add(off), fw, fh),
            rotated,
            trimmed: false,
            flip: FlipTransform::None,
            flip_of: None,
            source: *rect,
            source_size: (rect.w, rect.h),
        }
    }
}

/// Construct the packer for a concrete (non-auto) method at a page size.
pub fn make_packer(
    method: PackMethod,
    heuristic: MaxRectsHeuristic,
    width: u32,
    height: u32,
    cfg: &PackerConfig,
) -> Box<dyn Packer<String>> {
    match method {
        PackMethod::MaxRects => Box::new(maxrects::MaxRectsPacker::new(
            width, height, heuristic, cfg,
        )),
        PackMethod::Guillotine => Box::new(guillotine::GuillotinePacker::new(width, height, cfg)),
        PackMethod::Skyline => Box::new(skyline::SkylinePacker::new(width, height, cfg)),
        PackMethod::Shelf => Box::new(shelf::ShelfPacker::new(
            width,
            height,
            shelf::ShelfMode::NextFit,
            cfg,
        )),
        PackMethod::ShelfFfdh => Box::new(shelf::ShelfPacker::new(
            width,
            height,
            shelf::ShelfMode::FirstFit,
            cfg,
        )),
        PackMethod::SimpleRow => Box::new(simple_row::SimpleRowPacker::new(width, height, cfg)),
        PackMethod::Auto => unreachable!("auto is resolved before packer construction"),
    }
}
