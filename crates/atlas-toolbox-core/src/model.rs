use crate::config::PackMethod;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
}

/// Mirror transform mapping a canonical bitmap onto a deduplicated variant.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FlipTransform {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl FlipTransform {
    pub fn is_flipped(self) -> bool {
        !matches!(self, FlipTransform::None)
    }
    /// All transforms, in the deterministic order used for canonicalization.
    pub const ALL: [FlipTransform; 4] = [
        FlipTransform::None,
        FlipTransform::Horizontal,
        FlipTransform::Vertical,
        FlipTransform::Both,
    ];
}

/// A placed sprite within the atlas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame<K = String> {
    /// User-specified key (e.g., filename or asset path).
    pub key: K,
    /// Placed rectangle within the page (post-rotation width/height).
    pub frame: Rect,
    /// True if the frame was rotated 90° when placed.
    pub rotated: bool,
    /// True if the source was trimmed.
    pub trimmed: bool,
    /// Transform mapping the stored bitmap onto this sprite.
    pub flip: FlipTransform,
    /// Canonical key when this frame is a flip alias sharing another frame's
    /// stored rect.
    pub flip_of: Option<K>,
    /// Source sub-rect within the original image after trimming.
    pub source: Rect,
    /// Original (untrimmed) image size.
    pub source_size: (u32, u32),
}

impl<K> Frame<K> {
    pub fn is_alias(&self) -> bool {
        self.flip_of.is_some()
    }
}

/// Atlas-level metadata (common fields used by exporters).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Schema version for JSON metadata formats. String to allow non-integer
    /// versions like "1.0"; current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub format: String,
    pub scale: f32,
    pub power_of_two: bool,
    pub padding: (u32, u32),
    pub allow_rotation: bool,
    pub allow_flip: bool,
    pub trim_mode: String,
}

/// A packed atlas page: final dimensions, the algorithm that produced it and
/// one frame per input sprite (aliases share their canonical frame's rect).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atlas<K = String> {
    pub width: u32,
    pub height: u32,
    pub method: PackMethod,
    pub frames: Vec<Frame<K>>,
    pub meta: Meta,
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    /// Total number of frames, aliases included.
    pub num_frames: usize,
    /// Frames that share a canonical frame's stored rect.
    pub num_aliases: usize,
    pub num_rotated: usize,
    pub num_trimmed: usize,
    /// Page area in pixels.
    pub page_area: u64,
    /// Area covered by stored (non-alias) frames.
    pub used_area: u64,
    /// used_area / page_area (0.0 to 1.0). Higher is better.
    pub occupancy: f64,
}

impl<K> Atlas<K> {
    /// Computes packing statistics for this atlas.
    pub fn stats(&self) -> PackStats {
        let page_area = self.width as u64 * self.height as u64;
        let mut num_aliases = 0;
        let mut num_rotated = 0;
        let mut num_trimmed = 0;
        let mut used_area = 0u64;
        for f in &self.frames {
            if f.is_alias() {
                num_aliases += 1;
            } else {
                used_area += f.frame.area();
            }
            if f.rotated {
                num_rotated += 1;
            }
            if f.trimmed {
                num_trimmed += 1;
            }
        }
        let occupancy = if page_area > 0 {
            used_area as f64 / page_area as f64
        } else {
            0.0
        };
        PackStats {
            num_frames: self.frames.len(),
            num_aliases,
            num_rotated,
            num_trimmed,
            page_area,
            used_area,
            occupancy,
        }
    }

    /// Area covered by stored frames, in pixels.
    pub fn used_area(&self) -> u64 {
        self.frames
            .iter()
            .filter(|f| !f.is_alias())
            .map(|f| f.frame.area())
            .sum()
    }
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Frames: {} ({} aliases), Occupancy: {:.2}%, Page: {} px², Used: {} px², Rotated: {}, Trimmed: {}",
            self.num_frames,
            self.num_aliases,
            self.occupancy * 100.0,
            self.page_area,
            self.used_area,
            self.num_rotated,
            self.num_trimmed,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.page_area.saturating_sub(self.used_area)
    }
}
