use crate::model::FlipTransform;
use image::RgbaImage;
use image::imageops;
use std::collections::HashMap;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Result of matching a sprite against the already-seen canonical set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// First sprite with this signature; it becomes canonical entry `idx`.
    Canonical(usize),
    /// Mirror variant of canonical entry `idx`; the transform maps the
    /// canonical bitmap onto this one.
    AliasOf(usize, FlipTransform),
}

/// Detects sprites that are mirror images (or exact duplicates) of an earlier
/// sprite. Matching is order-dependent: the first sprite seen with a given
/// signature stays canonical for the rest of the run.
///
/// Signatures are XxHash64 digests canonicalized over the four flip
/// orientations; every hash match is confirmed byte-exact, so a collision
/// falls back to treating the sprite as unique.
pub struct SpriteDeduplicator {
    by_signature: HashMap<u64, usize>,
    canonical: Vec<RgbaImage>,
}

impl SpriteDeduplicator {
    pub fn new() -> Self {
        Self {
            by_signature: HashMap::new(),
            canonical: Vec::new(),
        }
    }

    /// Classify `image` against the sprites seen so far. Canonical sprites are
    /// retained internally for collision verification; the caller keeps its
    /// own mapping from canonical indices to sprite keys.
    pub fn classify(&mut self, image: &RgbaImage) -> DedupOutcome {
        if let Some(&idx) = self.by_signature.get(&canonical_signature(image)) {
            if let Some(t) = find_flip(&self.canonical[idx], image) {
                return DedupOutcome::AliasOf(idx, t);
            }
            // Signature collision with no pixel-exact match: the sprite stays
            // unique and the first entry keeps owning the signature.
            let idx = self.canonical.len();
            self.canonical.push(image.clone());
            return DedupOutcome::Canonical(idx);
        }
        let idx = self.canonical.len();
        self.by_signature.insert(canonical_signature(image), idx);
        self.canonical.push(image.clone());
        DedupOutcome::Canonical(idx)
    }

    /// Number of canonical sprites recorded so far.
    pub fn canonical_count(&self) -> usize {
        self.canonical.len()
    }
}

impl Default for SpriteDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a flip transform to a bitmap.
pub fn apply_flip(image: &RgbaImage, t: FlipTransform) -> RgbaImage {
    match t {
        FlipTransform::None => image.clone(),
        FlipTransform::Horizontal => imageops::flip_horizontal(image),
        FlipTransform::Vertical => imageops::flip_vertical(image),
        FlipTransform::Both => imageops::flip_vertical(&imageops::flip_horizontal(image)),
    }
}

/// Smallest XxHash64 digest over the four flip orientations. The flip group
/// is closed, so every orientation of the same bitmap family yields the same
/// signature.
pub fn canonical_signature(image: &RgbaImage) -> u64 {
    FlipTransform::ALL
        .iter()
        .map(|&t| pixel_hash(&apply_flip(image, t)))
        .min()
        .unwrap_or(0)
}

/// Transform `t` such that `apply_flip(canonical, t)` equals `candidate`
/// byte for byte, if any. Identity is tried first so exact duplicates map to
/// `FlipTransform::None`.
pub fn find_flip(canonical: &RgbaImage, candidate: &RgbaImage) -> Option<FlipTransform> {
    if canonical.dimensions() != candidate.dimensions() {
        return None;
    }
    FlipTransform::ALL.iter().copied().find(|&t| {
        let flipped = apply_flip(canonical, t);
        flipped.dimensions() == candidate.dimensions() && flipped.as_raw() == candidate.as_raw()
    })
}

fn pixel_hash(image: &RgbaImage) -> u64 {
    let (w, h) = image.dimensions();
    let mut hasher = XxHash64::default();
    hasher.write_u32(w);
    hasher.write_u32(h);
    hasher.write(image.as_raw());
    hasher.finish()
}
