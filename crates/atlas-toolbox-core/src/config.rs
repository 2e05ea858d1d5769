use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Packing configuration and the enums that select algorithm behavior.
/// Key notes:
///   - `method` selects the packing algorithm; `Auto` evaluates the whole
///     portfolio and keeps the most efficient result
///   - `size` is the sizing policy (automatic search, bounded search, or
///     fixed dimensions); `power_of_two` rounds each axis independently
///   - `format` caps which features (rotation/flip/trim) may be enabled;
///     `validate()` rejects combinations the format cannot represent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PackMethod {
    MaxRects,
    Guillotine,
    Shelf,
    ShelfFfdh,
    Skyline,
    SimpleRow,
    /// Try every algorithm and keep the best result (efficiency, then area).
    Auto,
}

impl PackMethod {
    /// Fixed tie-break priority for `Auto`, strongest packer first.
    pub const PRIORITY: [PackMethod; 6] = [
        PackMethod::MaxRects,
        PackMethod::Skyline,
        PackMethod::Guillotine,
        PackMethod::ShelfFfdh,
        PackMethod::Shelf,
        PackMethod::SimpleRow,
    ];
}

impl fmt::Display for PackMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PackMethod::MaxRects => "maxrects",
            PackMethod::Guillotine => "guillotine",
            PackMethod::Shelf => "shelf",
            PackMethod::ShelfFfdh => "shelf_ffdh",
            PackMethod::Skyline => "skyline",
            PackMethod::SimpleRow => "simple_row",
            PackMethod::Auto => "auto",
        };
        f.write_str(s)
    }
}

impl FromStr for PackMethod {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "maxrects" => Ok(Self::MaxRects),
            "guillotine" => Ok(Self::Guillotine),
            "shelf" => Ok(Self::Shelf),
            "shelf_ffdh" | "ffdh" => Ok(Self::ShelfFfdh),
            "skyline" => Ok(Self::Skyline),
            "simple_row" | "row" => Ok(Self::SimpleRow),
            "auto" => Ok(Self::Auto),
            _ => Err(()),
        }
    }
}

/// MaxRects free-rect scoring heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaxRectsHeuristic {
    /// Try every heuristic and keep the best total efficiency.
    Auto,
    BestAreaFit,
    BestShortSideFit,
    BottomLeft,
}

impl FromStr for MaxRectsHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "baf" | "best_area_fit" => Ok(Self::BestAreaFit),
            "bssf" | "best_short_side_fit" => Ok(Self::BestShortSideFit),
            "bl" | "bottom_left" => Ok(Self::BottomLeft),
            _ => Err(()),
        }
    }
}

/// Atlas sizing policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum SizePolicy {
    /// Search for the smallest working size, then shrink to content.
    Automatic,
    /// Search within `[min, max]` per axis.
    MinMax { min: u32, max: u32 },
    /// Use exactly these dimensions; packing may fail with
    /// `InsufficientSpace`.
    Manual { width: u32, height: u32 },
}

/// What to do with a fully transparent sprite when trimming is enabled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransparentPolicy {
    /// Pack the sprite untrimmed.
    Keep,
    /// Drop the sprite from the atlas.
    Skip,
    /// Fail the run with `EmptySprite`.
    Abort,
}

impl FromStr for TransparentPolicy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            _ => Err(()),
        }
    }
}

/// Target metadata formats. Each format caps which placement features it can
/// describe; configs enabling more are rejected up front.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetadataFormat {
    JsonHash,
    JsonArray,
    Plist,
    SparrowXml,
}

impl MetadataFormat {
    pub fn supports_rotation(self) -> bool {
        !matches!(self, MetadataFormat::SparrowXml)
    }
    pub fn supports_flip(self) -> bool {
        matches!(self, MetadataFormat::JsonHash | MetadataFormat::JsonArray)
    }
    pub fn supports_trim(self) -> bool {
        true
    }
    pub fn name(self) -> &'static str {
        match self {
            MetadataFormat::JsonHash => "json-hash",
            MetadataFormat::JsonArray => "json-array",
            MetadataFormat::Plist => "plist",
            MetadataFormat::SparrowXml => "sparrow-xml",
        }
    }
}

impl FromStr for MetadataFormat {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json-hash" | "json_hash" => Ok(Self::JsonHash),
            "json-array" | "json_array" | "json" => Ok(Self::JsonArray),
            "plist" => Ok(Self::Plist),
            "sparrow-xml" | "sparrow_xml" | "sparrow" | "starling" => Ok(Self::SparrowXml),
            _ => Err(()),
        }
    }
}

/// Sorting orders for deterministic packing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    AreaDesc,
    MaxSideDesc,
    HeightDesc,
    WidthDesc,
    NameAsc,
    None,
}

impl FromStr for SortOrder {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "area_desc" => Ok(Self::AreaDesc),
            "max_side_desc" => Ok(Self::MaxSideDesc),
            "height_desc" => Ok(Self::HeightDesc),
            "width_desc" => Ok(Self::WidthDesc),
            "name_asc" => Ok(Self::NameAsc),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackerConfig {
    /// Packing algorithm.
    pub method: PackMethod,
    /// MaxRects scoring heuristic.
    pub mr_heuristic: MaxRectsHeuristic,
    /// Atlas sizing policy.
    pub size: SizePolicy,
    /// Round final page dimensions up to powers of two, per axis.
    pub power_of_two: bool,

    /// Pixels around the entire page border.
    pub border_padding: u32,
    /// Pixels between frames.
    pub texture_padding: u32,

    /// Allow 90° rotations for placements where beneficial.
    pub allow_rotation: bool,
    /// Collapse mirror-image sprites to one stored bitmap plus flip metadata.
    pub allow_flip_dedup: bool,

    /// Trim transparent borders (alpha <= trim_threshold).
    pub trim: bool,
    pub trim_threshold: u8,
    /// Policy for fully transparent sprites under trimming.
    pub transparent_policy: TransparentPolicy,

    pub sort_order: SortOrder,

    /// Target metadata format; bounds which features may be enabled.
    pub format: MetadataFormat,

    /// Optional time budget for the Auto portfolio (milliseconds). None or 0
    /// disables.
    pub time_budget_ms: Option<u64>,
    /// Evaluate Auto candidates in parallel when the `parallel` feature is on.
    pub parallel: bool,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            mr_heuristic: default_mr_heuristic(),
            size: default_size_policy(),
            power_of_two: false,
            border_padding: 0,
            texture_padding: 2,
            allow_rotation: false,
            allow_flip_dedup: false,
            trim: true,
            trim_threshold: 0,
            transparent_policy: default_transparent_policy(),
            sort_order: default_sort_order(),
            format: default_format(),
            time_budget_ms: None,
            parallel: false,
        }
    }
}

fn default_method() -> PackMethod {
    PackMethod::MaxRects
}
fn default_mr_heuristic() -> MaxRectsHeuristic {
    MaxRectsHeuristic::BestAreaFit
}
fn default_size_policy() -> SizePolicy {
    SizePolicy::Automatic
}
fn default_transparent_policy() -> TransparentPolicy {
    TransparentPolicy::Keep
}
fn default_sort_order() -> SortOrder {
    SortOrder::AreaDesc
}
fn default_format() -> MetadataFormat {
    MetadataFormat::JsonHash
}

impl PackerConfig {
    /// Validates the configuration.
    ///
    /// Rejects zero or inverted dimensions, borders that leave no usable
    /// space, and feature/format combinations the target format cannot
    /// represent.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AtlasError;

        match self.size {
            SizePolicy::Manual { width, height } => {
                if width == 0 || height == 0 {
                    return Err(AtlasError::InvalidConfig(format!(
                        "manual atlas size {}x{} has a zero dimension",
                        width, height
                    )));
                }
                let total_border = self.border_padding.saturating_mul(2);
                if total_border >= width || total_border >= height {
                    return Err(AtlasError::InvalidConfig(format!(
                        "border_padding ({}) * 2 leaves no space in a {}x{} atlas",
                        self.border_padding, width, height
                    )));
                }
            }
            SizePolicy::MinMax { min, max } => {
                if min == 0 || max == 0 || min > max {
                    return Err(AtlasError::InvalidConfig(format!(
                        "invalid size range [{}, {}]",
                        min, max
                    )));
                }
                if max > crate::sizer::MAX_ATLAS_DIMENSION {
                    return Err(AtlasError::InvalidConfig(format!(
                        "size range max {} exceeds the {} hard cap",
                        max,
                        crate::sizer::MAX_ATLAS_DIMENSION
                    )));
                }
            }
            SizePolicy::Automatic => {}
        }

        if self.allow_rotation && !self.format.supports_rotation() {
            return Err(AtlasError::UnsupportedFeature {
                feature: "rotation",
                format: self.format.name().into(),
            });
        }
        if self.allow_flip_dedup && !self.format.supports_flip() {
            return Err(AtlasError::UnsupportedFeature {
                feature: "flip deduplication",
                format: self.format.name().into(),
            });
        }
        if self.trim && !self.format.supports_trim() {
            return Err(AtlasError::UnsupportedFeature {
                feature: "trimming",
                format: self.format.name().into(),
            });
        }
        Ok(())
    }

    /// Create a fluent builder for `PackerConfig`.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::new()
    }
}

/// Builder for `PackerConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackerConfigBuilder {
    cfg: PackerConfig,
}

impl PackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackerConfig::default(),
        }
    }
    pub fn method(mut self, v: PackMethod) -> Self {
        self.cfg.method = v;
        self
    }
    pub fn mr_heuristic(mut self, v: MaxRectsHeuristic) -> Self {
        self.cfg.mr_heuristic = v;
        self
    }
    pub fn automatic_size(mut self) -> Self {
        self.cfg.size = SizePolicy::Automatic;
        self
    }
    pub fn min_max_size(mut self, min: u32, max: u32) -> Self {
        self.cfg.size = SizePolicy::MinMax { min, max };
        self
    }
    pub fn manual_size(mut self, width: u32, height: u32) -> Self {
        self.cfg.size = SizePolicy::Manual { width, height };
        self
    }
    pub fn pow2(mut self, v: bool) -> Self {
        self.cfg.power_of_two = v;
        self
    }
    pub fn border_padding(mut self, v: u32) -> Self {
        self.cfg.border_padding = v;
        self
    }
    pub fn texture_padding(mut self, v: u32) -> Self {
        self.cfg.texture_padding = v;
        self
    }
    pub fn allow_rotation(mut self, v: bool) -> Self {
        self.cfg.allow_rotation = v;
        self
    }
    pub fn allow_flip_dedup(mut self, v: bool) -> Self {
        self.cfg.allow_flip_dedup = v;
        self
    }
    pub fn trim(mut self, v: bool) -> Self {
        self.cfg.trim = v;
        self
    }
    pub fn trim_threshold(mut self, v: u8) -> Self {
        self.cfg.trim_threshold = v;
        self
    }
    pub fn transparent_policy(mut self, v: TransparentPolicy) -> Self {
        self.cfg.transparent_policy = v;
        self
    }
    pub fn sort_order(mut self, v: SortOrder) -> Self {
        self.cfg.sort_order = v;
        self
    }
    pub fn format(mut self, v: MetadataFormat) -> Self {
        self.cfg.format = v;
        self
    }
    pub fn time_budget_ms(mut self, v: Option<u64>) -> Self {
        self.cfg.time_budget_ms = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> PackerConfig {
        self.cfg
    }
}
