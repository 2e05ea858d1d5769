//! Core library for building sprite atlases.
//!
//! - Algorithms: MaxRects (BAF/BSSF/BL), Guillotine, Skyline, Shelf,
//!   Shelf-FFDH, Simple Row, plus an `Auto` mode that evaluates the whole
//!   portfolio and keeps the most efficient result
//! - Pipeline: `pack_sprites` takes in-memory images through trimming,
//!   flip-deduplication, atlas sizing and packing, and returns the composed
//!   RGBA page + metadata; `pack_layout` computes placements only
//! - Batch: `run_batch` processes independent sprite sets on a worker pool
//!   with memory-gated admission and cooperative cancellation
//! - Data model is serde-serializable; metadata exporters cover JSON
//!   (array/hash), Apple plist and Sparrow/Starling XML.
//!
//! Quick example:
//! ```ignore
//! use atlas_toolbox_core::{InputSprite, PackerConfig, pack_sprites};
//! use image::ImageReader;
//! # fn main() -> anyhow::Result<()> {
//! let inputs = vec![
//!     InputSprite { key: "idle0".into(), image: ImageReader::open("idle0.png")?.decode()? },
//!     InputSprite { key: "idle1".into(), image: ImageReader::open("idle1.png")?.decode()? },
//! ];
//! let out = pack_sprites(inputs, PackerConfig::default())?;
//! println!("{}x{} ({})", out.atlas.width, out.atlas.height, out.atlas.method);
//! # Ok(()) }
//! ```

pub mod batch;
pub mod compose;
pub mod config;
pub mod dedup;
pub mod error;
pub mod export;
pub mod extract;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod progress;
pub mod sizer;
pub mod trim;

pub use batch::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use extract::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;
pub use progress::*;

/// Convenience prelude for the primary APIs.
pub mod prelude {
    pub use crate::batch::{BatchJob, BatchOptions, BatchReport, run_batch};
    pub use crate::config::{
        MaxRectsHeuristic, MetadataFormat, PackMethod, PackerConfig, PackerConfigBuilder,
        SizePolicy, SortOrder, TransparentPolicy,
    };
    pub use crate::model::{Atlas, FlipTransform, Frame, Meta, PackStats, Rect};
    pub use crate::pipeline::{InputSprite, PackOutput, pack_layout, pack_sprites};
    pub use crate::progress::{PackPhase, ProgressEvent, ProgressSink, RunContext};
    pub use crate::{extract_sprites, pack_layout_with, pack_sprites_with, render_metadata};
}
