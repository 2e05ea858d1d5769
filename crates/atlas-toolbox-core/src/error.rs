use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Nothing to pack")]
    Empty,
    #[error("Sprite `{key}` is fully transparent")]
    EmptySprite { key: String },
    #[error("{feature} is not representable in the {format} metadata format")]
    UnsupportedFeature {
        feature: &'static str,
        format: String,
    },
    #[error("Automatic sizing exhausted the search up to {max_dimension}x{max_dimension}")]
    SizeSearchExhausted { max_dimension: u32 },
    #[error("No atlas size within [{min}, {max}] fits all sprites")]
    NoFittingSize { min: u32, max: u32 },
    #[error("Atlas of {width}x{height} is too small: placed {placed} of {total} sprites")]
    InsufficientSpace {
        width: u32,
        height: u32,
        placed: usize,
        total: usize,
    },
    #[error("Encoding error: {0}")]
    Encode(String),
    #[error("Run was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, AtlasError>;
