use thiserror::Error;

/// Errors surfaced by palette extraction and palette state transitions.
///
/// None of these are fatal: a failed operation leaves `PaletteState` as it was
/// (or, for a failed decode, empty).
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("Unable to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid hex color `{0}`")]
    InvalidHex(String),

    #[error("Swatch index {index} out of range (palette has {len} entries)")]
    SwatchIndex { index: usize, len: usize },

    #[error("No image loaded")]
    NoImage,

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PaletteError>;
