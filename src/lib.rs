//! Dominant color palette extraction for uploaded images.
//!
//! The browser page drives a [`wasm::PaletteSession`]; native callers use
//! [`PaletteState`] directly or the `palette-cli` binary.

pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod generate;
pub mod naming;
pub mod quantize;
pub mod state;
pub mod wasm;

pub use color::{HexColor, PixelSample, parse_hex, rgb_to_hex};
pub use config::{PaletteConfig, Theme};
pub use error::{PaletteError, Result};
pub use export::{EXPORT_FILE_NAME, clipboard_text, palette_text};
pub use extract::{decode_image, extract_samples, samples_from_rgba};
pub use generate::{MAX_COLORS, MIN_COLORS, SwatchEntry, clamp_color_count, generate};
pub use naming::{ColorName, nearest_name};
pub use quantize::{KMeansQuantizer, MedianCutQuantizer, Quantizer, QuantizerKind, histogram};
pub use state::{PaletteState, UploadOutcome, UploadToken};

/// Decode `input` and return up to `n_colors` dominant colors as `#rrggbb`,
/// using `config`'s downscale and quantizer. Backs `wasm::extract_palette`.
pub fn extract_palette_hex(
    input: &[u8],
    n_colors: usize,
    config: &PaletteConfig,
) -> Result<Vec<String>> {
    let samples = extract_samples(input, config.downscale)?;
    let palette = generate(&samples, n_colors, &[], config.quantizer().as_ref());
    Ok(palette.into_iter().map(|entry| entry.color.to_string()).collect())
}
