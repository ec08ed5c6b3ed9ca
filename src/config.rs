use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PaletteError, Result};
use crate::generate::{DEFAULT_COLORS, clamp_color_count};
use crate::quantize::{KMeansQuantizer, MedianCutQuantizer, Quantizer, QuantizerKind};

/// Light or dark page theme. Purely cosmetic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Tunables for extraction and generation.
///
/// Every field has a default, so a config file only needs the keys it changes:
///
/// ```toml
/// color_count = 8
/// quantizer = "median-cut"
/// downscale = 128
///
/// [kmeans]
/// seed = 42
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub color_count: usize,
    pub quantizer: QuantizerKind,
    pub kmeans: KMeansQuantizer,
    /// Longest side (pixels) images are reduced to before sampling.
    pub downscale: Option<u32>,
    pub theme: Theme,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        PaletteConfig {
            color_count: DEFAULT_COLORS,
            quantizer: QuantizerKind::default(),
            kmeans: KMeansQuantizer::default(),
            downscale: Some(256),
            theme: Theme::default(),
        }
    }
}

impl PaletteConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: PaletteConfig =
            toml::from_str(raw).map_err(|e| PaletteError::Config(e.to_string()))?;
        config.validated()
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: PaletteConfig =
            serde_json::from_str(raw).map_err(|e| PaletteError::Config(e.to_string()))?;
        config.validated()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    fn validated(mut self) -> Result<Self> {
        self.color_count = clamp_color_count(i64::try_from(self.color_count).unwrap_or(i64::MAX));
        if !(self.kmeans.converge.is_finite() && self.kmeans.converge >= 0.0) {
            return Err(PaletteError::Config(format!(
                "kmeans.converge must be a non-negative number, got {}",
                self.kmeans.converge
            )));
        }
        if self.downscale == Some(0) {
            self.downscale = None;
        }
        Ok(self)
    }

    /// The quantization strategy this config selects.
    pub fn quantizer(&self) -> Box<dyn Quantizer> {
        match self.quantizer {
            QuantizerKind::KMeans => Box::new(self.kmeans.clone()),
            QuantizerKind::MedianCut => Box::new(MedianCutQuantizer),
        }
    }
}
