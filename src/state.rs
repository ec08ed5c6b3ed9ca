use tracing::{debug, info, warn};

use crate::color::{HexColor, PixelSample};
use crate::config::PaletteConfig;
use crate::error::{PaletteError, Result};
use crate::export::{clipboard_text, palette_text};
use crate::extract::extract_samples;
use crate::generate::{SwatchEntry, clamp_color_count, generate};
use crate::quantize::Quantizer;

/// Identifies one upload. Only the most recently issued token may change state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UploadToken(u64);

impl UploadToken {
    pub fn from_raw(raw: u64) -> Self {
        UploadToken(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// What happened to a completed upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Samples replaced and a fresh palette generated.
    Loaded { samples: usize, colors: usize },
    /// A newer upload started first; the result was dropped.
    Stale,
}

/// Everything the palette view renders from: the current image's samples, the
/// palette, and the color count the next regeneration will use.
pub struct PaletteState {
    config: PaletteConfig,
    quantizer: Box<dyn Quantizer>,
    samples: Option<Vec<PixelSample>>,
    palette: Vec<SwatchEntry>,
    color_count: usize,
    upload_seq: u64,
}

impl PaletteState {
    pub fn new(config: PaletteConfig) -> Self {
        let quantizer = config.quantizer();
        let color_count = clamp_color_count(i64::try_from(config.color_count).unwrap_or(i64::MAX));
        PaletteState {
            config,
            quantizer,
            samples: None,
            palette: Vec::new(),
            color_count,
            upload_seq: 0,
        }
    }

    /// Swap the quantization strategy. Takes effect on the next generation.
    pub fn with_quantizer(mut self, quantizer: Box<dyn Quantizer>) -> Self {
        self.quantizer = quantizer;
        self
    }

    pub fn config(&self) -> &PaletteConfig {
        &self.config
    }

    pub fn palette(&self) -> &[SwatchEntry] {
        &self.palette
    }

    pub fn samples(&self) -> &[PixelSample] {
        self.samples.as_deref().unwrap_or_default()
    }

    pub fn has_image(&self) -> bool {
        self.samples.is_some()
    }

    pub fn color_count(&self) -> usize {
        self.color_count
    }

    /// Start a new upload; every earlier token becomes stale.
    pub fn begin_upload(&mut self) -> UploadToken {
        self.upload_seq += 1;
        UploadToken(self.upload_seq)
    }

    fn is_current(&self, token: UploadToken) -> bool {
        token.0 == self.upload_seq
    }

    /// Apply the result of decoding an upload.
    ///
    /// A stale token leaves the state alone. A decode failure clears the image
    /// and palette and hands the error back. Success replaces the samples and
    /// generates a palette with no locks.
    pub fn complete_upload(
        &mut self,
        token: UploadToken,
        decoded: Result<Vec<PixelSample>>,
    ) -> Result<UploadOutcome> {
        if !self.is_current(token) {
            warn!(token = token.0, current = self.upload_seq, "dropping stale upload");
            return Ok(UploadOutcome::Stale);
        }

        match decoded {
            Ok(samples) => {
                self.palette = generate(&samples, self.color_count, &[], self.quantizer.as_ref());
                info!(samples = samples.len(), colors = self.palette.len(), "image loaded");
                let outcome = UploadOutcome::Loaded {
                    samples: samples.len(),
                    colors: self.palette.len(),
                };
                self.samples = Some(samples);
                Ok(outcome)
            }
            Err(err) => {
                self.samples = None;
                self.palette.clear();
                Err(err)
            }
        }
    }

    /// Decode `input` with the configured downscale and apply it.
    pub fn load_image(&mut self, token: UploadToken, input: &[u8]) -> Result<UploadOutcome> {
        if !self.is_current(token) {
            warn!(token = token.0, current = self.upload_seq, "skipping decode of stale upload");
            return Ok(UploadOutcome::Stale);
        }
        let decoded = extract_samples(input, self.config.downscale);
        self.complete_upload(token, decoded)
    }

    /// Flip the lock on one swatch and return its new state.
    pub fn toggle_lock(&mut self, index: usize) -> Result<bool> {
        let len = self.palette.len();
        let entry = self
            .palette
            .get_mut(index)
            .ok_or(PaletteError::SwatchIndex { index, len })?;
        entry.locked = !entry.locked;
        debug!(index, locked = entry.locked, "lock toggled");
        Ok(entry.locked)
    }

    /// Store a new color count (clamped). The palette changes on `regenerate`.
    pub fn set_color_count(&mut self, n: i64) -> usize {
        self.color_count = clamp_color_count(n);
        self.color_count
    }

    /// Lock `colors` at the front of the palette, ahead of what is already
    /// there. A color already present is moved rather than duplicated. The
    /// palette is cut back to the color count; unlocked entries go first.
    pub fn pin_colors(&mut self, colors: impl IntoIterator<Item = HexColor>) {
        let mut pinned: Vec<SwatchEntry> = Vec::new();
        for color in colors {
            if pinned.iter().any(|entry| entry.color == color) {
                continue;
            }
            self.palette.retain(|entry| entry.color != color);
            pinned.push(SwatchEntry::locked(color));
        }
        pinned.append(&mut self.palette);
        // Drop surplus unlocked entries from the back before touching locks.
        while pinned.len() > self.color_count {
            match pinned.iter().rposition(|entry| !entry.locked) {
                Some(i) => {
                    pinned.remove(i);
                }
                None => pinned.truncate(self.color_count),
            }
        }
        self.palette = pinned;
    }

    /// Locked colors in palette order.
    pub fn locked_colors(&self) -> Vec<HexColor> {
        self.palette
            .iter()
            .filter(|entry| entry.locked)
            .map(|entry| entry.color.clone())
            .collect()
    }

    /// Replace every unlocked swatch using the stored samples.
    pub fn regenerate(&mut self) -> Result<&[SwatchEntry]> {
        let samples = self.samples.as_deref().ok_or(PaletteError::NoImage)?;
        let locked = self.locked_colors();
        self.palette = generate(samples, self.color_count, &locked, self.quantizer.as_ref());
        Ok(&self.palette)
    }

    pub fn export_text(&self) -> String {
        palette_text(&self.palette)
    }

    pub fn copy_text(&self, index: usize) -> Result<String> {
        self.palette
            .get(index)
            .map(clipboard_text)
            .ok_or(PaletteError::SwatchIndex {
                index,
                len: self.palette.len(),
            })
    }
}

impl Default for PaletteState {
    fn default() -> Self {
        PaletteState::new(PaletteConfig::default())
    }
}
