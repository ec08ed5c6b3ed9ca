use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

use crate::config::{PaletteConfig, Theme};
use crate::error::PaletteError;
use crate::export::EXPORT_FILE_NAME;
use crate::extract_palette_hex;
use crate::generate::SwatchEntry;
use crate::naming::nearest_name;
use crate::state::{PaletteState, UploadOutcome, UploadToken};

fn js_err(err: PaletteError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn swatch_object(entry: &SwatchEntry) -> Result<Object, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &JsValue::from_str("color"), &JsValue::from_str(entry.color.as_str()))?;
    Reflect::set(&obj, &JsValue::from_str("locked"), &JsValue::from_bool(entry.locked))?;
    Reflect::set(
        &obj,
        &JsValue::from_str("name"),
        &JsValue::from_str(nearest_name(&entry.color).name),
    )?;
    Ok(obj)
}

/// Palette state for one page.
///
/// The page reads the file, calls `begin_upload` before handing the bytes to
/// `load_image`, then renders `swatches()`. Clipboard writes and the download
/// Blob are done by the page with `copy_text` / `export_text`.
#[wasm_bindgen]
pub struct PaletteSession {
    state: PaletteState,
    theme: Theme,
}

#[wasm_bindgen]
impl PaletteSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> PaletteSession {
        PaletteSession::from_config(PaletteConfig::default())
    }

    /// Build a session from a JSON config object (missing keys use defaults).
    pub fn with_config(json: &str) -> Result<PaletteSession, JsValue> {
        let config = PaletteConfig::from_json_str(json).map_err(js_err)?;
        Ok(PaletteSession::from_config(config))
    }

    /// Returns the token to pass to `load_image` for this upload.
    pub fn begin_upload(&mut self) -> f64 {
        self.state.begin_upload().get() as f64
    }

    /// Decode and sample an upload. Returns `false` when a newer upload has
    /// started in the meantime and this one was ignored.
    pub fn load_image(&mut self, token: f64, input: Vec<u8>) -> Result<bool, JsValue> {
        let token = UploadToken::from_raw(token as u64);
        match self.state.load_image(token, &input).map_err(js_err)? {
            UploadOutcome::Loaded { .. } => Ok(true),
            UploadOutcome::Stale => Ok(false),
        }
    }

    pub fn has_image(&self) -> bool {
        self.state.has_image()
    }

    /// Store the slider value (clamped to 2..=10) and return what was stored.
    pub fn set_color_count(&mut self, n: i32) -> u32 {
        self.state.set_color_count(i64::from(n)) as u32
    }

    pub fn color_count(&self) -> u32 {
        self.state.color_count() as u32
    }

    pub fn toggle_lock(&mut self, index: usize) -> Result<bool, JsValue> {
        self.state.toggle_lock(index).map_err(js_err)
    }

    pub fn regenerate(&mut self) -> Result<Array, JsValue> {
        self.state.regenerate().map_err(js_err)?;
        self.swatches()
    }

    /// `[{ color, locked, name }, ...]` in display order.
    pub fn swatches(&self) -> Result<Array, JsValue> {
        let out = Array::new();
        for entry in self.state.palette() {
            let obj = swatch_object(entry)?;
            out.push(&obj);
        }
        Ok(out)
    }

    pub fn copy_text(&self, index: usize) -> Result<String, JsValue> {
        self.state.copy_text(index).map_err(js_err)
    }

    pub fn export_text(&self) -> String {
        self.state.export_text()
    }

    pub fn export_file_name(&self) -> String {
        EXPORT_FILE_NAME.to_string()
    }

    /// Flip light/dark and return the new theme name.
    pub fn toggle_theme(&mut self) -> String {
        self.theme = self.theme.toggled();
        self.theme.as_str().to_string()
    }

    pub fn theme(&self) -> String {
        self.theme.as_str().to_string()
    }
}

impl PaletteSession {
    fn from_config(config: PaletteConfig) -> PaletteSession {
        let theme = config.theme;
        PaletteSession {
            state: PaletteState::new(config),
            theme,
        }
    }

    pub fn state(&self) -> &PaletteState {
        &self.state
    }
}

impl Default for PaletteSession {
    fn default() -> Self {
        PaletteSession::new()
    }
}

/// One-shot extraction: decode `input` and return `n_colors` hex strings.
#[wasm_bindgen]
pub fn extract_palette(input: Vec<u8>, n_colors: usize) -> Result<Array, JsValue> {
    let palette = extract_palette_hex(&input, n_colors, &PaletteConfig::default()).map_err(js_err)?;

    let palette_js = Array::new();
    for hex in &palette {
        palette_js.push(&JsValue::from_str(hex));
    }
    Ok(palette_js)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tests::png_bytes;
    use image::{Rgba, RgbaImage};

    #[test]
    fn session_tracks_theme_and_count() {
        let mut session = PaletteSession::new();
        assert_eq!(session.theme(), "light");
        assert_eq!(session.toggle_theme(), "dark");
        assert_eq!(session.toggle_theme(), "light");
        assert_eq!(session.set_color_count(99), 10);
        assert_eq!(session.color_count(), 10);
        assert_eq!(session.export_file_name(), "color-palette.txt");
        assert_eq!(session.export_text(), "");
        assert!(!session.has_image());
    }

    #[test]
    fn load_image_reports_stale_uploads() {
        let img = RgbaImage::from_fn(4, 4, |x, _| {
            if x < 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let bytes = png_bytes(&img);
        let mut session = PaletteSession::new();
        let old = session.begin_upload();
        let new = session.begin_upload();

        assert_eq!(session.load_image(new, bytes.clone()).ok(), Some(true));
        assert_eq!(session.load_image(old, bytes).ok(), Some(false));
        assert!(session.has_image());
        assert_eq!(session.export_text(), "#0000ff\n#ff0000");
        assert_eq!(session.copy_text(1).ok().as_deref(), Some("#ff0000"));
        assert!(session.toggle_lock(0).ok().unwrap());
        assert_eq!(session.state().locked_colors().len(), 1);
    }

    #[test]
    fn config_json_sets_initial_theme() {
        let session = PaletteSession::with_config(r#"{"theme": "dark", "color_count": 3}"#)
            .ok()
            .unwrap();
        assert_eq!(session.theme(), "dark");
        assert_eq!(session.state().color_count(), 3);
    }
}
