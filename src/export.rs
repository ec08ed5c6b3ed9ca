use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::generate::SwatchEntry;

/// File name offered for palette downloads.
pub const EXPORT_FILE_NAME: &str = "color-palette.txt";

/// One hex color per line, nothing else.
pub fn palette_text(palette: &[SwatchEntry]) -> String {
    palette
        .iter()
        .map(|entry| entry.color.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// What the copy button puts on the clipboard.
pub fn clipboard_text(entry: &SwatchEntry) -> String {
    entry.color.to_string()
}

/// Write `palette` to `dir/file_name` and return the path written.
pub fn write_palette_file(dir: &Path, file_name: &str, palette: &[SwatchEntry]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, palette_text(palette))?;
    info!(path = %path.display(), colors = palette.len(), "palette written");
    Ok(path)
}
