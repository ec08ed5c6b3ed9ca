use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::{HexColor, PixelSample};
use crate::quantize::Quantizer;

pub const MIN_COLORS: usize = 2;
pub const MAX_COLORS: usize = 10;
pub const DEFAULT_COLORS: usize = 5;

/// One displayed palette entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwatchEntry {
    pub color: HexColor,
    pub locked: bool,
}

impl SwatchEntry {
    pub fn locked(color: HexColor) -> Self {
        SwatchEntry { color, locked: true }
    }

    pub fn unlocked(color: HexColor) -> Self {
        SwatchEntry { color, locked: false }
    }
}

/// Bring any requested color count into `MIN_COLORS..=MAX_COLORS`.
pub fn clamp_color_count(n: i64) -> usize {
    n.clamp(MIN_COLORS as i64, MAX_COLORS as i64) as usize
}

/// Build a palette of `target_count` entries: the locked colors first, in the
/// order given, followed by freshly quantized colors for the remaining slots.
///
/// Quantized colors equal to a locked color are skipped, so a locked color
/// appears exactly once. When there are more locked colors than slots, the
/// earliest ones are kept.
/// An empty sample set yields an empty palette without calling the quantizer.
pub fn generate(
    samples: &[PixelSample],
    target_count: usize,
    locked: &[HexColor],
    quantizer: &dyn Quantizer,
) -> Vec<SwatchEntry> {
    if samples.is_empty() {
        debug!("no samples, palette is empty");
        return Vec::new();
    }

    let target = target_count.clamp(MIN_COLORS, MAX_COLORS);
    let k = target.saturating_sub(locked.len());
    // Ask for extra colors so that skipping locked ones still fills the slots.
    let generated: Vec<HexColor> = if k > 0 {
        quantizer
            .quantize(samples, k + locked.len())
            .into_iter()
            .map(HexColor::from)
            .filter(|color| !locked.contains(color))
            .take(k)
            .collect()
    } else {
        Vec::new()
    };
    debug!(target, locked = locked.len(), requested = k, generated = generated.len(), "palette generated");

    locked
        .iter()
        .cloned()
        .map(SwatchEntry::locked)
        .chain(generated.into_iter().map(SwatchEntry::unlocked))
        .take(target)
        .collect()
}
