use std::collections::HashMap;

use kmeans_colors::{Sort, get_kmeans};
use palette::{Lab, Srgb};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::{PixelSample, from_lab, to_lab};

/// Reduces a set of samples to at most `k` representative colors.
///
/// Implementations return colors most dominant first, without duplicates, and
/// may return fewer than `k` when the input has few distinct colors. Empty
/// input or `k == 0` yields an empty vector.
pub trait Quantizer {
    fn quantize(&self, samples: &[PixelSample], k: usize) -> Vec<PixelSample>;
}

/// Which quantization strategy to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuantizerKind {
    #[default]
    #[serde(alias = "kmeans")]
    KMeans,
    MedianCut,
}

/// Distinct colors with their pixel counts, most frequent first.
/// Ties are broken by channel value so the order is stable.
pub fn histogram(samples: &[PixelSample]) -> Vec<(PixelSample, usize)> {
    let mut counts: HashMap<[u8; 3], usize> = HashMap::new();
    for s in samples {
        *counts.entry([s.red, s.green, s.blue]).or_insert(0) += 1;
    }
    let mut hist: Vec<([u8; 3], usize)> = counts.into_iter().collect();
    hist.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    hist.into_iter()
        .map(|([r, g, b], n)| (Srgb::new(r, g, b), n))
        .collect()
}

/// Shared shortcut: when there are no more distinct colors than requested,
/// those colors are the answer.
fn few_distinct(samples: &[PixelSample], k: usize) -> Result<Vec<PixelSample>, Vec<(PixelSample, usize)>> {
    let hist = histogram(samples);
    if hist.len() <= k {
        Ok(hist.into_iter().map(|(c, _)| c).collect())
    } else {
        Err(hist)
    }
}

fn dedup_in_order(colors: Vec<PixelSample>) -> Vec<PixelSample> {
    let mut out: Vec<PixelSample> = Vec::with_capacity(colors.len());
    for c in colors {
        if !out.contains(&c) {
            out.push(c);
        }
    }
    out
}

// ------------------------------------------------------------
// k-means in Lab
// ------------------------------------------------------------

/// k-means clustering in CIE Lab via `kmeans_colors`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansQuantizer {
    /// Independent runs (seeds `seed..seed + runs`); the lowest score wins.
    pub runs: u32,
    pub max_iter: usize,
    pub converge: f32,
    pub seed: u64,
}

impl Default for KMeansQuantizer {
    fn default() -> Self {
        KMeansQuantizer {
            runs: 3,
            max_iter: 20,
            converge: 1e-4,
            seed: 0,
        }
    }
}

impl Quantizer for KMeansQuantizer {
    fn quantize(&self, samples: &[PixelSample], k: usize) -> Vec<PixelSample> {
        if samples.is_empty() || k == 0 {
            return Vec::new();
        }
        if let Ok(distinct) = few_distinct(samples, k) {
            return distinct;
        }

        let lab_pixels: Vec<Lab> = samples.iter().map(|&s| to_lab(s)).collect();
        let runs = self.runs.max(1);
        let best = (0..runs)
            .map(|i| {
                get_kmeans(
                    k,
                    self.max_iter,
                    self.converge,
                    false,
                    &lab_pixels,
                    self.seed.wrapping_add(u64::from(i)),
                )
            })
            .min_by(|a, b| a.score.total_cmp(&b.score));
        let Some(kmeans) = best else {
            return Vec::new();
        };
        debug!(k, runs, score = kmeans.score, "k-means finished");

        let mut clusters = Lab::sort_indexed_colors(&kmeans.centroids, &kmeans.indices);
        clusters.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
        let colors = clusters
            .iter()
            .filter(|c| c.percentage > 0.0)
            .map(|c| from_lab(c.centroid))
            .collect();
        dedup_in_order(colors)
    }
}

// ------------------------------------------------------------
// Median cut in RGB
// ------------------------------------------------------------

/// Weighted median cut over the RGB histogram. Fully deterministic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MedianCutQuantizer;

#[derive(Debug)]
struct ColorBox {
    entries: Vec<([u8; 3], usize)>,
}

impl ColorBox {
    fn population(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// (widest channel, its range)
    fn widest_channel(&self) -> (usize, u8) {
        let mut lo = [u8::MAX; 3];
        let mut hi = [u8::MIN; 3];
        for (c, _) in &self.entries {
            for ch in 0..3 {
                lo[ch] = lo[ch].min(c[ch]);
                hi[ch] = hi[ch].max(c[ch]);
            }
        }
        (0..3)
            .map(|ch| (ch, hi[ch] - lo[ch]))
            .fold((0, 0), |best, cur| if cur.1 > best.1 { cur } else { best })
    }

    fn priority(&self) -> usize {
        self.population() * usize::from(self.widest_channel().1)
    }

    fn split(mut self) -> (ColorBox, ColorBox) {
        let (axis, _) = self.widest_channel();
        self.entries.sort_unstable_by_key(|(c, _)| (c[axis], *c));

        let half = self.population() / 2;
        let mut accumulated = 0usize;
        let mut split_idx = 1;
        for (i, (_, n)) in self.entries.iter().enumerate() {
            accumulated += n;
            if accumulated >= half {
                split_idx = i + 1;
                break;
            }
        }
        // At least one entry per side.
        split_idx = split_idx.clamp(1, self.entries.len() - 1);

        let right = self.entries.split_off(split_idx);
        (ColorBox { entries: self.entries }, ColorBox { entries: right })
    }

    fn mean(&self) -> PixelSample {
        let total = self.population().max(1) as f64;
        let mut sums = [0f64; 3];
        for (c, n) in &self.entries {
            for ch in 0..3 {
                sums[ch] += f64::from(c[ch]) * *n as f64;
            }
        }
        let avg = |ch: usize| (sums[ch] / total).round().clamp(0.0, 255.0) as u8;
        Srgb::new(avg(0), avg(1), avg(2))
    }
}

impl Quantizer for MedianCutQuantizer {
    fn quantize(&self, samples: &[PixelSample], k: usize) -> Vec<PixelSample> {
        if samples.is_empty() || k == 0 {
            return Vec::new();
        }
        let hist = match few_distinct(samples, k) {
            Ok(distinct) => return distinct,
            Err(hist) => hist,
        };

        let entries = hist
            .into_iter()
            .map(|(c, n)| ([c.red, c.green, c.blue], n))
            .collect();
        let mut boxes = vec![ColorBox { entries }];
        while boxes.len() < k {
            let best_idx = boxes
                .iter()
                .enumerate()
                .filter(|(_, b)| b.entries.len() >= 2)
                .max_by_key(|(_, b)| b.priority())
                .map(|(i, _)| i);
            let Some(idx) = best_idx else {
                break;
            };
            let (left, right) = boxes.swap_remove(idx).split();
            boxes.push(left);
            boxes.push(right);
        }
        debug!(k, boxes = boxes.len(), "median cut finished");

        boxes.sort_by(|a, b| b.population().cmp(&a.population()));
        dedup_in_order(boxes.iter().map(ColorBox::mean).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeat(color: (u8, u8, u8), n: usize) -> Vec<PixelSample> {
        vec![Srgb::new(color.0, color.1, color.2); n]
    }

    fn three_color_samples() -> Vec<PixelSample> {
        let mut samples = repeat((255, 0, 0), 60);
        samples.extend(repeat((0, 0, 255), 30));
        samples.extend(repeat((0, 255, 0), 10));
        samples
    }

    fn gradient_samples() -> Vec<PixelSample> {
        (0..=255u8)
            .flat_map(|v| [Srgb::new(v, 0, 255 - v), Srgb::new(v, v, v)])
            .collect()
    }

    #[test]
    fn histogram_orders_by_frequency_then_channels() {
        let mut samples = repeat((9, 9, 9), 2);
        samples.extend(repeat((1, 1, 1), 1));
        samples.extend(repeat((0, 0, 0), 1));
        let hist = histogram(&samples);
        assert_eq!(
            hist,
            vec![
                (Srgb::new(9, 9, 9), 2),
                (Srgb::new(0, 0, 0), 1),
                (Srgb::new(1, 1, 1), 1),
            ]
        );
    }

    #[test]
    fn empty_input_or_zero_k_yields_nothing() {
        let quantizers: [&dyn Quantizer; 2] = [&KMeansQuantizer::default(), &MedianCutQuantizer];
        for q in quantizers {
            assert!(q.quantize(&[], 5).is_empty());
            assert!(q.quantize(&three_color_samples(), 0).is_empty());
        }
    }

    #[test]
    fn few_distinct_colors_are_returned_by_dominance() {
        let quantizers: [&dyn Quantizer; 2] = [&KMeansQuantizer::default(), &MedianCutQuantizer];
        for q in quantizers {
            let colors = q.quantize(&three_color_samples(), 5);
            assert_eq!(
                colors,
                vec![Srgb::new(255, 0, 0), Srgb::new(0, 0, 255), Srgb::new(0, 255, 0)]
            );
        }
    }

    #[test]
    fn kmeans_returns_at_most_k_unique_colors() {
        let colors = KMeansQuantizer::default().quantize(&gradient_samples(), 4);
        assert!(!colors.is_empty());
        assert!(colors.len() <= 4);
        for (i, c) in colors.iter().enumerate() {
            assert!(!colors[i + 1..].contains(c));
        }
    }

    #[test]
    fn kmeans_is_deterministic_for_a_fixed_seed() {
        let q = KMeansQuantizer::default();
        let samples = gradient_samples();
        assert_eq!(q.quantize(&samples, 6), q.quantize(&samples, 6));
    }

    #[test]
    fn median_cut_splits_into_k_boxes() {
        let colors = MedianCutQuantizer.quantize(&gradient_samples(), 6);
        assert_eq!(colors.len(), 6);
        for (i, c) in colors.iter().enumerate() {
            assert!(!colors[i + 1..].contains(c));
        }
    }

    #[test]
    fn median_cut_separates_two_clusters() {
        let mut samples = repeat((250, 10, 10), 25);
        samples.extend(repeat((252, 12, 8), 25));
        samples.extend(repeat((10, 10, 250), 25));
        samples.extend(repeat((12, 8, 248), 25));
        let colors = MedianCutQuantizer.quantize(&samples, 2);
        assert_eq!(colors.len(), 2);
        let reddish = colors.iter().filter(|c| c.red > 200 && c.blue < 20).count();
        let bluish = colors.iter().filter(|c| c.blue > 200 && c.red < 20).count();
        assert_eq!((reddish, bluish), (1, 1));
    }

    #[test]
    fn quantizer_kind_uses_kebab_case() {
        let kind: QuantizerKind = serde_json::from_str("\"median-cut\"").unwrap();
        assert_eq!(kind, QuantizerKind::MedianCut);
        assert_eq!(serde_json::to_string(&QuantizerKind::KMeans).unwrap(), "\"k-means\"");
    }
}
