use image::{DynamicImage, GenericImageView, RgbaImage, imageops::FilterType};
use palette::Srgb;
use tracing::{debug, warn};

use crate::color::PixelSample;
use crate::error::Result;

/// Decode an uploaded file in any format the `image` crate understands.
pub fn decode_image(input: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(input).map_err(|e| {
        warn!(error = %e, bytes = input.len(), "image decode failed");
        e.into()
    })
}

/// Collect the RGB value of every pixel whose alpha is nonzero, in scan order.
pub fn samples_from_rgba(img: &RgbaImage) -> Vec<PixelSample> {
    img.as_raw()
        .chunks_exact(4)
        .filter(|chunk| chunk[3] != 0)
        .map(|chunk| Srgb::new(chunk[0], chunk[1], chunk[2]))
        .collect()
}

/// Shrink `img` so its longest side is `max_side` (nearest-neighbour).
/// Images already within the limit are returned unchanged.
fn limit_size(img: DynamicImage, max_side: u32) -> DynamicImage {
    let (orig_w, orig_h) = img.dimensions();
    let longest = orig_w.max(orig_h);
    if max_side == 0 || longest <= max_side {
        return img;
    }
    let ratio = max_side as f32 / longest as f32;
    let w = ((orig_w as f32) * ratio).round().max(1.0) as u32;
    let h = ((orig_h as f32) * ratio).round().max(1.0) as u32;
    DynamicImage::ImageRgba8(image::imageops::resize(&img, w, h, FilterType::Nearest))
}

/// Decode `input` and return its opaque pixel samples.
///
/// With `downscale`, large images are first reduced so the longest side is at
/// most that many pixels, which keeps quantization fast on big uploads.
pub fn extract_samples(input: &[u8], downscale: Option<u32>) -> Result<Vec<PixelSample>> {
    let img = decode_image(input)?;
    let (w, h) = img.dimensions();
    let working = match downscale {
        Some(max_side) => limit_size(img, max_side),
        None => img,
    };

    let samples = samples_from_rgba(&working.to_rgba8());
    debug!(width = w, height = h, samples = samples.len(), "extracted pixel samples");
    Ok(samples)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::PaletteError;
    use image::{ImageFormat, Rgba};

    /// PNG-encode an RGBA buffer for tests that go through decoding.
    pub(crate) fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img.clone())
            .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn transparent_region_is_excluded() {
        // Left half transparent green, right half opaque blue.
        let img = RgbaImage::from_fn(8, 4, |x, _| {
            if x < 4 {
                Rgba([0, 255, 0, 0])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let samples = extract_samples(&png_bytes(&img), None).unwrap();
        assert_eq!(samples.len(), 16);
        assert!(samples.iter().all(|s| *s == Srgb::new(0, 0, 255)));
    }

    #[test]
    fn partially_transparent_pixels_are_kept() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 1]));
        let samples = samples_from_rgba(&img);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], Srgb::new(10, 20, 30));
    }

    #[test]
    fn samples_follow_scan_order() {
        let img = RgbaImage::from_fn(2, 2, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let samples = samples_from_rgba(&img);
        let expected = vec![
            Srgb::new(0, 0, 0),
            Srgb::new(1, 0, 0),
            Srgb::new(0, 1, 0),
            Srgb::new(1, 1, 0),
        ];
        assert_eq!(samples, expected);
    }

    #[test]
    fn fully_transparent_image_yields_no_samples() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 0]));
        let samples = extract_samples(&png_bytes(&img), Some(64)).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn downscale_limits_sample_count() {
        let img = RgbaImage::from_pixel(100, 50, Rgba([200, 100, 50, 255]));
        let samples = extract_samples(&png_bytes(&img), Some(10)).unwrap();
        assert_eq!(samples.len(), 10 * 5);

        let untouched = extract_samples(&png_bytes(&img), Some(500)).unwrap();
        assert_eq!(untouched.len(), 100 * 50);
    }

    #[test]
    fn garbage_input_is_a_decode_error() {
        let err = extract_samples(b"definitely not an image", None).unwrap_err();
        assert!(matches!(err, PaletteError::Decode(_)));
    }
}
