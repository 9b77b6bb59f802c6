use image::{imageops::FilterType, DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Accent colors derived from cover art: the dominant color plus a darkened
/// border and a lightened halo variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub primary: Rgb,
    pub border: Rgb,
    pub halo: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        // Muted vinyl-sleeve purple, readable on a dark backdrop.
        Theme::from_primary(Rgb(137, 110, 180))
    }
}

const SAMPLE_SIZE: u32 = 32;
const BUCKET_SHIFT: u8 = 5;

impl Theme {
    pub fn from_primary(primary: Rgb) -> Self {
        Self {
            primary,
            border: scale(primary, 0.55),
            halo: lighten(primary, 0.45),
        }
    }

    /// Dominant-color extraction: downscale, bucket the hues, and take the
    /// average of the most populated bucket. Near-black, near-white and
    /// transparent pixels are skipped so letterboxing and glare don't win.
    /// Falls back to the default theme when nothing usable remains.
    pub fn from_image(img: &DynamicImage) -> Self {
        let small = img.resize_exact(SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Triangle);

        let mut buckets: HashMap<(u8, u8, u8), (u64, u64, u64, u64)> = HashMap::new();
        for (_, _, pixel) in small.pixels() {
            let [r, g, b, a] = pixel.0;
            if a < 128 {
                continue;
            }
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            if max < 24 || min > 232 {
                continue;
            }

            let key = (r >> BUCKET_SHIFT, g >> BUCKET_SHIFT, b >> BUCKET_SHIFT);
            let entry = buckets.entry(key).or_insert((0, 0, 0, 0));
            entry.0 += 1;
            entry.1 += u64::from(r);
            entry.2 += u64::from(g);
            entry.3 += u64::from(b);
        }

        let dominant = buckets
            .into_values()
            .max_by_key(|(count, _, _, _)| *count)
            .filter(|(count, _, _, _)| *count > 0);

        match dominant {
            Some((count, r, g, b)) => Theme::from_primary(Rgb(
                (r / count) as u8,
                (g / count) as u8,
                (b / count) as u8,
            )),
            None => Theme::default(),
        }
    }
}

fn scale(color: Rgb, factor: f32) -> Rgb {
    Rgb(
        (f32::from(color.0) * factor) as u8,
        (f32::from(color.1) * factor) as u8,
        (f32::from(color.2) * factor) as u8,
    )
}

fn lighten(color: Rgb, amount: f32) -> Rgb {
    let blend = |c: u8| (f32::from(c) + (255.0 - f32::from(c)) * amount) as u8;
    Rgb(blend(color.0), blend(color.1), blend(color.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn solid(r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_pixel(8, 8, Rgba([r, g, b, 255])))
    }

    #[test]
    fn test_dominant_color_of_solid_image() {
        let theme = Theme::from_image(&solid(200, 40, 40));
        // Triangle resampling keeps a solid image solid.
        assert_eq!(theme.primary, Rgb(200, 40, 40));
    }

    #[test]
    fn test_border_darker_halo_lighter() {
        let theme = Theme::from_primary(Rgb(100, 150, 200));
        assert!(theme.border.0 < theme.primary.0);
        assert!(theme.halo.0 > theme.primary.0);
        assert!(theme.halo.2 > theme.primary.2);
    }

    #[test]
    fn test_black_cover_falls_back_to_default() {
        let theme = Theme::from_image(&solid(0, 0, 0));
        assert_eq!(theme, Theme::default());
    }
}
