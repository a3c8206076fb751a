// THEORY:
// The `ColorHistogram` is the color half of a feature signature. It answers "what
// mix of hues and saturations does this surface show?" independently of where in
// the frame those colors occur and of the frame's resolution.
//
// Key architectural principles:
// 1.  **Fixed Discretization**: Hue (0..180) and saturation (0..256) are each split into
//     a configured number of equal-width bins. Two histograms are only comparable when
//     their bin counts match, and the shape travels with the data so that can be checked.
// 2.  **Min-Max Normalization**: After counting, bins are rescaled so the smallest bin is
//     0 and the largest is 1. This is a range normalization, not a probability density;
//     the comparator downstream is a correlation, which is invariant to that rescaling.
//     A histogram whose bins are all equal has no range and normalizes to all zeros.
// 3.  **Immutability**: Once built, a histogram is never mutated. It is a value.

use crate::core_modules::pixel::pixel::{HUE_RANGE, Pixel, SATURATION_RANGE};
use crate::core_modules::similarity;
use crate::error::{InspectionError, Result};
use image::RgbImage;

/// A min-max normalized hue × saturation distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorHistogram {
    hue_bins: usize,
    saturation_bins: usize,
    /// Row-major by hue: `values[h * saturation_bins + s]`.
    values: Vec<f32>,
}

impl ColorHistogram {
    /// Counts the hue/saturation of every pixel and normalizes the result.
    pub fn from_image(image: &RgbImage, hue_bins: usize, saturation_bins: usize) -> Result<Self> {
        Self::check_bins(hue_bins, saturation_bins)?;

        let mut counts = vec![0u64; hue_bins * saturation_bins];
        for rgb in image.pixels() {
            let hsv = Pixel::from(rgb).hsv();
            let h = bin_index(hsv.hue as u32, HUE_RANGE, hue_bins);
            let s = bin_index(hsv.saturation as u32, SATURATION_RANGE, saturation_bins);
            counts[h * saturation_bins + s] += 1;
        }

        let counts: Vec<f64> = counts.into_iter().map(|c| c as f64).collect();
        Ok(Self {
            hue_bins,
            saturation_bins,
            values: normalize_min_max(&counts),
        })
    }

    /// Builds a histogram from raw bin weights, normalizing them into [0, 1].
    pub fn from_counts(hue_bins: usize, saturation_bins: usize, counts: Vec<f32>) -> Result<Self> {
        Self::check_bins(hue_bins, saturation_bins)?;
        if counts.len() != hue_bins * saturation_bins {
            return Err(InspectionError::InvalidConfig(format!(
                "histogram of {hue_bins}x{saturation_bins} bins needs {} values, got {}",
                hue_bins * saturation_bins,
                counts.len()
            )));
        }
        if counts.iter().any(|c| !c.is_finite()) {
            return Err(InspectionError::InvalidConfig(
                "histogram values must be finite".to_string(),
            ));
        }

        let counts: Vec<f64> = counts.into_iter().map(f64::from).collect();
        Ok(Self {
            hue_bins,
            saturation_bins,
            values: normalize_min_max(&counts),
        })
    }

    fn check_bins(hue_bins: usize, saturation_bins: usize) -> Result<()> {
        if hue_bins == 0 || hue_bins > HUE_RANGE as usize {
            return Err(InspectionError::InvalidConfig(format!(
                "hue bins must be within 1..={HUE_RANGE}, got {hue_bins}"
            )));
        }
        if saturation_bins == 0 || saturation_bins > SATURATION_RANGE as usize {
            return Err(InspectionError::InvalidConfig(format!(
                "saturation bins must be within 1..={SATURATION_RANGE}, got {saturation_bins}"
            )));
        }
        Ok(())
    }

    /// `(hue_bins, saturation_bins)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.hue_bins, self.saturation_bins)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, hue_bin: usize, saturation_bin: usize) -> Option<f32> {
        if hue_bin >= self.hue_bins || saturation_bin >= self.saturation_bins {
            return None;
        }
        self.values.get(hue_bin * self.saturation_bins + saturation_bin).copied()
    }

    /// Pearson correlation against another histogram of the same shape.
    pub fn correlation(&self, other: &ColorHistogram) -> Result<f64> {
        if self.shape() != other.shape() {
            return Err(InspectionError::IncompatibleSignature {
                expected: self.shape(),
                found: other.shape(),
            });
        }
        Ok(similarity::correlation(&self.values, &other.values))
    }
}

/// Equal-width binning of `value` in `0..range` into `bins` buckets.
#[inline]
fn bin_index(value: u32, range: u32, bins: usize) -> usize {
    ((value as usize * bins) / range as usize).min(bins - 1)
}

/// Rescales so that min -> 0 and max -> 1. A flat input maps to all zeros.
///
/// Works in f64 so pixel counts past 2^24 keep their exact ratios; only the
/// normalized result is narrowed to f32.
fn normalize_min_max(values: &[f64]) -> Vec<f32> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let range = max - min;

    if range <= f64::EPSILON {
        return vec![0.0; values.len()];
    }

    values
        .iter()
        .map(|v| ((v - min) / range).clamp(0.0, 1.0) as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn values_always_lie_in_unit_range() {
        let image = RgbImage::from_fn(40, 30, |x, y| {
            Rgb([(x * 6) as u8, (y * 8) as u8, ((x + y) * 3) as u8])
        });
        let histogram = ColorHistogram::from_image(&image, 180, 256).unwrap();
        assert!(histogram.values().iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(histogram.values().iter().any(|v| *v == 1.0));
        assert!(histogram.values().iter().any(|v| *v == 0.0));
    }

    #[test]
    fn single_color_image_peaks_in_one_bin() {
        let image = RgbImage::from_pixel(10, 10, Rgb([0, 0, 255]));
        let histogram = ColorHistogram::from_image(&image, 180, 256).unwrap();
        assert_eq!(histogram.get(120, 255), Some(1.0));
        assert_eq!(histogram.values().iter().filter(|v| **v > 0.0).count(), 1);
    }

    #[test]
    fn shape_does_not_depend_on_resolution() {
        let small = RgbImage::from_pixel(3, 2, Rgb([10, 200, 30]));
        let large = RgbImage::from_pixel(300, 200, Rgb([10, 200, 30]));
        let a = ColorHistogram::from_image(&small, 30, 32).unwrap();
        let b = ColorHistogram::from_image(&large, 30, 32).unwrap();
        assert_eq!(a.shape(), (30, 32));
        assert_eq!(a, b);
    }

    #[test]
    fn coarse_bins_merge_neighbouring_values() {
        assert_eq!(bin_index(0, 180, 18), 0);
        assert_eq!(bin_index(9, 180, 18), 0);
        assert_eq!(bin_index(10, 180, 18), 1);
        assert_eq!(bin_index(179, 180, 18), 17);
        assert_eq!(bin_index(255, 256, 1), 0);
    }

    #[test]
    fn flat_counts_normalize_to_zero() {
        let histogram = ColorHistogram::from_counts(2, 2, vec![3.0; 4]).unwrap();
        assert_eq!(histogram.values(), &[0.0; 4]);
    }

    #[test]
    fn counts_are_rescaled_between_min_and_max() {
        let histogram = ColorHistogram::from_counts(1, 4, vec![2.0, 4.0, 6.0, 10.0]).unwrap();
        assert_eq!(histogram.values(), &[0.0, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn large_bin_counts_keep_exact_ratios() {
        // Counts above 2^24 are not representable as consecutive f32 integers.
        let values = normalize_min_max(&[0.0, 2_000_000.0, 18_000_000.0, 16_777_217.0]);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], (1.0f64 / 9.0) as f32);
        assert_eq!(values[2], 1.0);
        assert_eq!(values[3], (16_777_217.0f64 / 18_000_000.0) as f32);
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(ColorHistogram::from_counts(0, 4, vec![]).is_err());
        assert!(ColorHistogram::from_counts(181, 1, vec![0.0; 181]).is_err());
        assert!(ColorHistogram::from_counts(2, 2, vec![1.0; 3]).is_err());
        assert!(ColorHistogram::from_counts(1, 2, vec![1.0, f32::NAN]).is_err());
    }

    #[test]
    fn correlation_requires_matching_shapes() {
        let a = ColorHistogram::from_counts(1, 4, vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let b = ColorHistogram::from_counts(2, 2, vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            a.correlation(&b),
            Err(InspectionError::IncompatibleSignature { expected: (1, 4), found: (2, 2) })
        ));
        assert!((a.correlation(&a).unwrap() - 1.0).abs() < 1e-9);
    }
}
