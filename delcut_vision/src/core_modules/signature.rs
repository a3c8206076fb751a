// THEORY:
// A `FeatureSignature` is the compact fingerprint of one image: a texture score (how
// rough or detailed the surface is) and a color histogram (what hues and saturations
// it shows). It is derived once per image and never changes afterwards; every later
// decision works from signatures alone, never from pixels.

use crate::core_modules::histogram::ColorHistogram;
use crate::core_modules::pixel::pixel::{HUE_RANGE, SATURATION_RANGE};
use crate::core_modules::texture;
use crate::error::{InspectionError, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HUE_BINS: usize = 180;
pub const DEFAULT_SATURATION_BINS: usize = 256;

/// Discretization of the color histogram. Must be identical for every image compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub hue_bins: usize,
    pub saturation_bins: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            hue_bins: DEFAULT_HUE_BINS,
            saturation_bins: DEFAULT_SATURATION_BINS,
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=HUE_RANGE as usize).contains(&self.hue_bins) {
            return Err(InspectionError::InvalidConfig(format!(
                "hue_bins must be within 1..={HUE_RANGE}, got {}",
                self.hue_bins
            )));
        }
        if !(1..=SATURATION_RANGE as usize).contains(&self.saturation_bins) {
            return Err(InspectionError::InvalidConfig(format!(
                "saturation_bins must be within 1..={SATURATION_RANGE}, got {}",
                self.saturation_bins
            )));
        }
        Ok(())
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.hue_bins, self.saturation_bins)
    }
}

/// Texture score plus color histogram for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSignature {
    texture_score: f64,
    color_histogram: ColorHistogram,
}

impl FeatureSignature {
    /// Assembles a signature from precomputed parts. Negative or non-finite texture
    /// scores are clamped to 0.
    pub fn new(texture_score: f64, color_histogram: ColorHistogram) -> Self {
        let texture_score = if texture_score.is_finite() { texture_score.max(0.0) } else { 0.0 };
        Self {
            texture_score,
            color_histogram,
        }
    }

    /// Variance of the Laplacian response; non-negative.
    pub fn texture_score(&self) -> f64 {
        self.texture_score
    }

    /// Min-max normalized hue × saturation distribution.
    pub fn color_histogram(&self) -> &ColorHistogram {
        &self.color_histogram
    }

    pub fn shape(&self) -> (usize, usize) {
        self.color_histogram.shape()
    }
}

/// Derives the signature of a decoded image.
pub fn extract_features(image: &RgbImage, config: &ExtractionConfig) -> Result<FeatureSignature> {
    if image.width() == 0 || image.height() == 0 {
        log::warn!("Rejecting empty {}x{} image", image.width(), image.height());
        return Err(InspectionError::EmptyImage);
    }
    config.validate()?;

    let texture_score = texture::texture_score(image);
    let color_histogram = ColorHistogram::from_image(image, config.hue_bins, config.saturation_bins)?;

    log::debug!(
        "Extracted signature from {}x{} image: texture={:.3}, bins={:?}",
        image.width(),
        image.height(),
        texture_score,
        color_histogram.shape()
    );

    Ok(FeatureSignature::new(texture_score, color_histogram))
}
