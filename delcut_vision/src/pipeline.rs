// THEORY:
// The `pipeline` module is the top-level API for the inspection engine. It wraps the
// extractor, the reference pool and the decision engine behind one small interface:
// register known-defect samples, then inspect parts one at a time.
//
// The pipeline owns its `ReferencePool` for convenience, but the pool is still a plain
// value: it can be built elsewhere (e.g. in parallel) and installed with
// `set_references`, or borrowed out for display. No state is kept between inspections
// besides that pool.

use crate::core_modules::decision::{DecisionEngine, DecisionThresholds, PolicySelection};
use crate::core_modules::reference_pool::ReferencePool;
use crate::core_modules::signature::{ExtractionConfig, extract_features};
use crate::error::{InspectionError, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};

// Re-export key data structures for the public API.
pub use crate::core_modules::decision::{MatchPolicy, ReferenceComparison, Verdict};
pub use crate::core_modules::reference_pool::ReferenceEntry;
pub use crate::core_modules::signature::FeatureSignature;

/// Configuration for the InspectionPipeline, allowing for tunable behavior.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionConfig {
    /// Histogram discretization shared by references and test images.
    pub extraction: ExtractionConfig,
    /// Texture ratios and similarity bounds of both policies.
    pub thresholds: DecisionThresholds,
    /// Which policy to apply; `Auto` picks by pool size.
    pub policy: PolicySelection,
}

impl InspectionConfig {
    pub fn validate(&self) -> Result<()> {
        self.extraction.validate()?;
        self.thresholds.validate()
    }
}

/// The main, top-level struct for the inspection engine.
#[derive(Debug, Clone)]
pub struct InspectionPipeline {
    config: InspectionConfig,
    engine: DecisionEngine,
    references: ReferencePool,
}

impl InspectionPipeline {
    pub fn new(config: InspectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: DecisionEngine::new(config.thresholds),
            config,
            references: ReferencePool::new(),
        })
    }

    pub fn config(&self) -> &InspectionConfig {
        &self.config
    }

    /// Extracts and stores a known-defect sample.
    pub fn add_reference(&mut self, label: impl Into<String>, image: &RgbImage) -> Result<&ReferenceEntry> {
        let label = label.into();
        log::debug!("Adding reference '{label}'");
        self.references.add_image(label, image, &self.config.extraction)
    }

    /// Replaces the whole pool, e.g. with one built by `parallel_pipeline`.
    pub fn set_references(&mut self, references: ReferencePool) {
        log::info!("Installed reference pool with {} sample(s)", references.len());
        self.references = references;
    }

    pub fn references(&self) -> &ReferencePool {
        &self.references
    }

    pub fn clear_references(&mut self) {
        self.references.clear();
    }

    pub fn extract(&self, image: &RgbImage) -> Result<FeatureSignature> {
        extract_features(image, &self.config.extraction)
    }

    /// Full analysis of one part: extract, compare, decide.
    pub fn inspect(&self, image: &RgbImage) -> Result<Verdict> {
        if self.references.is_empty() {
            log::warn!("Inspection requested before any reference was added");
            return Err(InspectionError::EmptyReferencePool);
        }
        let signature = self.extract(image)?;
        self.inspect_signature(&signature)
    }

    /// Decision step only, for callers that already hold a signature.
    pub fn inspect_signature(&self, signature: &FeatureSignature) -> Result<Verdict> {
        self.engine.decide(&self.references, signature, self.config.policy)
    }

    pub fn defect_detected(&self, image: &RgbImage) -> Result<bool> {
        Ok(self.inspect(image)?.is_defect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn speckled(base: [u8; 3], seed: u32) -> RgbImage {
        RgbImage::from_fn(48, 48, |x, y| {
            let noise = (x.wrapping_mul(73) ^ y.wrapping_mul(151) ^ seed) % 5 == 0;
            if noise { Rgb([base[0] / 3, base[1] / 3, base[2] / 3]) } else { Rgb(base) }
        })
    }

    fn small_config() -> InspectionConfig {
        InspectionConfig {
            extraction: ExtractionConfig {
                hue_bins: 30,
                saturation_bins: 32,
            },
            ..InspectionConfig::default()
        }
    }

    #[test]
    fn refuses_to_inspect_without_references() {
        let pipeline = InspectionPipeline::new(InspectionConfig::default()).unwrap();
        let image = speckled([200, 50, 50], 1);
        assert!(matches!(pipeline.inspect(&image), Err(InspectionError::EmptyReferencePool)));
        assert!(pipeline.defect_detected(&image).is_err());
    }

    #[test]
    fn identical_part_matches_its_own_reference() {
        let mut pipeline = InspectionPipeline::new(small_config()).unwrap();
        let red = speckled([200, 50, 50], 1);
        pipeline.add_reference("red.png", &red).unwrap();

        let verdict = pipeline.inspect(&red).unwrap();
        assert!(verdict.is_defect);
        assert_eq!(verdict.policy, MatchPolicy::SingleReference);
        assert!((verdict.best_similarity - 1.0).abs() < 1e-6);
        assert_eq!(verdict.matched_label.as_deref(), Some("red.png"));
    }

    #[test]
    fn flat_part_is_accepted() {
        let mut pipeline = InspectionPipeline::new(small_config()).unwrap();
        pipeline.add_reference("red.png", &speckled([200, 50, 50], 1)).unwrap();

        let clean = RgbImage::from_pixel(48, 48, Rgb([200, 50, 50]));
        assert!(!pipeline.defect_detected(&clean).unwrap());
    }

    #[test]
    fn switches_to_first_match_with_several_references() {
        let mut pipeline = InspectionPipeline::new(small_config()).unwrap();
        pipeline.add_reference("red.png", &speckled([200, 50, 50], 1)).unwrap();
        pipeline.add_reference("blue.png", &speckled([40, 60, 220], 2)).unwrap();

        let verdict = pipeline.inspect(&speckled([40, 60, 220], 2)).unwrap();
        assert_eq!(verdict.policy, MatchPolicy::FirstMatch);
        assert!(verdict.is_defect);
        assert_eq!(verdict.matched_label.as_deref(), Some("blue.png"));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = InspectionConfig::default();
        config.thresholds.multi_similarity = 2.0;
        assert!(matches!(InspectionPipeline::new(config), Err(InspectionError::InvalidConfig(_))));
    }

    #[test]
    fn clearing_references_restores_precondition() {
        let mut pipeline = InspectionPipeline::new(small_config()).unwrap();
        let red = speckled([200, 50, 50], 1);
        pipeline.add_reference("red.png", &red).unwrap();
        pipeline.clear_references();
        assert!(pipeline.references().is_empty());
        assert!(matches!(pipeline.inspect(&red), Err(InspectionError::EmptyReferencePool)));
    }
}
