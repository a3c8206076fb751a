// THEORY:
// The decision engine turns signatures into a verdict. It never looks at pixels; it only
// weighs texture scores and color similarities against thresholds.
//
// Two matching strategies exist, expressed as variants of one `MatchPolicy` rather than
// as two copies of the same loop:
// 1.  **SingleReference**: one known defect. The test piece is flagged when it is at
//     least as textured as 85% of the reference AND its colors correlate above 0.45.
//     Both conditions must hold; either alone is not enough.
// 2.  **FirstMatch**: a pool of known defects scanned in order. Each reference is judged
//     on its own (similarity above 0.55 AND texture at least 80% of that reference's);
//     the first reference that passes flags the piece and ends the scan.
//
// Because `FirstMatch` stops early, the reported best similarity and label only cover
// the references actually evaluated. The verdict lists those comparisons and says
// whether the scan was cut short, so a presenter can word "best similarity" honestly.

use crate::core_modules::reference_pool::{ReferenceEntry, ReferencePool};
use crate::core_modules::signature::FeatureSignature;
use crate::core_modules::similarity::compare_signatures;
use crate::error::{InspectionError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SINGLE_TEXTURE_RATIO: f64 = 0.85;
pub const DEFAULT_SINGLE_SIMILARITY: f64 = 0.45;
pub const DEFAULT_MULTI_TEXTURE_RATIO: f64 = 0.8;
pub const DEFAULT_MULTI_SIMILARITY: f64 = 0.55;

/// The matching strategy a verdict was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Threshold test against exactly one reference.
    SingleReference,
    /// Ordered scan of the pool, stopping at the first qualifying reference.
    FirstMatch,
}

/// How the engine picks a `MatchPolicy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicySelection {
    /// `SingleReference` for a pool of one, `FirstMatch` otherwise.
    #[default]
    Auto,
    SingleReference,
    FirstMatch,
}

impl PolicySelection {
    pub fn resolve(self, pool_len: usize) -> MatchPolicy {
        match self {
            PolicySelection::Auto if pool_len == 1 => MatchPolicy::SingleReference,
            PolicySelection::Auto => MatchPolicy::FirstMatch,
            PolicySelection::SingleReference => MatchPolicy::SingleReference,
            PolicySelection::FirstMatch => MatchPolicy::FirstMatch,
        }
    }
}

/// Tunable bounds of both policies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    /// Fraction of the reference texture the test must reach (single reference).
    pub single_texture_ratio: f64,
    /// Similarity the test must exceed (single reference).
    pub single_similarity: f64,
    /// Fraction of each reference's texture the test must reach (first match).
    pub multi_texture_ratio: f64,
    /// Similarity the test must exceed against a reference (first match).
    pub multi_similarity: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            single_texture_ratio: DEFAULT_SINGLE_TEXTURE_RATIO,
            single_similarity: DEFAULT_SINGLE_SIMILARITY,
            multi_texture_ratio: DEFAULT_MULTI_TEXTURE_RATIO,
            multi_similarity: DEFAULT_MULTI_SIMILARITY,
        }
    }
}

impl DecisionThresholds {
    pub fn validate(&self) -> Result<()> {
        for (name, ratio) in [
            ("single_texture_ratio", self.single_texture_ratio),
            ("multi_texture_ratio", self.multi_texture_ratio),
        ] {
            if !ratio.is_finite() || ratio < 0.0 {
                return Err(InspectionError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {ratio}"
                )));
            }
        }
        for (name, bound) in [
            ("single_similarity", self.single_similarity),
            ("multi_similarity", self.multi_similarity),
        ] {
            if !(-1.0..=1.0).contains(&bound) {
                return Err(InspectionError::InvalidConfig(format!(
                    "{name} must lie within [-1, 1], got {bound}"
                )));
            }
        }
        Ok(())
    }
}

/// Outcome of judging the test signature against one reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceComparison {
    pub label: String,
    /// Raw color correlation, in [-1, 1].
    pub similarity: f64,
    /// Texture score the test had to reach for this reference.
    pub texture_threshold: f64,
    /// Whether this reference alone satisfied its policy's conditions.
    pub matched: bool,
}

/// Classification of one test image.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub policy: MatchPolicy,
    pub is_defect: bool,
    /// Highest similarity seen among evaluated references, floored at 0.
    pub best_similarity: f64,
    /// Reference that produced `best_similarity`; `None` if no similarity exceeded 0.
    pub matched_label: Option<String>,
    /// Texture score of the test image.
    pub texture_score: f64,
    /// Every reference actually evaluated, in pool order.
    pub comparisons: Vec<ReferenceComparison>,
    /// True when a match ended the scan before the last reference was evaluated.
    pub scan_stopped_early: bool,
}

impl Verdict {
    /// Raw similarity of a single-reference verdict.
    pub fn similarity(&self) -> Option<f64> {
        match self.policy {
            MatchPolicy::SingleReference => self.comparisons.first().map(|c| c.similarity),
            MatchPolicy::FirstMatch => None,
        }
    }

    /// Texture threshold of a single-reference verdict.
    pub fn texture_threshold(&self) -> Option<f64> {
        match self.policy {
            MatchPolicy::SingleReference => self.comparisons.first().map(|c| c.texture_threshold),
            MatchPolicy::FirstMatch => None,
        }
    }
}

/// Applies a `MatchPolicy` to a test signature and a reference pool.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    thresholds: DecisionThresholds,
}

impl DecisionEngine {
    pub fn new(thresholds: DecisionThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &DecisionThresholds {
        &self.thresholds
    }

    /// Resolves `selection` against the pool size, then evaluates.
    pub fn decide(
        &self,
        pool: &ReferencePool,
        test: &FeatureSignature,
        selection: PolicySelection,
    ) -> Result<Verdict> {
        if pool.is_empty() {
            return Err(InspectionError::EmptyReferencePool);
        }
        self.evaluate(selection.resolve(pool.len()), pool, test)
    }

    /// Evaluates an explicit policy.
    pub fn evaluate(
        &self,
        policy: MatchPolicy,
        pool: &ReferencePool,
        test: &FeatureSignature,
    ) -> Result<Verdict> {
        match policy {
            MatchPolicy::SingleReference => match pool.entries() {
                [] => Err(InspectionError::EmptyReferencePool),
                [reference] => self.single_reference(reference, test),
                entries => Err(InspectionError::AmbiguousReference {
                    count: entries.len(),
                }),
            },
            MatchPolicy::FirstMatch => self.first_match(pool, test),
        }
    }

    /// Threshold test against one reference: texture AND similarity.
    pub fn single_reference(
        &self,
        reference: &ReferenceEntry,
        test: &FeatureSignature,
    ) -> Result<Verdict> {
        Self::check_shape(reference.signature.shape(), test)?;

        let similarity = compare_signatures(&reference.signature, test);
        let texture_threshold = reference.signature.texture_score() * self.thresholds.single_texture_ratio;
        let is_defect =
            test.texture_score() >= texture_threshold && similarity > self.thresholds.single_similarity;

        log::info!(
            "Single-reference verdict against '{}': defect={} similarity={:.4} texture={:.3} threshold={:.3}",
            reference.label,
            is_defect,
            similarity,
            test.texture_score(),
            texture_threshold
        );

        let has_similarity = similarity > 0.0;
        Ok(Verdict {
            policy: MatchPolicy::SingleReference,
            is_defect,
            best_similarity: similarity.max(0.0),
            matched_label: has_similarity.then(|| reference.label.clone()),
            texture_score: test.texture_score(),
            comparisons: vec![ReferenceComparison {
                label: reference.label.clone(),
                similarity,
                texture_threshold,
                matched: is_defect,
            }],
            scan_stopped_early: false,
        })
    }

    /// Ordered scan; the first reference meeting both of its conditions flags the piece.
    pub fn first_match(&self, pool: &ReferencePool, test: &FeatureSignature) -> Result<Verdict> {
        let Some(shape) = pool.shape() else {
            return Err(InspectionError::EmptyReferencePool);
        };
        Self::check_shape(shape, test)?;

        let mut best_similarity = 0.0f64;
        let mut matched_label = None;
        let mut is_defect = false;
        let mut scan_stopped_early = false;
        let mut comparisons = Vec::with_capacity(pool.len());

        for (index, reference) in pool.iter().enumerate() {
            let similarity = compare_signatures(&reference.signature, test);
            let texture_threshold = reference.signature.texture_score() * self.thresholds.multi_texture_ratio;

            if similarity > best_similarity {
                best_similarity = similarity;
                matched_label = Some(reference.label.clone());
            }

            let matched =
                similarity > self.thresholds.multi_similarity && test.texture_score() >= texture_threshold;
            log::debug!(
                "Compared against '{}': similarity={:.4} threshold={:.3} matched={}",
                reference.label,
                similarity,
                texture_threshold,
                matched
            );
            comparisons.push(ReferenceComparison {
                label: reference.label.clone(),
                similarity,
                texture_threshold,
                matched,
            });

            if matched {
                is_defect = true;
                scan_stopped_early = index + 1 < pool.len();
                break;
            }
        }

        log::info!(
            "First-match verdict: defect={} best_similarity={:.4} label={:?} evaluated={}/{}",
            is_defect,
            best_similarity,
            matched_label,
            comparisons.len(),
            pool.len()
        );

        Ok(Verdict {
            policy: MatchPolicy::FirstMatch,
            is_defect,
            best_similarity,
            matched_label,
            texture_score: test.texture_score(),
            comparisons,
            scan_stopped_early,
        })
    }

    fn check_shape(expected: (usize, usize), test: &FeatureSignature) -> Result<()> {
        let found = test.shape();
        if found != expected {
            return Err(InspectionError::IncompatibleSignature { expected, found });
        }
        Ok(())
    }
}
