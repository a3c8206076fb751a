// THEORY:
// This file is the main entry point for the `delcut_vision` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (like the `delcut_tester` harness).
//
// The primary goal is to export the `InspectionPipeline` and its associated data
// structures (`InspectionConfig`, `Verdict`, etc.) as the clean, high-level
// interface for the whole engine. The building blocks (`core_modules`) stay public
// for callers that want the individual steps: feature extraction, signature
// comparison, and the decision policies.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::decision::{DecisionEngine, DecisionThresholds, MatchPolicy, PolicySelection, Verdict};
pub use core_modules::histogram::ColorHistogram;
pub use core_modules::reference_pool::{ReferenceEntry, ReferencePool};
pub use core_modules::signature::{ExtractionConfig, FeatureSignature, extract_features};
pub use core_modules::similarity::compare_signatures;
pub use core_modules::utils::image_helper::image_helper::{decode_rgb, rgb_from_raw};
pub use error::{InspectionError, Result};
pub use parallel_pipeline::{ReferenceSample, build_reference_pool};
pub use pipeline::{InspectionConfig, InspectionPipeline};
