//! Error types for the inspection engine.

use thiserror::Error;

/// Result type for inspection operations.
pub type Result<T> = std::result::Result<T, InspectionError>;

/// Everything that can stop an inspection from producing a `Verdict`.
#[derive(Error, Debug)]
pub enum InspectionError {
    /// The supplied bytes are not a decodable image.
    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// A raw buffer does not hold exactly `width * height * 3` bytes.
    #[error("Invalid dimensions: {width}x{height} does not match a buffer of {len} bytes")]
    InvalidDimensions { width: u32, height: u32, len: usize },

    /// The image has no pixels.
    #[error("Image has zero width or height")]
    EmptyImage,

    /// A decision was requested before any reference was supplied.
    #[error("Reference pool is empty; add at least one defect sample before inspecting")]
    EmptyReferencePool,

    /// The single-reference policy was requested against a pool holding several references.
    #[error("Single-reference policy needs exactly one reference, pool holds {count}")]
    AmbiguousReference { count: usize },

    /// Two histograms with different discretizations were compared.
    #[error("Incompatible signature: expected {expected:?} bins, found {found:?}")]
    IncompatibleSignature {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// A configuration value is out of range.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// A background extraction task panicked or was cancelled.
    #[error("Worker error: {0}")]
    Worker(String),
}
