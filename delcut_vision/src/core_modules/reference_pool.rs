// THEORY:
// The `ReferencePool` is the session's memory of known defects. It is an explicit value
// owned by the caller: built once from the uploaded RED samples, then handed by
// reference to every decision. Nothing in the engine holds it globally, so two sessions
// (or two tests) can never see each other's references.
//
// The pool keeps insertion order, because the first-match policy scans it in that order
// and stops early. It also pins the histogram shape of its first entry; later entries
// with a different discretization are refused, which keeps every pair of signatures in
// the pool directly comparable.

use crate::core_modules::signature::{ExtractionConfig, FeatureSignature, extract_features};
use crate::error::{InspectionError, Result};
use image::RgbImage;

/// One known-defect sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    /// Identifying name, typically the uploaded file name.
    pub label: String,
    pub signature: FeatureSignature,
}

impl ReferenceEntry {
    pub fn new(label: impl Into<String>, signature: FeatureSignature) -> Self {
        Self {
            label: label.into(),
            signature,
        }
    }
}

/// Ordered collection of reference entries for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferencePool {
    entries: Vec<ReferenceEntry>,
}

impl ReferencePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a pool from entries, keeping their order.
    pub fn from_entries(entries: impl IntoIterator<Item = ReferenceEntry>) -> Result<Self> {
        let mut pool = Self::new();
        for entry in entries {
            pool.push(entry)?;
        }
        Ok(pool)
    }

    /// Appends an entry and returns it. Fails if its histogram shape differs from the pool's.
    pub fn push(&mut self, entry: ReferenceEntry) -> Result<&ReferenceEntry> {
        if let Some(expected) = self.shape() {
            let found = entry.signature.shape();
            if found != expected {
                log::warn!("Refusing reference '{}' with {:?} bins", entry.label, found);
                return Err(InspectionError::IncompatibleSignature { expected, found });
            }
        }
        self.entries.push(entry);
        self.entries.last().ok_or(InspectionError::EmptyReferencePool)
    }

    /// Extracts the signature of `image` and appends it under `label`.
    pub fn add_image(
        &mut self,
        label: impl Into<String>,
        image: &RgbImage,
        config: &ExtractionConfig,
    ) -> Result<&ReferenceEntry> {
        let signature = extract_features(image, config)?;
        self.push(ReferenceEntry::new(label, signature))
    }

    /// Histogram shape shared by all entries, `None` while empty.
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.entries.first().map(|entry| entry.signature.shape())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReferenceEntry> {
        self.entries.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.label.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a ReferencePool {
    type Item = &'a ReferenceEntry;
    type IntoIter = std::slice::Iter<'a, ReferenceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
