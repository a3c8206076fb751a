// THEORY:
// Reference samples are independent of one another, so their signatures can be
// extracted concurrently. Extraction is CPU-bound and pure, which means each sample can
// run on tokio's blocking pool with no shared state and no locking. A semaphore sized
// to the machine's core count keeps a large upload from flooding the blocking pool.
//
// Results are joined in submission order, so the resulting pool has exactly the order
// the samples were supplied in. That order matters to the first-match policy.

use crate::core_modules::reference_pool::{ReferenceEntry, ReferencePool};
use crate::core_modules::signature::{ExtractionConfig, extract_features};
use crate::error::{InspectionError, Result};
use futures::future::join_all;
use image::RgbImage;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task;

/// A decoded known-defect sample waiting for extraction.
#[derive(Debug, Clone)]
pub struct ReferenceSample {
    pub label: String,
    pub image: RgbImage,
}

impl ReferenceSample {
    pub fn new(label: impl Into<String>, image: RgbImage) -> Self {
        Self {
            label: label.into(),
            image,
        }
    }
}

/// Number of samples extracted at the same time.
pub fn worker_limit() -> usize {
    num_cpus::get().max(1)
}

/// Extracts every sample concurrently and collects them into a pool, preserving order.
///
/// The first failing sample aborts the build with its error.
pub async fn build_reference_pool(
    samples: Vec<ReferenceSample>,
    config: ExtractionConfig,
) -> Result<ReferencePool> {
    config.validate()?;
    let permits = Arc::new(Semaphore::new(worker_limit()));
    let total = samples.len();

    let tasks = samples.into_iter().map(|sample| {
        let permits = Arc::clone(&permits);
        async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|err| InspectionError::Worker(err.to_string()))?;
            let ReferenceSample { label, image } = sample;
            let signature = task::spawn_blocking(move || extract_features(&image, &config))
                .await
                .map_err(|err| InspectionError::Worker(format!("extraction of '{label}' failed: {err}")))??;
            Ok::<_, InspectionError>(ReferenceEntry::new(label, signature))
        }
    });

    let entries = join_all(tasks).await.into_iter().collect::<Result<Vec<_>>>()?;
    let pool = ReferencePool::from_entries(entries)?;
    log::info!("{} RED sample(s) processed into the reference pool", pool.len());
    debug_assert_eq!(pool.len(), total);
    Ok(pool)
}
