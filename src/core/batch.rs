use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Serialize;

use super::enhance::EnhancementSettings;
use super::params::{clamp_image_count, GenerationRequest};
use super::result::{GeneratedImage, GenerationFailure, GenerationResult};

/// Anything that turns a request into exactly one result
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult;
}

/// How the calls of one batch are issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// One call at a time, in order
    #[default]
    Sequential,
    /// All calls in flight together; results keep request order
    Concurrent,
}

/// A failed call within a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// 1-based position of the call
    pub index: usize,
    #[serde(flatten)]
    pub failure: GenerationFailure,
}

/// Successful image within a batch
#[derive(Debug, Clone)]
pub struct BatchImage {
    /// 1-based position of the call that produced it
    pub index: usize,
    pub image: GeneratedImage,
}

/// Collected results of N independent calls
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub requested: usize,
    pub images: Vec<BatchImage>,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    fn collect(results: Vec<GenerationResult>) -> Self {
        let mut outcome = BatchOutcome {
            requested: results.len(),
            ..Default::default()
        };

        for (idx, result) in results.into_iter().enumerate() {
            match result {
                GenerationResult::Image(image) => outcome.images.push(BatchImage {
                    index: idx + 1,
                    image,
                }),
                GenerationResult::Failure(failure) => {
                    tracing::warn!("Image {} failed: {}", idx + 1, failure);
                    outcome.failures.push(BatchFailure {
                        index: idx + 1,
                        failure,
                    });
                }
            }
        }

        outcome
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Apply filters to every image, in place
    pub fn enhance(&mut self, settings: &EnhancementSettings) {
        if settings.is_identity() {
            return;
        }
        for entry in &mut self.images {
            entry.image.bitmap = settings.apply(&entry.image.bitmap);
        }
    }
}

/// Issue `count` (clamped to 1..=4) independent calls for the same request
pub async fn generate_batch<G>(
    generator: &G,
    request: &GenerationRequest,
    count: u8,
    mode: BatchMode,
) -> BatchOutcome
where
    G: ImageGenerator + ?Sized,
{
    let count = clamp_image_count(count) as usize;
    tracing::debug!("Generating {} image(s) ({:?})", count, mode);

    let results = match mode {
        BatchMode::Sequential => {
            let mut results = Vec::with_capacity(count);
            for _ in 0..count {
                results.push(generator.generate(request).await);
            }
            results
        }
        BatchMode::Concurrent => join_all((0..count).map(|_| generator.generate(request))).await,
    };

    BatchOutcome::collect(results)
}
