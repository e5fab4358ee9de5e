//! Extraction pipeline: ordered fallback chain of extraction stages.
//!
//! Stages implement a shared [`ExtractionStage`] contract and are tried in
//! fixed priority order — the generative model first when configured, the
//! heuristic extractor always last. The first stage to produce a candidate
//! is canonical; stage outputs are never merged. Because the heuristic
//! stage is total, a run always terminates with a usable candidate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::candidate::EventCandidate;
use crate::heuristic::HeuristicStage;
use crate::model::{ModelConfig, ModelStage};

/// One extraction strategy.
pub trait ExtractionStage {
    /// Stage name for logs.
    fn name(&self) -> &'static str;

    /// Produce a candidate, or `None` when the stage is unavailable for
    /// this input and the pipeline should fall through to the next stage.
    fn extract(&self, text: &str) -> Option<EventCandidate>;
}

impl ExtractionStage for ModelStage {
    fn name(&self) -> &'static str {
        "model"
    }

    fn extract(&self, text: &str) -> Option<EventCandidate> {
        match self.extract_candidate(text) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                tracing::debug!(error = %e, "model stage unavailable");
                None
            }
        }
    }
}

impl ExtractionStage for HeuristicStage {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn extract(&self, text: &str) -> Option<EventCandidate> {
        Some(HeuristicStage::extract(self, text))
    }
}

/// Cooperative cancellation flag shared between a pipeline run and its
/// caller. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The affected run returns `None` instead of
    /// publishing a result.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Pipeline configuration, constructed by the caller and injected — there
/// is no process-wide session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Generative stage configuration; `None` disables the model stage.
    pub model: Option<ModelConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: Some(ModelConfig::default()),
        }
    }
}

/// The extraction pipeline.
pub struct ExtractionPipeline {
    stages: Vec<Box<dyn ExtractionStage>>,
}

impl ExtractionPipeline {
    /// Build the standard stage chain from a configuration.
    pub fn new(config: PipelineConfig) -> Self {
        let mut stages: Vec<Box<dyn ExtractionStage>> = Vec::new();
        if let Some(model) = config.model {
            stages.push(Box::new(ModelStage::new(model)));
        }
        stages.push(Box::new(HeuristicStage::new()));
        Self { stages }
    }

    /// Build a pipeline from explicit stages, in priority order.
    pub fn with_stages(stages: Vec<Box<dyn ExtractionStage>>) -> Self {
        Self { stages }
    }

    /// Run the pipeline. Always yields exactly one canonical candidate.
    pub fn run(&self, text: &str) -> EventCandidate {
        for stage in &self.stages {
            if let Some(candidate) = stage.extract(text) {
                tracing::debug!(stage = stage.name(), "stage produced the canonical candidate");
                return candidate;
            }
            tracing::debug!(stage = stage.name(), "stage unavailable, falling back");
        }
        EventCandidate::bare(text)
    }

    /// Run the pipeline unless cancelled. A run that observes cancellation —
    /// before a stage or after one returns — publishes nothing.
    pub fn run_with_cancel(&self, text: &str, cancel: &CancelToken) -> Option<EventCandidate> {
        for stage in &self.stages {
            if cancel.is_cancelled() {
                return None;
            }
            let outcome = stage.extract(text);
            if cancel.is_cancelled() {
                return None;
            }
            if let Some(candidate) = outcome {
                return Some(candidate);
            }
        }
        if cancel.is_cancelled() {
            None
        } else {
            Some(EventCandidate::bare(text))
        }
    }
}
