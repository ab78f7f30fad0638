//! Semantic detector contract
//!
//! The semantic detector finds what patterns cannot: person names, addresses
//! and health data. It is external and non-deterministic, so everything it
//! returns is checked against the input before it becomes a [`Span`].

use crate::masking;
use crate::patterns::PatternRegistry;
use async_trait::async_trait;
use kvguard_core::{DetectionSource, RawCandidate, Result, Span};
use std::sync::Arc;
use tracing::debug;

/// Trait for semantic (classifier-backed) detectors
#[async_trait]
pub trait SemanticDetector: Send + Sync {
    /// Report candidate PII spans in `text`
    ///
    /// Implementations may fail freely; the engine turns any error into an
    /// empty candidate list.
    async fn detect_semantic(&self, text: &str) -> Result<Vec<RawCandidate>>;

    /// Get the detector name
    fn name(&self) -> &str;
}

/// Detector that never reports anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSemantic;

#[async_trait]
impl SemanticDetector for NoSemantic {
    async fn detect_semantic(&self, _text: &str) -> Result<Vec<RawCandidate>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "none"
    }
}

#[async_trait]
impl<T: SemanticDetector> SemanticDetector for Option<T> {
    async fn detect_semantic(&self, text: &str) -> Result<Vec<RawCandidate>> {
        match self {
            Some(detector) => detector.detect_semantic(text).await,
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &str {
        match self {
            Some(detector) => detector.name(),
            None => "none",
        }
    }
}

#[async_trait]
impl<T: SemanticDetector + ?Sized> SemanticDetector for Arc<T> {
    async fn detect_semantic(&self, text: &str) -> Result<Vec<RawCandidate>> {
        (**self).detect_semantic(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Turn untrusted candidates into spans over `text`
///
/// Drops candidates outside the semantic category subset, with non-finite or
/// too-low confidence, with empty values, or whose value does not occur in
/// the text. Misplaced offsets are corrected to the occurrence closest to the
/// reported start.
pub(crate) fn candidates_to_spans(
    text: &str,
    candidates: Vec<RawCandidate>,
    min_confidence: f32,
    registry: &PatternRegistry,
) -> Vec<Span> {
    let mut spans = Vec::with_capacity(candidates.len());
    let mut dropped = 0usize;

    for candidate in candidates {
        if !candidate.category.is_semantic()
            || !candidate.confidence.is_finite()
            || candidate.value.is_empty()
        {
            dropped += 1;
            continue;
        }

        let confidence = candidate.confidence.clamp(0.0, 1.0);
        if confidence < min_confidence {
            dropped += 1;
            continue;
        }

        let Some((start, end)) = locate(text, &candidate) else {
            debug!(
                category = %candidate.category,
                start = candidate.start,
                end = candidate.end,
                "Semantic candidate not found in text"
            );
            dropped += 1;
            continue;
        };

        if registry.is_allowlisted(&candidate.value) {
            dropped += 1;
            continue;
        }

        spans.push(Span {
            category: candidate.category,
            masked_value: masking::mask(candidate.category, &candidate.value),
            original_value: candidate.value,
            start,
            end,
            confidence,
            source: DetectionSource::Semantic,
        });
    }

    if dropped > 0 {
        debug!(dropped, accepted = spans.len(), "Filtered semantic candidates");
    }

    spans
}

/// Byte range of the candidate's value in `text`
fn locate(text: &str, candidate: &RawCandidate) -> Option<(usize, usize)> {
    let (start, end) = (candidate.start, candidate.end);

    if start < end && text.get(start..end) == Some(candidate.value.as_str()) {
        return Some((start, end));
    }

    text.match_indices(candidate.value.as_str())
        .map(|(idx, _)| idx)
        .min_by_key(|idx| idx.abs_diff(start))
        .map(|idx| (idx, idx + candidate.value.len()))
}
