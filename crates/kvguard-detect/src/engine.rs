//! Detection engine
//!
//! Runs the pattern registry and the semantic detector over the same input
//! concurrently, then merges both span sets and masks the text.

use crate::config::EngineConfig;
use crate::merge::{apply_masks, merge_spans};
use crate::patterns::PatternRegistry;
use crate::semantic::{candidates_to_spans, NoSemantic, SemanticDetector};
use kvguard_core::{DetectionResult, Error, Span};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default deadline for one semantic call
pub const DEFAULT_SEMANTIC_TIMEOUT: Duration = Duration::from_secs(10);

/// PII detection engine
///
/// Holds no per-call state; one engine can serve concurrent callers behind an
/// `Arc`.
#[derive(Debug, Clone)]
pub struct DetectionEngine<S = NoSemantic> {
    registry: PatternRegistry,
    semantic: S,
    semantic_timeout: Duration,
    min_semantic_confidence: f32,
}

impl DetectionEngine<NoSemantic> {
    /// Engine that only uses the pattern registry
    pub fn patterns_only(registry: PatternRegistry) -> Self {
        Self::new(registry, NoSemantic)
    }
}

impl<S: SemanticDetector> DetectionEngine<S> {
    pub fn new(registry: PatternRegistry, semantic: S) -> Self {
        Self {
            registry,
            semantic,
            semantic_timeout: DEFAULT_SEMANTIC_TIMEOUT,
            min_semantic_confidence: 0.0,
        }
    }

    /// Create an engine with semantic timeout and confidence floor taken from
    /// `config`
    pub fn with_config(registry: PatternRegistry, semantic: S, config: &EngineConfig) -> Self {
        Self {
            registry,
            semantic,
            semantic_timeout: config.semantic.timeout(),
            min_semantic_confidence: config.semantic.min_confidence,
        }
    }

    pub fn with_semantic_timeout(mut self, timeout: Duration) -> Self {
        self.semantic_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn semantic(&self) -> &S {
        &self.semantic
    }

    pub fn semantic_timeout(&self) -> Duration {
        self.semantic_timeout
    }

    /// Detect and mask PII in `text`
    ///
    /// Never fails: a semantic error or timeout leaves the pattern results.
    pub async fn detect(&self, text: &str) -> DetectionResult {
        self.detect_with_timeout(text, self.semantic_timeout).await
    }

    /// Same as [`detect`](Self::detect) with a caller-supplied semantic
    /// deadline
    pub async fn detect_with_timeout(&self, text: &str, timeout: Duration) -> DetectionResult {
        let started = Instant::now();

        // Semantic branch first so its request is in flight during the scan.
        let (semantic_spans, pattern_spans) = tokio::join!(
            self.semantic_spans(text, timeout),
            async { self.registry.scan(text) }
        );

        let mut spans = pattern_spans;
        spans.extend(semantic_spans);

        self.finish(text, spans, started)
    }

    /// Pattern-only detection, usable without an async runtime
    pub fn detect_patterns(&self, text: &str) -> DetectionResult {
        let started = Instant::now();
        let spans = self.registry.scan(text);
        self.finish(text, spans, started)
    }

    async fn semantic_spans(&self, text: &str, timeout: Duration) -> Vec<Span> {
        if text.is_empty() {
            return Vec::new();
        }

        let candidates =
            match tokio::time::timeout(timeout, self.semantic.detect_semantic(text)).await {
                Ok(Ok(candidates)) => candidates,
                Ok(Err(e)) => {
                    warn!(
                        detector = self.semantic.name(),
                        error_kind = e.kind(),
                        "Semantic detection failed, continuing with patterns only"
                    );
                    metrics::counter!("kvguard_semantic_failures_total", "reason" => e.kind())
                        .increment(1);
                    return Vec::new();
                }
                Err(_) => {
                    warn!(
                        detector = self.semantic.name(),
                        timeout_ms = timeout.as_millis() as u64,
                        "Semantic detection timed out, continuing with patterns only"
                    );
                    metrics::counter!(
                        "kvguard_semantic_failures_total",
                        "reason" => Error::Timeout.kind()
                    )
                    .increment(1);
                    return Vec::new();
                }
            };

        candidates_to_spans(
            text,
            candidates,
            self.min_semantic_confidence,
            &self.registry,
        )
    }

    fn finish(&self, text: &str, spans: Vec<Span>, started: Instant) -> DetectionResult {
        let candidate_count = spans.len();
        let spans = merge_spans(spans);
        let masked_text = apply_masks(text, &spans);

        for span in &spans {
            metrics::counter!(
                "kvguard_detections_total",
                "category" => span.category.as_str(),
                "source" => span.source.as_str()
            )
            .increment(1);
        }

        let elapsed = started.elapsed();
        metrics::histogram!("kvguard_detect_latency_ms").record(elapsed.as_secs_f64() * 1000.0);

        debug!(
            input_bytes = text.len(),
            candidates = candidate_count,
            detections = spans.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Detection complete"
        );

        DetectionResult {
            spans,
            masked_text,
            processing_time_ms: elapsed.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kvguard_core::{DetectionSource, PiiCategory, RawCandidate, Result};

    struct FixedSemantic(Vec<RawCandidate>);

    #[async_trait]
    impl SemanticDetector for FixedSemantic {
        async fn detect_semantic(&self, _text: &str) -> Result<Vec<RawCandidate>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct BrokenSemantic;

    #[async_trait]
    impl SemanticDetector for BrokenSemantic {
        async fn detect_semantic(&self, _text: &str) -> Result<Vec<RawCandidate>> {
            Err(Error::semantic("endpoint returned status 503"))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn registry() -> PatternRegistry {
        PatternRegistry::builtin().unwrap()
    }

    #[test]
    fn test_detect_patterns_sync() {
        let engine = DetectionEngine::patterns_only(registry());
        let result = engine.detect_patterns("Kimlik: 10000000146");

        assert_eq!(result.spans.len(), 1);
        assert_eq!(result.spans[0].category, PiiCategory::NationalId);
        assert_eq!(result.masked_text, "Kimlik: 100****146");
    }

    #[tokio::test]
    async fn test_empty_text() {
        let engine = DetectionEngine::patterns_only(registry());
        let result = engine.detect("").await;
        assert!(result.spans.is_empty());
        assert_eq!(result.masked_text, "");
    }

    #[tokio::test]
    async fn test_semantic_and_pattern_combined() {
        let text = "Hasta Ahmet Yılmaz, kimlik 10000000146";
        let engine = DetectionEngine::new(
            registry(),
            FixedSemantic(vec![RawCandidate {
                category: PiiCategory::PersonName,
                value: "Ahmet Yılmaz".to_string(),
                start: 6,
                end: 19,
                confidence: 0.9,
            }]),
        );

        let result = engine.detect(text).await;
        assert_eq!(result.spans.len(), 2);
        assert_eq!(result.spans[0].source, DetectionSource::Semantic);
        assert_eq!(result.spans[1].source, DetectionSource::Pattern);
        assert_eq!(result.masked_text, "Hasta A**** Y*****, kimlik 100****146");
    }

    #[tokio::test]
    async fn test_semantic_failure_degrades() {
        let engine = DetectionEngine::new(registry(), BrokenSemantic);
        let result = engine.detect("kimlik 10000000146").await;

        assert_eq!(result.spans.len(), 1);
        assert_eq!(result.spans[0].source, DetectionSource::Pattern);
    }

    #[test]
    fn test_with_config() {
        let mut config = EngineConfig::default();
        config.semantic.timeout_ms = 1500;
        config.semantic.min_confidence = 0.7;

        let engine = DetectionEngine::with_config(registry(), NoSemantic, &config);
        assert_eq!(engine.semantic_timeout(), Duration::from_millis(1500));
        assert_eq!(engine.min_semantic_confidence, 0.7);

        let engine = engine.with_semantic_timeout(Duration::from_millis(200));
        assert_eq!(engine.semantic_timeout(), Duration::from_millis(200));
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DetectionEngine>();
        assert_send_sync::<DetectionEngine<crate::llm::ChatCompletionsDetector>>();
    }
}
