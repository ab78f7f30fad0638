//! JSON scan report
//!
//! Spans are reported without their original values so the report can be
//! stored or shared like the masked text itself.

use kvguard_core::{DetectionResult, DetectionSource, DetectionSummary, PiiCategory, Span};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub masked_text: String,
    pub spans: Vec<SpanReport>,
    pub summary: DetectionSummary,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct SpanReport {
    pub category: PiiCategory,
    pub masked_value: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
    pub source: DetectionSource,
}

impl From<&Span> for SpanReport {
    fn from(span: &Span) -> Self {
        Self {
            category: span.category,
            masked_value: span.masked_value.clone(),
            start: span.start,
            end: span.end,
            confidence: span.confidence,
            source: span.source,
        }
    }
}

impl From<DetectionResult> for ScanReport {
    fn from(result: DetectionResult) -> Self {
        Self {
            summary: result.summary(),
            spans: result.spans.iter().map(SpanReport::from).collect(),
            masked_text: result.masked_text,
            processing_time_ms: result.processing_time_ms,
        }
    }
}
