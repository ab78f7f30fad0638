//! Core types for KVGuard

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Category of personally identifiable information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
    /// Turkish national identity number (TC Kimlik No)
    NationalId,
    /// Turkish IBAN
    Iban,
    Phone,
    CardNumber,
    Address,
    PersonName,
    HealthData,
    Email,
    DateOfBirth,
}

impl PiiCategory {
    /// All categories in declaration order
    pub const ALL: [PiiCategory; 9] = [
        PiiCategory::NationalId,
        PiiCategory::Iban,
        PiiCategory::Phone,
        PiiCategory::CardNumber,
        PiiCategory::Address,
        PiiCategory::PersonName,
        PiiCategory::HealthData,
        PiiCategory::Email,
        PiiCategory::DateOfBirth,
    ];

    /// Stable snake_case name, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            PiiCategory::NationalId => "national_id",
            PiiCategory::Iban => "iban",
            PiiCategory::Phone => "phone",
            PiiCategory::CardNumber => "card_number",
            PiiCategory::Address => "address",
            PiiCategory::PersonName => "person_name",
            PiiCategory::HealthData => "health_data",
            PiiCategory::Email => "email",
            PiiCategory::DateOfBirth => "date_of_birth",
        }
    }

    /// Categories the semantic detector is allowed to report
    pub fn is_semantic(&self) -> bool {
        matches!(
            self,
            PiiCategory::PersonName | PiiCategory::Address | PiiCategory::HealthData
        )
    }
}

impl fmt::Display for PiiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PiiCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PiiCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown PII category: {}", s))
    }
}

/// Which detector produced a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    /// Deterministic pattern rule (optionally checksum-validated)
    Pattern,
    /// External semantic classifier
    Semantic,
}

impl DetectionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionSource::Pattern => "pattern",
            DetectionSource::Semantic => "semantic",
        }
    }
}

/// A single detected PII occurrence
///
/// `start` and `end` are half-open UTF-8 byte offsets into the original input
/// and always fall on `char` boundaries, so `&text[start..end]` equals
/// `original_value`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub category: PiiCategory,
    pub original_value: String,
    pub masked_value: String,
    pub start: usize,
    pub end: usize,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    pub source: DetectionSource,
}

impl Span {
    /// Half-open interval overlap test
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when the range covers no bytes
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

// Hand-written so spans can be logged without leaking the raw value.
impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("category", &self.category)
            .field("original_value", &"<redacted>")
            .field("masked_value", &self.masked_value)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("confidence", &self.confidence)
            .field("source", &self.source)
            .finish()
    }
}

/// Candidate reported by a semantic detector, not yet validated
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub category: PiiCategory,
    pub value: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
}

impl fmt::Debug for RawCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCandidate")
            .field("category", &self.category)
            .field("value", &"<redacted>")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("confidence", &self.confidence)
            .finish()
    }
}

/// Output of one detection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Non-overlapping spans, ascending by start offset
    pub spans: Vec<Span>,

    /// Input text with every span replaced by its masked value
    pub masked_text: String,

    /// Wall-clock time spent in detection
    pub processing_time_ms: u64,
}

impl DetectionResult {
    /// Aggregate counts and confidence, free of raw values
    pub fn summary(&self) -> DetectionSummary {
        let mut by_category = BTreeMap::new();
        let mut by_source = BTreeMap::new();
        let mut confidence_sum = 0.0f32;

        for span in &self.spans {
            *by_category.entry(span.category).or_insert(0) += 1;
            *by_source.entry(span.source).or_insert(0) += 1;
            confidence_sum += span.confidence;
        }

        let average_confidence = if self.spans.is_empty() {
            0.0
        } else {
            confidence_sum / self.spans.len() as f32
        };

        DetectionSummary {
            total: self.spans.len(),
            by_category,
            by_source,
            average_confidence,
        }
    }

    /// Spans of a single category
    pub fn spans_of(&self, category: PiiCategory) -> impl Iterator<Item = &Span> {
        self.spans.iter().filter(move |s| s.category == category)
    }
}

/// Per-run statistics, safe to log or persist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub total: usize,
    pub by_category: BTreeMap<PiiCategory, usize>,
    pub by_source: BTreeMap<DetectionSource, usize>,
    pub average_confidence: f32,
}
