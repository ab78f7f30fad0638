//! KVGuard Core
//!
//! Core types and error handling shared across KVGuard components.
//!
//! This crate provides:
//! - The closed set of PII categories and detection sources
//! - Spans, semantic candidates and detection results
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    DetectionResult, DetectionSource, DetectionSummary, PiiCategory, RawCandidate, Span,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{DetectionResult, DetectionSource, PiiCategory, RawCandidate, Span};
}
