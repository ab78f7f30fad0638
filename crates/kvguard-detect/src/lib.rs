//! KVGuard Detection
//!
//! Detection and masking of Turkish personal data in free text.
//!
//! Two sources feed every detection run:
//! - Pattern rules: regular expressions, checksum-validated where the format
//!   allows it (national ID, IBAN)
//! - A semantic detector for what patterns cannot see (person names,
//!   addresses, health data)
//!
//! Both run concurrently over the same input. Their spans are merged into a
//! non-overlapping set and masked in place. A failing or slow semantic
//! detector only costs its own results.

pub mod config;
pub mod engine;
pub mod llm;
pub mod masking;
pub mod merge;
pub mod patterns;
pub mod semantic;
pub mod validators;

pub use config::{EngineConfig, PatternConfig, SemanticConfig};
pub use engine::{DetectionEngine, DEFAULT_SEMANTIC_TIMEOUT};
pub use llm::{parse_detections, ChatCompletionsDetector};
pub use masking::mask;
pub use merge::{apply_masks, merge_spans};
pub use patterns::{CategoryPolicy, PatternRegistry, PatternRule};
pub use semantic::{NoSemantic, SemanticDetector};
pub use validators::{validate_iban, validate_national_id};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::engine::DetectionEngine;
    pub use crate::llm::ChatCompletionsDetector;
    pub use crate::patterns::PatternRegistry;
    pub use crate::semantic::{NoSemantic, SemanticDetector};
    pub use kvguard_core::prelude::*;
}
