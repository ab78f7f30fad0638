//! Pattern registry (deterministic detection)
//!
//! An ordered list of immutable rules, one per category that can be found by
//! shape alone. Compiled `Regex` values hold no match position between calls;
//! every scan drives its own `find_iter`, so a registry can be shared freely
//! between concurrent requests.

use crate::config::PatternConfig;
use crate::masking;
use crate::validators::{self, strip_formatting};
use kvguard_core::{DetectionSource, Error, PiiCategory, Result, Span};
use regex::{Regex, RegexBuilder};
use tracing::{debug, info};

/// Confidence of a match with no structural check
pub const UNVALIDATED_CONFIDENCE: f32 = 0.8;

/// Confidence of a match that passed its checksum validator
pub const VALIDATED_CONFIDENCE: f32 = 0.95;

/// Checksum validator signature
pub type Validator = fn(&str) -> bool;

/// Masker signature
pub type Masker = fn(&str) -> String;

/// Detection and masking policy of a category
#[derive(Debug, Clone, Copy)]
pub struct CategoryPolicy {
    /// Built-in pattern, `None` for categories only the semantic detector finds
    pub pattern: Option<&'static str>,
    pub validator: Option<Validator>,
    pub masker: Masker,
    pub confidence: f32,
}

impl CategoryPolicy {
    /// Policy table keyed by category
    pub fn of(category: PiiCategory) -> Self {
        match category {
            PiiCategory::NationalId => Self {
                pattern: Some(r"\b[1-9]\d{10}\b"),
                validator: Some(validators::validate_national_id),
                masker: masking::mask_national_id,
                confidence: VALIDATED_CONFIDENCE,
            },
            PiiCategory::Iban => Self {
                pattern: Some(r"(?i)\bTR\d{24}\b"),
                validator: Some(validators::validate_iban),
                masker: masking::mask_iban,
                confidence: VALIDATED_CONFIDENCE,
            },
            PiiCategory::Phone => Self {
                pattern: Some(r"(\+90|0)?\s?(\(\d{3}\)|\d{3})\s?\d{3}\s?\d{2}\s?\d{2}"),
                validator: None,
                masker: masking::mask_phone,
                confidence: UNVALIDATED_CONFIDENCE,
            },
            PiiCategory::CardNumber => Self {
                pattern: Some(r"\b\d{4}\s?\d{4}\s?\d{4}\s?\d{4}\b"),
                validator: None,
                masker: masking::mask_card_number,
                confidence: UNVALIDATED_CONFIDENCE,
            },
            PiiCategory::Email => Self {
                pattern: Some(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b"),
                validator: None,
                masker: masking::mask_email,
                confidence: UNVALIDATED_CONFIDENCE,
            },
            PiiCategory::DateOfBirth => Self {
                pattern: Some(r"\b(0[1-9]|[12]\d|3[01])[./-](0[1-9]|1[0-2])[./-](19|20)\d{2}\b"),
                validator: None,
                masker: masking::mask_date_of_birth,
                confidence: UNVALIDATED_CONFIDENCE,
            },
            PiiCategory::Address => Self {
                pattern: None,
                validator: None,
                masker: masking::mask_address,
                confidence: UNVALIDATED_CONFIDENCE,
            },
            PiiCategory::PersonName => Self {
                pattern: None,
                validator: None,
                masker: masking::mask_person_name,
                confidence: UNVALIDATED_CONFIDENCE,
            },
            PiiCategory::HealthData => Self {
                pattern: None,
                validator: None,
                masker: masking::mask_health_data,
                confidence: UNVALIDATED_CONFIDENCE,
            },
        }
    }
}

/// A compiled detection rule
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub category: PiiCategory,
    regex: Regex,
    validator: Option<Validator>,
    masker: Masker,
    confidence: f32,
}

impl PatternRule {
    /// Compile a rule for `category` using `pattern` and the category policy
    ///
    /// Custom expressions keep full Unicode semantics.
    pub fn new(category: PiiCategory, pattern: &str) -> Result<Self> {
        Self::compile(category, pattern, true)
    }

    /// Compile the built-in rule of `category`, if it has one
    ///
    /// Built-in expressions run in ASCII mode: `\b`, `\d` and `\s` only know
    /// ASCII, so a digit run glued to a Turkish letter (`Kartı4111...`) still
    /// has a word boundary and non-ASCII digits are never matched.
    pub fn builtin(category: PiiCategory) -> Result<Option<Self>> {
        CategoryPolicy::of(category)
            .pattern
            .map(|pattern| Self::compile(category, pattern, false))
            .transpose()
    }

    fn compile(category: PiiCategory, pattern: &str, unicode: bool) -> Result<Self> {
        let policy = CategoryPolicy::of(category);
        let regex = RegexBuilder::new(pattern)
            .unicode(unicode)
            .build()
            .map_err(|e| Error::config(format!("invalid pattern for {}: {}", category, e)))?;

        Ok(Self {
            category,
            regex,
            validator: policy.validator,
            masker: policy.masker,
            confidence: policy.confidence,
        })
    }

    /// Source text of the compiled expression
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_validated(&self) -> bool {
        self.validator.is_some()
    }

    /// Scan `text` and push accepted spans
    fn scan_into(&self, text: &str, allowlist: &[Regex], spans: &mut Vec<Span>) {
        for mat in self.regex.find_iter(text) {
            // Overrides may be able to match the empty string
            if mat.start() == mat.end() {
                continue;
            }

            let value = mat.as_str();

            if let Some(validator) = self.validator {
                if !validator(&strip_formatting(value)) {
                    debug!(
                        category = %self.category,
                        start = mat.start(),
                        end = mat.end(),
                        "Match rejected by checksum"
                    );
                    continue;
                }
            }

            if allowlist.iter().any(|re| re.is_match(value)) {
                debug!(category = %self.category, start = mat.start(), "Match allowlisted");
                continue;
            }

            spans.push(Span {
                category: self.category,
                original_value: value.to_string(),
                masked_value: (self.masker)(value),
                start: mat.start(),
                end: mat.end(),
                confidence: self.confidence,
                source: DetectionSource::Pattern,
            });
        }
    }
}

/// Ordered set of compiled rules plus the allowlist
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    rules: Vec<PatternRule>,
    allowlist: Vec<Regex>,
}

impl PatternRegistry {
    /// Registry with every built-in rule enabled
    pub fn builtin() -> Result<Self> {
        Self::from_config(&PatternConfig::default())
    }

    /// Compile the registry described by `config`
    ///
    /// Invalid expressions fail here, at construction, never during a scan.
    pub fn from_config(config: &PatternConfig) -> Result<Self> {
        let mut rules = Vec::new();

        for category in PiiCategory::ALL {
            if config.disabled.contains(&category) {
                continue;
            }

            let rule = match config.overrides.get(&category) {
                Some(custom) => PatternRule::new(category, custom)?,
                None => match PatternRule::builtin(category)? {
                    Some(rule) => rule,
                    None => continue,
                },
            };

            rules.push(rule);
        }

        let allowlist = config
            .allowlist
            .iter()
            .enumerate()
            .map(|(idx, pattern)| {
                Regex::new(pattern)
                    .map_err(|e| Error::config(format!("invalid allowlist pattern #{}: {}", idx, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            rules = rules.len(),
            allowlist = allowlist.len(),
            "Pattern registry compiled"
        );

        Ok(Self { rules, allowlist })
    }

    /// Find every rule match in `text`
    ///
    /// Spans come out grouped by rule, in registry order, and may overlap;
    /// conflict resolution is the engine's job.
    pub fn scan(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        for rule in &self.rules {
            rule.scan_into(text, &self.allowlist, &mut spans);
        }
        spans
    }

    /// Whether `value` matches an allowlist expression
    pub fn is_allowlisted(&self, value: &str) -> bool {
        self.allowlist.iter().any(|re| re.is_match(value))
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Categories with an active rule, in scan order
    pub fn categories(&self) -> Vec<PiiCategory> {
        self.rules.iter().map(|r| r.category).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn registry() -> PatternRegistry {
        PatternRegistry::builtin().unwrap()
    }

    #[test]
    fn test_builtin_rules() {
        let registry = registry();
        assert_eq!(
            registry.categories(),
            vec![
                PiiCategory::NationalId,
                PiiCategory::Iban,
                PiiCategory::Phone,
                PiiCategory::CardNumber,
                PiiCategory::Email,
                PiiCategory::DateOfBirth,
            ]
        );
        assert!(registry.rules()[0].is_validated());
    }

    #[test]
    fn test_policy_confidence() {
        assert_eq!(CategoryPolicy::of(PiiCategory::NationalId).confidence, 0.95);
        assert_eq!(CategoryPolicy::of(PiiCategory::Iban).confidence, 0.95);
        assert_eq!(CategoryPolicy::of(PiiCategory::Email).confidence, 0.8);
        assert!(CategoryPolicy::of(PiiCategory::PersonName).pattern.is_none());
    }

    #[test]
    fn test_valid_national_id_detected() {
        let spans = registry().scan("TC: 10000000146");
        let ids: Vec<_> = spans
            .iter()
            .filter(|s| s.category == PiiCategory::NationalId)
            .collect();

        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].original_value, "10000000146");
        assert_eq!(ids[0].masked_value, "100****146");
        assert_eq!((ids[0].start, ids[0].end), (4, 15));
        assert_eq!(ids[0].confidence, 0.95);
    }

    #[test]
    fn test_invalid_national_id_filtered() {
        let spans = registry().scan("TC: 12345678901");
        assert!(spans.iter().all(|s| s.category != PiiCategory::NationalId));
    }

    #[test]
    fn test_iban_detected() {
        let spans = registry().scan("IBAN: TR330006100519786457841326");
        let ibans: Vec<_> = spans.iter().filter(|s| s.category == PiiCategory::Iban).collect();
        assert_eq!(ibans.len(), 1);
        assert_eq!(ibans[0].masked_value, "TR330006****1326");
    }

    #[test]
    fn test_email_and_date_detected() {
        let text = "Mail: ayse.demir@example.com, doğum: 15.03.1985";
        let spans = registry().scan(text);

        let email = spans.iter().find(|s| s.category == PiiCategory::Email).unwrap();
        assert_eq!(email.original_value, "ayse.demir@example.com");
        assert_eq!(&text[email.start..email.end], email.original_value);

        let dob = spans.iter().find(|s| s.category == PiiCategory::DateOfBirth).unwrap();
        assert_eq!(dob.original_value, "15.03.1985");
        assert_eq!(dob.masked_value, "**.**.****");
        assert_eq!(&text[dob.start..dob.end], "15.03.1985");
    }

    #[test]
    fn test_phone_and_card_detected() {
        let spans = registry().scan("Tel: 0532 123 45 67 Kart: 4111 1111 1111 1111");

        let phone = spans.iter().find(|s| s.category == PiiCategory::Phone).unwrap();
        assert_eq!(phone.masked_value, "053****67");

        let card = spans.iter().find(|s| s.category == PiiCategory::CardNumber).unwrap();
        assert_eq!(card.masked_value, "4111 **** **** 1111");
    }

    #[test]
    fn test_repeated_scans_are_independent() {
        let registry = registry();
        let text = "a@example.com ve b.c@example.org";
        let first = registry.scan(text);
        let second = registry.scan(text);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_disabled_category() {
        let config = PatternConfig {
            disabled: vec![PiiCategory::Email],
            ..Default::default()
        };
        let registry = PatternRegistry::from_config(&config).unwrap();
        assert!(!registry.categories().contains(&PiiCategory::Email));
        assert!(registry.scan("a.b@example.com").is_empty());
    }

    #[test]
    fn test_override_adds_rule() {
        let mut overrides = BTreeMap::new();
        overrides.insert(PiiCategory::HealthData, r"(?i)\bdiyabet\b".to_string());
        let config = PatternConfig {
            overrides,
            ..Default::default()
        };
        let registry = PatternRegistry::from_config(&config).unwrap();

        let spans = registry.scan("Tanı: Diyabet");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].category, PiiCategory::HealthData);
        assert_eq!(spans[0].masked_value, "*******");
        assert_eq!(spans[0].confidence, 0.8);
    }

    #[test]
    fn test_invalid_override_is_config_error() {
        let mut overrides = BTreeMap::new();
        overrides.insert(PiiCategory::Phone, "(unclosed".to_string());
        let config = PatternConfig {
            overrides,
            ..Default::default()
        };

        let err = PatternRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("phone"));
    }

    #[test]
    fn test_allowlist_suppresses_match() {
        let config = PatternConfig {
            allowlist: vec![r"@example\.com$".to_string()],
            ..Default::default()
        };
        let registry = PatternRegistry::from_config(&config).unwrap();

        let spans = registry.scan("x.y@example.com z.w@example.org");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].original_value, "z.w@example.org");
        assert!(registry.is_allowlisted("q@example.com"));
    }

    #[test]
    fn test_card_glued_to_turkish_letter() {
        let engine_text = "Kartı4111222233334444";
        let spans = registry().scan(engine_text);

        let card = spans
            .iter()
            .find(|s| s.category == PiiCategory::CardNumber)
            .unwrap();
        assert_eq!(card.original_value, "4111222233334444");
        assert_eq!(&engine_text[card.start..card.end], "4111222233334444");
        assert_eq!(card.masked_value, "4111 **** **** 4444");
    }

    #[test]
    fn test_national_id_glued_to_turkish_letter() {
        for text in ["Kimlikş10000000146", "TCç10000000146ı", "no:10000000146ğ"] {
            let spans = registry().scan(text);
            let ids: Vec<_> = spans
                .iter()
                .filter(|s| s.category == PiiCategory::NationalId)
                .collect();
            assert_eq!(ids.len(), 1, "no national id in {:?}", text);
            assert_eq!(ids[0].original_value, "10000000146");
        }
    }

    #[test]
    fn test_iban_and_email_next_to_turkish_letters() {
        let spans = registry().scan("hesabıTR330006100519786457841326ş");
        assert!(spans.iter().any(|s| s.category == PiiCategory::Iban));

        let text = "adresiçayse@example.com";
        let spans = registry().scan(text);
        let email = spans
            .iter()
            .find(|s| s.category == PiiCategory::Email)
            .unwrap();
        assert_eq!(email.original_value, "ayse@example.com");
    }

    #[test]
    fn test_non_ascii_digits_ignored() {
        assert!(registry().scan("٠٥٣٢١٢٣٤٥٦٧").is_empty());
        assert!(registry().scan("４１１１２２２２３３３３４４４４").is_empty());
    }

    #[test]
    fn test_overrides_keep_unicode() {
        let mut overrides = BTreeMap::new();
        overrides.insert(PiiCategory::HealthData, r"\bastım\b".to_string());
        let config = PatternConfig {
            overrides,
            ..Default::default()
        };
        let registry = PatternRegistry::from_config(&config).unwrap();

        // Unicode word boundaries: a Turkish letter before the word blocks it
        let text = "hastalığıastım, astım";
        let spans = registry.scan(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].original_value, "astım");
        assert_eq!(spans[0].start, text.rfind("astım").unwrap());
    }

    #[test]
    fn test_invalid_allowlist_is_config_error() {
        let config = PatternConfig {
            allowlist: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            PatternRegistry::from_config(&config),
            Err(Error::Config(_))
        ));
    }
}
