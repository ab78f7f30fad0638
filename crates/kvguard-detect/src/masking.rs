//! Category-specific masking
//!
//! Every masker is a pure function of the matched value. Slicing is done on
//! `char`s so multi-byte input (Turkish letters in names and addresses) never
//! splits a UTF-8 sequence, and inputs too short for a shape fall back to a
//! fully starred form instead of panicking.

use kvguard_core::PiiCategory;

/// Fixed replacement for dates of birth
pub const DATE_OF_BIRTH_MASK: &str = "**.**.****";

const STARS: &str = "****";
const HEALTH_DATA_MAX_STARS: usize = 10;

/// Mask a value according to its category
pub fn mask(category: PiiCategory, value: &str) -> String {
    match category {
        PiiCategory::NationalId => mask_national_id(value),
        PiiCategory::Iban => mask_iban(value),
        PiiCategory::Phone => mask_phone(value),
        PiiCategory::CardNumber => mask_card_number(value),
        PiiCategory::Email => mask_email(value),
        PiiCategory::DateOfBirth => mask_date_of_birth(value),
        PiiCategory::PersonName => mask_person_name(value),
        PiiCategory::Address => mask_address(value),
        PiiCategory::HealthData => mask_health_data(value),
    }
}

/// First 3 + `****` + last 3
pub fn mask_national_id(value: &str) -> String {
    keep_ends(value, 3, 3, STARS)
}

/// First 8 + `****` + last 4
pub fn mask_iban(value: &str) -> String {
    keep_ends(value, 8, 4, STARS)
}

/// Digits only, first 3 + `****` + last 2
pub fn mask_phone(value: &str) -> String {
    keep_ends(&digits_only(value), 3, 2, STARS)
}

/// Digits only, first 4 + ` **** **** ` + last 4
pub fn mask_card_number(value: &str) -> String {
    keep_ends(&digits_only(value), 4, 4, " **** **** ")
}

/// Dates are fully redacted
pub fn mask_date_of_birth(_value: &str) -> String {
    DATE_OF_BIRTH_MASK.to_string()
}

/// Local part reduced to first 2 + `****` + last 1, domain unchanged
pub fn mask_email(value: &str) -> String {
    let Some((local, domain)) = value.split_once('@') else {
        return STARS.to_string();
    };

    let len = local.chars().count();
    let masked_local = if len > 2 {
        format!("{}{}{}", take_first(local, 2), STARS, take_last(local, 1))
    } else if len == 2 {
        format!("{}{}", local, STARS)
    } else {
        STARS.to_string()
    };

    format!("{}@{}", masked_local, domain)
}

/// Each space-separated word longer than 2 chars keeps its first char only
pub fn mask_person_name(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let len = word.chars().count();
            if len > 2 {
                format!("{}{}", take_first(word, 1), "*".repeat(len - 1))
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Digit runs become `***`, alphabetic runs of 3+ keep their first 2 chars
pub fn mask_address(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_ascii_digit() {
            while chars.peek().map_or(false, |c| c.is_ascii_digit()) {
                chars.next();
            }
            out.push_str("***");
        } else if ch.is_alphabetic() {
            let mut run = String::new();
            while let Some(&c) = chars.peek() {
                if !c.is_alphabetic() {
                    break;
                }
                run.push(c);
                chars.next();
            }
            let len = run.chars().count();
            if len >= 3 {
                out.push_str(&take_first(&run, 2));
                out.push_str(&"*".repeat(len.saturating_sub(2).max(1)));
            } else {
                out.push_str(&run);
            }
        } else {
            out.push(ch);
            chars.next();
        }
    }

    out
}

/// Up to 10 stars regardless of content
pub fn mask_health_data(value: &str) -> String {
    "*".repeat(value.chars().count().min(HEALTH_DATA_MAX_STARS))
}

fn keep_ends(value: &str, head: usize, tail: usize, filler: &str) -> String {
    if value.chars().count() < head + tail {
        return STARS.to_string();
    }
    format!("{}{}{}", take_first(value, head), filler, take_last(value, tail))
}

fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn take_first(value: &str, n: usize) -> String {
    value.chars().take(n).collect()
}

fn take_last(value: &str, n: usize) -> String {
    let len = value.chars().count();
    value.chars().skip(len.saturating_sub(n)).collect()
}
