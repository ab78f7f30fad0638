//! Checksum validators
//!
//! Validators never locate PII. They only reject pattern matches that have the
//! right shape but fail the arithmetic check, e.g. an 11-digit number that is
//! not a valid national ID.

/// Validate a Turkish national identity number (TC Kimlik No)
///
/// Requires exactly 11 ASCII digits with a non-zero first digit. Digit 10 must
/// equal `((d0+d2+d4+d6+d8)*7 - (d1+d3+d5+d7)) mod 10` and digit 11 must equal
/// the sum of the first ten digits mod 10.
pub fn validate_national_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    if bytes.len() != 11 || !bytes.iter().all(u8::is_ascii_digit) || bytes[0] == b'0' {
        return false;
    }

    let d: Vec<i32> = bytes.iter().map(|b| i32::from(b - b'0')).collect();

    let odd = d[0] + d[2] + d[4] + d[6] + d[8];
    let even = d[1] + d[3] + d[5] + d[7];
    let check1 = (odd * 7 - even).rem_euclid(10);
    let check2 = d[..10].iter().sum::<i32>() % 10;

    check1 == d[9] && check2 == d[10]
}

/// Validate a Turkish IBAN using the ISO 13616 mod-97 check
///
/// Whitespace is ignored and letters are case-insensitive. The normalized
/// code must be 26 characters long and start with `TR`.
pub fn validate_iban(code: &str) -> bool {
    let clean: String = code
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    // Non-ASCII input can never be valid, and would make byte slicing unsafe
    if !clean.is_ascii() || clean.len() != 26 || !clean.starts_with("TR") {
        return false;
    }

    let (head, tail) = clean.split_at(4);
    let mut remainder: u32 = 0;

    for ch in tail.chars().chain(head.chars()) {
        match ch {
            '0'..='9' => {
                remainder = (remainder * 10 + (ch as u32 - '0' as u32)) % 97;
            }
            'A'..='Z' => {
                // Letters expand to two digits: A=10 .. Z=35
                let value = ch as u32 - 'A' as u32 + 10;
                remainder = (remainder * 100 + value) % 97;
            }
            _ => return false,
        }
    }

    remainder == 1
}

/// Strip the formatting characters a validator does not care about
pub(crate) fn strip_formatting(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_national_ids() {
        assert!(validate_national_id("10000000146"));
        assert!(validate_national_id("12345678950"));
    }

    #[test]
    fn test_invalid_national_ids() {
        // Wrong check digits
        assert!(!validate_national_id("12345678901"));
        assert!(!validate_national_id("10000000147"));
        // Leading zero
        assert!(!validate_national_id("01234567890"));
        // Wrong length, non-digits
        assert!(!validate_national_id("1000000014"));
        assert!(!validate_national_id("100000001466"));
        assert!(!validate_national_id("1000000014a"));
        assert!(!validate_national_id(""));
    }

    #[test]
    fn test_national_id_negative_weighted_sum() {
        // Odd-position sum * 7 is smaller than the even-position sum here;
        // the check digit still has to be computed modulo 10 (non-negative).
        let base = [1, 9, 0, 9, 0, 9, 0, 9, 0];
        let odd: i32 = base[0] + base[2] + base[4] + base[6] + base[8];
        let even: i32 = base[1] + base[3] + base[5] + base[7];
        let c1 = (odd * 7 - even).rem_euclid(10);
        let c2 = (base.iter().sum::<i32>() + c1) % 10;

        let id: String = base
            .iter()
            .chain([c1, c2].iter())
            .map(|d| char::from(b'0' + *d as u8))
            .collect();
        assert!(validate_national_id(&id));
    }

    #[test]
    fn test_valid_iban() {
        assert!(validate_iban("TR330006100519786457841326"));
        assert!(validate_iban("tr330006100519786457841326"));
        assert!(validate_iban("TR33 0006 1005 1978 6457 8413 26"));
    }

    #[test]
    fn test_iban_single_digit_changes_fail() {
        let iban = "TR330006100519786457841326";
        for (idx, ch) in iban.char_indices().skip(2) {
            for replacement in '0'..='9' {
                if replacement == ch {
                    continue;
                }
                let mut altered = iban.to_string();
                altered.replace_range(idx..idx + 1, &replacement.to_string());
                assert!(!validate_iban(&altered), "altered at {} to {}", idx, replacement);
            }
        }
    }

    #[test]
    fn test_invalid_iban_shape() {
        assert!(!validate_iban("DE89370400440532013000"));
        assert!(!validate_iban("TR33000610051978645784132"));
        assert!(!validate_iban("GB330006100519786457841326"));
        assert!(!validate_iban("TR33000610051978645784132-"));
    }

    #[test]
    fn test_iban_multibyte_input_rejected() {
        // 26 bytes, with a two-byte char straddling the 4-byte rearrangement point
        let straddling = format!("TR1é{}", "0".repeat(21));
        assert_eq!(straddling.len(), 26);
        assert!(!validate_iban(&straddling));

        assert!(!validate_iban("TR33０006100519786457841326"));
        assert!(!validate_iban("ŞR330006100519786457841326"));
    }

    #[test]
    fn test_strip_formatting() {
        assert_eq!(strip_formatting(" 100 000 001 46\n"), "10000000146");
    }
}
