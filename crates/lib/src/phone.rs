//! Phone number normalization.
//!
//! A normalized phone is the sole identity credential, so every comparison
//! between stored and entered numbers goes through [`normalize_phone`].

use crate::constants::COUNTRY_CODE;

/// Normalize a free-form phone number to `+<digits>`.
///
/// Everything except digits is dropped. Local-format numbers (`0…`) have the
/// leading zero replaced by the country code, and a bare subscriber number
/// (`1…`, nine or ten digits) has the country code prepended. Empty input
/// normalizes to an empty string.
pub fn normalize_phone(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let mut digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if let Some(rest) = digits.strip_prefix('0') {
        digits = format!("{COUNTRY_CODE}{rest}");
    }

    if digits.starts_with('1') && matches!(digits.len(), 9 | 10) {
        digits = format!("{COUNTRY_CODE}{digits}");
    }

    format!("+{digits}")
}

/// Compare two phones after normalization. Empty numbers never match.
pub fn phones_match(a: &str, b: &str) -> bool {
    let a = normalize_phone(a);
    !a.is_empty() && a == normalize_phone(b)
}
