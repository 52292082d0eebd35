//! Display formatting for lucky numbers.
//!
//! Formatting is cosmetic only: the raw integer stays the canonical value and
//! a formatted string is never written back to storage.
//!
//! Steps, in order:
//! 1. zero-pad to `digit_width` (keeping only the last `digit_width` digits)
//! 2. append a check digit
//! 3. prepend the prefix
//! 4. append the suffix
//! 5. pour the digits into the `X` slots of the pattern

use crate::domain::{ChecksumAlgorithm, FormatConfig};

/// Placeholder character in format patterns.
const PLACEHOLDER: char = 'X';

/// Render `number` for display.
#[must_use]
pub fn format_number(number: u64, config: &FormatConfig) -> String {
    let mut value = pad_digits(number, config.digit_width);

    if config.enable_checksum {
        value.push(check_digit(&value, config.checksum_algorithm));
    }

    if config.enable_prefix && !config.prefix_text.is_empty() {
        value.insert_str(0, &config.prefix_text);
    }

    if config.enable_suffix && !config.suffix_text.is_empty() {
        value.push_str(&config.suffix_text);
    }

    if config.enable_formatting && !config.format_pattern.is_empty() {
        value = apply_pattern(&value, &config.format_pattern);
    }

    value
}

/// Zero-pad `number` to `width` digits, truncating from the left if longer.
fn pad_digits(number: u64, width: u8) -> String {
    let width = usize::from(width.max(1));
    let digits = format!("{number:0width$}");
    digits[digits.len() - width..].to_string()
}

/// Replace each placeholder in `pattern` with the next digit of `value`.
///
/// Non-digit characters of `value` are skipped. Placeholders left over once the
/// digits run out stay as literal `X`.
fn apply_pattern(value: &str, pattern: &str) -> String {
    let mut digits = value.chars().filter(char::is_ascii_digit);
    pattern
        .chars()
        .map(|c| {
            if c == PLACEHOLDER {
                digits.next().unwrap_or(PLACEHOLDER)
            } else {
                c
            }
        })
        .collect()
}

/// Compute the check digit of a decimal digit string.
///
/// Non-digit characters are ignored.
#[must_use]
pub fn check_digit(digits: &str, algorithm: ChecksumAlgorithm) -> char {
    let values: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    let digit = match algorithm {
        ChecksumAlgorithm::Modulo10 => modulo10(&values),
        ChecksumAlgorithm::Modulo11 => modulo11(&values),
        ChecksumAlgorithm::Luhn => luhn(&values),
    };
    char::from_digit(digit, 10).unwrap_or('0')
}

/// Weights 1, 2, 1, 2, ... from the rightmost digit; two-digit products are
/// reduced to the sum of their digits.
fn modulo10(digits: &[u32]) -> u32 {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| {
            let product = d * if i % 2 == 0 { 1 } else { 2 };
            product / 10 + product % 10
        })
        .sum();
    (10 - sum % 10) % 10
}

/// Weights 2..=9 cycling from the rightmost digit; remainders below 2 give 0.
fn modulo11(digits: &[u32]) -> u32 {
    let sum: u32 = digits
        .iter()
        .rev()
        .zip((2..=9).cycle())
        .map(|(d, weight)| d * weight)
        .sum();
    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

/// Luhn: double every second digit from the right, subtracting 9 when the
/// result exceeds 9.
fn luhn(digits: &[u32]) -> u32 {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    (10 - sum % 10) % 10
}
