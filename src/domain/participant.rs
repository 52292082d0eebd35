//! Participant types.

use serde::{Deserialize, Serialize};

/// Shortest accepted document (CPF).
const MIN_DOCUMENT_DIGITS: usize = 11;

/// Longest accepted document (CNPJ).
const MAX_DOCUMENT_DIGITS: usize = 14;

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// CPF/CNPJ digits.
    pub document: String,
    /// Display name.
    pub name: String,
    /// Contact e-mail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Registration time (milliseconds since epoch).
    pub registered_at: i64,
}

/// Strip punctuation from a CPF/CNPJ and check its length.
///
/// `"123.456.789-01"` becomes `"12345678901"`.
///
/// # Errors
///
/// Returns a message when the document does not have 11 to 14 digits.
pub fn normalize_document(raw: &str) -> Result<String, String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < MIN_DOCUMENT_DIGITS || digits.len() > MAX_DOCUMENT_DIGITS {
        return Err(format!(
            "document must have {MIN_DOCUMENT_DIGITS} to {MAX_DOCUMENT_DIGITS} digits"
        ));
    }
    Ok(digits)
}
