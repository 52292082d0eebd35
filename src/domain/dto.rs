//! Data Transfer Objects for API requests and responses.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Series;

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response code (0 = success, non-zero = error).
    pub code: i32,

    /// Human-readable message.
    pub message: String,

    /// Response data (null on error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a success response.
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Create a success response with no data.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: None,
        }
    }
}

/// Request to generate lucky numbers for a participant.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    /// Participant CPF/CNPJ, punctuation allowed.
    pub document: String,

    /// Number of lucky numbers to issue.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Request to register a participant.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterParticipantRequest {
    /// CPF/CNPJ, punctuation allowed.
    pub document: String,

    /// Full name.
    pub name: String,

    /// Contact e-mail.
    #[serde(default)]
    pub email: Option<String>,

    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
}

impl RegisterParticipantRequest {
    /// Validate the fields that are not normalized elsewhere.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().chars().count() < 3 {
            return Err("name must have at least 3 characters".to_string());
        }
        if let Some(email) = &self.email
            && !email.contains('@')
        {
            return Err("email is invalid".to_string());
        }
        Ok(())
    }
}

/// Update of the series section.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesUpdate {
    /// New series count.
    pub series_count: u32,
}

/// One issued number with its display form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberEntry {
    /// Raw value.
    pub number: u64,
    /// Display string.
    pub formatted: String,
    /// Allocation that produced it.
    pub allocation_id: Uuid,
    /// Issuance time (milliseconds since epoch).
    pub issued_at: i64,
}

/// A participant's lucky numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantNumbersResponse {
    /// Normalized document.
    pub document: String,
    /// Count of numbers held.
    pub total: usize,
    /// Numbers, ascending.
    pub numbers: Vec<NumberEntry>,
}

/// Formatting preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatPreviewResponse {
    /// Raw value.
    pub number: u64,
    /// Display string under the current format settings.
    pub formatted: String,
}

/// Series layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesResponse {
    /// Number of series.
    pub series_count: u32,
    /// Size of the whole number space.
    pub total_numbers: u64,
    /// Series intervals.
    pub series: Vec<Series>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success(vec![1, 2, 3]);
        assert_eq!(response.code, 0);
        assert_eq!(response.message, "success");
        assert_eq!(response.data, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_generate_request_default_quantity() {
        let req: GenerateRequest = serde_json::from_str(r#"{"document": "12345678901"}"#).unwrap();
        assert_eq!(req.quantity, 1);
    }

    #[test]
    fn test_register_request_validation() {
        let mut req = RegisterParticipantRequest {
            document: "12345678901".to_string(),
            name: "Ana Souza".to_string(),
            email: Some("ana@example.com".to_string()),
            phone: None,
        };
        assert!(req.validate().is_ok());

        req.name = "Al".to_string();
        assert!(req.validate().is_err());

        req.name = "Ana Souza".to_string();
        req.email = Some("not-an-email".to_string());
        assert!(req.validate().is_err());
    }
}
