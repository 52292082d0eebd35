//! Participant registration.

use std::sync::Arc;

use crate::domain::{Participant, RegisterParticipantRequest, normalize_document};
use crate::error::{AppError, Result, StorageError};
use crate::storage::traits::Storage;

/// Service for registering and looking up participants.
pub struct ParticipantService {
    /// Storage backend.
    storage: Arc<dyn Storage>,
}

impl ParticipantService {
    /// Create a new participant service.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Register a participant under its normalized document.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for invalid input, `ParticipantExists` if the
    /// document is already registered, or an error if storage fails.
    pub async fn register(&self, request: RegisterParticipantRequest) -> Result<Participant> {
        request.validate().map_err(AppError::BadRequest)?;
        let document = normalize_document(&request.document).map_err(AppError::BadRequest)?;

        let participant = Participant {
            document,
            name: request.name.trim().to_string(),
            email: request.email.map(|e| e.trim().to_lowercase()),
            phone: request.phone,
            registered_at: chrono::Utc::now().timestamp_millis(),
        };

        match self.storage.insert_participant(&participant).await {
            Ok(()) => {
                tracing::info!(document = %participant.document, "Participant registered");
                Ok(participant)
            }
            Err(StorageError::Conflict(_)) => {
                Err(AppError::ParticipantExists(participant.document))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a participant. `document` may carry punctuation.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for a malformed document, `ParticipantNotFound`
    /// if nobody is registered under it, or an error if storage fails.
    pub async fn get(&self, document: &str) -> Result<Participant> {
        let document = normalize_document(document).map_err(AppError::BadRequest)?;
        self.storage
            .get_participant(&document)
            .await?
            .ok_or(AppError::ParticipantNotFound(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn request(document: &str, name: &str) -> RegisterParticipantRequest {
        RegisterParticipantRequest {
            document: document.to_string(),
            name: name.to_string(),
            email: Some("Maria@Example.com ".to_string()),
            phone: None,
        }
    }

    fn service() -> ParticipantService {
        ParticipantService::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_register_normalizes() {
        let service = service();
        let participant = service
            .register(request("123.456.789-01", "  Maria Silva "))
            .await
            .unwrap();

        assert_eq!(participant.document, "12345678901");
        assert_eq!(participant.name, "Maria Silva");
        assert_eq!(participant.email.as_deref(), Some("maria@example.com"));

        let found = service.get("123456789-01").await.unwrap();
        assert_eq!(found, participant);
    }

    #[tokio::test]
    async fn test_duplicate_document() {
        let service = service();
        service
            .register(request("12345678901", "Maria Silva"))
            .await
            .unwrap();

        let result = service
            .register(request("123.456.789-01", "Outra Pessoa"))
            .await;
        assert!(matches!(result, Err(AppError::ParticipantExists(doc)) if doc == "12345678901"));
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let service = service();
        assert!(matches!(
            service.register(request("123", "Maria Silva")).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            service.register(request("12345678901", "Al")).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_participant() {
        let service = service();
        assert!(matches!(
            service.get("98765432100").await,
            Err(AppError::ParticipantNotFound(_))
        ));
    }
}
