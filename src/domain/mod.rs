//! Domain models for the lucky-number campaign.
//!
//! This module contains the campaign configuration, series, issued numbers,
//! participants and API contracts.

pub mod campaign;
pub mod dto;
pub mod number;
pub mod participant;

pub use campaign::{
    Algorithm, AlgorithmConfig, CampaignConfig, ChecksumAlgorithm, FormatConfig, LimitConfig,
    LimitReason,
};
pub use dto::{
    ApiResponse, FormatPreviewResponse, GenerateRequest, NumberEntry, ParticipantNumbersResponse,
    RegisterParticipantRequest, SeriesResponse, SeriesUpdate,
};
pub use number::{Allocation, IssuedNumber, SERIES_WIDTH, Series};
pub use participant::{Participant, normalize_document};
