//! Service layer module.
//!
//! Contains the number-generation algorithms and the services that apply
//! them to the stored campaign.

pub mod allocation;
pub mod campaign;
pub mod formatter;
pub mod generator;
pub mod limits;
pub mod participant;
pub mod series;

pub use allocation::AllocationService;
pub use campaign::CampaignService;
pub use formatter::{check_digit, format_number};
pub use generator::{GenerationRequest, Generated, NumberGenerator, SystemClock, TimeSource};
pub use limits::{LimitDecision, UsageCounts, campaign_day_start, check_and_reserve};
pub use participant::ParticipantService;
pub use series::{compute_series, total_capacity};
