//! Campaign configuration types.
//!
//! One [`CampaignConfig`] record drives the whole allocation pipeline: the
//! series count bounds the number space, the algorithm section picks the
//! generator, the limits gate each request and the format section decides how
//! a raw number is displayed.

use serde::{Deserialize, Serialize};

/// Maximum distance from UTC accepted for the campaign day boundary.
const MAX_DAY_OFFSET_MINUTES: i32 = 14 * 60;

/// Number generation strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Uniform rejection sampling over the whole range.
    #[default]
    Random,
    /// Ascending scan from a persisted cursor.
    Sequential,
    /// Ascending scan from a base derived from the wall clock.
    Timestamp,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Sequential => write!(f, "sequential"),
            Self::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// Generator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    /// Selected strategy.
    #[serde(default)]
    pub algorithm: Algorithm,

    /// First value scanned by the sequential strategy when no cursor exists yet.
    #[serde(default = "default_sequential_start")]
    pub sequential_start: u64,

    /// Divisor applied to epoch milliseconds by the timestamp strategy.
    #[serde(default = "default_timestamp_multiplier")]
    pub timestamp_multiplier: u64,

    /// Stratify random draws into equal buckets (best effort).
    #[serde(default)]
    pub enforce_uniform_distribution: bool,
}

const fn default_sequential_start() -> u64 {
    1
}

const fn default_timestamp_multiplier() -> u64 {
    1000
}

impl AlgorithmConfig {
    /// Random strategy with default parameters.
    #[must_use]
    pub fn random() -> Self {
        Self::default()
    }

    /// Sequential strategy starting at `start`.
    #[must_use]
    pub fn sequential(start: u64) -> Self {
        Self {
            algorithm: Algorithm::Sequential,
            sequential_start: start,
            ..Self::default()
        }
    }

    /// Timestamp strategy with the given multiplier.
    #[must_use]
    pub fn timestamp(multiplier: u64) -> Self {
        Self {
            algorithm: Algorithm::Timestamp,
            timestamp_multiplier: multiplier,
            ..Self::default()
        }
    }

    /// Validate the algorithm settings.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.timestamp_multiplier == 0 {
            return Err("timestamp_multiplier must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Random,
            sequential_start: default_sequential_start(),
            timestamp_multiplier: default_timestamp_multiplier(),
            enforce_uniform_distribution: false,
        }
    }
}

/// Issuance limits. Each cap only applies when its flag is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Enforce `max_per_participant`.
    #[serde(default)]
    pub enable_participant_limit: bool,

    /// Lifetime cap per participant.
    #[serde(default = "default_max_per_participant")]
    pub max_per_participant: u64,

    /// Enforce `max_per_participant_per_day`.
    #[serde(default)]
    pub enable_daily_reset: bool,

    /// Per-participant cap that resets every campaign day.
    #[serde(default = "default_max_per_participant_per_day")]
    pub max_per_participant_per_day: u64,

    /// Enforce `global_daily_limit`.
    #[serde(default)]
    pub enable_global_daily_limit: bool,

    /// Cap over all participants for one campaign day.
    #[serde(default = "default_global_daily_limit")]
    pub global_daily_limit: u64,

    /// Fixed UTC offset, in minutes, at which the campaign day starts.
    #[serde(default)]
    pub day_boundary_offset_minutes: i32,
}

const fn default_max_per_participant() -> u64 {
    100
}

const fn default_max_per_participant_per_day() -> u64 {
    50
}

const fn default_global_daily_limit() -> u64 {
    10_000
}

impl LimitConfig {
    /// Validate the limit settings.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.enable_participant_limit && self.max_per_participant == 0 {
            return Err("max_per_participant must be at least 1".to_string());
        }
        if self.enable_daily_reset && self.max_per_participant_per_day == 0 {
            return Err("max_per_participant_per_day must be at least 1".to_string());
        }
        if self.enable_global_daily_limit && self.global_daily_limit == 0 {
            return Err("global_daily_limit must be at least 1".to_string());
        }
        if self.day_boundary_offset_minutes.abs() > MAX_DAY_OFFSET_MINUTES {
            return Err(format!(
                "day_boundary_offset_minutes must be within +/-{MAX_DAY_OFFSET_MINUTES}"
            ));
        }
        Ok(())
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            enable_participant_limit: false,
            max_per_participant: default_max_per_participant(),
            enable_daily_reset: false,
            max_per_participant_per_day: default_max_per_participant_per_day(),
            enable_global_daily_limit: false,
            global_daily_limit: default_global_daily_limit(),
            day_boundary_offset_minutes: 0,
        }
    }
}

/// Why a generation request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitReason {
    /// Lifetime per-participant cap.
    #[serde(rename = "participant-limit-exceeded")]
    ParticipantTotal,
    /// Per-participant daily cap.
    #[serde(rename = "daily-limit-exceeded")]
    ParticipantDaily,
    /// Campaign-wide daily cap.
    #[serde(rename = "global-limit-exceeded")]
    GlobalDaily,
}

impl LimitReason {
    /// Stable identifier shown to API clients.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParticipantTotal => "participant-limit-exceeded",
            Self::ParticipantDaily => "daily-limit-exceeded",
            Self::GlobalDaily => "global-limit-exceeded",
        }
    }
}

impl std::fmt::Display for LimitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check digit algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// Alternating 1/2 weights with digit-sum reduction.
    #[default]
    Modulo10,
    /// Cycling 2..=9 weights, remainder mod 11.
    Modulo11,
    /// Luhn doubling.
    Luhn,
}

/// Display settings for lucky numbers. Never affects the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Prepend `prefix_text`.
    #[serde(default)]
    pub enable_prefix: bool,

    /// Prefix text.
    #[serde(default = "default_prefix_text")]
    pub prefix_text: String,

    /// Append `suffix_text`.
    #[serde(default)]
    pub enable_suffix: bool,

    /// Suffix text.
    #[serde(default)]
    pub suffix_text: String,

    /// Append a check digit.
    #[serde(default)]
    pub enable_checksum: bool,

    /// Check digit algorithm.
    #[serde(default)]
    pub checksum_algorithm: ChecksumAlgorithm,

    /// Zero-padded width of the numeric part.
    #[serde(default = "default_digit_width")]
    pub digit_width: u8,

    /// Apply `format_pattern`.
    #[serde(default)]
    pub enable_formatting: bool,

    /// Template where each `X` takes the next digit, e.g. `XXX-XXX`.
    #[serde(default = "default_format_pattern")]
    pub format_pattern: String,
}

fn default_prefix_text() -> String {
    "LT".to_string()
}

const fn default_digit_width() -> u8 {
    6
}

fn default_format_pattern() -> String {
    "XXX-XXX".to_string()
}

impl FormatConfig {
    /// Validate the format settings.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=12).contains(&self.digit_width) {
            return Err("digit_width must be between 1 and 12".to_string());
        }
        if self.enable_formatting && self.format_pattern.is_empty() {
            return Err("format_pattern cannot be empty when formatting is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            enable_prefix: false,
            prefix_text: default_prefix_text(),
            enable_suffix: false,
            suffix_text: String::new(),
            enable_checksum: false,
            checksum_algorithm: ChecksumAlgorithm::Modulo10,
            digit_width: default_digit_width(),
            enable_formatting: false,
            format_pattern: default_format_pattern(),
        }
    }
}

/// The campaign-wide configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Number of 100,000-wide series.
    #[serde(default = "default_series_count")]
    pub series_count: u32,

    /// Generator settings.
    #[serde(default)]
    pub algorithm: AlgorithmConfig,

    /// Issuance limits.
    #[serde(default)]
    pub limits: LimitConfig,

    /// Display settings.
    #[serde(default)]
    pub format: FormatConfig,

    /// Last update (milliseconds since epoch, 0 when never stored).
    #[serde(default)]
    pub updated_at: i64,
}

const fn default_series_count() -> u32 {
    1
}

impl CampaignConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.series_count == 0 {
            return Err("series_count must be at least 1".to_string());
        }
        self.algorithm.validate()?;
        self.limits.validate()?;
        self.format.validate()
    }
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            series_count: default_series_count(),
            algorithm: AlgorithmConfig::default(),
            limits: LimitConfig::default(),
            format: FormatConfig::default(),
            updated_at: 0,
        }
    }
}
