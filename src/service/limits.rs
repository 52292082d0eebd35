//! Issuance limit checks.
//!
//! The decision is a pure function of counts supplied by the caller. Two
//! concurrent requests can both pass against the same counts; closing that
//! window is the storage layer's job.

use chrono::{DateTime, FixedOffset, NaiveTime, Offset, TimeZone, Utc};

use crate::domain::{LimitConfig, LimitReason};

/// Counts read from storage before a generation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageCounts {
    /// Numbers the participant holds overall.
    pub participant_total: u64,
    /// Numbers the participant received since the current campaign day began.
    pub participant_daily: u64,
    /// Numbers issued to anyone since the current campaign day began.
    pub global_daily: u64,
}

/// Outcome of a limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDecision {
    /// Generation may proceed.
    Allow,
    /// Generation must not proceed.
    Deny(LimitReason),
}

impl LimitDecision {
    /// Check whether the request was allowed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decide whether `participant` may receive `requested` more numbers.
///
/// Limits are checked in order: lifetime per participant, daily per
/// participant, daily global. A request landing exactly on a limit is allowed.
#[must_use]
pub fn check_and_reserve(
    participant: &str,
    requested: u64,
    usage: UsageCounts,
    limits: &LimitConfig,
) -> LimitDecision {
    let exceeds = |current: u64, limit: u64| current.saturating_add(requested) > limit;

    let decision = if limits.enable_participant_limit
        && exceeds(usage.participant_total, limits.max_per_participant)
    {
        LimitDecision::Deny(LimitReason::ParticipantTotal)
    } else if limits.enable_daily_reset
        && exceeds(usage.participant_daily, limits.max_per_participant_per_day)
    {
        LimitDecision::Deny(LimitReason::ParticipantDaily)
    } else if limits.enable_global_daily_limit
        && exceeds(usage.global_daily, limits.global_daily_limit)
    {
        LimitDecision::Deny(LimitReason::GlobalDaily)
    } else {
        LimitDecision::Allow
    };

    if let LimitDecision::Deny(reason) = decision {
        tracing::debug!(participant, requested, ?usage, %reason, "Limit check denied");
    }

    decision
}

/// Start of the campaign day containing `now`, for a day that begins at
/// midnight in the fixed offset `offset_minutes` east of UTC.
#[must_use]
pub fn campaign_day_start(now: DateTime<Utc>, offset_minutes: i32) -> DateTime<Utc> {
    let offset = FixedOffset::east_opt(offset_minutes.saturating_mul(60)).unwrap_or(Utc.fix());
    let midnight = now
        .with_timezone(&offset)
        .date_naive()
        .and_time(NaiveTime::MIN);

    // Fixed offsets have no gaps, so local midnight maps to exactly one instant
    offset
        .from_local_datetime(&midnight)
        .single()
        .map_or(now, |start| start.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_limits(total: u64, daily: u64, global: u64) -> LimitConfig {
        LimitConfig {
            enable_participant_limit: true,
            max_per_participant: total,
            enable_daily_reset: true,
            max_per_participant_per_day: daily,
            enable_global_daily_limit: true,
            global_daily_limit: global,
            day_boundary_offset_minutes: 0,
        }
    }

    #[test]
    fn test_disabled_limits_allow_everything() {
        let usage = UsageCounts {
            participant_total: u64::MAX - 1,
            participant_daily: u64::MAX - 1,
            global_daily: u64::MAX - 1,
        };
        let decision = check_and_reserve("12345678901", 10, usage, &LimitConfig::default());
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_boundary_is_allowed() {
        let limits = all_limits(10, 5, 100);
        let usage = UsageCounts {
            participant_total: 7,
            participant_daily: 2,
            global_daily: 97,
        };
        assert_eq!(
            check_and_reserve("12345678901", 3, usage, &limits),
            LimitDecision::Allow
        );
    }

    #[test]
    fn test_participant_limit() {
        let limits = all_limits(10, 50, 1000);
        let usage = UsageCounts {
            participant_total: 8,
            ..Default::default()
        };
        assert_eq!(
            check_and_reserve("12345678901", 3, usage, &limits),
            LimitDecision::Deny(LimitReason::ParticipantTotal)
        );
    }

    #[test]
    fn test_daily_limit() {
        let limits = all_limits(100, 5, 1000);
        let usage = UsageCounts {
            participant_total: 5,
            participant_daily: 5,
            global_daily: 5,
        };
        assert_eq!(
            check_and_reserve("12345678901", 1, usage, &limits),
            LimitDecision::Deny(LimitReason::ParticipantDaily)
        );
    }

    #[test]
    fn test_global_limit() {
        let limits = all_limits(100, 50, 20);
        let usage = UsageCounts {
            participant_total: 0,
            participant_daily: 0,
            global_daily: 19,
        };
        assert_eq!(
            check_and_reserve("12345678901", 2, usage, &limits),
            LimitDecision::Deny(LimitReason::GlobalDaily)
        );
    }

    #[test]
    fn test_participant_limit_checked_first() {
        let limits = all_limits(1, 1, 1);
        let usage = UsageCounts {
            participant_total: 1,
            participant_daily: 1,
            global_daily: 1,
        };
        assert_eq!(
            check_and_reserve("12345678901", 1, usage, &limits),
            LimitDecision::Deny(LimitReason::ParticipantTotal)
        );
    }

    #[test]
    fn test_day_start_utc() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 15, 30, 0).unwrap();
        assert_eq!(
            campaign_day_start(now, 0),
            Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_day_start_with_negative_offset() {
        // 02:00 UTC is still the previous day at UTC-3
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 2, 0, 0).unwrap();
        assert_eq!(
            campaign_day_start(now, -180),
            Utc.with_ymd_and_hms(2026, 3, 9, 3, 0, 0).unwrap()
        );
    }
}
