//! Series and issued-number types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Width of every series block.
pub const SERIES_WIDTH: u64 = 100_000;

/// One contiguous block of the lucky-number space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    /// 1-based ordinal.
    pub index: u32,
    /// First value (inclusive).
    pub start: u64,
    /// Last value (inclusive).
    pub end: u64,
}

impl Series {
    /// Number of values in this series.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A series always holds `SERIES_WIDTH` values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Check whether `number` falls inside this series.
    #[must_use]
    pub const fn contains(&self, number: u64) -> bool {
        number >= self.start && number <= self.end
    }
}

/// A lucky number owned by a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedNumber {
    /// Raw value, unique campaign-wide.
    pub number: u64,
    /// Owner's normalized document.
    pub document: String,
    /// Allocation that produced this number.
    pub allocation_id: Uuid,
    /// Issuance time (milliseconds since epoch).
    pub issued_at: i64,
}

/// Result of one successful generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Allocation identifier.
    pub allocation_id: Uuid,
    /// Owner's normalized document.
    pub document: String,
    /// Raw numbers, ascending.
    pub numbers: Vec<u64>,
    /// Display strings, same order as `numbers`.
    pub formatted: Vec<String>,
    /// Issuance time (milliseconds since epoch).
    pub issued_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_len_and_contains() {
        let series = Series {
            index: 2,
            start: 100_000,
            end: 199_999,
        };
        assert_eq!(series.len(), SERIES_WIDTH);
        assert!(series.contains(100_000));
        assert!(series.contains(199_999));
        assert!(!series.contains(99_999));
        assert!(!series.contains(200_000));
    }
}
