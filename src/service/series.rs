//! Series partitioning.

use crate::domain::{SERIES_WIDTH, Series};
use crate::error::{AppError, Result};

/// Split the number space into `series_count` contiguous blocks.
///
/// Series `k` covers `[(k-1) * 100000, k * 100000 - 1]`.
///
/// # Errors
///
/// Returns `InvalidConfiguration` when `series_count` is zero.
pub fn compute_series(series_count: u32) -> Result<Vec<Series>> {
    if series_count == 0 {
        return Err(AppError::InvalidConfiguration(
            "series_count must be at least 1".to_string(),
        ));
    }

    Ok((1..=series_count)
        .map(|index| {
            let k = u64::from(index);
            Series {
                index,
                start: (k - 1) * SERIES_WIDTH,
                end: k * SERIES_WIDTH - 1,
            }
        })
        .collect())
}

/// Exclusive upper bound of the number space for `series_count` series.
#[must_use]
pub fn total_capacity(series_count: u32) -> u64 {
    u64::from(series_count) * SERIES_WIDTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_series() {
        let series = compute_series(2).unwrap();
        assert_eq!(
            series,
            vec![
                Series {
                    index: 1,
                    start: 0,
                    end: 99_999
                },
                Series {
                    index: 2,
                    start: 100_000,
                    end: 199_999
                },
            ]
        );
    }

    #[test]
    fn test_series_cover_space_without_gaps() {
        for count in [1, 3, 10, 57] {
            let series = compute_series(count).unwrap();
            assert_eq!(series.len(), count as usize);
            assert_eq!(series[0].start, 0);
            assert_eq!(series.last().unwrap().end + 1, total_capacity(count));
            for pair in series.windows(2) {
                assert_eq!(pair[0].end + 1, pair[1].start);
            }
            assert!(series.iter().all(|s| s.len() == SERIES_WIDTH));
        }
    }

    #[test]
    fn test_zero_series_rejected() {
        assert!(matches!(
            compute_series(0),
            Err(AppError::InvalidConfiguration(_))
        ));
    }
}
