//! Lucky-number generation.
//!
//! The generator is a pure function of its inputs plus a random source (random
//! strategy) and the wall clock (timestamp strategy). It never touches storage:
//! callers pass a snapshot of the issued numbers and persist the result
//! themselves, relying on a uniqueness constraint to catch races.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;

use crate::domain::{Algorithm, AlgorithmConfig};
use crate::error::{AppError, Result};

/// Random draws attempted per requested number before falling back to
/// sampling from the enumerated free values.
const MAX_DRAWS_PER_NUMBER: usize = 32;

/// Source of wall-clock time in milliseconds since the Unix epoch.
pub trait TimeSource: Send + Sync {
    /// Current time in milliseconds.
    fn current_millis(&self) -> i64;
}

/// System wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Inputs for a single generation call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// How many numbers to produce.
    pub quantity: u32,
    /// Exclusive upper bound; numbers fall in `[0, bound)`.
    pub bound: u64,
    /// Snapshot of numbers already issued.
    pub issued: &'a HashSet<u64>,
    /// Strategy settings.
    pub algorithm: &'a AlgorithmConfig,
    /// Persisted sequential cursor, if any.
    pub cursor: Option<u64>,
}

/// Output of a generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// Distinct numbers, ascending.
    pub numbers: Vec<u64>,
    /// Where the next sequential scan should start (sequential strategy only).
    pub next_cursor: Option<u64>,
}

/// Lucky-number generator.
#[derive(Clone)]
pub struct NumberGenerator {
    clock: Arc<dyn TimeSource>,
}

impl Default for NumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NumberGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumberGenerator").finish_non_exhaustive()
    }
}

impl NumberGenerator {
    /// Create a generator reading the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a generator with a custom clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn TimeSource>) -> Self {
        Self { clock }
    }

    /// Generate numbers using the thread-local RNG.
    ///
    /// # Errors
    ///
    /// See [`NumberGenerator::generate_with_rng`].
    pub fn generate(&self, request: &GenerationRequest<'_>) -> Result<Generated> {
        self.generate_with_rng(request, &mut rand::rng())
    }

    /// Generate `quantity` distinct numbers in `[0, bound)` that are absent
    /// from `issued`.
    ///
    /// The free space is checked up front, so nothing is produced when the
    /// request cannot be satisfied in full.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `quantity` is zero
    /// - `InvalidBound` if `bound` is zero
    /// - `CapacityExhausted` if fewer than `quantity` free values remain
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        request: &GenerationRequest<'_>,
        rng: &mut R,
    ) -> Result<Generated> {
        if request.quantity == 0 {
            return Err(AppError::InvalidQuantity(
                "quantity must be at least 1".to_string(),
            ));
        }
        if request.bound == 0 {
            return Err(AppError::InvalidBound(request.bound));
        }

        let in_range = request
            .issued
            .iter()
            .filter(|&&n| n < request.bound)
            .count() as u64;
        let available = request.bound - in_range;
        let requested = u64::from(request.quantity);
        if requested > available {
            return Err(AppError::CapacityExhausted {
                requested,
                available,
            });
        }

        let quantity = request.quantity as usize;
        let mut generated = match request.algorithm.algorithm {
            Algorithm::Random => {
                let numbers = if request.algorithm.enforce_uniform_distribution {
                    draw_stratified(quantity, request.bound, request.issued, rng)
                } else {
                    draw_uniform(quantity, request.bound, request.issued, rng)
                };
                Generated {
                    numbers,
                    next_cursor: None,
                }
            }
            Algorithm::Sequential => {
                let start = request
                    .cursor
                    .unwrap_or(request.algorithm.sequential_start);
                let (numbers, next) = scan_free(start, quantity, request.bound, request.issued);
                Generated {
                    numbers,
                    next_cursor: Some(next),
                }
            }
            Algorithm::Timestamp => {
                let base = timestamp_base(
                    self.clock.current_millis(),
                    request.algorithm.timestamp_multiplier,
                    request.bound,
                );
                let (numbers, _) = scan_free(base, quantity, request.bound, request.issued);
                Generated {
                    numbers,
                    next_cursor: None,
                }
            }
        };

        generated.numbers.sort_unstable();
        Ok(generated)
    }
}

/// Map a wall-clock reading into `[0, bound)`.
fn timestamp_base(now_millis: i64, multiplier: u64, bound: u64) -> u64 {
    let millis = u64::try_from(now_millis).unwrap_or(0);
    (millis / multiplier.max(1)) % bound
}

/// Walk upward from `start`, wrapping at `bound`, collecting free values.
///
/// Returns the collected values and the value after the last one inspected.
/// The caller guarantees at least `quantity` free values exist.
fn scan_free(start: u64, quantity: usize, bound: u64, issued: &HashSet<u64>) -> (Vec<u64>, u64) {
    let mut numbers = Vec::with_capacity(quantity);
    let mut candidate = start % bound;

    while numbers.len() < quantity {
        if !issued.contains(&candidate) {
            numbers.push(candidate);
        }
        candidate = (candidate + 1) % bound;
    }

    (numbers, candidate)
}

/// Rejection sampling over the whole range.
fn draw_uniform<R: Rng + ?Sized>(
    quantity: usize,
    bound: u64,
    issued: &HashSet<u64>,
    rng: &mut R,
) -> Vec<u64> {
    let mut picked = HashSet::with_capacity(quantity);
    sample_range(0, bound, quantity, issued, &mut picked, rng);
    picked.into_iter().collect()
}

/// One draw per equal-width bucket, topped up globally for buckets that had
/// no free value left.
fn draw_stratified<R: Rng + ?Sized>(
    quantity: usize,
    bound: u64,
    issued: &HashSet<u64>,
    rng: &mut R,
) -> Vec<u64> {
    let mut picked = HashSet::with_capacity(quantity);
    let buckets = quantity as u128;

    for bucket in 0..buckets {
        // u128 keeps `bucket * bound` from overflowing
        let lo = (bucket * u128::from(bound) / buckets) as u64;
        let hi = ((bucket + 1) * u128::from(bound) / buckets) as u64;
        if lo < hi {
            sample_range(lo, hi, 1, issued, &mut picked, rng);
        }
    }

    if picked.len() < quantity {
        let missing = quantity - picked.len();
        sample_range(0, bound, missing, issued, &mut picked, rng);
    }

    picked.into_iter().collect()
}

/// Add up to `wanted` new values from `[lo, hi)` to `picked`, skipping
/// anything in `issued` or already picked.
fn sample_range<R: Rng + ?Sized>(
    lo: u64,
    hi: u64,
    wanted: usize,
    issued: &HashSet<u64>,
    picked: &mut HashSet<u64>,
    rng: &mut R,
) {
    let target = picked.len() + wanted;
    let max_attempts = wanted.saturating_mul(MAX_DRAWS_PER_NUMBER);
    let mut attempts = 0;

    while picked.len() < target && attempts < max_attempts {
        attempts += 1;
        let candidate = rng.random_range(lo..hi);
        if !issued.contains(&candidate) {
            picked.insert(candidate);
        }
    }

    if picked.len() < target {
        // Dense range: sample exactly from what is left
        let free: Vec<u64> = (lo..hi)
            .filter(|n| !issued.contains(n) && !picked.contains(n))
            .collect();
        let missing = (target - picked.len()).min(free.len());
        for index in rand::seq::index::sample(rng, free.len(), missing) {
            picked.insert(free[index]);
        }
    }
}
