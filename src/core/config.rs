//! # Coordinator configuration.
//!
//! Provides [`Config`], the construction-time settings of a coordinator.
//!
//! ## Sentinel values
//! - `cache_capacity = 0` → caching disabled (completed outcomes are never
//!   stored; every submission of an identity not currently executing runs)
//! - `throttle_limit = 0` → clamped to 1 (the limit is inherently positive)

/// Construction-time configuration for a coordinator.
///
/// Defines:
/// - **Concurrency**: maximum simultaneous request executions
/// - **Caching**: number of distinct identities retained, FIFO-evicted
/// - **Event system**: bus capacity for event delivery
///
/// ## Field semantics
/// - `throttle_limit`: execution-pool bound (min 1; clamped by accessor)
/// - `cache_capacity`: result-cache bound (`0` = caching disabled)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the clamped accessors over
/// sprinkling sentinel checks across call sites.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of request executions to run concurrently.
    ///
    /// At most this many identities are ever present in the execution pool.
    /// A value of `0` is treated as 1.
    pub throttle_limit: usize,

    /// Maximum number of distinct identities retained in the result cache.
    ///
    /// When an insertion would exceed the capacity, the entry inserted
    /// earliest is evicted first (strict FIFO, not recency-based).
    /// `0` disables caching entirely.
    pub cache_capacity: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events
    /// will skip older items. Minimum value is 1 (enforced by the bus).
    pub bus_capacity: usize,
}

impl Config {
    /// Creates a configuration with the given throttle limit and cache
    /// capacity, keeping the default bus capacity.
    pub fn new(throttle_limit: usize, cache_capacity: usize) -> Self {
        Self {
            throttle_limit,
            cache_capacity,
            ..Self::default()
        }
    }

    /// Returns the throttle limit clamped to a minimum of 1.
    #[inline]
    pub fn throttle_limit_clamped(&self) -> usize {
        self.throttle_limit.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `throttle_limit = 8` (modest parallelism)
    /// - `cache_capacity = 128` (bounded reuse of completed outcomes)
    /// - `bus_capacity = 1024` (good baseline)
    fn default() -> Self {
        Self {
            throttle_limit: 8,
            cache_capacity: 128,
            bus_capacity: 1024,
        }
    }
}
