//! Configuration for [`BoxOffice`](crate::BoxOffice) instances.

/// Tunable runtime parameters, builder-style.
///
/// # Example
///
/// ```
/// use turnstile_runtime::BoxOfficeConfig;
///
/// let config = BoxOfficeConfig::default().with_notice_capacity(256);
/// assert_eq!(config.notice_capacity, 256);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BoxOfficeConfig {
    /// Capacity of the notice broadcast channel. Slow subscribers lag and
    /// drop the oldest notices once the buffer is full; increase this for
    /// high-throughput sales with many observers.
    pub notice_capacity: usize,
}

impl BoxOfficeConfig {
    /// Create a configuration with the given values.
    #[must_use]
    pub const fn new(notice_capacity: usize) -> Self {
        Self { notice_capacity }
    }

    /// Set the notice broadcast capacity.
    #[must_use]
    pub const fn with_notice_capacity(mut self, capacity: usize) -> Self {
        self.notice_capacity = capacity;
        self
    }
}

impl Default for BoxOfficeConfig {
    fn default() -> Self {
        Self {
            notice_capacity: 64,
        }
    }
}
