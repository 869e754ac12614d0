//! # Turnstile Testing
//!
//! Deterministic helpers for testing the Turnstile engine.
//!
//! This crate provides:
//! - Fixed, reproducible timestamps and block heights
//! - Stable actor identities
//! - A builder for sale parameters with sensible test defaults
//!
//! ## Example
//!
//! ```
//! use turnstile_testing::{at, sale_open, SaleParamsBuilder};
//!
//! let params = SaleParamsBuilder::new()
//!     .cap(2)
//!     .per_wallet_cap(1)
//!     .build();
//!
//! assert!(params.start < params.end);
//! assert_eq!(params.start, sale_open());
//! assert!(at(10) > sale_open());
//! ```

use chrono::{DateTime, Duration, Utc};
use turnstile_core::{ActorId, Money, SaleParams};
use uuid::Uuid;

/// Fixed, reproducible time helpers
///
/// Every engine operation takes `now` explicitly, so tests pin a fixed
/// origin instead of mocking a clock. All helpers are offsets from the
/// same origin (2025-01-01 00:00:00 UTC), making interleavings easy to
/// read in test code.
pub mod time {
    use super::{DateTime, Duration, Utc};

    /// The fixed test origin (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which should
    /// never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn sale_open() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc)
    }

    /// `sale_open()` plus `secs` seconds (negative offsets land before
    /// the origin)
    #[must_use]
    pub fn at(secs: i64) -> DateTime<Utc> {
        sale_open() + Duration::seconds(secs)
    }
}

/// Stable actor identities
pub mod actors {
    use super::{ActorId, Uuid};

    /// A deterministic actor derived from `index`; the same index always
    /// yields the same identity, and index 0 is still a valid (non-nil)
    /// actor.
    #[must_use]
    pub fn actor(index: u8) -> ActorId {
        ActorId::from_uuid(Uuid::from_u128(u128::from(index) + 1))
    }
}

/// Builder for [`SaleParams`] with test defaults.
///
/// Defaults: price 10 cents, cap 100, window `[sale_open(), +1h]`,
/// per-wallet cap 10, no cooldown.
#[derive(Debug, Clone)]
pub struct SaleParamsBuilder {
    params: SaleParams,
}

impl SaleParamsBuilder {
    /// Start from the defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: SaleParams {
                price: Money::from_cents(10),
                cap: 100,
                start: time::sale_open(),
                end: time::at(3600),
                per_wallet_cap: 10,
                cooldown_blocks: 0,
            },
        }
    }

    /// Set the ticket price
    #[must_use]
    pub const fn price(mut self, price: Money) -> Self {
        self.params.price = price;
        self
    }

    /// Set the sale cap
    #[must_use]
    pub const fn cap(mut self, cap: u32) -> Self {
        self.params.cap = cap;
        self
    }

    /// Set the sale window
    #[must_use]
    pub const fn window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.params.start = start;
        self.params.end = end;
        self
    }

    /// Set the per-wallet cap
    #[must_use]
    pub const fn per_wallet_cap(mut self, cap: u32) -> Self {
        self.params.per_wallet_cap = cap;
        self
    }

    /// Set the purchase cooldown in blocks
    #[must_use]
    pub const fn cooldown_blocks(mut self, blocks: u64) -> Self {
        self.params.cooldown_blocks = blocks;
        self
    }

    /// Finish the build
    #[must_use]
    pub const fn build(self) -> SaleParams {
        self.params
    }
}

impl Default for SaleParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// Re-export commonly used items
pub use actors::actor;
pub use time::{at, sale_open};
