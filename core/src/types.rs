//! Domain types for the Turnstile engine.
//!
//! Value objects and entity records shared by every component: identifiers,
//! money, block heights, and the event/ticket records owned by the
//! inventory ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event.
///
/// Assigned by the organizer at creation time; an event identifier is
/// created at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(u64);

impl EventId {
    /// Create an `EventId` from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw identifier value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity of an acting party (buyer, organizer, verifier, admin).
///
/// The nil actor is never a valid participant; it is used to detect
/// null/empty recipient identifiers at the settlement boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(Uuid);

impl ActorId {
    /// Creates a new random `ActorId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `ActorId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The nil (null/empty) actor identifier
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Whether this is the nil identifier
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seat serial number, unique within one event.
///
/// Serials are positive, assigned sequentially from 1 as tickets are sold,
/// with no gaps and no reuse. Zero is not a valid serial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatSerial(u32);

impl SeatSerial {
    /// Create a serial from its raw value (zero is rejected by the ledger)
    #[must_use]
    pub const fn new(serial: u32) -> Self {
        Self(serial)
    }

    /// Get the raw serial value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Whether the serial is positive (valid)
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for SeatSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A batch of seat serials issued by a single purchase.
///
/// Purchases are typically for a handful of seats, so the batch lives
/// inline on the stack.
pub type SerialBatch = SmallVec<[SeatSerial; 8]>;

/// Discrete, monotonically increasing time-step used for purchase
/// throttling. Wall-clock time gates the sale window; block height gates
/// the per-actor cooldown.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockHeight(u64);

impl BlockHeight {
    /// Create a block height from its raw value
    #[must_use]
    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    /// Get the raw height value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Height plus a cooldown span, saturating at the maximum
    #[must_use]
    pub const fn saturating_add(&self, blocks: u64) -> Self {
        Self(self.0.saturating_add(blocks))
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in the smallest currency unit (cents) to avoid
/// floating-point arithmetic errors.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Adds two money amounts, saturating at the maximum representable
    /// balance
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtracts two money amounts (returns None if result would be negative)
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        if self.0 >= other.0 {
            Some(Self(self.0 - other.0))
        } else {
            None
        }
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Ledger-owned records
// ============================================================================

/// An event as recorded by the inventory ledger.
///
/// Immutable after creation apart from the `active` flag; this core never
/// deactivates events: they are permanent once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Organizer-assigned identifier
    pub id: EventId,
    /// Human-facing name
    pub name: String,
    /// Human-facing description
    pub description: String,
    /// Scheduled date of the event
    pub date: DateTime<Utc>,
    /// Venue / location description
    pub location: String,
    /// Whether the event accepts ledger operations
    pub active: bool,
}

/// A single issued ticket, identified by the composite key
/// `(EventId, SeatSerial)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Event the ticket belongs to
    pub event: EventId,
    /// Seat serial, unique within the event
    pub serial: SeatSerial,
    /// Current holder
    pub holder: ActorId,
    /// Whether the ticket has been consumed at check-in
    pub used: bool,
    /// Verifier that consumed the ticket, once used
    pub used_by: Option<ActorId>,
}
