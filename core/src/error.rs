//! Error types for the Turnstile engine.
//!
//! Every failure in this core is a typed, returned value: validation
//! happens before any mutation, no operation partially applies, and no
//! failure is a crash. Each component owns an error enum; the runtime
//! surfaces them unified as [`BoxOfficeError`].

use crate::auth::Role;
use crate::types::{ActorId, EventId, Money, SeatSerial};
use thiserror::Error;

/// Failures raised by the inventory ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The event identifier was already created; identifiers are
    /// created at most once.
    #[error("event {0} already exists")]
    AlreadyExists(EventId),

    /// The event is absent or inactive.
    #[error("unknown or inactive event {0}")]
    UnknownEvent(EventId),

    /// A supplied seat serial was not positive.
    #[error("seat serials must be positive")]
    InvalidSerial,

    /// No ticket has been issued under the composite key.
    #[error("no ticket issued for event {event}, seat {serial}")]
    TicketNotOwned {
        /// Event half of the composite key
        event: EventId,
        /// Serial half of the composite key
        serial: SeatSerial,
    },

    /// The ticket was already consumed at check-in.
    ///
    /// A second consumption attempt always fails; it never silently
    /// succeeds.
    #[error("ticket {serial} for event {event} is already used")]
    AlreadyUsed {
        /// Event half of the composite key
        event: EventId,
        /// Serial half of the composite key
        serial: SeatSerial,
    },
}

/// Failures raised by the sale policy engine.
///
/// The admissibility variants (`SaleNotActive` through `CooldownActive`)
/// are produced in a fixed order (the first failing check wins), so
/// rejection reasons are deterministic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A sale already exists for the event.
    #[error("a sale already exists for event {0}")]
    DuplicateSale(EventId),

    /// Sale price must be positive.
    #[error("sale price must be positive")]
    InvalidPrice,

    /// Sale cap must be positive.
    #[error("sale cap must be positive")]
    InvalidCap,

    /// Sale window must satisfy `start < end`.
    #[error("sale window start must precede end")]
    InvalidWindow,

    /// Per-wallet cap must be positive.
    #[error("per-wallet cap must be positive")]
    InvalidWalletCap,

    /// The sale is absent or no longer accepting purchases.
    #[error("sale is not active")]
    SaleNotActive,

    /// The sale window has not opened yet.
    #[error("sale has not started")]
    SaleNotStarted,

    /// The sale window has closed.
    #[error("sale has ended")]
    SaleEnded,

    /// Requested amount must be positive.
    #[error("purchase amount must be positive")]
    InvalidAmount,

    /// The purchase would exceed the sale cap.
    #[error("purchase would exceed the sale cap")]
    ExceedsCap,

    /// The purchase would exceed the actor's per-wallet cap.
    #[error("purchase would exceed the per-wallet cap")]
    ExceedsWalletCap,

    /// The actor purchased too recently and is still cooling down.
    #[error("purchase cooldown is still active")]
    CooldownActive,

    /// `end_sale` was called on a sale that is not currently open.
    #[error("sale is not open")]
    NotActive,
}

/// Failures raised by the purchase processor on top of policy admission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    /// The offered payment does not cover the total cost.
    #[error("insufficient payment: required {required}, offered {offered}")]
    InsufficientPayment {
        /// Total cost of the requested batch
        required: Money,
        /// Payment offered by the buyer
        offered: Money,
    },

    /// `price * amount` does not fit the money representation.
    #[error("total cost overflows the money representation")]
    CostOverflow,
}

/// Failures raised by the settlement manager.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// There are no proceeds to withdraw.
    #[error("no proceeds to withdraw")]
    NoProceeds,

    /// The recipient identifier is nil/empty.
    #[error("invalid withdrawal recipient")]
    InvalidRecipient,

    /// No sale was ever created for the event, so nothing is refundable.
    #[error("no sale exists for event {0}")]
    UnknownSale(EventId),

    /// Refunds only open once the sale has ended.
    #[error("sale for event {0} is still active")]
    SaleStillActive(EventId),

    /// The actor was already refunded for this event.
    #[error("actor {actor} was already refunded for event {event}")]
    AlreadyRefunded {
        /// Event the refund was requested for
        event: EventId,
        /// Actor requesting the refund
        actor: ActorId,
    },

    /// The actor does not hold the referenced ticket.
    #[error("actor {actor} does not own ticket {serial} for event {event}")]
    NotTicketOwner {
        /// Event half of the composite key
        event: EventId,
        /// Serial half of the composite key
        serial: SeatSerial,
        /// Actor requesting the refund
        actor: ActorId,
    },

    /// The settlable balance cannot cover the refund.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount the refund requires
        required: Money,
        /// Balance currently available
        available: Money,
    },
}

/// Failures raised by the authorization layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The actor does not hold the role the operation requires.
    #[error("actor {actor} is not authorized as {role:?}")]
    Unauthorized {
        /// The calling actor
        actor: ActorId,
        /// The role the operation requires
        role: Role,
    },
}

/// Unified error surface of the engine.
///
/// Component errors convert losslessly via `From`, so `?` works across
/// component boundaries inside engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoxOfficeError {
    /// Inventory ledger failure
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Sale policy failure
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Purchase processing failure
    #[error(transparent)]
    Purchase(#[from] PurchaseError),

    /// Settlement failure
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    /// Authorization failure
    #[error(transparent)]
    Auth(#[from] AuthError),
}
