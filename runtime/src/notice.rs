//! Notifications emitted by the box office.
//!
//! Every externally observable state change is broadcast as a [`Notice`]
//! to whoever subscribed: presentation layers, audit sinks, the funds
//! rail. Notices are facts about what happened, published after the
//! mutation committed; they are never part of the critical section and a
//! send with no subscribers is a no-op.

use serde::{Deserialize, Serialize};
use turnstile_core::{ActorId, EventId, Money, SaleParams, SeatSerial};

/// A fact about a committed state change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Notice {
    /// An event was created
    EventCreated {
        /// The new event
        event: EventId,
    },

    /// A sale was opened for an event
    SaleCreated {
        /// The event the sale belongs to
        event: EventId,
        /// Parameters the sale was opened with
        params: SaleParams,
    },

    /// A sale was ended by an administrator
    SaleEnded {
        /// The event the sale belongs to
        event: EventId,
    },

    /// Tickets were issued directly by an organizer
    TicketsIssued {
        /// The event the tickets belong to
        event: EventId,
        /// Receiving holder
        holder: ActorId,
        /// Issued serials
        serials: Vec<SeatSerial>,
    },

    /// Tickets were sold through the purchase path
    TicketsSold {
        /// The event the tickets belong to
        event: EventId,
        /// Buying actor
        holder: ActorId,
        /// Issued serials
        serials: Vec<SeatSerial>,
        /// Total charged
        total: Money,
    },

    /// A ticket was consumed at check-in
    TicketCheckedIn {
        /// The event the ticket belongs to
        event: EventId,
        /// Consumed serial
        serial: SeatSerial,
        /// Verifying actor
        verifier: ActorId,
    },

    /// Accumulated proceeds were withdrawn
    ProceedsWithdrawn {
        /// Receiving recipient
        to: ActorId,
        /// Withdrawn amount
        amount: Money,
    },

    /// A refund was issued
    RefundIssued {
        /// The event the refund concerns
        event: EventId,
        /// Refunded actor
        actor: ActorId,
        /// Refunded amount
        amount: Money,
    },
}
