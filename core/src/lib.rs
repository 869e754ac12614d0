//! # Turnstile Core
//!
//! Domain model and pure transition logic for the Turnstile ticket-sale
//! and admission-control engine.
//!
//! This crate is the functional core: plain data, pure validation, and
//! deterministic state transitions. It knows nothing about locks, tasks,
//! or channels; the `turnstile-runtime` crate wraps these components in
//! the concurrency shell that serializes mutations per event.
//!
//! ## Components
//!
//! - [`ledger`]: inventory ledger. Event records, ticket issuance,
//!   at-most-once consumption, ownership queries
//! - [`policy`]: sale policy engine. Sale parameters, the ordered
//!   purchase-admissibility check, throttling counters
//! - [`settlement`]: treasury. Proceeds balance, withdrawal, refund
//!   records
//! - [`auth`]: role grants and the capability check gating privileged
//!   operations
//! - [`types`]: shared identifiers, money, and records
//! - [`error`]: per-component error enums and the unified
//!   [`error::BoxOfficeError`]
//!
//! ## Invariants held here
//!
//! - `sold <= cap` always; serials for an event are exactly `1..=sold`,
//!   gapless, never reused
//! - a ticket is consumed at most once; the second attempt observes a
//!   typed failure
//! - an actor is refunded at most once per event
//! - every validation runs before the first mutation, so a failed call
//!   leaves state untouched

pub mod auth;
pub mod error;
pub mod ledger;
pub mod policy;
pub mod settlement;
pub mod types;

pub use auth::{Role, RoleGrants};
pub use error::{
    AuthError, BoxOfficeError, LedgerError, PolicyError, PurchaseError, SettlementError,
};
pub use ledger::EventLedger;
pub use policy::{PurchaseLedgerEntry, Quote, Sale, SaleParams, SaleState};
pub use settlement::Treasury;
pub use types::{
    ActorId, BlockHeight, EventId, EventRecord, Money, SeatSerial, SerialBatch, Ticket,
};
