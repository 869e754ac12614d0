//! # Turnstile Runtime
//!
//! The concurrent box-office shell over `turnstile-core`.
//!
//! This crate provides [`BoxOffice`], the engine external collaborators
//! call: it serializes all mutations for one event through a per-event
//! exclusive section, keeps settlement behind its own lock, gates
//! privileged operations on role grants, and broadcasts a [`Notice`] for
//! every committed state change.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────────────────────┐
//!   buyers ─────▶ │              BoxOffice               │
//!   verifiers ──▶ │  per-event Mutex ─ ledger + policy   │ ──▶ notices
//!   organizers ─▶ │  treasury Mutex ─ proceeds + refunds │     (broadcast)
//!   admins ─────▶ │  role grants ─ authorize()           │
//!                 └──────────────────────────────────────┘
//! ```
//!
//! The functional core (validation, transitions, invariants) lives in
//! `turnstile-core`; this crate adds exactly the concurrency, logging,
//! metrics, and notification concerns the core deliberately avoids.
//!
//! ## Guarantees
//!
//! - **No oversell**: admissibility and commit happen under one lock.
//! - **At-most-once check-in**: concurrent consumers of one serial
//!   serialize; exactly one wins.
//! - **All-or-nothing operations**: every fallible step precedes the
//!   first mutation.
//! - **No reentrancy**: no caller code runs inside a critical section.

mod boxoffice;
mod config;
mod notice;

pub use boxoffice::{BoxOffice, PurchaseReceipt};
pub use config::BoxOfficeConfig;
pub use notice::Notice;

// Re-export the core surface so consumers depend on one crate.
pub use turnstile_core::{
    ActorId, AuthError, BlockHeight, BoxOfficeError, EventId, EventRecord, LedgerError, Money,
    PolicyError, PurchaseError, Role, Sale, SaleParams, SeatSerial, SerialBatch, SettlementError,
    Ticket,
};
