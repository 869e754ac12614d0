//! The box office: concurrent shell around the pure core.
//!
//! [`BoxOffice`] is the single entry point external collaborators call.
//! It owns all mutable state behind locks and serializes every mutation
//! for one event through that event's exclusive section, so the
//! admissibility check, serial assignment, ticket issuance, and counter
//! updates of a purchase commit as one indivisible unit, so two concurrent
//! purchases can never both pass the cap check and jointly oversell.
//!
//! # Locking
//!
//! - An outer `RwLock` maps `EventId` to a per-event cell; mutations take
//!   the cell's `Mutex`, so events never contend with each other.
//! - The treasury has its own `Mutex`. Lock order is always
//!   event → treasury (withdrawal takes the treasury alone), which rules
//!   out deadlock.
//! - No caller code runs inside a critical section: funds movement is
//!   modeled as returned amounts, never as a callback, so an operation
//!   cannot re-enter the engine while state is half-updated.
//!
//! # Failure semantics
//!
//! Every fallible step of an operation runs before its first mutation.
//! A rejected call therefore leaves state exactly as it was: there is no
//! partial application and nothing to roll back.

use crate::config::BoxOfficeConfig;
use crate::notice::Notice;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, broadcast};
use turnstile_core::{
    ActorId, BlockHeight, BoxOfficeError, EventId, EventLedger, EventRecord, LedgerError, Money,
    PolicyError, PurchaseError, Role, RoleGrants, Sale, SaleParams, SaleState, SeatSerial,
    SerialBatch, SettlementError, Ticket, Treasury,
};

/// Outcome of an accepted purchase.
///
/// `change_due` is computed here but moved by the funds rail at the
/// boundary; the engine only does the arithmetic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    /// The event purchased for
    pub event: EventId,
    /// The buying actor
    pub holder: ActorId,
    /// Serials issued to the holder, in assignment order
    pub serials: SerialBatch,
    /// Total charged into proceeds
    pub total_cost: Money,
    /// Overpayment owed back to the payer
    pub change_due: Money,
}

/// Per-event state: the inventory ledger and the sale policy records,
/// guarded together so a purchase mutates both under one lock.
struct EventState {
    ledger: EventLedger,
    sale: SaleState,
}

struct EventCell {
    state: Mutex<EventState>,
}

impl EventCell {
    fn new(record: EventRecord) -> Self {
        Self {
            state: Mutex::new(EventState {
                ledger: EventLedger::new(record),
                sale: SaleState::new(),
            }),
        }
    }
}

/// The concurrent ticket-sale and admission-control engine.
///
/// # Example
///
/// ```ignore
/// let admin = ActorId::new();
/// let office = BoxOffice::new(admin);
///
/// office.grant_role(admin, organizer, Role::Organizer).await?;
/// office.create_event(organizer, event, "Launch Night", "", date, "Hall 9").await?;
/// office.create_sale(organizer, event, params).await?;
///
/// let receipt = office
///     .purchase(buyer, event, 2, Money::from_cents(20), now, block)
///     .await?;
/// ```
pub struct BoxOffice {
    events: RwLock<HashMap<EventId, Arc<EventCell>>>,
    treasury: Mutex<Treasury>,
    roles: RwLock<RoleGrants>,
    notices: broadcast::Sender<Notice>,
}

impl BoxOffice {
    /// Create an engine with default configuration, seeded with a root
    /// administrator.
    #[must_use]
    pub fn new(root_admin: ActorId) -> Self {
        Self::with_config(root_admin, BoxOfficeConfig::default())
    }

    /// Create an engine with custom configuration.
    #[must_use]
    pub fn with_config(root_admin: ActorId, config: BoxOfficeConfig) -> Self {
        let (notices, _) = broadcast::channel(config.notice_capacity);
        Self {
            events: RwLock::new(HashMap::new()),
            treasury: Mutex::new(Treasury::new()),
            roles: RwLock::new(RoleGrants::with_administrator(root_admin)),
            notices,
        }
    }

    /// Subscribe to committed-state-change notices.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    fn notify(&self, notice: Notice) {
        // Best-effort: no subscriber means nobody to tell.
        let _ = self.notices.send(notice);
    }

    async fn cell(&self, event: EventId) -> Option<Arc<EventCell>> {
        self.events.read().await.get(&event).cloned()
    }

    async fn authorize(&self, actor: ActorId, role: Role) -> Result<(), BoxOfficeError> {
        self.roles.read().await.authorize(actor, role)?;
        Ok(())
    }

    // ========================================================================
    // Role administration
    // ========================================================================

    /// Grant `role` to `actor`. Requires `Administrator`.
    ///
    /// # Errors
    ///
    /// [`turnstile_core::AuthError::Unauthorized`] if `admin` is not an
    /// administrator.
    #[tracing::instrument(skip_all, fields(admin = %admin, actor = %actor, role = ?role))]
    pub async fn grant_role(
        &self,
        admin: ActorId,
        actor: ActorId,
        role: Role,
    ) -> Result<(), BoxOfficeError> {
        self.authorize(admin, Role::Administrator).await?;
        self.roles.write().await.grant(actor, role);
        tracing::info!(?role, "role granted");
        Ok(())
    }

    /// Revoke `role` from `actor`. Requires `Administrator`.
    ///
    /// # Errors
    ///
    /// [`turnstile_core::AuthError::Unauthorized`] if `admin` is not an
    /// administrator.
    #[tracing::instrument(skip_all, fields(admin = %admin, actor = %actor, role = ?role))]
    pub async fn revoke_role(
        &self,
        admin: ActorId,
        actor: ActorId,
        role: Role,
    ) -> Result<(), BoxOfficeError> {
        self.authorize(admin, Role::Administrator).await?;
        self.roles.write().await.revoke(actor, role);
        tracing::info!(?role, "role revoked");
        Ok(())
    }

    /// Whether `actor` currently holds `role`.
    pub async fn has_role(&self, actor: ActorId, role: Role) -> bool {
        self.roles.read().await.has(actor, role)
    }

    // ========================================================================
    // Inventory ledger operations
    // ========================================================================

    /// Create an event. Requires `Organizer`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AlreadyExists`] if the identifier is already taken;
    /// authorization failure otherwise.
    #[tracing::instrument(skip_all, fields(event = %event, organizer = %organizer))]
    pub async fn create_event(
        &self,
        organizer: ActorId,
        event: EventId,
        name: impl Into<String>,
        description: impl Into<String>,
        date: DateTime<Utc>,
        location: impl Into<String>,
    ) -> Result<(), BoxOfficeError> {
        self.authorize(organizer, Role::Organizer).await?;

        let mut events = self.events.write().await;
        if events.contains_key(&event) {
            return Err(LedgerError::AlreadyExists(event).into());
        }
        events.insert(
            event,
            Arc::new(EventCell::new(EventRecord {
                id: event,
                name: name.into(),
                description: description.into(),
                date,
                location: location.into(),
                active: true,
            })),
        );
        drop(events);

        metrics::counter!("boxoffice.events.created").increment(1);
        tracing::info!("event created");
        self.notify(Notice::EventCreated { event });
        Ok(())
    }

    /// Issue tickets directly to a holder, outside the purchase path
    /// (comps, manual allocation). Requires `Organizer`.
    ///
    /// Serial uniqueness is the caller's contract: serials handed in here
    /// must never collide with each other, with prior manual issuance, or
    /// with the sequential range an open sale assigns from its sold
    /// counter.
    ///
    /// # Errors
    ///
    /// [`LedgerError::UnknownEvent`] for an absent or inactive event,
    /// [`LedgerError::InvalidSerial`] for a non-positive serial;
    /// authorization failure otherwise.
    #[tracing::instrument(skip_all, fields(event = %event, holder = %holder))]
    pub async fn issue_tickets(
        &self,
        organizer: ActorId,
        event: EventId,
        holder: ActorId,
        serials: &[SeatSerial],
    ) -> Result<(), BoxOfficeError> {
        self.authorize(organizer, Role::Organizer).await?;

        let cell = self
            .cell(event)
            .await
            .ok_or(LedgerError::UnknownEvent(event))?;
        let mut state = cell.state.lock().await;
        state.ledger.issue(holder, serials)?;
        drop(state);

        metrics::counter!("boxoffice.tickets.issued").increment(serials.len() as u64);
        self.notify(Notice::TicketsIssued {
            event,
            holder,
            serials: serials.to_vec(),
        });
        Ok(())
    }

    // ========================================================================
    // Sale policy operations
    // ========================================================================

    /// Open the sale for an event. Requires `Organizer`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::UnknownEvent`] for an absent event, the parameter
    /// validation errors of
    /// [`SaleState::create_sale`], or
    /// [`PolicyError::DuplicateSale`]; authorization failure otherwise.
    #[tracing::instrument(skip_all, fields(event = %event))]
    pub async fn create_sale(
        &self,
        organizer: ActorId,
        event: EventId,
        params: SaleParams,
    ) -> Result<(), BoxOfficeError> {
        self.authorize(organizer, Role::Organizer).await?;

        let cell = self
            .cell(event)
            .await
            .ok_or(LedgerError::UnknownEvent(event))?;
        let mut state = cell.state.lock().await;
        state.sale.create_sale(event, params)?;
        drop(state);

        metrics::counter!("boxoffice.sales.created").increment(1);
        tracing::info!(price = %params.price, cap = params.cap, "sale created");
        self.notify(Notice::SaleCreated { event, params });
        Ok(())
    }

    /// End the sale for an event. Requires `Administrator`.
    ///
    /// # Errors
    ///
    /// [`PolicyError::NotActive`] unless a sale is currently open;
    /// authorization failure otherwise.
    #[tracing::instrument(skip_all, fields(event = %event))]
    pub async fn end_sale(&self, admin: ActorId, event: EventId) -> Result<(), BoxOfficeError> {
        self.authorize(admin, Role::Administrator).await?;

        let cell = self.cell(event).await.ok_or(PolicyError::NotActive)?;
        let mut state = cell.state.lock().await;
        state.sale.end_sale()?;
        drop(state);

        metrics::counter!("boxoffice.sales.ended").increment(1);
        tracing::info!("sale ended");
        self.notify(Notice::SaleEnded { event });
        Ok(())
    }

    /// Read-only admissibility probe: would this purchase be admitted
    /// right now? Reuses the canonical check the purchase path runs.
    ///
    /// # Errors
    ///
    /// The first failing admissibility reason, as the purchase path would
    /// report it.
    pub async fn can_purchase(
        &self,
        actor: ActorId,
        event: EventId,
        amount: u32,
        now: DateTime<Utc>,
        current_block: BlockHeight,
    ) -> Result<(), BoxOfficeError> {
        let cell = self.cell(event).await.ok_or(PolicyError::SaleNotActive)?;
        let state = cell.state.lock().await;
        state
            .sale
            .evaluate_purchase(actor, amount, now, current_block)?;
        Ok(())
    }

    // ========================================================================
    // Purchase processor
    // ========================================================================

    /// Atomically purchase `amount` tickets.
    ///
    /// Under the event's exclusive section: admissibility, pricing, and
    /// payment checks run first; then the tickets are issued against the
    /// next serials, the counters committed, and the proceeds banked.
    /// Serial assignment order matches acceptance order because the sold
    /// counter is both inventory count and numbering source.
    ///
    /// # Errors
    ///
    /// The first failing admissibility reason ([`PolicyError`]),
    /// [`PurchaseError::CostOverflow`], or
    /// [`PurchaseError::InsufficientPayment`]. On any failure no state
    /// changes.
    #[tracing::instrument(
        skip_all,
        fields(event = %event, actor = %actor, amount, payment = %payment)
    )]
    pub async fn purchase(
        &self,
        actor: ActorId,
        event: EventId,
        amount: u32,
        payment: Money,
        now: DateTime<Utc>,
        current_block: BlockHeight,
    ) -> Result<PurchaseReceipt, BoxOfficeError> {
        let cell = self.cell(event).await.ok_or(PolicyError::SaleNotActive)?;
        let mut state = cell.state.lock().await;

        let quote = state
            .sale
            .evaluate_purchase(actor, amount, now, current_block)
            .inspect_err(|reason| {
                metrics::counter!("boxoffice.purchases.rejected").increment(1);
                tracing::debug!(%reason, "purchase rejected");
            })?;
        let total_cost = quote.total().ok_or(PurchaseError::CostOverflow)?;
        if payment < total_cost {
            metrics::counter!("boxoffice.purchases.rejected").increment(1);
            return Err(PurchaseError::InsufficientPayment {
                required: total_cost,
                offered: payment,
            }
            .into());
        }

        // Last fallible step is behind us: commit in an order where every
        // remaining call is infallible for the state we hold.
        state.ledger.issue(actor, &quote.serials)?;
        state.sale.record_purchase(actor, amount, current_block);
        self.treasury.lock().await.record_proceeds(total_cost);
        drop(state);

        let change_due = payment.checked_sub(total_cost).unwrap_or(Money::ZERO);
        let receipt = PurchaseReceipt {
            event,
            holder: actor,
            serials: quote.serials,
            total_cost,
            change_due,
        };

        metrics::counter!("boxoffice.purchases.accepted").increment(1);
        tracing::debug!(
            first = ?receipt.serials.first(),
            count = receipt.serials.len(),
            "purchase accepted"
        );
        self.notify(Notice::TicketsSold {
            event,
            holder: actor,
            serials: receipt.serials.to_vec(),
            total: total_cost,
        });
        Ok(receipt)
    }

    // ========================================================================
    // Admission controller
    // ========================================================================

    /// Consume a ticket at check-in. Requires `Verifier`.
    ///
    /// This is the only sanctioned path that marks a ticket used.
    /// Concurrent check-ins on the same serial serialize on the event's
    /// section: exactly one wins, the rest observe `AlreadyUsed`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::TicketNotOwned`] when no such ticket exists,
    /// [`LedgerError::AlreadyUsed`] when it was already consumed;
    /// authorization failure otherwise.
    #[tracing::instrument(skip_all, fields(event = %event, serial = %serial, verifier = %verifier))]
    pub async fn check_in(
        &self,
        verifier: ActorId,
        event: EventId,
        serial: SeatSerial,
    ) -> Result<(), BoxOfficeError> {
        self.authorize(verifier, Role::Verifier).await?;

        let cell = self
            .cell(event)
            .await
            .ok_or(LedgerError::TicketNotOwned { event, serial })?;
        let mut state = cell.state.lock().await;
        state
            .ledger
            .mark_used(serial, verifier)
            .inspect_err(|_| {
                metrics::counter!("boxoffice.checkins.rejected").increment(1);
            })?;
        drop(state);

        metrics::counter!("boxoffice.checkins.accepted").increment(1);
        tracing::info!("ticket checked in");
        self.notify(Notice::TicketCheckedIn {
            event,
            serial,
            verifier,
        });
        Ok(())
    }

    // ========================================================================
    // Settlement manager
    // ========================================================================

    /// Withdraw the entire proceeds balance to `to`. Requires
    /// `Administrator`.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NoProceeds`] on an empty balance, then
    /// [`SettlementError::InvalidRecipient`] on a nil recipient;
    /// authorization failure otherwise.
    #[tracing::instrument(skip_all, fields(admin = %admin, to = %to))]
    pub async fn withdraw_proceeds(
        &self,
        admin: ActorId,
        to: ActorId,
    ) -> Result<Money, BoxOfficeError> {
        self.authorize(admin, Role::Administrator).await?;

        let amount = self.treasury.lock().await.withdraw(to)?;

        metrics::counter!("boxoffice.withdrawals").increment(1);
        tracing::info!(%amount, "proceeds withdrawn");
        self.notify(Notice::ProceedsWithdrawn { to, amount });
        Ok(amount)
    }

    /// Refund the sale price to `actor`, once per `(event, actor)`.
    ///
    /// Open to any actor holding a ticket. Refunds only open once the
    /// sale is over, ended by an administrator or past its window.
    ///
    /// # Errors
    ///
    /// [`SettlementError::UnknownSale`] when the event never had a sale,
    /// [`SettlementError::SaleStillActive`] while the sale is running,
    /// [`SettlementError::AlreadyRefunded`] on a repeat refund,
    /// [`SettlementError::NotTicketOwner`] when `actor` does not hold the
    /// referenced ticket, and
    /// [`SettlementError::InsufficientBalance`] when proceeds cannot
    /// cover the price.
    #[tracing::instrument(skip_all, fields(event = %event, actor = %actor, serial = %serial))]
    pub async fn refund(
        &self,
        actor: ActorId,
        event: EventId,
        serial: SeatSerial,
        now: DateTime<Utc>,
    ) -> Result<Money, BoxOfficeError> {
        let cell = self
            .cell(event)
            .await
            .ok_or(SettlementError::UnknownSale(event))?;
        let state = cell.state.lock().await;

        let (active, end, price) = {
            let sale = state
                .sale
                .sale()
                .ok_or(SettlementError::UnknownSale(event))?;
            (sale.active, sale.params.end, sale.params.price)
        };
        if active && now <= end {
            return Err(SettlementError::SaleStillActive(event).into());
        }

        let mut treasury = self.treasury.lock().await;
        if treasury.has_refunded(event, actor) {
            return Err(SettlementError::AlreadyRefunded { event, actor }.into());
        }
        if state.ledger.owner_of(serial) != Some(actor) {
            return Err(SettlementError::NotTicketOwner {
                event,
                serial,
                actor,
            }
            .into());
        }
        let amount = treasury.refund(event, actor, price)?;
        drop(treasury);
        drop(state);

        metrics::counter!("boxoffice.refunds").increment(1);
        tracing::info!(%amount, "refund issued");
        self.notify(Notice::RefundIssued {
            event,
            actor,
            amount,
        });
        Ok(amount)
    }

    // ========================================================================
    // Read-only queries
    // ========================================================================

    /// The event record, if created.
    pub async fn event(&self, event: EventId) -> Option<EventRecord> {
        let cell = self.cell(event).await?;
        let state = cell.state.lock().await;
        Some(state.ledger.record().clone())
    }

    /// The sale record, if created.
    pub async fn sale(&self, event: EventId) -> Option<Sale> {
        let cell = self.cell(event).await?;
        let state = cell.state.lock().await;
        state.sale.sale().cloned()
    }

    /// Tickets still sellable under the cap, if a sale exists.
    pub async fn remaining(&self, event: EventId) -> Option<u32> {
        self.sale(event).await.map(|sale| sale.remaining())
    }

    /// Current holder of a ticket, if issued.
    pub async fn owner_of(&self, event: EventId, serial: SeatSerial) -> Option<ActorId> {
        let cell = self.cell(event).await?;
        let state = cell.state.lock().await;
        state.ledger.owner_of(serial)
    }

    /// Whether a ticket has been consumed; `None` if never issued.
    pub async fn is_used(&self, event: EventId, serial: SeatSerial) -> Option<bool> {
        let cell = self.cell(event).await?;
        let state = cell.state.lock().await;
        state.ledger.is_used(serial)
    }

    /// Full ticket record, if issued.
    pub async fn ticket(&self, event: EventId, serial: SeatSerial) -> Option<Ticket> {
        let cell = self.cell(event).await?;
        let state = cell.state.lock().await;
        state.ledger.ticket(serial).cloned()
    }

    /// Serials held by `actor` for `event`, ascending.
    pub async fn tickets_of(&self, event: EventId, actor: ActorId) -> Vec<SeatSerial> {
        match self.cell(event).await {
            Some(cell) => cell.state.lock().await.ledger.tickets_of(actor),
            None => Vec::new(),
        }
    }

    /// Cumulative tickets bought by `actor` for `event`.
    pub async fn minted_by(&self, event: EventId, actor: ActorId) -> u32 {
        match self.cell(event).await {
            Some(cell) => cell.state.lock().await.sale.minted_by(actor),
            None => 0,
        }
    }

    /// Collected, unwithdrawn proceeds. Requires `Administrator`.
    ///
    /// # Errors
    ///
    /// Authorization failure if `admin` is not an administrator.
    pub async fn proceeds_balance(&self, admin: ActorId) -> Result<Money, BoxOfficeError> {
        self.authorize(admin, Role::Administrator).await?;
        Ok(self.treasury.lock().await.balance())
    }
}
