//! Sale policy engine: per-event sale parameters and purchase admission.
//!
//! Exclusively owns the [`Sale`] record and the per-actor purchase ledger
//! entries used for throttling. Ownership truth lives in the inventory
//! ledger; the counters here exist so the engine can answer one question
//! deterministically: is this purchase admissible right now?
//!
//! The per-event sale lifecycle is `Uncreated → Open → Ended`. There is no
//! edge back to `Open`: a sale is created at most once per event, which is
//! what keeps the sold counter a valid serial-numbering source for the
//! lifetime of the event. Queries additionally treat `now > end` as
//! logically ended without mutating the `active` flag; the flag and the
//! time window are independent gates and both must pass.

use crate::error::PolicyError;
use crate::types::{ActorId, BlockHeight, EventId, Money, SeatSerial, SerialBatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters fixed at sale creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleParams {
    /// Price per ticket in the smallest currency unit
    pub price: Money,
    /// Maximum sellable tickets
    pub cap: u32,
    /// Opening of the sale window
    pub start: DateTime<Utc>,
    /// Close of the sale window
    pub end: DateTime<Utc>,
    /// Maximum tickets one actor may ever buy for this event
    pub per_wallet_cap: u32,
    /// Minimum number of blocks between two purchases by one actor
    pub cooldown_blocks: u64,
}

/// One event's sale record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Parameters fixed at creation
    pub params: SaleParams,
    /// Running count of sold tickets, `0 <= sold <= cap`
    pub sold: u32,
    /// Whether the sale accepts purchases (cleared by `end_sale`)
    pub active: bool,
}

impl Sale {
    /// Tickets still sellable under the cap.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.params.cap - self.sold
    }
}

/// Per-actor throttling record: cumulative purchases and the block of the
/// most recent one. Never consulted for ownership.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLedgerEntry {
    /// Cumulative tickets bought by the actor for this event
    pub minted: u32,
    /// Block of the most recent successful purchase, `None` before the
    /// first one
    pub last_mint_block: Option<BlockHeight>,
}

/// Admissible-purchase quote: the serials the batch would receive and the
/// unit price to charge. Produced by [`SaleState::evaluate_purchase`]
/// without mutating anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    /// Serials the batch will occupy, `sold+1 ..= sold+amount`
    pub serials: SerialBatch,
    /// Price per ticket
    pub unit_price: Money,
}

impl Quote {
    /// Total cost of the quoted batch; `None` on overflow.
    #[must_use]
    pub fn total(&self) -> Option<Money> {
        u32::try_from(self.serials.len())
            .ok()
            .and_then(|amount| self.unit_price.checked_multiply(amount))
    }
}

/// Sale-policy state for one event: the sale record plus the per-actor
/// purchase ledger.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SaleState {
    sale: Option<Sale>,
    entries: HashMap<ActorId, PurchaseLedgerEntry>,
}

impl SaleState {
    /// Fresh state with no sale created.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The sale record, if one was created.
    #[must_use]
    pub const fn sale(&self) -> Option<&Sale> {
        self.sale.as_ref()
    }

    /// The throttling entry for `actor`.
    #[must_use]
    pub fn entry(&self, actor: ActorId) -> PurchaseLedgerEntry {
        self.entries.get(&actor).copied().unwrap_or_default()
    }

    /// Cumulative tickets bought by `actor` for this event.
    #[must_use]
    pub fn minted_by(&self, actor: ActorId) -> u32 {
        self.entry(actor).minted
    }

    /// Open the sale with the given parameters.
    ///
    /// Validation order matches the rejection contract: price, cap,
    /// window, wallet cap, then duplicate detection.
    ///
    /// # Errors
    ///
    /// [`PolicyError::InvalidPrice`], [`PolicyError::InvalidCap`],
    /// [`PolicyError::InvalidWindow`], [`PolicyError::InvalidWalletCap`],
    /// or [`PolicyError::DuplicateSale`].
    pub fn create_sale(&mut self, event: EventId, params: SaleParams) -> Result<(), PolicyError> {
        if params.price.is_zero() {
            return Err(PolicyError::InvalidPrice);
        }
        if params.cap == 0 {
            return Err(PolicyError::InvalidCap);
        }
        if params.start >= params.end {
            return Err(PolicyError::InvalidWindow);
        }
        if params.per_wallet_cap == 0 {
            return Err(PolicyError::InvalidWalletCap);
        }
        if self.sale.is_some() {
            return Err(PolicyError::DuplicateSale(event));
        }

        self.sale = Some(Sale {
            params,
            sold: 0,
            active: true,
        });
        Ok(())
    }

    /// The canonical admissibility check, pure and order-deterministic.
    ///
    /// Checks run in a fixed order and the first failing reason wins:
    /// active flag, window start, window end, amount, cap, wallet cap,
    /// cooldown. Reused by the mutating purchase path and by the
    /// read-only can-I-buy query.
    ///
    /// Cooldown invariant: a purchase at block `B` blocks the next one by
    /// the same actor until `current_block > B + cooldown_blocks`. The
    /// comparison is strict, so `cooldown_blocks = 0` still forbids a
    /// same-block repeat purchase: a minimum one-block gap.
    ///
    /// # Errors
    ///
    /// The first failing admissibility reason, as a [`PolicyError`].
    pub fn evaluate_purchase(
        &self,
        actor: ActorId,
        amount: u32,
        now: DateTime<Utc>,
        current_block: BlockHeight,
    ) -> Result<Quote, PolicyError> {
        let sale = self
            .sale
            .as_ref()
            .filter(|sale| sale.active)
            .ok_or(PolicyError::SaleNotActive)?;

        if now < sale.params.start {
            return Err(PolicyError::SaleNotStarted);
        }
        if now > sale.params.end {
            return Err(PolicyError::SaleEnded);
        }
        if amount == 0 {
            return Err(PolicyError::InvalidAmount);
        }
        if sale.sold.checked_add(amount).is_none_or(|next| next > sale.params.cap) {
            return Err(PolicyError::ExceedsCap);
        }

        let entry = self.entry(actor);
        if entry
            .minted
            .checked_add(amount)
            .is_none_or(|next| next > sale.params.per_wallet_cap)
        {
            return Err(PolicyError::ExceedsWalletCap);
        }
        if let Some(last) = entry.last_mint_block {
            if current_block <= last.saturating_add(sale.params.cooldown_blocks) {
                return Err(PolicyError::CooldownActive);
            }
        }

        let serials = (sale.sold + 1..=sale.sold + amount)
            .map(SeatSerial::new)
            .collect();
        Ok(Quote {
            serials,
            unit_price: sale.params.price,
        })
    }

    /// Commit an admitted purchase: bump `sold`, the actor's cumulative
    /// count, and the actor's last-purchase block.
    ///
    /// Precondition, not re-checked: [`Self::evaluate_purchase`] admitted
    /// this exact `(actor, amount)` and no other mutation interleaved;
    /// the caller must hold the event's exclusive section across both
    /// calls.
    pub fn record_purchase(&mut self, actor: ActorId, amount: u32, current_block: BlockHeight) {
        debug_assert!(amount > 0, "admitted purchases have positive amounts");
        if let Some(sale) = self.sale.as_mut() {
            debug_assert!(sale.sold + amount <= sale.params.cap);
            sale.sold += amount;
        }
        let entry = self.entries.entry(actor).or_default();
        entry.minted += amount;
        entry.last_mint_block = Some(current_block);
    }

    /// Close the sale.
    ///
    /// # Errors
    ///
    /// [`PolicyError::NotActive`] unless the sale exists and is open.
    pub fn end_sale(&mut self) -> Result<(), PolicyError> {
        match self.sale.as_mut() {
            Some(sale) if sale.active => {
                sale.active = false;
                Ok(())
            }
            _ => Err(PolicyError::NotActive),
        }
    }
}
