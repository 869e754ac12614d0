//! Settlement: proceeds balance and refund records.
//!
//! The treasury exclusively owns the running proceeds balance and the
//! per-`(event, actor)` refund flags. It only does bookkeeping; the funds
//! rail that actually moves value is an external collaborator consuming
//! the amounts these operations return.

use crate::error::SettlementError;
use crate::types::{ActorId, EventId, Money};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Proceeds balance plus refund records for one engine instance.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Treasury {
    balance: Money,
    refunded: HashSet<(EventId, ActorId)>,
}

impl Treasury {
    /// Empty treasury.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collected, unwithdrawn proceeds.
    #[must_use]
    pub const fn balance(&self) -> Money {
        self.balance
    }

    /// Record sale proceeds.
    pub fn record_proceeds(&mut self, amount: Money) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Withdraw the entire balance to `to`, zeroing it.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NoProceeds`] on a zero balance (checked first),
    /// then [`SettlementError::InvalidRecipient`] on a nil recipient.
    pub fn withdraw(&mut self, to: ActorId) -> Result<Money, SettlementError> {
        if self.balance.is_zero() {
            return Err(SettlementError::NoProceeds);
        }
        if to.is_nil() {
            return Err(SettlementError::InvalidRecipient);
        }
        let amount = self.balance;
        self.balance = Money::ZERO;
        Ok(amount)
    }

    /// Whether `(event, actor)` was already refunded.
    #[must_use]
    pub fn has_refunded(&self, event: EventId, actor: ActorId) -> bool {
        self.refunded.contains(&(event, actor))
    }

    /// Issue a refund of `price` to `actor` for `event`: marks the refund
    /// flag and decrements the balance by exactly `price`, once.
    ///
    /// Ownership of the referenced ticket is the caller's check: it lives
    /// in the inventory ledger, which the treasury never reads.
    ///
    /// # Errors
    ///
    /// [`SettlementError::AlreadyRefunded`] on a repeated refund,
    /// [`SettlementError::InsufficientBalance`] when the balance cannot
    /// cover `price`.
    pub fn refund(
        &mut self,
        event: EventId,
        actor: ActorId,
        price: Money,
    ) -> Result<Money, SettlementError> {
        if self.has_refunded(event, actor) {
            return Err(SettlementError::AlreadyRefunded { event, actor });
        }
        let remaining =
            self.balance
                .checked_sub(price)
                .ok_or(SettlementError::InsufficientBalance {
                    required: price,
                    available: self.balance,
                })?;

        self.refunded.insert((event, actor));
        self.balance = remaining;
        Ok(price)
    }
}
