//! Inventory ledger: per-event ticket numbering and ownership truth.
//!
//! The ledger exclusively owns [`EventRecord`] and [`Ticket`] records. It
//! issues tickets against serials the caller supplies and enforces
//! at-most-once consumption at check-in, the one invariant everything
//! else leans on: a consumed ticket can never be consumed again, and the
//! second attempt always observes a failure rather than a silent success.
//!
//! Serial uniqueness is a caller contract. The sale policy engine is the
//! single numbering source (serials are derived from the sold counter
//! under the same exclusive section), so the ledger does not re-detect
//! collisions here.

use crate::error::LedgerError;
use crate::types::{ActorId, EventRecord, SeatSerial, Ticket};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One event's ledger: the event record plus its ticket book.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventLedger {
    record: EventRecord,
    tickets: BTreeMap<SeatSerial, Ticket>,
}

impl EventLedger {
    /// Open a ledger for a freshly created event.
    #[must_use]
    pub const fn new(record: EventRecord) -> Self {
        Self {
            record,
            tickets: BTreeMap::new(),
        }
    }

    /// The event record this ledger belongs to.
    #[must_use]
    pub const fn record(&self) -> &EventRecord {
        &self.record
    }

    /// Number of tickets issued so far.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.tickets.len()
    }

    /// Issue one ticket per serial to `holder`.
    ///
    /// All serials are validated before the first insertion, so a failed
    /// call leaves the ticket book untouched.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UnknownEvent`] if the event is inactive.
    /// - [`LedgerError::InvalidSerial`] if any serial is zero.
    pub fn issue(&mut self, holder: ActorId, serials: &[SeatSerial]) -> Result<(), LedgerError> {
        if !self.record.active {
            return Err(LedgerError::UnknownEvent(self.record.id));
        }
        if serials.iter().any(|serial| !serial.is_valid()) {
            return Err(LedgerError::InvalidSerial);
        }

        for &serial in serials {
            self.tickets.insert(
                serial,
                Ticket {
                    event: self.record.id,
                    serial,
                    holder,
                    used: false,
                    used_by: None,
                },
            );
        }
        Ok(())
    }

    /// Consume a ticket at check-in, recording the verifying actor.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::TicketNotOwned`] if no ticket exists for the key.
    /// - [`LedgerError::AlreadyUsed`] if the ticket was already consumed.
    pub fn mark_used(
        &mut self,
        serial: SeatSerial,
        verifier: ActorId,
    ) -> Result<(), LedgerError> {
        let event = self.record.id;
        let ticket = self
            .tickets
            .get_mut(&serial)
            .ok_or(LedgerError::TicketNotOwned { event, serial })?;

        if ticket.used {
            return Err(LedgerError::AlreadyUsed { event, serial });
        }
        ticket.used = true;
        ticket.used_by = Some(verifier);
        Ok(())
    }

    /// Current holder of a ticket, if issued.
    #[must_use]
    pub fn owner_of(&self, serial: SeatSerial) -> Option<ActorId> {
        self.tickets.get(&serial).map(|ticket| ticket.holder)
    }

    /// Whether a ticket has been consumed; `None` if never issued.
    #[must_use]
    pub fn is_used(&self, serial: SeatSerial) -> Option<bool> {
        self.tickets.get(&serial).map(|ticket| ticket.used)
    }

    /// Full ticket record, if issued.
    #[must_use]
    pub fn ticket(&self, serial: SeatSerial) -> Option<&Ticket> {
        self.tickets.get(&serial)
    }

    /// Serials currently held by `actor`, in ascending order.
    #[must_use]
    pub fn tickets_of(&self, actor: ActorId) -> Vec<SeatSerial> {
        self.tickets
            .values()
            .filter(|ticket| ticket.holder == actor)
            .map(|ticket| ticket.serial)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventId;
    use chrono::Utc;

    fn ledger() -> EventLedger {
        EventLedger::new(EventRecord {
            id: EventId::new(1),
            name: "Launch Night".to_string(),
            description: "Door show".to_string(),
            date: Utc::now(),
            location: "Warehouse 9".to_string(),
            active: true,
        })
    }

    #[test]
    fn issue_creates_unused_tickets_for_holder() {
        let holder = ActorId::new();
        let mut ledger = ledger();

        ledger
            .issue(holder, &[SeatSerial::new(1), SeatSerial::new(2)])
            .ok();

        assert_eq!(ledger.issued(), 2);
        assert_eq!(ledger.owner_of(SeatSerial::new(1)), Some(holder));
        assert_eq!(ledger.is_used(SeatSerial::new(2)), Some(false));
        assert_eq!(
            ledger.tickets_of(holder),
            vec![SeatSerial::new(1), SeatSerial::new(2)]
        );
    }

    #[test]
    fn zero_serial_rejects_whole_batch() {
        let mut ledger = ledger();
        let result = ledger.issue(ActorId::new(), &[SeatSerial::new(1), SeatSerial::new(0)]);

        assert_eq!(result, Err(LedgerError::InvalidSerial));
        assert_eq!(ledger.issued(), 0);
    }

    #[test]
    fn mark_used_consumes_at_most_once() {
        let holder = ActorId::new();
        let verifier = ActorId::new();
        let mut ledger = ledger();
        ledger.issue(holder, &[SeatSerial::new(1)]).ok();

        assert!(ledger.mark_used(SeatSerial::new(1), verifier).is_ok());
        assert_eq!(ledger.is_used(SeatSerial::new(1)), Some(true));
        assert_eq!(
            ledger.ticket(SeatSerial::new(1)).map(|t| t.used_by),
            Some(Some(verifier))
        );

        // Second consumption always fails, never silently succeeds.
        assert_eq!(
            ledger.mark_used(SeatSerial::new(1), verifier),
            Err(LedgerError::AlreadyUsed {
                event: EventId::new(1),
                serial: SeatSerial::new(1)
            })
        );
    }

    #[test]
    fn mark_used_requires_an_issued_ticket() {
        let mut ledger = ledger();
        assert_eq!(
            ledger.mark_used(SeatSerial::new(7), ActorId::new()),
            Err(LedgerError::TicketNotOwned {
                event: EventId::new(1),
                serial: SeatSerial::new(7)
            })
        );
    }
}
