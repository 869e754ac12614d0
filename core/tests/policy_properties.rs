//! Property tests for the sale policy / ledger / treasury composition.
//!
//! Drives randomized purchase-attempt sequences through the pure core the
//! same way the runtime's exclusive section does, then checks the engine
//! invariants: never oversell, gapless serials, wallet-cap monotonicity,
//! strict cooldown gaps, and exact proceeds accounting.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use std::collections::HashMap;
use turnstile_core::{
    ActorId, BlockHeight, EventId, EventLedger, EventRecord, Money, SaleParams, SaleState,
    SeatSerial, Treasury,
};
use uuid::Uuid;

fn t(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
}

fn actor(index: u8) -> ActorId {
    ActorId::from_uuid(Uuid::from_u128(u128::from(index) + 1))
}

fn fixture(params: SaleParams) -> (SaleState, EventLedger, Treasury) {
    let mut sale = SaleState::new();
    sale.create_sale(EventId::new(1), params).expect("valid params");
    let ledger = EventLedger::new(EventRecord {
        id: EventId::new(1),
        name: "prop".to_string(),
        description: String::new(),
        date: t(86_400),
        location: "hall".to_string(),
        active: true,
    });
    (sale, ledger, Treasury::new())
}

#[derive(Clone, Debug)]
struct Attempt {
    actor: u8,
    amount: u32,
    block_step: u64,
}

fn attempts() -> impl Strategy<Value = Vec<Attempt>> {
    prop::collection::vec(
        (0u8..4, 0u32..6, 0u64..3).prop_map(|(actor, amount, block_step)| Attempt {
            actor,
            amount,
            block_step,
        }),
        0..40,
    )
}

proptest! {
    #[test]
    fn purchase_sequences_preserve_engine_invariants(
        cap in 1u32..20,
        per_wallet_cap in 1u32..5,
        cooldown_blocks in 0u64..3,
        price_cents in 1u64..1_000,
        attempts in attempts(),
    ) {
        let price = Money::from_cents(price_cents);
        let (mut sale, mut ledger, mut treasury) = fixture(SaleParams {
            price,
            cap,
            start: t(0),
            end: t(1_000),
            per_wallet_cap,
            cooldown_blocks,
        });

        let mut block = BlockHeight::new(0);
        let mut success_blocks: HashMap<u8, Vec<u64>> = HashMap::new();

        for attempt in &attempts {
            block = BlockHeight::new(block.value() + attempt.block_step);
            let buyer = actor(attempt.actor);

            if let Ok(quote) = sale.evaluate_purchase(buyer, attempt.amount, t(10), block) {
                let total = quote.total().expect("small totals never overflow");
                ledger.issue(buyer, &quote.serials).expect("serials are fresh and positive");
                sale.record_purchase(buyer, attempt.amount, block);
                treasury.record_proceeds(total);
                success_blocks.entry(attempt.actor).or_default().push(block.value());
            }
        }

        let sold = sale.sale().expect("sale exists").sold;

        // Never oversell.
        prop_assert!(sold <= cap);

        // Serials are exactly {1..=sold}: every serial in range is issued,
        // nothing beyond it is.
        prop_assert_eq!(ledger.issued() as u32, sold);
        for serial in 1..=sold {
            prop_assert!(ledger.owner_of(SeatSerial::new(serial)).is_some());
        }
        prop_assert!(ledger.owner_of(SeatSerial::new(sold + 1)).is_none());

        // Wallet cap holds per actor regardless of ordering.
        for index in 0u8..4 {
            prop_assert!(sale.minted_by(actor(index)) <= per_wallet_cap);
        }

        // Cooldown: consecutive successes of one actor are strictly more
        // than cooldown_blocks apart.
        for blocks in success_blocks.values() {
            for pair in blocks.windows(2) {
                prop_assert!(pair[1] > pair[0] + cooldown_blocks);
            }
        }

        // Proceeds account for every sold ticket exactly once.
        let expected = price.checked_multiply(sold).expect("bounded total");
        prop_assert_eq!(treasury.balance(), expected);
    }

    #[test]
    fn refunds_never_double_spend(
        price_cents in 1u64..1_000,
        buyers in 1u8..4,
        refund_attempts in prop::collection::vec(0u8..4, 0..12),
    ) {
        let price = Money::from_cents(price_cents);
        let event = EventId::new(1);
        let mut treasury = Treasury::new();
        for _ in 0..buyers {
            treasury.record_proceeds(price);
        }
        let funded = treasury.balance();

        let mut refunded = 0u64;
        for index in refund_attempts {
            if treasury.refund(event, actor(index), price).is_ok() {
                refunded += 1;
            }
        }

        // Each (event, actor) pair refunds at most once and the balance
        // drops by exactly price per refund.
        prop_assert!(refunded <= 4);
        let expected = funded
            .checked_sub(price.checked_multiply(u32::try_from(refunded).unwrap()).unwrap());
        prop_assert_eq!(Some(treasury.balance()), expected);
    }
}
