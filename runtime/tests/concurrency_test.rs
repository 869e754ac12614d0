//! Concurrency tests for the box office.
//!
//! Races many buyers, verifiers, and the administrator against the same
//! event and asserts the serialization guarantees hold: the cap is never
//! oversold, serials stay gapless, one check-in wins, and the treasury
//! accounts for every sold ticket exactly once.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use turnstile_runtime::{
    BlockHeight, BoxOffice, BoxOfficeError, EventId, LedgerError, Money, PolicyError, Role,
    SeatSerial,
};
use turnstile_testing::{SaleParamsBuilder, actor, at};

const EVENT: EventId = EventId::new(1);
const PRICE: Money = Money::from_cents(10);

async fn office_with_sale(cap: u32, per_wallet_cap: u32, cooldown_blocks: u64) -> Arc<BoxOffice> {
    let admin = actor(100);
    let organizer = actor(101);
    let office = BoxOffice::new(admin);
    office
        .grant_role(admin, organizer, Role::Organizer)
        .await
        .unwrap();
    office
        .grant_role(admin, actor(102), Role::Verifier)
        .await
        .unwrap();
    office
        .create_event(organizer, EVENT, "Storm", "", at(86_400), "Hall")
        .await
        .unwrap();
    office
        .create_sale(
            organizer,
            EVENT,
            SaleParamsBuilder::new()
                .price(PRICE)
                .cap(cap)
                .per_wallet_cap(per_wallet_cap)
                .cooldown_blocks(cooldown_blocks)
                .build(),
        )
        .await
        .unwrap();
    Arc::new(office)
}

/// Thirty-two distinct buyers race for ten seats: exactly ten purchases
/// land, sold never exceeds the cap, and the issued serials are exactly
/// `{1..=10}` with no duplicates.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn purchase_storm_never_oversells() {
    let office = office_with_sale(10, 10, 0).await;

    let tasks = (0u8..32).map(|i| {
        let office = Arc::clone(&office);
        tokio::spawn(async move {
            office
                .purchase(
                    actor(i),
                    EVENT,
                    1,
                    PRICE,
                    at(1),
                    BlockHeight::new(u64::from(i)),
                )
                .await
        })
    });
    let outcomes = join_all(tasks).await;

    let mut issued = BTreeSet::new();
    let mut accepted = 0u32;
    for outcome in outcomes {
        if let Ok(receipt) = outcome.unwrap() {
            accepted += 1;
            for serial in &receipt.serials {
                assert!(issued.insert(*serial), "serial issued twice: {serial}");
            }
        }
    }

    assert_eq!(accepted, 10);
    let sale = office.sale(EVENT).await.unwrap();
    assert_eq!(sale.sold, 10);
    assert_eq!(
        issued,
        (1..=10).map(SeatSerial::new).collect::<BTreeSet<_>>()
    );
    assert_eq!(office.owner_of(EVENT, SeatSerial::new(11)).await, None);
}

/// One actor races itself: the wallet cap holds no matter how the
/// attempts interleave.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn wallet_cap_holds_under_concurrency() {
    let office = office_with_sale(100, 3, 0).await;
    let greedy = actor(1);

    let tasks = (1u64..=16).map(|block| {
        let office = Arc::clone(&office);
        tokio::spawn(async move {
            office
                .purchase(greedy, EVENT, 1, PRICE, at(1), BlockHeight::new(block))
                .await
        })
    });
    let outcomes = join_all(tasks).await;

    let accepted = outcomes
        .into_iter()
        .filter(|outcome| matches!(outcome, Ok(Ok(_))))
        .count();

    let minted = office.minted_by(EVENT, greedy).await;
    assert_eq!(minted as usize, accepted);
    assert!(minted <= 3, "wallet cap exceeded: {minted}");
}

/// Eight verifiers race to consume one serial: exactly one wins and every
/// loser observes `AlreadyUsed`.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn same_serial_check_in_has_one_winner() {
    let office = office_with_sale(10, 10, 0).await;
    let verifier = actor(102);

    office
        .purchase(actor(1), EVENT, 1, PRICE, at(1), BlockHeight::new(1))
        .await
        .unwrap();

    let tasks = (0..8).map(|_| {
        let office = Arc::clone(&office);
        tokio::spawn(async move { office.check_in(verifier, EVENT, SeatSerial::new(1)).await })
    });
    let outcomes = join_all(tasks).await;

    let mut wins = 0;
    for outcome in outcomes {
        match outcome.unwrap() {
            Ok(()) => wins += 1,
            Err(err) => assert_eq!(
                err,
                BoxOfficeError::Ledger(LedgerError::AlreadyUsed {
                    event: EVENT,
                    serial: SeatSerial::new(1)
                })
            ),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(office.is_used(EVENT, SeatSerial::new(1)).await, Some(true));
}

/// The administrator sweeps proceeds while buyers are still purchasing;
/// whatever the interleaving, withdrawn + remaining equals price × sold.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn withdrawal_races_purchases_without_losing_money() {
    let office = office_with_sale(50, 1, 0).await;
    let admin = actor(100);

    let buyers = (0u8..20).map(|i| {
        let office = Arc::clone(&office);
        tokio::spawn(async move {
            office
                .purchase(actor(i), EVENT, 1, PRICE, at(1), BlockHeight::new(1))
                .await
                .is_ok()
        })
    });
    let sweeper = {
        let office = Arc::clone(&office);
        tokio::spawn(async move {
            match office.withdraw_proceeds(admin, admin).await {
                Ok(amount) => amount,
                Err(_) => Money::ZERO,
            }
        })
    };

    let sold = join_all(buyers)
        .await
        .into_iter()
        .filter(|joined| matches!(joined, Ok(true)))
        .count() as u32;
    let withdrawn = sweeper.await.unwrap();

    let remaining = office.proceeds_balance(admin).await.unwrap();
    let collected = withdrawn.saturating_add(remaining);
    assert_eq!(collected, PRICE.checked_multiply(sold).unwrap());
}

/// Purchases against two different events do not contend: both sell out
/// to their own caps with their own serial sequences.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn events_are_independent() {
    let office = office_with_sale(5, 10, 0).await;
    let organizer = actor(101);
    let other = EventId::new(2);

    office
        .create_event(organizer, other, "Second Hall", "", at(86_400), "Hall 2")
        .await
        .unwrap();
    office
        .create_sale(
            organizer,
            other,
            SaleParamsBuilder::new().price(PRICE).cap(5).build(),
        )
        .await
        .unwrap();

    let tasks = (0u8..10).map(|i| {
        let office = Arc::clone(&office);
        let event = if i % 2 == 0 { EVENT } else { other };
        tokio::spawn(async move {
            office
                .purchase(actor(i), event, 1, PRICE, at(1), BlockHeight::new(u64::from(i)))
                .await
        })
    });
    let accepted = join_all(tasks)
        .await
        .into_iter()
        .filter(|outcome| matches!(outcome, Ok(Ok(_))))
        .count();

    assert_eq!(accepted, 10);
    assert_eq!(office.sale(EVENT).await.unwrap().sold, 5);
    assert_eq!(office.sale(other).await.unwrap().sold, 5);
    for event in [EVENT, other] {
        for serial in 1..=5 {
            assert!(office.owner_of(event, SeatSerial::new(serial)).await.is_some());
        }
    }
}

/// A rejected purchase mid-storm mutates nothing: rerunning the same
/// rejected request after the storm still reports the same reason.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn rejections_are_stable_after_the_storm() {
    let office = office_with_sale(4, 10, 0).await;

    let tasks = (0u8..12).map(|i| {
        let office = Arc::clone(&office);
        tokio::spawn(async move {
            office
                .purchase(actor(i), EVENT, 1, PRICE, at(1), BlockHeight::new(u64::from(i)))
                .await
        })
    });
    join_all(tasks).await;

    let err = office
        .purchase(actor(40), EVENT, 2, PRICE.checked_multiply(2).unwrap(), at(1), BlockHeight::new(99))
        .await
        .unwrap_err();
    assert_eq!(err, BoxOfficeError::Policy(PolicyError::ExceedsCap));
    assert_eq!(office.sale(EVENT).await.unwrap().sold, 4);
}
