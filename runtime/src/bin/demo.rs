//! Scripted end-to-end demo of the box office.
//!
//! Creates an event, opens a sale, runs a couple of purchases, checks a
//! ticket in, and withdraws the proceeds, logging each step. The final
//! purchase receipt is printed as JSON.
//!
//! Run with: `cargo run --bin demo` (set `RUST_LOG=debug` for the full
//! trace).

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;
use turnstile_runtime::{ActorId, BlockHeight, BoxOffice, EventId, Money, Role, SaleParams};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let admin = ActorId::new();
    let organizer = ActorId::new();
    let verifier = ActorId::new();
    let alice = ActorId::new();
    let bob = ActorId::new();

    let office = BoxOffice::new(admin);
    office.grant_role(admin, organizer, Role::Organizer).await?;
    office.grant_role(admin, verifier, Role::Verifier).await?;

    let event = EventId::new(1);
    let now = Utc::now();
    office
        .create_event(
            organizer,
            event,
            "Launch Night",
            "Doors at eight",
            now + Duration::days(30),
            "Warehouse 9",
        )
        .await?;

    office
        .create_sale(
            organizer,
            event,
            SaleParams {
                price: Money::from_cents(2_500),
                cap: 100,
                start: now - Duration::hours(1),
                end: now + Duration::days(7),
                per_wallet_cap: 4,
                cooldown_blocks: 1,
            },
        )
        .await?;

    let receipt = office
        .purchase(
            alice,
            event,
            2,
            Money::from_cents(5_000),
            now,
            BlockHeight::new(10),
        )
        .await?;
    tracing::info!(holder = %alice, serials = receipt.serials.len(), "alice bought her seats");

    // Bob overpays and is owed change.
    let receipt = office
        .purchase(
            bob,
            event,
            1,
            Money::from_cents(3_000),
            now,
            BlockHeight::new(11),
        )
        .await?;

    office.check_in(verifier, event, receipt.serials[0]).await?;

    let swept = office.withdraw_proceeds(admin, admin).await?;
    tracing::info!(amount = %swept, "proceeds withdrawn");

    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}
