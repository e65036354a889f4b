//! Portal Core Simulation.
//!
//! Demonstrates the full portal lifecycle: custodian registration, porting
//! matching and minting, redeem delivery with proportional unlock, failed
//! delivery liquidation, and portfolio-wide liquidation after a rate crash.

use portal_core::*;
use std::collections::BTreeMap;

const PRV: AssetId = AssetId(0);
const BTC: AssetId = AssetId(1);
const BNB: AssetId = AssetId(2);

fn main() {
    println!("Portal Core Engine Simulation");
    println!("Collateral-Backed Porting, Redeems, Liquidations\n");

    scenario_1_registration_and_rates();
    scenario_2_single_custodian_porting();
    scenario_3_multi_custodian_porting();
    scenario_4_redeem_lifecycle();
    scenario_5_failed_delivery_liquidation();
    scenario_6_rate_crash_detection();
    scenario_7_porting_expiry();
    scenario_8_block_processing();

    println!("\nAll simulations completed successfully.");
}

fn remote_addresses(btc: &str, bnb: &str) -> BTreeMap<AssetId, RemoteAddress> {
    [(BTC, btc.to_string()), (BNB, bnb.to_string())]
        .into_iter()
        .collect()
}

/// Engine with three custodians and a live rate table, the baseline for the
/// later scenarios.
fn seeded_engine() -> PortalEngine {
    let mut engine = PortalEngine::new(EngineConfig::default());
    engine.begin_block(1);

    engine
        .register_custodian(
            "alice".to_string(),
            2_000_000,
            remote_addresses("btc-alice", "bnb-alice"),
        )
        .unwrap();
    engine
        .register_custodian(
            "bob".to_string(),
            5_000_000,
            remote_addresses("btc-bob", "bnb-bob"),
        )
        .unwrap();
    engine
        .register_custodian(
            "carol".to_string(),
            10_000_000,
            remote_addresses("btc-carol", "bnb-carol"),
        )
        .unwrap();

    // 1 BTC = 20 PRV, 1 BNB = 4 PRV
    engine
        .update_exchange_rates([(PRV, 1), (BTC, 20), (BNB, 4)].into_iter().collect())
        .unwrap();

    engine
}

fn scenario_1_registration_and_rates() {
    println!("Scenario 1: Custodian Registration and Rates\n");

    let engine = seeded_engine();
    for (address, custodian) in engine.state().custodians.iter() {
        println!(
            "  {}: total {} free {} (btc addr {})",
            address,
            custodian.total_collateral,
            custodian.free_collateral,
            custodian.remote_address(BTC).unwrap()
        );
    }
    println!();
}

fn scenario_2_single_custodian_porting() {
    println!("Scenario 2: Single-Custodian Porting\n");

    let mut engine = seeded_engine();

    // 10_000 BTC-units cost 10_000 * 20 * 150% = 300_000 PRV; alice (2M free)
    // is the tightest single fit
    let outcome = engine
        .request_porting(PortingId("port-1".to_string()), BTC, 10_000)
        .unwrap();
    println!("  Porting port-1: 10_000 BTC-units, min fee {}", outcome.min_fee);
    for matched in &outcome.custodians {
        println!(
            "    {} covers {} (locked {})",
            matched.inc_address, matched.amount, matched.locked_collateral
        );
    }

    engine.complete_mint(PortingId("port-1".to_string())).unwrap();
    let alice = engine.state().custodians.get("alice").unwrap();
    println!(
        "  After mint: alice holds {} BTC-units, locked {} PRV\n",
        alice.holding(BTC),
        alice.locked(BTC)
    );
}

fn scenario_3_multi_custodian_porting() {
    println!("Scenario 3: Multi-Custodian Porting\n");

    let mut engine = seeded_engine();

    // 500_000 BTC-units need 15M PRV locked; no single custodian covers it
    let outcome = engine
        .request_porting(PortingId("port-big".to_string()), BTC, 500_000)
        .unwrap();
    println!("  Porting port-big split across {} custodians:", outcome.custodians.len());
    for matched in &outcome.custodians {
        println!(
            "    {} covers {} (locked {}, remaining free {})",
            matched.inc_address, matched.amount, matched.locked_collateral, matched.remain_collateral
        );
    }
    println!();
}

fn scenario_4_redeem_lifecycle() {
    println!("Scenario 4: Redeem Lifecycle\n");

    let mut engine = seeded_engine();
    engine
        .request_porting(PortingId("port-1".to_string()), BTC, 10_000)
        .unwrap();
    engine.complete_mint(PortingId("port-1".to_string())).unwrap();

    let outcome = engine
        .request_redeem(RedeemId("redeem-1".to_string()), "dave".to_string(), BTC, 4_000)
        .unwrap();
    let custodian = outcome.custodians[0].inc_address.clone();
    println!(
        "  Redeem redeem-1: 4_000 BTC-units matched to {}, min fee {}",
        custodian, outcome.min_fee
    );

    let unlock = engine
        .complete_redeem(RedeemId("redeem-1".to_string()), custodian.clone())
        .unwrap();
    println!(
        "  {} delivered, unlocked {} PRV, request closed: {}",
        custodian, unlock.unlocked, unlock.request_closed
    );

    let state = engine.state().custodians.get(&custodian).unwrap();
    println!(
        "  {} now holds {} BTC-units with {} PRV locked\n",
        custodian,
        state.holding(BTC),
        state.locked(BTC)
    );
}

fn scenario_5_failed_delivery_liquidation() {
    println!("Scenario 5: Failed Delivery Liquidation\n");

    let mut engine = seeded_engine();
    engine
        .request_porting(PortingId("port-1".to_string()), BTC, 10_000)
        .unwrap();
    engine.complete_mint(PortingId("port-1".to_string())).unwrap();
    let outcome = engine
        .request_redeem(RedeemId("redeem-1".to_string()), "dave".to_string(), BTC, 4_000)
        .unwrap();
    let custodian = outcome.custodians[0].inc_address.clone();

    // the custodian never delivers; it pays 105% of the redeem value
    let liquidated = engine
        .liquidate_custodian(RedeemId("redeem-1".to_string()), custodian.clone())
        .unwrap();
    println!(
        "  {} liquidated: {} PRV to the redeemer, {} PRV returned",
        custodian, liquidated.compensation, liquidated.returned
    );

    let state = engine.state().custodians.get(&custodian).unwrap();
    println!(
        "  {} total collateral is now {} PRV\n",
        custodian, state.total_collateral
    );
}

fn scenario_6_rate_crash_detection() {
    println!("Scenario 6: Rate Crash and Liquidation Pool\n");

    let mut engine = seeded_engine();
    engine
        .request_porting(PortingId("port-1".to_string()), BTC, 50_000)
        .unwrap();
    engine.complete_mint(PortingId("port-1".to_string())).unwrap();

    // BTC doubles against PRV: locked at 150% of 20 is now 75% of 40
    engine
        .update_exchange_rates([(PRV, 1), (BTC, 40), (BNB, 4)].into_iter().collect())
        .unwrap();

    let records = engine.detect_liquidations().unwrap();
    for record in &records {
        println!(
            "  {} breached at tp {} ({:?}): seized {} PRV, {} BTC-units",
            record.custodian,
            record.tp_value,
            record.tier,
            record.seized_collateral,
            record.seized_pub_token
        );
    }

    if let Some(record) = records.first() {
        if record.seized_pub_token > 0 {
            let claim = record.seized_pub_token / 2;
            let paid = engine
                .redeem_from_liquidation_pool("dave".to_string(), record.asset, claim)
                .unwrap();
            println!(
                "  dave burns {} BTC-units against the pool for {} PRV",
                claim, paid.paid_collateral
            );
        }
    }
    println!();
}

fn scenario_7_porting_expiry() {
    println!("Scenario 7: Porting Expiry\n");

    let mut engine = seeded_engine();
    engine
        .request_porting(PortingId("port-stale".to_string()), BTC, 10_000)
        .unwrap();
    let locked_before: u64 = engine
        .state()
        .custodians
        .iter()
        .map(|(_, c)| c.total_locked())
        .sum();
    println!("  Locked while waiting: {} PRV", locked_before);

    // the user never ships the deposit; the window lapses
    engine.begin_block(1 + engine.params().porting_expiry_window);
    let expired = engine.expire_portings().unwrap();
    let locked_after: u64 = engine
        .state()
        .custodians
        .iter()
        .map(|(_, c)| c.total_locked())
        .sum();
    println!(
        "  Expired {:?}, locked after release: {} PRV\n",
        expired, locked_after
    );
}

fn scenario_8_block_processing() {
    println!("Scenario 8: Raw Block Processing\n");

    let mut engine = seeded_engine();
    let raws = vec![
        Instruction::PortingRequest {
            porting_id: PortingId("port-1".to_string()),
            asset: BTC,
            amount: 10_000,
        }
        .to_raw(1),
        Instruction::CompleteMint {
            porting_id: PortingId("port-1".to_string()),
        }
        .to_raw(1),
        // over-asks the whole pool: skipped, not rejected
        Instruction::PortingRequest {
            porting_id: PortingId("port-2".to_string()),
            asset: BTC,
            amount: 100_000_000,
        }
        .to_raw(1),
        // unknown type tag: rejected at parse
        RawInstruction {
            type_tag: 99,
            shard_id: 1,
            payload: Vec::new(),
        },
    ];

    let summary = engine.process_block(2, &raws);
    println!(
        "  Block {}: {} applied, {} skipped, {} rejected",
        summary.height, summary.applied, summary.skipped, summary.rejected
    );

    for event in engine.recent_events(3) {
        println!("  [Event {}] h{} {:?}", event.id.0, event.height, event.payload);
    }

    let mut store = MemoryStore::new();
    engine.commit(&mut store).unwrap();
    let reloaded = PortalEngine::load(EngineConfig::default(), &store, 2).unwrap();
    println!(
        "  Snapshot persisted and reloaded, states match: {}",
        reloaded.state() == engine.state()
    );
}
