//! Config → engine → validation, the way the binary wires it.

use sharpline::config::AppConfig;
use sharpline::engine::PricingEngine;
use sharpline::parlay::{ParlayRegistry, ParlayType, PayoutTable};
use sharpline::strategy::{Leg, ReferenceQuote};
use sharpline::types::{Market, PricingError, Side};

const CONFIG: &str = r#"
[server]
enabled = false

[engine]
devig_method = "multiplicative"
consensus = "weighted"
book_weights = { pinnacle = 3.0 }

[[parlay_types]]
id = "5-pick-flex"
legs = 5
payouts = [
    { hits = 5, multiplier = 10.0 },
    { hits = 4, multiplier = 2.0 },
    { hits = 3, multiplier = 0.4 },
]

[[parlay_types]]
id = "2-pick-power"
legs = 2
payouts = [{ hits = 2, multiplier = 3.0 }]
"#;

fn engine() -> PricingEngine {
    let cfg = AppConfig::parse(CONFIG).unwrap();
    PricingEngine::new(cfg.registry().unwrap(), cfg.engine_settings().unwrap()).unwrap()
}

fn quote(book: &str, a: i32, b: i32) -> ReferenceQuote {
    ReferenceQuote {
        book: book.to_string(),
        market: Market::new(a, b),
    }
}

fn leg(id: &str, side: Side, references: Vec<ReferenceQuote>) -> Leg {
    Leg {
        id: id.to_string(),
        label: None,
        side,
        platform_market: None,
        references,
    }
}

#[test]
fn test_configured_engine_reports_weighted_consensus() {
    let engine = engine();
    assert_eq!(engine.consensus_name(), "weighted");
    assert_eq!(engine.parlay_types().registry().ids(), vec!["5-pick-flex", "2-pick-power"]);
}

#[test]
fn test_weighted_consensus_drives_edge() {
    let engine = engine();
    // Pinnacle (weight 3) at 57.98%, Soft (weight 1) at 50%:
    // (3 * 0.579832 + 0.5) / 4 = 0.559874, above 5-pick-flex's 54.25%.
    let legs = vec![leg(
        "1",
        Side::A,
        vec![quote("Pinnacle", -150, 130), quote("Soft", -110, -110)],
    )];

    let sharp = vec!["Pinnacle".to_string(), "Soft".to_string()];

    let report = engine.validate("5-pick-flex", &legs, &sharp).unwrap();
    let result = &report.legs[0];
    assert!((result.consensus_true_probability.unwrap() - 0.559874).abs() < 1e-5);
    assert!(result.is_ev);

    // Same leg against 2-pick-power (57.74%) is -EV.
    let report = engine.validate("2-pick-power", &legs, &sharp).unwrap();
    assert!(!report.legs[0].is_ev);
    assert!(report.legs[0].edge.unwrap() < 0.0);
}

#[test]
fn test_scan_mixed_slate() {
    let engine = engine();
    let slate = vec![
        leg("no-refs", Side::A, vec![]),
        leg("heavy-fav", Side::A, vec![quote("Pinnacle", -250, 200)]),
        leg("dog", Side::B, vec![quote("Pinnacle", -250, 200)]),
        leg("lean", Side::A, vec![quote("Pinnacle", -135, 115)]),
        leg("bad-quote", Side::A, vec![quote("Pinnacle", 50, -300)]),
    ];
    let sharp = vec!["PINNACLE".to_string()];

    let report = engine.validate("5-pick-flex", &slate, &sharp).unwrap();
    assert_eq!(report.summary.total_legs, 5);
    assert_eq!(report.summary.legs_with_sharp_data, 3);
    assert_eq!(report.summary.ev_legs, 2);

    let ev = engine.find_ev_legs("5-pick-flex", &slate, &sharp).unwrap();
    let ids: Vec<&str> = ev.iter().map(|r| r.leg_id.as_str()).collect();
    assert_eq!(ids, ["heavy-fav", "lean"]);
}

#[test]
fn test_reload_registry_while_shared() {
    let engine = std::sync::Arc::new(engine());
    let before = engine.parlay_types();

    let handle = {
        let engine = std::sync::Arc::clone(&engine);
        std::thread::spawn(move || engine.breakeven("5-pick-flex").map(|r| r.fair_odds))
    };

    engine
        .reload_registry(ParlayRegistry::standard().unwrap())
        .unwrap();

    assert_eq!(handle.join().unwrap(), Ok(-119));
    assert_eq!(before.results().len(), 2);
    assert_eq!(engine.parlay_types().results().len(), 4);
    assert_eq!(engine.breakeven("3-pick-flex").unwrap().fair_odds, -144);
}

#[test]
fn test_bad_table_fails_engine_construction() {
    let registry = ParlayRegistry::new(vec![ParlayType::new(
        "house-always-wins",
        PayoutTable::new(3, [(3, 0.9)]).unwrap(),
    )])
    .unwrap();

    let cfg = AppConfig::parse("").unwrap();
    match PricingEngine::new(registry, cfg.engine_settings().unwrap()) {
        Err(PricingError::BreakevenConvergence { parlay_type, .. }) => {
            assert_eq!(parlay_type, "house-always-wins")
        }
        Err(other) => panic!("unexpected error {other:?}"),
        Ok(_) => panic!("engine built from an unprofitable table"),
    }
}
