//! Properties that must hold across whole ranges of inputs.

use sharpline::parlay::{expected_payout, solve_table, PayoutTable};
use sharpline::pricing::{devig, odds_to_probability, probability_to_odds};
use sharpline::types::{DevigMethod, Market};

#[test]
fn test_every_method_sums_to_one_across_markets() {
    let prices = [-400, -250, -180, -135, -115, -105, 100, 110, 125, 150, 200, 350];
    for &a in &prices {
        for &b in &prices {
            let market = Market::new(a, b);
            let (pa, pb) = (odds_to_probability(a).unwrap(), odds_to_probability(b).unwrap());
            for &method in DevigMethod::ALL {
                match devig(&market, method) {
                    Ok(r) => {
                        let sum: f64 = r.true_probabilities.iter().sum();
                        assert!((sum - 1.0).abs() < 1e-6, "{market} {method}: sum {sum}");
                    }
                    // Power needs a positive overround to bracket an exponent.
                    Err(_) => assert!(method == DevigMethod::Power && pa + pb <= 1.0),
                }
            }
        }
    }
}

#[test]
fn test_fair_odds_round_trip() {
    for odds in (-1000..=-100).chain(101..=1000) {
        let back = probability_to_odds(odds_to_probability(odds).unwrap()).unwrap();
        assert!((back - odds).abs() <= 1, "{odds} came back as {back}");
    }
}

#[test]
fn test_breakeven_zeroes_expected_profit() {
    for legs in 2..=8u32 {
        let sweep = f64::from(legs) * 2.5;
        let table = PayoutTable::new(legs, [(legs, sweep), (legs - 1, 1.0)]).unwrap();
        let r = solve_table("generated", &table).unwrap();
        let e = expected_payout(&table, r.probability);
        assert!((e - 1.0).abs() < 1e-9, "{legs} legs: E(p*) = {e}");
        assert!(r.probability > 0.0 && r.probability < 1.0);
    }
}
