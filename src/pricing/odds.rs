//! American odds ↔ implied probability conversion.

use crate::types::{Market, Odds, PricingError};

/// Whether `odds` is a price that can exist in American notation.
pub fn is_valid_odds(odds: Odds) -> bool {
    odds.unsigned_abs() >= 100
}

/// Convert American odds to implied probability.
///
/// `+150` → 0.4, `-150` → 0.6. Prices strictly between -100 and +100 do
/// not exist and are rejected.
pub fn odds_to_probability(odds: Odds) -> Result<f64, PricingError> {
    if !is_valid_odds(odds) {
        return Err(PricingError::InvalidOdds(odds));
    }

    let o = f64::from(odds);
    if odds > 0 {
        Ok(100.0 / (o + 100.0))
    } else {
        Ok(-o / (-o + 100.0))
    }
}

/// Convert a probability to American odds, rounded to the nearest integer.
///
/// Probabilities of one half or more are quoted as favourites, so exactly
/// 0.5 maps to `-100` rather than `+100`.
pub fn probability_to_odds(p: f64) -> Result<Odds, PricingError> {
    if !p.is_finite() || p <= 0.0 || p >= 1.0 {
        return Err(PricingError::InvalidProbability(p));
    }

    let odds = if p >= 0.5 {
        (-p / (1.0 - p) * 100.0).round()
    } else {
        ((1.0 - p) / p * 100.0).round()
    };

    // `as` saturates for probabilities pressed against 0 or 1.
    Ok(odds as Odds)
}

/// Raw implied probabilities of both sides of a market.
pub fn implied_probabilities(market: &Market) -> Result<(f64, f64), PricingError> {
    Ok((
        odds_to_probability(market.side_a)?,
        odds_to_probability(market.side_b)?,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underdog_odds() {
        let p = odds_to_probability(150).unwrap();
        assert!((p - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_favorite_odds() {
        let p = odds_to_probability(-150).unwrap();
        assert!((p - 0.6).abs() < 1e-12);
        let p = odds_to_probability(-110).unwrap();
        assert!((p - 110.0 / 210.0).abs() < 1e-12);
    }

    #[test]
    fn test_even_money_both_signs() {
        assert_eq!(odds_to_probability(100).unwrap(), 0.5);
        assert_eq!(odds_to_probability(-100).unwrap(), 0.5);
    }

    #[test]
    fn test_invalid_odds_rejected() {
        for odds in [0, 1, -1, 50, -50, 99, -99] {
            assert_eq!(odds_to_probability(odds), Err(PricingError::InvalidOdds(odds)));
        }
        assert!(odds_to_probability(i32::MIN).is_ok());
    }

    #[test]
    fn test_probability_to_odds() {
        assert_eq!(probability_to_odds(0.4).unwrap(), 150);
        assert_eq!(probability_to_odds(0.6).unwrap(), -150);
        assert_eq!(probability_to_odds(0.5238095238).unwrap(), -110);
    }

    #[test]
    fn test_coinflip_is_favorite_convention() {
        assert_eq!(probability_to_odds(0.5).unwrap(), -100);
    }

    #[test]
    fn test_invalid_probability_rejected() {
        for p in [0.0, 1.0, -0.1, 1.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                probability_to_odds(p),
                Err(PricingError::InvalidProbability(_))
            ));
        }
    }

    #[test]
    fn test_round_trip_within_one() {
        let mut checked = 0;
        for odds in (-2000..=-100).chain(100..=2000) {
            let back = probability_to_odds(odds_to_probability(odds).unwrap()).unwrap();
            if odds == 100 {
                // +100 and -100 are the same price; the boundary maps to -100.
                assert_eq!(back, -100);
            } else {
                assert!((back - odds).abs() <= 1, "odds {odds} came back as {back}");
            }
            checked += 1;
        }
        assert_eq!(checked, 3802);
    }

    #[test]
    fn test_implied_probabilities_of_market() {
        let (a, b) = implied_probabilities(&Market::new(-110, -110)).unwrap();
        assert!((a + b - 220.0 / 210.0).abs() < 1e-12);
        assert!(implied_probabilities(&Market::new(-110, 20)).is_err());
    }
}
