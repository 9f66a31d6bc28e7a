//! Cross-book line comparison.
//!
//! Groups player prop lines by (player, stat) across books and flags
//! props where a target book's point line sits away from a reference
//! book's line.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use crate::types::{Odds, PricingError};

pub const DEFAULT_MIN_DIFF: f64 = 0.5;
pub const DEFAULT_REFERENCE_BOOK: &str = "Pinnacle";
pub const DEFAULT_TARGET_BOOK: &str = "PrizePicks";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One book's point line for a player prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropLine {
    pub book: String,
    pub player_name: String,
    /// e.g. "points", "rebounds", "pts+reb+ast".
    pub stat_type: String,
    pub points: f64,
    #[serde(default)]
    pub price: Option<Odds>,
    /// "Away @ Home".
    #[serde(default)]
    pub matchup: Option<String>,
}

impl PropLine {
    /// Grouping key: player and stat, trimmed and lowercased. `None` for
    /// lines that can't be grouped.
    fn key(&self) -> Option<(String, String)> {
        let player = self.player_name.trim().to_lowercase();
        let stat = self.stat_type.trim().to_lowercase();
        if player.is_empty() || stat.is_empty() || !self.points.is_finite() {
            None
        } else {
            Some((player, stat))
        }
    }

    fn is_from(&self, book: &str) -> bool {
        self.book.trim().eq_ignore_ascii_case(book.trim())
    }
}

/// Optional narrowing applied before comparing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineFilter {
    /// Exact stat type, case-insensitive.
    #[serde(default)]
    pub stat_type: Option<String>,
    /// Substring of the player name, case-insensitive.
    #[serde(default)]
    pub player: Option<String>,
    /// Substring of either team in the matchup, case-insensitive.
    #[serde(default)]
    pub team: Option<String>,
}

impl LineFilter {
    pub fn matches(&self, line: &PropLine) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.trim().to_lowercase())
        };

        if let Some(stat) = &self.stat_type {
            if !line.stat_type.trim().eq_ignore_ascii_case(stat.trim()) {
                return false;
            }
        }
        if let Some(player) = &self.player {
            if !contains(&line.player_name, player) {
                return false;
            }
        }
        if let Some(team) = &self.team {
            match &line.matchup {
                Some(matchup) if contains(matchup, team) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Which two books to compare and how far apart they must be.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscrepancyQuery {
    pub reference_book: String,
    pub target_book: String,
    /// Minimum absolute point difference, inclusive.
    pub min_diff: f64,
    pub filter: LineFilter,
}

impl Default for DiscrepancyQuery {
    fn default() -> Self {
        Self {
            reference_book: DEFAULT_REFERENCE_BOOK.to_string(),
            target_book: DEFAULT_TARGET_BOOK.to_string(),
            min_diff: DEFAULT_MIN_DIFF,
            filter: LineFilter::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A prop where the target book's line differs from the reference book's.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
    pub player_name: String,
    pub stat_type: String,
    pub reference_book: String,
    pub reference_line: f64,
    pub target_book: String,
    pub target_line: f64,
    /// Absolute point difference.
    pub difference: f64,
    /// Difference relative to the reference line, in percent.
    pub percent_diff: f64,
    pub higher_book: String,
    pub matchup: Option<String>,
    pub reference_price: Option<Odds>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookLine {
    pub book: String,
    pub points: f64,
    pub price: Option<Odds>,
}

/// Every book's line for one (player, stat), side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineComparison {
    pub player_name: String,
    pub stat_type: String,
    pub matchup: Option<String>,
    pub lines: Vec<BookLine>,
    pub low: f64,
    pub high: f64,
    /// `high - low`; zero when the books agree or only one quotes it.
    pub spread: f64,
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Props where the target book's line is at least `min_diff` points away
/// from the reference book's, largest difference first.
///
/// The first reference line seen for a (player, stat) is the one compared.
pub fn find_discrepancies(
    lines: &[PropLine],
    query: &DiscrepancyQuery,
) -> Result<Vec<Discrepancy>, PricingError> {
    if !query.min_diff.is_finite() || query.min_diff < 0.0 {
        return Err(PricingError::InvalidRequest(format!(
            "min_diff must be a non-negative number, got {}",
            query.min_diff
        )));
    }

    let mut reference: HashMap<(String, String), &PropLine> = HashMap::new();
    for line in lines
        .iter()
        .filter(|l| l.is_from(&query.reference_book) && query.filter.matches(l))
    {
        if let Some(key) = line.key() {
            reference.entry(key).or_insert(line);
        }
    }

    let mut found: Vec<Discrepancy> = lines
        .iter()
        .filter(|l| l.is_from(&query.target_book) && query.filter.matches(l))
        .filter_map(|target| {
            let base = reference.get(&target.key()?)?;
            let difference = (base.points - target.points).abs();
            if difference < query.min_diff {
                return None;
            }

            let denominator = if base.points != 0.0 { base.points } else { 1.0 };
            let higher_book = if target.points > base.points {
                &target.book
            } else {
                &base.book
            };

            Some(Discrepancy {
                player_name: target.player_name.clone(),
                stat_type: target.stat_type.clone(),
                reference_book: base.book.clone(),
                reference_line: base.points,
                target_book: target.book.clone(),
                target_line: target.points,
                difference,
                percent_diff: difference / denominator * 100.0,
                higher_book: higher_book.clone(),
                matchup: base.matchup.clone().or_else(|| target.matchup.clone()),
                reference_price: base.price,
            })
        })
        .collect();

    found.sort_by(|a, b| {
        b.difference
            .partial_cmp(&a.difference)
            .unwrap_or(Ordering::Equal)
    });

    debug!(
        reference = %query.reference_book,
        target = %query.target_book,
        min_diff = query.min_diff,
        count = found.len(),
        "Line discrepancies found"
    );

    Ok(found)
}

/// Group lines by (player, stat) with every book side by side, in order of
/// first appearance. An empty `books` list keeps every book; otherwise
/// names match case-insensitively. A book's first line for a prop wins.
pub fn compare_lines(
    lines: &[PropLine],
    books: &[String],
    filter: &LineFilter,
) -> Vec<LineComparison> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut groups: Vec<LineComparison> = Vec::new();

    for line in lines.iter().filter(|l| filter.matches(l)) {
        if !books.is_empty() && !books.iter().any(|b| line.is_from(b)) {
            continue;
        }
        let Some(key) = line.key() else {
            debug!(book = %line.book, player = %line.player_name, "Skipping ungroupable line");
            continue;
        };

        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(LineComparison {
                player_name: line.player_name.clone(),
                stat_type: line.stat_type.clone(),
                matchup: line.matchup.clone(),
                lines: Vec::new(),
                low: line.points,
                high: line.points,
                spread: 0.0,
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        if group.lines.iter().any(|existing| line.is_from(&existing.book)) {
            continue;
        }
        group.lines.push(BookLine {
            book: line.book.clone(),
            points: line.points,
            price: line.price,
        });
        group.low = group.low.min(line.points);
        group.high = group.high.max(line.points);
        group.spread = group.high - group.low;
        if group.matchup.is_none() {
            group.matchup = line.matchup.clone();
        }
    }

    groups
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn line(book: &str, player: &str, stat: &str, points: f64) -> PropLine {
        PropLine {
            book: book.to_string(),
            player_name: player.to_string(),
            stat_type: stat.to_string(),
            points,
            price: None,
            matchup: Some("Knicks @ Celtics".to_string()),
        }
    }

    fn slate() -> Vec<PropLine> {
        vec![
            line("Pinnacle", "Jalen Brunson", "Points", 27.5),
            line("PrizePicks", "jalen brunson ", "points", 26.0),
            line("Pinnacle", "Jayson Tatum", "Rebounds", 8.5),
            line("PrizePicks", "Jayson Tatum", "Rebounds", 9.0),
            line("Pinnacle", "Josh Hart", "Rebounds", 10.5),
            line("PrizePicks", "Josh Hart", "Rebounds", 10.5),
            line("PrizePicks", "Derrick White", "Points", 15.5),
        ]
    }

    #[test]
    fn test_discrepancies_sorted_and_thresholded() {
        let found = find_discrepancies(&slate(), &DiscrepancyQuery::default()).unwrap();
        let players: Vec<&str> = found.iter().map(|d| d.player_name.as_str()).collect();
        // Hart agrees, White has no reference line; 0.5 is inclusive.
        assert_eq!(players, ["jalen brunson ", "Jayson Tatum"]);

        let brunson = &found[0];
        assert_eq!(brunson.reference_line, 27.5);
        assert_eq!(brunson.target_line, 26.0);
        assert_eq!(brunson.difference, 1.5);
        assert!((brunson.percent_diff - 5.4545).abs() < 1e-3);
        assert_eq!(brunson.higher_book, "Pinnacle");
        assert_eq!(found[1].higher_book, "PrizePicks");
    }

    #[test]
    fn test_min_diff_raises_threshold() {
        let query = DiscrepancyQuery {
            min_diff: 1.0,
            ..DiscrepancyQuery::default()
        };
        let found = find_discrepancies(&slate(), &query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].player_name, "jalen brunson ");
    }

    #[test]
    fn test_invalid_min_diff_rejected() {
        for min_diff in [-0.5, f64::NAN] {
            let query = DiscrepancyQuery {
                min_diff,
                ..DiscrepancyQuery::default()
            };
            assert!(matches!(
                find_discrepancies(&slate(), &query),
                Err(PricingError::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn test_zero_reference_line_uses_unit_base() {
        let lines = vec![
            line("Pinnacle", "Role Player", "Blocks", 0.0),
            line("PrizePicks", "Role Player", "Blocks", 0.5),
        ];
        let found = find_discrepancies(&lines, &DiscrepancyQuery::default()).unwrap();
        assert_eq!(found[0].percent_diff, 50.0);
    }

    #[test]
    fn test_custom_books_and_filters() {
        let mut lines = slate();
        lines.push(line("Underdog", "Jayson Tatum", "Rebounds", 7.5));

        let query = DiscrepancyQuery {
            target_book: "underdog".to_string(),
            filter: LineFilter {
                stat_type: Some("rebounds".to_string()),
                player: Some("tatum".to_string()),
                team: Some("celtics".to_string()),
            },
            ..DiscrepancyQuery::default()
        };
        let found = find_discrepancies(&lines, &query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target_book, "Underdog");
        assert_eq!(found[0].difference, 1.0);

        let other_team = DiscrepancyQuery {
            filter: LineFilter {
                team: Some("lakers".to_string()),
                ..LineFilter::default()
            },
            ..DiscrepancyQuery::default()
        };
        assert!(find_discrepancies(&lines, &other_team).unwrap().is_empty());
    }

    #[test]
    fn test_compare_groups_books_side_by_side() {
        let mut lines = slate();
        lines.push(line("Underdog", "Jayson Tatum", "rebounds", 7.5));
        // Second Pinnacle line for the same prop is ignored.
        lines.push(line("Pinnacle", "Jayson Tatum", "Rebounds", 12.5));

        let groups = compare_lines(&lines, &[], &LineFilter::default());
        assert_eq!(groups.len(), 4);

        let tatum = &groups[1];
        let books: Vec<&str> = tatum.lines.iter().map(|l| l.book.as_str()).collect();
        assert_eq!(books, ["Pinnacle", "PrizePicks", "Underdog"]);
        assert_eq!(tatum.low, 7.5);
        assert_eq!(tatum.high, 9.0);
        assert_eq!(tatum.spread, 1.5);

        assert_eq!(groups[2].spread, 0.0);
        assert_eq!(groups[3].lines.len(), 1);
    }

    #[test]
    fn test_compare_book_filter() {
        let books = vec!["PINNACLE".to_string()];
        let groups = compare_lines(&slate(), &books, &LineFilter::default());
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.lines.len() == 1 && g.spread == 0.0));
    }

    #[test]
    fn test_ungroupable_lines_skipped() {
        let lines = vec![
            line("Pinnacle", "  ", "Points", 20.5),
            line("Pinnacle", "Someone", "Points", f64::NAN),
        ];
        assert!(compare_lines(&lines, &[], &LineFilter::default()).is_empty());
        assert!(find_discrepancies(&lines, &DiscrepancyQuery::default())
            .unwrap()
            .is_empty());
    }
}
