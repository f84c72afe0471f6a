//! Five-element balance analysis over the four pillars.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use super::BirthChart;
use super::FiveElement;

/// Element distribution of a chart.
///
/// All five keys are always present and the counts sum to 4: with four
/// pillars spread over five buckets at least one bucket is always zero, so
/// the balance score can never reach its count-based theoretical maximum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementAnalysis {
    pub counts: BTreeMap<FiveElement, u32>,
    pub strongest: FiveElement,
    pub weakest: FiveElement,
    pub missing: Vec<FiveElement>,
    pub balance: u32,
}

impl ElementAnalysis {
    pub fn count(&self, element: FiveElement) -> u32 {
        self.counts.get(&element).copied().unwrap_or(0)
    }

    pub fn has(&self, element: FiveElement) -> bool {
        self.count(element) > 0
    }
}

/// Analyze the element distribution of a chart. Pure function of its input;
/// no error conditions.
pub fn analyze(chart: &BirthChart) -> ElementAnalysis {
    let mut counts: BTreeMap<FiveElement, u32> =
        FiveElement::ALL.iter().map(|&e| (e, 0)).collect();

    for pillar in chart.pillars() {
        *counts.entry(pillar.element).or_insert(0) += 1;
    }

    // Linear scan in the fixed element order; ties keep the earlier element.
    let mut strongest = FiveElement::ALL[0];
    let mut weakest = FiveElement::ALL[0];
    for &element in &FiveElement::ALL[1..] {
        if counts[&element] > counts[&strongest] {
            strongest = element;
        }
        if counts[&element] < counts[&weakest] {
            weakest = element;
        }
    }

    let missing: Vec<FiveElement> = FiveElement::ALL
        .iter()
        .copied()
        .filter(|e| counts[e] == 0)
        .collect();

    let balance = balance_score(&counts);

    ElementAnalysis {
        counts,
        strongest,
        weakest,
        missing,
        balance,
    }
}

/// Balance score in [0, 100], a monotonically decreasing function of the
/// count variance around the ideal 0.8 per element.
fn balance_score(counts: &BTreeMap<FiveElement, u32>) -> u32 {
    let total: u32 = counts.values().sum();
    let ideal = f64::from(total) / 5.0;

    let variance: f64 = counts
        .values()
        .map(|&c| (f64::from(c) - ideal).powi(2))
        .sum();

    let balance = (100.0 - variance / ideal * 10.0).max(0.0);
    balance.round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bazi::chart::derive_chart;
    use crate::bazi::EarthlyBranch;
    use crate::bazi::HeavenlyStem;
    use crate::bazi::Pillar;

    fn pillar(stem: u8) -> Pillar {
        Pillar {
            stem: HeavenlyStem(stem),
            branch: EarthlyBranch(0),
            element: HeavenlyStem(stem).element(),
            zodiac: None,
        }
    }

    fn chart_of(stems: [u8; 4]) -> BirthChart {
        BirthChart {
            year: pillar(stems[0]),
            month: pillar(stems[1]),
            day: pillar(stems[2]),
            hour: pillar(stems[3]),
        }
    }

    #[test]
    fn test_counts_sum_to_four() {
        let analysis = analyze(&chart_of([0, 2, 4, 6]));
        assert_eq!(analysis.counts.values().sum::<u32>(), 4);
        assert_eq!(analysis.counts.len(), 5);
    }

    #[test]
    fn test_all_fire_chart() {
        // 丙丙丁丁: every pillar is fire
        let analysis = analyze(&chart_of([2, 2, 3, 3]));
        assert_eq!(analysis.count(FiveElement::Fire), 4);
        assert_eq!(analysis.strongest, FiveElement::Fire);
        assert_eq!(
            analysis.missing,
            vec![
                FiveElement::Wood,
                FiveElement::Earth,
                FiveElement::Metal,
                FiveElement::Water
            ]
        );
        // variance = (4-0.8)^2 + 4*(0.8)^2 = 12.8 -> 100 - 160 clamps to 0
        assert_eq!(analysis.balance, 0);
    }

    #[test]
    fn test_balanced_chart_score() {
        // 甲丙戊庚: one each of wood/fire/earth/metal, water missing
        let analysis = analyze(&chart_of([0, 2, 4, 6]));
        // variance = 4*(0.2)^2 + (0.8)^2 = 0.8 -> 100 - 10 = 90
        assert_eq!(analysis.balance, 90);
        assert_eq!(analysis.missing, vec![FiveElement::Water]);
    }

    #[test]
    fn test_tie_resolution_order() {
        // two wood, two fire: strongest tie resolves to wood (earlier in order)
        let analysis = analyze(&chart_of([0, 1, 2, 3]));
        assert_eq!(analysis.strongest, FiveElement::Wood);
        // earth/metal/water all zero: weakest is earth (earliest zero)
        assert_eq!(analysis.weakest, FiveElement::Earth);
    }

    #[test]
    fn test_balance_in_range_for_derived_charts() {
        for (date, time) in [
            ("1955-03-20", "06:15"),
            ("1988-08-08", "08:08"),
            ("2001-12-31", "23:59"),
            ("2024-02-04", "00:00"),
        ] {
            let chart = derive_chart(date, time).unwrap();
            let analysis = analyze(&chart);
            assert!(analysis.balance <= 100);
            assert_eq!(analysis.counts.values().sum::<u32>(), 4);
            for e in FiveElement::ALL {
                assert_eq!(analysis.has(e), analysis.count(e) > 0);
                assert_eq!(analysis.missing.contains(&e), analysis.count(e) == 0);
            }
        }
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let chart = derive_chart("1990-06-15", "14:30").unwrap();
        assert_eq!(analyze(&chart), analyze(&chart));
    }
}
