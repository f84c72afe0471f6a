//! Fortune scoring from the day master and the element balance.

use serde::Deserialize;
use serde::Serialize;

use super::ElementAnalysis;
use super::FiveElement;

/// The four scored life domains, in the fixed iteration order used when
/// picking the weakest one (ties keep the earlier domain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FortuneDomain {
    Career,
    Wealth,
    Health,
    Relationship,
}

impl FortuneDomain {
    pub const ALL: [FortuneDomain; 4] = [
        FortuneDomain::Career,
        FortuneDomain::Wealth,
        FortuneDomain::Health,
        FortuneDomain::Relationship,
    ];

    pub fn chinese(self) -> &'static str {
        match self {
            FortuneDomain::Career => "事业运",
            FortuneDomain::Wealth => "财运",
            FortuneDomain::Health => "健康运",
            FortuneDomain::Relationship => "感情运",
        }
    }
}

/// Per-domain fortune scores, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FortuneScore {
    pub career: u32,
    pub wealth: u32,
    pub health: u32,
    pub relationship: u32,
    pub overall: u32,
}

impl FortuneScore {
    pub fn domain(&self, domain: FortuneDomain) -> u32 {
        match domain {
            FortuneDomain::Career => self.career,
            FortuneDomain::Wealth => self.wealth,
            FortuneDomain::Health => self.health,
            FortuneDomain::Relationship => self.relationship,
        }
    }

    /// The domain with the lowest score; ties resolve to the earlier domain
    /// in [`FortuneDomain::ALL`] order.
    pub fn weakest_domain(&self) -> FortuneDomain {
        let mut weakest = FortuneDomain::ALL[0];
        for &domain in &FortuneDomain::ALL[1..] {
            if self.domain(domain) < self.domain(weakest) {
                weakest = domain;
            }
        }
        weakest
    }
}

fn clamp(score: i64) -> u32 {
    score.clamp(0, 100) as u32
}

/// Score the four domains. Each starts from the balance score and gains a
/// fixed bonus when the day master is generated by (or generates) a present
/// element, per the classical generative cycle.
pub fn score(day_master: FiveElement, analysis: &ElementAnalysis) -> FortuneScore {
    let base = i64::from(analysis.balance);

    let mut career = base;
    if day_master == FiveElement::Fire && analysis.has(FiveElement::Wood) {
        career += 10; // 火得木生
    }
    if day_master == FiveElement::Earth && analysis.has(FiveElement::Fire) {
        career += 10; // 土得火生
    }

    let mut wealth = base;
    if day_master == FiveElement::Earth && analysis.has(FiveElement::Metal) {
        wealth += 15; // 土生金
    }
    if day_master == FiveElement::Metal && analysis.has(FiveElement::Water) {
        wealth += 15; // 金生水
    }

    let mut health = base;
    if analysis.balance > 80 {
        health += 20;
    } else if analysis.balance < 30 {
        health -= 20;
    }

    let mut relationship = base;
    if day_master == FiveElement::Water && analysis.has(FiveElement::Wood) {
        relationship += 10; // 水生木
    }
    if day_master == FiveElement::Wood && analysis.has(FiveElement::Fire) {
        relationship += 10; // 木生火
    }

    let career = clamp(career);
    let wealth = clamp(wealth);
    let health = clamp(health);
    let relationship = clamp(relationship);

    // Mean of the clamped domain scores; bounded by construction.
    let overall =
        (f64::from(career + wealth + health + relationship) / 4.0).round() as u32;

    FortuneScore {
        career,
        wealth,
        health,
        relationship,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bazi::elements::analyze;
    use crate::bazi::BirthChart;
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
    fn test_earth_day_master_with_metal_wealth_bonus() {
        // 甲丙戊庚: day master 戊 (earth), metal present
        let chart = chart_of([0, 2, 4, 6]);
        let analysis = analyze(&chart);
        let fortune = score(chart.day_master(), &analysis);

        // balance 90 -> wealth 90+15 clamped to 100
        assert_eq!(analysis.balance, 90);
        assert_eq!(
            fortune.wealth,
            (analysis.balance as i64 + 15).clamp(0, 100) as u32
        );
        // earth day master with fire present also gains the career bonus
        assert_eq!(fortune.career, 100);
    }

    #[test]
    fn test_health_shift_thresholds() {
        // balanced chart (balance 90 > 80): health gains 20, clamped at 100
        let chart = chart_of([0, 2, 4, 6]);
        let analysis = analyze(&chart);
        let fortune = score(chart.day_master(), &analysis);
        assert_eq!(fortune.health, 100);

        // single-element chart (balance 0 < 30): health loses 20, clamps at 0
        let chart = chart_of([2, 2, 3, 3]);
        let analysis = analyze(&chart);
        let fortune = score(chart.day_master(), &analysis);
        assert_eq!(fortune.health, 0);
    }

    #[test]
    fn test_scores_bounded_at_extremes() {
        for stems in [[0u8, 0, 0, 0], [2, 2, 2, 2], [4, 4, 4, 4], [8, 9, 8, 9]] {
            let chart = chart_of(stems);
            let analysis = analyze(&chart);
            let fortune = score(chart.day_master(), &analysis);
            for domain in FortuneDomain::ALL {
                assert!(fortune.domain(domain) <= 100);
            }
            assert!(fortune.overall <= 100);
        }
    }

    #[test]
    fn test_overall_is_rounded_mean() {
        let chart = chart_of([0, 2, 4, 6]);
        let analysis = analyze(&chart);
        let fortune = score(chart.day_master(), &analysis);
        let mean = f64::from(
            fortune.career + fortune.wealth + fortune.health + fortune.relationship,
        ) / 4.0;
        assert_eq!(fortune.overall, mean.round() as u32);
    }

    #[test]
    fn test_weakest_domain_tie_order() {
        let fortune = FortuneScore {
            career: 50,
            wealth: 50,
            health: 80,
            relationship: 50,
            overall: 58,
        };
        assert_eq!(fortune.weakest_domain(), FortuneDomain::Career);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let chart = chart_of([0, 2, 4, 6]);
        let analysis = analyze(&chart);
        assert_eq!(
            score(chart.day_master(), &analysis),
            score(chart.day_master(), &analysis)
        );
    }
}
