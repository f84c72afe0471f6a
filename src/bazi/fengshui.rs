//! Feng-shui advice derived from the missing elements.

use serde::Deserialize;
use serde::Serialize;

use super::ElementAnalysis;
use super::FiveElement;

/// Accumulated advice lists. Entries are appended per missing element and
/// deliberately not deduplicated: if two missing elements share a suggestion
/// it appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FengShuiAdvice {
    pub colors: Vec<String>,
    pub directions: Vec<String>,
    pub lifestyle: Vec<String>,
    pub cautions: Vec<String>,
}

/// Fixed advice bundle per element: 2 colors, 1 direction, 2 lifestyle tips.
fn element_bundle(element: FiveElement) -> ([&'static str; 2], &'static str, [&'static str; 2]) {
    match element {
        FiveElement::Wood => (["绿色", "青色"], "东方", ["多接触自然", "可养植绿植"]),
        FiveElement::Fire => (["红色", "紫色"], "南方", ["多晒太阳", "可佩带红色饰品"]),
        FiveElement::Earth => (["黄色", "棕色"], "中宫", ["多接触土地", "可佩带黄水晶"]),
        FiveElement::Metal => (["白色", "金色"], "西方", ["多佩带金属饰品", "可放置金属用品"]),
        FiveElement::Water => (["黑色", "蓝色"], "北方", ["多喝水", "可放置水景装饰"]),
    }
}

/// Build advice for every missing element.
pub fn advise(analysis: &ElementAnalysis) -> FengShuiAdvice {
    let mut advice = FengShuiAdvice::default();

    for &element in &analysis.missing {
        let (colors, direction, lifestyle) = element_bundle(element);
        advice.colors.extend(colors.iter().map(ToString::to_string));
        advice.directions.push(direction.to_string());
        advice
            .lifestyle
            .extend(lifestyle.iter().map(ToString::to_string));
    }

    advice
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bazi::elements::analyze;
    use crate::bazi::BirthChart;
    use crate::bazi::EarthlyBranch;
    use crate::bazi::HeavenlyStem;
    use crate::bazi::Pillar;

    fn chart_of(stems: [u8; 4]) -> BirthChart {
        let pillar = |stem: u8| Pillar {
            stem: HeavenlyStem(stem),
            branch: EarthlyBranch(0),
            element: HeavenlyStem(stem).element(),
            zodiac: None,
        };
        BirthChart {
            year: pillar(stems[0]),
            month: pillar(stems[1]),
            day: pillar(stems[2]),
            hour: pillar(stems[3]),
        }
    }

    #[test]
    fn test_advice_lengths_match_missing_count() {
        // all-fire chart: four elements missing
        let analysis = analyze(&chart_of([2, 2, 3, 3]));
        let advice = advise(&analysis);
        let missing = analysis.missing.len();
        assert_eq!(missing, 4);
        assert_eq!(advice.colors.len(), 2 * missing);
        assert_eq!(advice.directions.len(), missing);
        assert_eq!(advice.lifestyle.len(), 2 * missing);
        assert!(advice.cautions.is_empty());
    }

    #[test]
    fn test_no_missing_elements_empty_advice() {
        // 甲丙戊庚 covers four elements, water missing only
        let analysis = analyze(&chart_of([0, 2, 4, 6]));
        let advice = advise(&analysis);
        assert_eq!(advice.colors, vec!["黑色", "蓝色"]);
        assert_eq!(advice.directions, vec!["北方"]);
    }
}
