//! Crystal recommendation: three candidate lists merged against the catalog.

use serde::Deserialize;
use serde::Serialize;

use crate::bazi::ElementAnalysis;
use crate::bazi::FortuneScore;
use crate::models::CrystalRecord;
use crate::narrative::CrystalMention;
use crate::narrative::NarrativeAnalysis;

pub mod tables;

/// A catalog crystal with the score and reason it was selected for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCrystal {
    #[serde(flatten)]
    pub crystal: CrystalRecord,
    pub score: u32,
    pub reason: String,
}

/// Fixed wearing guidance attached to every recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WearingGuide {
    pub daily_routine: String,
    pub wearing_time: String,
    pub care_instructions: String,
    pub combinations: Vec<String>,
}

/// Final recommendation: up to three primary and three secondary crystals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub primary: Vec<ScoredCrystal>,
    pub secondary: Vec<ScoredCrystal>,
    pub reasoning: String,
    pub wearing_guide: WearingGuide,
}

/// Build the recommendation bundle. Zero catalog matches are valid: empty
/// lists are an acceptable result, not an error.
pub fn recommend(
    analysis: &ElementAnalysis,
    fortune: &FortuneScore,
    catalog: &[CrystalRecord],
    narrative: &NarrativeAnalysis,
) -> RecommendationBundle {
    let mut candidates = Vec::new();

    collect_element_candidates(analysis, catalog, &mut candidates);
    collect_domain_candidates(fortune, catalog, &mut candidates);
    collect_narrative_candidates(&narrative.crystal_recommendations, catalog, &mut candidates);

    let merged = merge_candidates(candidates);

    let primary: Vec<ScoredCrystal> = merged.iter().take(3).cloned().collect();
    let secondary: Vec<ScoredCrystal> = merged.iter().skip(3).take(3).cloned().collect();

    let reasoning = build_reasoning(analysis, fortune, narrative);
    let wearing_guide = build_wearing_guide(&primary);

    RecommendationBundle {
        primary,
        secondary,
        reasoning,
        wearing_guide,
    }
}

/// Element-gap matches: fixed entries per missing element, resolved against
/// the catalog by substring on english or chinese name. Candidate score is
/// the table priority scaled to the common 0-100 scale.
fn collect_element_candidates(
    analysis: &ElementAnalysis,
    catalog: &[CrystalRecord],
    out: &mut Vec<ScoredCrystal>,
) {
    for &element in &analysis.missing {
        for entry in tables::element_crystals(element) {
            if let Some(crystal) = find_by_names(catalog, entry.english_name, entry.chinese_name) {
                out.push(ScoredCrystal {
                    crystal: crystal.clone(),
                    score: entry.priority * 10,
                    reason: entry.reason.to_string(),
                });
            }
        }
    }
}

/// Weakest-domain matches: the lowest of the four domain scores selects a
/// fixed crystal list, matched by name or by the domain tag in
/// `suitable_for`.
fn collect_domain_candidates(
    fortune: &FortuneScore,
    catalog: &[CrystalRecord],
    out: &mut Vec<ScoredCrystal>,
) {
    let weakest = fortune.weakest_domain();

    for name in tables::domain_crystals(weakest) {
        let found = catalog.iter().find(|c| {
            c.english_name.to_lowercase().contains(&name.to_lowercase())
                || c.suitable_for.iter().any(|s| s.contains(weakest.chinese()))
        });
        if let Some(crystal) = found {
            out.push(ScoredCrystal {
                crystal: crystal.clone(),
                score: 70,
                reason: format!("改善{}", weakest.chinese()),
            });
        }
    }
}

/// Narrative-extracted matches resolved the same way.
fn collect_narrative_candidates(
    mentions: &[CrystalMention],
    catalog: &[CrystalRecord],
    out: &mut Vec<ScoredCrystal>,
) {
    for mention in mentions {
        let found = catalog.iter().find(|c| {
            (!mention.chinese_name.is_empty() && c.chinese_name.contains(&mention.chinese_name))
                || (!mention.english_name.is_empty()
                    && c.english_name
                        .to_lowercase()
                        .contains(&mention.english_name.to_lowercase()))
        });
        if let Some(crystal) = found {
            out.push(ScoredCrystal {
                crystal: crystal.clone(),
                score: 85,
                reason: mention.reason.clone(),
            });
        }
    }
}

fn find_by_names<'a>(
    catalog: &'a [CrystalRecord],
    english: &str,
    chinese: &str,
) -> Option<&'a CrystalRecord> {
    let english = english.to_lowercase();
    catalog
        .iter()
        .find(|c| c.english_name.to_lowercase().contains(&english) || c.chinese_name.contains(chinese))
}

/// Deduplicate by catalog id keeping the highest-scoring instance, then sort
/// by score descending (stable: equal scores keep candidate order).
fn merge_candidates(candidates: Vec<ScoredCrystal>) -> Vec<ScoredCrystal> {
    let mut merged: Vec<ScoredCrystal> = Vec::new();

    for candidate in candidates {
        match merged.iter_mut().find(|m| m.crystal.id == candidate.crystal.id) {
            Some(existing) => {
                if candidate.score > existing.score {
                    *existing = candidate;
                }
            }
            None => merged.push(candidate),
        }
    }

    merged.sort_by(|a, b| b.score.cmp(&a.score));
    merged
}

fn build_reasoning(
    analysis: &ElementAnalysis,
    fortune: &FortuneScore,
    narrative: &NarrativeAnalysis,
) -> String {
    let mut reasoning = String::from("根据您的八字分析：\n");

    if !analysis.missing.is_empty() {
        let missing = analysis
            .missing
            .iter()
            .map(|e| e.chinese().to_string())
            .collect::<Vec<_>>()
            .join("、");
        reasoning.push_str(&format!("\n您的五行中缺少{missing}能量，"));
        reasoning.push_str("建议佩带相应的水晶来补强。");
    }

    let weakest = fortune.weakest_domain();
    reasoning.push_str(&format!("\n您的{}相对较弱，", weakest.chinese()));
    reasoning.push_str("可以通过特定水晶来增强这方面的能量。");

    if !narrative.main_issues.is_empty() {
        reasoning.push_str(&format!("\n\n综合分析认为：{}", narrative.main_issues));
    }

    reasoning
}

fn build_wearing_guide(primary: &[ScoredCrystal]) -> WearingGuide {
    let mut combinations = Vec::new();
    if primary.len() >= 2 {
        combinations.push(format!(
            "{}和{}可以同时佩带，增强效果。",
            primary[0].crystal.chinese_name, primary[1].crystal.chinese_name
        ));
    }

    WearingGuide {
        daily_routine: "建议每天佩带水晶，可以选择手链、项链或随身携带。".to_string(),
        wearing_time: "最佳佩带时间为每天6-8小时，避免过度佩带。".to_string(),
        care_instructions: "定期清洗水晶，可用清水冲洗或日光净化。".to_string(),
        combinations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bazi::chart::derive_chart;
    use crate::bazi::elements::analyze;
    use crate::bazi::fortune;
    use crate::bazi::FiveElement;
    use crate::narrative::fallback;

    fn crystal(id: i64, english: &str, chinese: &str, elements: Vec<FiveElement>) -> CrystalRecord {
        CrystalRecord {
            id,
            english_name: english.to_string(),
            chinese_name: chinese.to_string(),
            category: Some("石英类".to_string()),
            color: None,
            elements,
            healing_properties: vec![],
            suitable_for: vec![],
            image_url: None,
            price: Some(88.0),
            description: None,
        }
    }

    fn sample_catalog() -> Vec<CrystalRecord> {
        vec![
            crystal(1, "Amethyst", "紫水晶", vec![FiveElement::Water]),
            crystal(2, "Rose Quartz", "粉水晶", vec![FiveElement::Earth]),
            crystal(3, "Clear Quartz", "白水晶", vec![FiveElement::Metal]),
            crystal(4, "Citrine", "黄水晶", vec![FiveElement::Earth]),
            crystal(5, "Green Aventurine", "绿东陵石", vec![FiveElement::Wood]),
            crystal(6, "Tiger Eye", "虎眼石", vec![FiveElement::Earth]),
            crystal(7, "Moonstone", "月光石", vec![FiveElement::Water]),
        ]
    }

    fn pipeline(date: &str, time: &str) -> RecommendationBundle {
        let chart = derive_chart(date, time).unwrap();
        let analysis = analyze(&chart);
        let score = fortune::score(chart.day_master(), &analysis);
        let narrative = fallback::generate_for_month(&chart, &analysis, &score, 6);
        recommend(&analysis, &score, &sample_catalog(), &narrative)
    }

    #[test]
    fn test_merge_keeps_highest_score_per_id() {
        let catalog = sample_catalog();
        let candidates = vec![
            ScoredCrystal {
                crystal: catalog[0].clone(),
                score: 70,
                reason: "low".to_string(),
            },
            ScoredCrystal {
                crystal: catalog[0].clone(),
                score: 90,
                reason: "high".to_string(),
            },
        ];
        let merged = merge_candidates(candidates);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].score, 90);
        assert_eq!(merged[0].reason, "high");
    }

    #[test]
    fn test_merge_sorts_descending() {
        let catalog = sample_catalog();
        let candidates = vec![
            ScoredCrystal {
                crystal: catalog[0].clone(),
                score: 70,
                reason: String::new(),
            },
            ScoredCrystal {
                crystal: catalog[1].clone(),
                score: 100,
                reason: String::new(),
            },
            ScoredCrystal {
                crystal: catalog[2].clone(),
                score: 85,
                reason: String::new(),
            },
        ];
        let merged = merge_candidates(candidates);
        let scores: Vec<u32> = merged.iter().map(|m| m.score).collect();
        assert_eq!(scores, vec![100, 85, 70]);
    }

    #[test]
    fn test_empty_catalog_yields_empty_lists() {
        let chart = derive_chart("1990-06-15", "14:30").unwrap();
        let analysis = analyze(&chart);
        let score = fortune::score(chart.day_master(), &analysis);
        let narrative = fallback::generate_for_month(&chart, &analysis, &score, 6);
        let bundle = recommend(&analysis, &score, &[], &narrative);

        assert!(bundle.primary.is_empty());
        assert!(bundle.secondary.is_empty());
        assert!(!bundle.reasoning.is_empty());
    }

    #[test]
    fn test_tier_sizes() {
        let bundle = pipeline("1990-06-15", "14:30");
        assert!(bundle.primary.len() <= 3);
        assert!(bundle.secondary.len() <= 3);

        // no id appears in both tiers
        for p in &bundle.primary {
            assert!(!bundle
                .secondary
                .iter()
                .any(|s| s.crystal.id == p.crystal.id));
        }
    }

    #[test]
    fn test_primary_ordered_by_score() {
        let bundle = pipeline("1990-06-15", "14:30");
        for pair in bundle.primary.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_reasoning_mentions_weakest_domain() {
        let chart = derive_chart("1990-06-15", "14:30").unwrap();
        let analysis = analyze(&chart);
        let score = fortune::score(chart.day_master(), &analysis);
        let narrative = fallback::generate_for_month(&chart, &analysis, &score, 6);
        let bundle = recommend(&analysis, &score, &sample_catalog(), &narrative);
        assert!(bundle
            .reasoning
            .contains(score.weakest_domain().chinese()));
    }
}
