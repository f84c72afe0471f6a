//! Local narrative generator used when the completion service is
//! unavailable. A complete deterministic implementation of the same
//! contract, built from the same rule tables — not a degraded stub.

use chrono::Datelike;
use chrono::Utc;

use super::CrystalMention;
use super::NarrativeAnalysis;
use crate::bazi::fortune::FortuneDomain;
use crate::bazi::BirthChart;
use crate::bazi::ElementAnalysis;
use crate::bazi::FiveElement;
use crate::bazi::FortuneScore;
use crate::recommend::tables;

/// Generate the full analysis locally. The seasonal line is keyed on the
/// current calendar month, independent of the chart's own season.
pub fn generate(
    chart: &BirthChart,
    analysis: &ElementAnalysis,
    fortune: &FortuneScore,
) -> NarrativeAnalysis {
    generate_for_month(chart, analysis, fortune, Utc::now().month())
}

/// Deterministic variant taking the calendar month explicitly.
pub fn generate_for_month(
    chart: &BirthChart,
    analysis: &ElementAnalysis,
    fortune: &FortuneScore,
    month: u32,
) -> NarrativeAnalysis {
    let crystal_recommendations = crystal_recommendations(analysis, fortune);

    NarrativeAnalysis {
        main_issues: main_issues(chart, analysis, fortune, month),
        wearing_advice: wearing_advice(analysis, &crystal_recommendations),
        expected_effects: expected_effects(analysis, fortune),
        additional_advice: additional_advice(chart),
        full_analysis: full_report(chart, analysis, fortune, &crystal_recommendations),
        crystal_recommendations,
    }
}

fn main_issues(
    chart: &BirthChart,
    analysis: &ElementAnalysis,
    fortune: &FortuneScore,
    month: u32,
) -> String {
    let mut issues = Vec::new();

    if analysis.balance < 60 {
        issues.push(format!(
            "您的五行平衡度较低({}%)，这可能导致能量流动不畅，影响各方面运势。",
            analysis.balance
        ));
    }

    for &element in &analysis.missing {
        issues.push(format!(
            "{}元素不足，可能影响您的{}。",
            element,
            tables::element_meaning(element)
        ));
    }

    let low_domains: Vec<&str> = FortuneDomain::ALL
        .iter()
        .filter(|&&d| fortune.domain(d) < 70)
        .map(|d| d.chinese())
        .collect();
    if !low_domains.is_empty() {
        issues.push(format!(
            "{}相对较弱，需要重点关注和调理。",
            low_domains.join("、")
        ));
    }

    if let Some(line) = seasonal_line(chart.day_master(), month) {
        issues.push(line.to_string());
    }

    issues.join(" ")
}

fn season_of(month: u32) -> &'static str {
    match month {
        12 | 1 | 2 => "冬",
        3..=5 => "春",
        6..=8 => "夏",
        _ => "秋",
    }
}

/// Season-aware day-master narrative, one line per element/season pair.
fn seasonal_line(day_master: FiveElement, month: u32) -> Option<&'static str> {
    let season = season_of(month);
    let line = match (day_master, season) {
        (FiveElement::Wood, "春") => "正值木旺之季，是您发展事业的最佳时机。",
        (FiveElement::Wood, "夏") => "火旺消耗木气，注意保持充足休息。",
        (FiveElement::Wood, "秋") => "金克木，需要特别注意健康和人际关系。",
        (FiveElement::Wood, "冬") => "水生木，适合学习充电和规划未来。",
        (FiveElement::Fire, "春") => "木生火，您的创造力和热情将得到很好的发挥。",
        (FiveElement::Fire, "夏") => "火旺当季，正是您大展身手的好时机。",
        (FiveElement::Fire, "秋") => "需要保持内心的热情，避免过度消耗。",
        (FiveElement::Fire, "冬") => "水克火，注意保暖养生，维持内在能量。",
        (FiveElement::Earth, "春") => "木克土，需要加强稳定性和耐心。",
        (FiveElement::Earth, "夏") => "火生土，财运和事业都有不错的发展机会。",
        (FiveElement::Earth, "秋") => "金泄土气，适合整理和巩固已有成果。",
        (FiveElement::Earth, "冬") => "寒土需要温暖，多关注家庭和健康。",
        (FiveElement::Metal, "春") => "木消耗金气，需要多补充营养和休息。",
        (FiveElement::Metal, "夏") => "火克金，避免过度劳累和情绪激动。",
        (FiveElement::Metal, "秋") => "金旺之季，您的理性思维和决断力最强。",
        (FiveElement::Metal, "冬") => "土生金，适合深度思考和长远规划。",
        (FiveElement::Water, "春") => "水生木，您的智慧能够很好地转化为行动力。",
        (FiveElement::Water, "夏") => "火蒸水，需要保持内心平静，避免急躁。",
        (FiveElement::Water, "秋") => "金生水，您的直觉和洞察力特别敏锐。",
        (FiveElement::Water, "冬") => "水旺当季，是您思考人生和蓄积能量的好时期。",
        _ => return None,
    };
    Some(line)
}

/// Element-gap entries plus low-domain singles, deduplicated by name keeping
/// the higher priority, ranked, top 3.
fn crystal_recommendations(
    analysis: &ElementAnalysis,
    fortune: &FortuneScore,
) -> Vec<CrystalMention> {
    let mut entries: Vec<tables::CrystalEntry> = Vec::new();

    for &element in &analysis.missing {
        entries.extend_from_slice(tables::element_crystals(element));
    }

    for &domain in &FortuneDomain::ALL {
        if fortune.domain(domain) < 70 {
            entries.push(tables::low_domain_crystal(domain));
        }
    }

    let mut unique: Vec<tables::CrystalEntry> = Vec::new();
    for entry in entries {
        match unique
            .iter_mut()
            .find(|e| e.chinese_name == entry.chinese_name)
        {
            Some(existing) => {
                if entry.priority > existing.priority {
                    *existing = entry;
                }
            }
            None => unique.push(entry),
        }
    }
    unique.sort_by(|a, b| b.priority.cmp(&a.priority));

    unique
        .into_iter()
        .take(3)
        .map(|e| CrystalMention {
            chinese_name: e.chinese_name.to_string(),
            english_name: e.english_name.to_string(),
            reason: e.reason.to_string(),
        })
        .collect()
}

fn wearing_advice(analysis: &ElementAnalysis, recommendations: &[CrystalMention]) -> String {
    let mut advice = Vec::new();

    advice.push("建议每天佩带推荐的水晶，最好放置在心轮位置或直接佩带。".to_string());

    if analysis.balance < 60 {
        advice.push("由于您的五行平衡度较低，建议同时佩带2-3种不同水晶，平衡能量。".to_string());
    }

    if let Some(primary) = recommendations.first() {
        advice.push(format!(
            "主要佩带{}，可以做成手链或项链形式。",
            primary.chinese_name
        ));
    }

    advice.push(
        "每天早上起床后和晚上睡前，各花费5-10分钟冥想，手持水晶感受其能量振动。".to_string(),
    );

    advice.join(" ")
}

fn expected_effects(analysis: &ElementAnalysis, fortune: &FortuneScore) -> String {
    let mut effects = Vec::new();

    if analysis.balance < 50 {
        effects.push("在1-2周内，您将逐渐感受到内心的平静和能量的流动。");
        effects.push("在2-4周内，五行能量将得到显著平衡，运势开始好转。");
        effects.push("在1-3个月内，您的整体运势将得到稳定提升。");
    } else {
        effects.push("在1周内，您将感受到水晶带来的正面能量。");
        effects.push("在2-3周内，相应的运势领域将得到明显改善。");
    }

    if fortune.career < 70 {
        effects.push("事业方面：工作灵感增加，决断力提升，更容易获得上司和同事的认可。");
    }
    if fortune.wealth < 70 {
        effects.push("财运方面：理财意识增强，更容易发现赚钱机会，积累能力提升。");
    }
    if fortune.health < 70 {
        effects.push("健康方面：身体能量增强，睡眠质量改善，抵抗力提升。");
    }
    if fortune.relationship < 70 {
        effects.push("感情方面：人际关系改善，更容易吸引到合适的伴侣，家庭和谐度提升。");
    }

    effects.join(" ")
}

fn additional_advice(chart: &BirthChart) -> String {
    let mut advice = Vec::new();

    advice.push("生活习惯：保持规律作息，早睡早起，适度运动，均衡饮食。".to_string());
    advice.push(
        "水晶保养：每周用清水清洗水晶，每月放在月光下净化一次，保持水晶能量纯净。".to_string(),
    );
    advice.push(format!(
        "环境布置：{}",
        tables::environment_advice(chart.day_master())
    ));
    advice.push("心理调节：保持乐观积极的心态，定期冥想，提升精神层面的能量振动。".to_string());

    advice.join(" ")
}

fn full_report(
    chart: &BirthChart,
    analysis: &ElementAnalysis,
    fortune: &FortuneScore,
    recommendations: &[CrystalMention],
) -> String {
    let mut report = Vec::new();

    report.push(format!("您的八字为：{}。", chart.notation()));
    report.push(format!(
        "您的日主为{}({})，这决定了您的根本性格和命运特质。",
        chart.day.stem,
        chart.day_master()
    ));

    let counts = FiveElement::ALL
        .iter()
        .map(|&e| format!("{}({})", e, analysis.count(e)))
        .collect::<Vec<_>>()
        .join("、");
    report.push(format!(
        "五行分布：{counts}，平衡度{}%。",
        analysis.balance
    ));

    report.push(format!(
        "各项运势评分：事业{}分、财运{}分、健康{}分、感情{}分，综合评分{}分。",
        fortune.career, fortune.wealth, fortune.health, fortune.relationship, fortune.overall
    ));

    if !recommendations.is_empty() {
        let names = recommendations
            .iter()
            .map(|c| c.chinese_name.clone())
            .collect::<Vec<_>>()
            .join("、");
        report.push(format!(
            "根据您的八字特点，特别推荐佩带{names}等水晶，这些水晶能够有效平衡您的五行能量。"
        ));
    }

    report.push(
        "此分析基于传统五行理论和水晶能量学，旨在为您提供参考和指导。请结合自身实际情况，理性对待。"
            .to_string(),
    );

    report.join("")
}
