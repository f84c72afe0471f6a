//! Prompt construction for the narrative completion call.

use crate::bazi::BirthChart;
use crate::bazi::ElementAnalysis;
use crate::bazi::FiveElement;
use crate::bazi::FortuneScore;

/// Fixed persona for the completion service.
pub const SYSTEM_PROMPT: &str = "你是一位专业的水晶疗愈师和八字命理师，能够根据用户的八字分析结果推荐最适合的水晶组合。请以专业、准确、温暖的语调回复。";

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 2000;

/// Build the structured analysis prompt from chart, element analysis and
/// fortune scores.
pub fn build_analysis_prompt(
    chart: &BirthChart,
    analysis: &ElementAnalysis,
    fortune: &FortuneScore,
) -> String {
    let counts = FiveElement::ALL
        .iter()
        .map(|&e| format!("{}({})", e, analysis.count(e)))
        .collect::<Vec<_>>()
        .join("、");

    let missing = analysis
        .missing
        .iter()
        .map(|e| e.chinese().to_string())
        .collect::<Vec<_>>()
        .join("、");

    format!(
        r"请根据以下八字分析结果，为用户推荐最适合的水晶组合：

八字信息：
- 年柱：{}{}(五行：{})
- 月柱：{}{}(五行：{})
- 日柱：{}{}(五行：{})
- 时柱：{}{}(五行：{})

五行分析：
- 五行统计：{counts}
- 最强五行：{}
- 最弱五行：{}
- 需要补强：{missing}
- 平衡度：{}%

运势分析：
- 事业运：{}分
- 财运：{}分
- 健康运：{}分
- 感情运：{}分
- 总体运势：{}分

请按照以下格式返回分析结果：

1. 主要问题分析（找出最需要改善的方面）
2. 推荐水晶组合（至少3种水晶，包括中文名和英文名）
3. 佩带建议（具体的佩带方法和注意事项）
4. 疗愈效果预期（预期能改善的具体方面）
5. 额外建议（生活方式或风水布置建议）

请确保推荐的水晶都是常见且容易获取的品种。",
        chart.year.stem,
        chart.year.branch,
        chart.year.element,
        chart.month.stem,
        chart.month.branch,
        chart.month.element,
        chart.day.stem,
        chart.day.branch,
        chart.day.element,
        chart.hour.stem,
        chart.hour.branch,
        chart.hour.element,
        analysis.strongest,
        analysis.weakest,
        analysis.balance,
        fortune.career,
        fortune.wealth,
        fortune.health,
        fortune.relationship,
        fortune.overall,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bazi::chart::derive_chart;
    use crate::bazi::elements::analyze;
    use crate::bazi::fortune;

    #[test]
    fn test_prompt_contains_all_sections() {
        let chart = derive_chart("1990-06-15", "14:30").unwrap();
        let analysis = analyze(&chart);
        let score = fortune::score(chart.day_master(), &analysis);

        let prompt = build_analysis_prompt(&chart, &analysis, &score);
        assert!(prompt.contains("年柱"));
        assert!(prompt.contains("五行统计"));
        assert!(prompt.contains(&format!("平衡度：{}%", analysis.balance)));
        assert!(prompt.contains(&format!("总体运势：{}分", score.overall)));
        assert!(prompt.contains("推荐水晶组合"));
    }
}
