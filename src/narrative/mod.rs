//! Natural-language narrative generation.
//!
//! The primary path sends the chart and scores to an OpenAI-style chat
//! completion endpoint and scans the free-text reply into named sections.
//! Extraction is best-effort string matching, so callers must tolerate
//! empty sections. Any call failure falls back to the local deterministic
//! generator; a prediction request is never aborted by this dependency.

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::bazi::BirthChart;
use crate::bazi::ElementAnalysis;
use crate::bazi::FortuneScore;
use crate::config::AppConfig;
use crate::errors::CrystalPathError;
use crate::Result;

pub mod fallback;
pub mod prompts;

/// A crystal name pair extracted from narrative text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrystalMention {
    pub chinese_name: String,
    pub english_name: String,
    pub reason: String,
}

/// Parsed narrative, five named sections plus the raw text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeAnalysis {
    pub main_issues: String,
    pub crystal_recommendations: Vec<CrystalMention>,
    pub wearing_advice: String,
    pub expected_effects: String,
    pub additional_advice: String,
    pub full_analysis: String,
}

/// Client for the narrative completion service.
pub struct NarrativeService {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl NarrativeService {
    /// Create a new narrative service from configuration.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.llm.timeout_secs))
            .build()
            .map_err(|e| CrystalPathError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.llm_endpoint().to_string(),
            api_key: config.llm_key().to_string(),
            model: config.llm_model().to_string(),
        })
    }

    /// Generate the narrative analysis. On any remote failure (network
    /// error, timeout, non-2xx, malformed response) the local fallback is
    /// substituted — this method never fails.
    pub async fn analyze(
        &self,
        chart: &BirthChart,
        analysis: &ElementAnalysis,
        fortune: &FortuneScore,
    ) -> NarrativeAnalysis {
        match self.analyze_remote(chart, analysis, fortune).await {
            Ok(narrative) => narrative,
            Err(e) => {
                warn!("Narrative service unavailable, using local analysis: {e}");
                fallback::generate(chart, analysis, fortune)
            }
        }
    }

    async fn analyze_remote(
        &self,
        chart: &BirthChart,
        analysis: &ElementAnalysis,
        fortune: &FortuneScore,
    ) -> Result<NarrativeAnalysis> {
        let prompt = prompts::build_analysis_prompt(chart, analysis, fortune);
        let text = self.complete(&prompt).await?;
        Ok(parse_analysis(&text))
    }

    /// Call the chat completions endpoint with the fixed persona.
    async fn complete(&self, user_prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct ChatMessage<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage<'a>>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: String,
        }

        let url = format!("{}/v1/chat/completions", self.endpoint);
        debug!("Calling completion API: {}", url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompts::SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: prompts::TEMPERATURE,
            max_tokens: prompts::MAX_TOKENS,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| CrystalPathError::NarrativeService(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CrystalPathError::NarrativeService(format!(
                "completion API error ({status}): {error_text}"
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| CrystalPathError::NarrativeService(format!("malformed response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CrystalPathError::NarrativeService("empty choices".to_string()))
    }
}

/// Split free text into the five named sections by keyword boundaries.
pub fn parse_analysis(text: &str) -> NarrativeAnalysis {
    NarrativeAnalysis {
        main_issues: extract_section(text, "主要问题", Some("推荐水晶")),
        crystal_recommendations: extract_crystal_mentions(text),
        wearing_advice: extract_section(text, "佩带建议", Some("疗愈效果")),
        expected_effects: extract_section(text, "疗愈效果", Some("额外建议")),
        additional_advice: extract_section(text, "额外建议", None),
        full_analysis: text.to_string(),
    }
}

/// Lines between the line containing `start` and the line containing `end`.
fn extract_section(text: &str, start: &str, end: Option<&str>) -> String {
    let mut in_section = false;
    let mut content = Vec::new();

    for line in text.lines() {
        if !in_section {
            if line.contains(start) {
                in_section = true;
            }
            continue;
        }
        if let Some(end) = end {
            if line.contains(end) {
                break;
            }
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            content.push(trimmed);
        }
    }

    content.join("\n")
}

/// Extract `中文名(English Name)` pairs from the recommendation section.
fn extract_crystal_mentions(text: &str) -> Vec<CrystalMention> {
    let mut mentions = Vec::new();
    let mut in_section = false;

    for line in text.lines() {
        if line.contains("推荐水晶") || line.contains("水晶组合") {
            in_section = true;
            continue;
        }
        if in_section && (line.contains("佩带建议") || line.contains("疗愈效果")) {
            break;
        }
        if in_section && !line.trim().is_empty() {
            for (chinese, english) in extract_name_pairs(line) {
                mentions.push(CrystalMention {
                    chinese_name: chinese,
                    english_name: english,
                    reason: line.trim().to_string(),
                });
            }
        }
    }

    mentions
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Scan a line for runs of CJK characters directly followed by a
/// parenthesized ASCII name, tolerating fullwidth parentheses and spaces.
fn extract_name_pairs(line: &str) -> Vec<(String, String)> {
    let chars: Vec<char> = line.chars().collect();
    let mut pairs = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '(' || chars[i] == '（' {
            // walk back over spaces, then the CJK run
            let mut j = i;
            while j > 0 && chars[j - 1] == ' ' {
                j -= 1;
            }
            let name_end = j;
            while j > 0 && is_cjk(chars[j - 1]) {
                j -= 1;
            }
            if j < name_end {
                // walk forward over the ASCII name
                let mut k = i + 1;
                while k < chars.len() && (chars[k].is_ascii_alphabetic() || chars[k] == ' ') {
                    k += 1;
                }
                if k < chars.len() && (chars[k] == ')' || chars[k] == '）') {
                    let chinese: String = chars[j..name_end].iter().collect();
                    let english: String =
                        chars[i + 1..k].iter().collect::<String>().trim().to_string();
                    if !english.is_empty() {
                        pairs.push((chinese, english));
                        i = k;
                    }
                }
            }
        }
        i += 1;
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1. 主要问题分析\n您的五行缺水，需要补强。\n\n2. 推荐水晶组合\n- 紫水晶(Amethyst)：增强直觉和智慧\n- 海蓝宝（Aquamarine）：平静心灵\n- 月光石 (Moonstone)：增强直觉\n\n3. 佩带建议\n建议佩带在左手。\n\n4. 疗愈效果预期\n两周内见效。\n\n5. 额外建议\n多喝水。";

    #[test]
    fn test_section_extraction() {
        let parsed = parse_analysis(SAMPLE);
        assert!(parsed.main_issues.contains("五行缺水"));
        assert!(parsed.wearing_advice.contains("左手"));
        assert!(parsed.expected_effects.contains("两周"));
        assert!(parsed.additional_advice.contains("多喝水"));
        assert_eq!(parsed.full_analysis, SAMPLE);
    }

    #[test]
    fn test_crystal_mention_extraction() {
        let parsed = parse_analysis(SAMPLE);
        let names: Vec<&str> = parsed
            .crystal_recommendations
            .iter()
            .map(|c| c.english_name.as_str())
            .collect();
        assert_eq!(names, vec!["Amethyst", "Aquamarine", "Moonstone"]);
        assert_eq!(parsed.crystal_recommendations[0].chinese_name, "紫水晶");
        assert!(parsed.crystal_recommendations[0].reason.contains("直觉"));
    }

    #[test]
    fn test_unstructured_text_yields_empty_sections() {
        let parsed = parse_analysis("完全没有结构的回复。");
        assert!(parsed.main_issues.is_empty());
        assert!(parsed.crystal_recommendations.is_empty());
        assert_eq!(parsed.full_analysis, "完全没有结构的回复。");
    }

    #[test]
    fn test_name_pair_scanner_edge_cases() {
        assert_eq!(
            extract_name_pairs("推荐黄水晶(Citrine)和白水晶(Clear Quartz)"),
            vec![
                ("黄水晶".to_string(), "Citrine".to_string()),
                ("白水晶".to_string(), "Clear Quartz".to_string())
            ]
        );
        // parenthesis without a CJK run before it is ignored
        assert!(extract_name_pairs("(Citrine)").is_empty());
        // empty parentheses are ignored
        assert!(extract_name_pairs("黄水晶()").is_empty());
    }
}
