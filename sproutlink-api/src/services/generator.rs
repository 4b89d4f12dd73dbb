//! Learning-report generation via the Gemini LLM
//!
//! Builds the 12-category scoring prompt, calls the model, and parses
//! the structured response into a typed `Report`. Orchestrators depend
//! on the `ReportGenerator` trait so tests can inject a fake.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

use super::gemini::{
    generate_content_url, Content, GenerateContentRequest, GenerateContentResponse, Part,
};
use crate::models::Report;

const SCORING_MODEL: &str = "gemini-1.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The fixed scoring categories with their one-line descriptors.
/// Every report carries an integer 1-5 for each of these.
pub const SCORE_CATEGORIES: [(&str, &str); 12] = [
    ("Spelling and Punctuation", "Accuracy in basic mechanics."),
    ("Sentence Variety", "Uses different sentence types."),
    ("Cohesion and Coherence", "Logical flow using connectors."),
    ("Paragraphing", "Organized structure (start to end)."),
    ("Clarity of Expression", "Meaning conveyed clearly."),
    ("Content Relevance", "Stays on topic and appropriate."),
    ("Detail and Elaboration", "Goes beyond basic responses."),
    ("Creativity in Expression", "Interesting or vivid language."),
    ("Tone and Formality", "Respectful, donor-appropriate."),
    ("Length of Writing", "Increased word/sentence count."),
    ("Error Reduction", "Fewer repeated mistakes."),
    ("Lexical Sophistication", "Richer vocabulary."),
];

/// Report generation errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("LLM API error {0}: {1}")]
    Api(u16, String),

    #[error("Could not locate JSON payload in LLM response")]
    MissingPayload,

    #[error("Invalid report payload: {0}")]
    InvalidReport(String),
}

/// (journal text, previous report, topic) → structured report
#[async_trait::async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(
        &self,
        journal: &str,
        previous: Option<&Report>,
        topic: &str,
    ) -> Result<Report, GenerationError>;
}

/// Gemini scoring client
pub struct GeminiScoringClient {
    http_client: reqwest::Client,
    api_key: String,
}

impl GeminiScoringClient {
    pub fn new(api_key: String) -> Result<Self, GenerationError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl ReportGenerator for GeminiScoringClient {
    async fn generate(
        &self,
        journal: &str,
        previous: Option<&Report>,
        topic: &str,
    ) -> Result<Report, GenerationError> {
        let prompt = build_prompt(journal, previous, topic);

        tracing::debug!(
            journal_chars = journal.len(),
            has_previous = previous.is_some(),
            "Requesting learning report"
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
        };

        let response = self
            .http_client
            .post(generate_content_url(SCORING_MODEL, &self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api(status.as_u16(), error_text));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let raw_text = body.first_text().ok_or(GenerationError::MissingPayload)?;

        let report = parse_report_response(raw_text)?;

        tracing::info!(
            overall_score = report.overall_score,
            "Learning report generated"
        );

        Ok(report)
    }
}

/// Build the scoring prompt sent to the model.
///
/// Enumerates every category with its descriptor, includes the previous
/// report (or "None") for progress comparison, and pins the expected
/// JSON output shape.
pub fn build_prompt(journal: &str, previous: Option<&Report>, topic: &str) -> String {
    let categories = SCORE_CATEGORIES
        .iter()
        .enumerate()
        .map(|(i, (name, desc))| format!("{}. {} - {}", i + 1, name, desc))
        .collect::<Vec<_>>()
        .join("\n");

    let prev = match previous {
        Some(report) => {
            serde_json::to_string_pretty(report).unwrap_or_else(|_| "None".to_string())
        }
        None => "None".to_string(),
    };

    let output_scores: BTreeMap<&str, &str> = SCORE_CATEGORIES
        .iter()
        .map(|(name, _)| (*name, "int (1-5)"))
        .collect();
    let output_format = serde_json::json!({
        "scores": output_scores,
        "overall_score": "float",
        "progress_update": "string",
        "summary": "string",
    });

    format!(
        "You are an educational language assessor.\n\
         \n\
         You will receive:\n\
         - A new journal entry from a child\n\
         - The previous learning report (or None)\n\
         - A journal topic to guide your evaluation\n\
         \n\
         Your tasks:\n\
         1. Score the journal in each of the 12 categories (1-5 scale) based on the journal topic provided\n\
         2. Provide the average overall score (1 decimal)\n\
         3. Compare the new journal to the previous report and describe improvements or regressions\n\
         4. Write a donor-friendly summary of this submission\n\
         \n\
         Scoring Categories:\n{categories}\n\
         \n\
         New Journal Entry:\n{journal}\n\
         \n\
         Previous Report:\n{prev}\n\
         \n\
         Journal Topic:\n{topic}\n\
         \n\
         Output format (must follow this JSON structure):\n{format}",
        categories = categories,
        journal = journal,
        prev = prev,
        topic = topic,
        format = serde_json::to_string_pretty(&output_format).unwrap_or_default(),
    )
}

/// Parse a raw LLM response into a validated `Report`.
///
/// Strips an optional markdown code fence, locates the first balanced
/// `{...}` block, parses it as JSON, and validates the score table.
pub fn parse_report_response(raw: &str) -> Result<Report, GenerationError> {
    let stripped = strip_code_fence(raw.trim());
    let json_block = extract_json_block(stripped).ok_or(GenerationError::MissingPayload)?;

    let value: serde_json::Value = serde_json::from_str(json_block)
        .map_err(|e| GenerationError::InvalidReport(format!("JSON parse failed: {}", e)))?;

    report_from_value(&value)
}

/// Remove a ```json ... ``` (or plain ```) wrapper if present
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };

    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// First balanced `{...}` block in the text, honoring JSON string
/// literals and escapes
fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Validate the parsed payload and build a typed `Report`.
///
/// Requires every fixed category with an integer score in 1-5; scores
/// the model returns as floats (e.g. 4.0) are accepted when whole.
fn report_from_value(value: &serde_json::Value) -> Result<Report, GenerationError> {
    let scores_obj = value
        .get("scores")
        .and_then(|s| s.as_object())
        .ok_or_else(|| GenerationError::InvalidReport("missing scores object".to_string()))?;

    let mut scores = BTreeMap::new();
    for (name, _) in SCORE_CATEGORIES {
        let raw_score = scores_obj.get(name).ok_or_else(|| {
            GenerationError::InvalidReport(format!("missing score for category '{}'", name))
        })?;

        let score = raw_score
            .as_i64()
            .or_else(|| {
                raw_score
                    .as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            })
            .ok_or_else(|| {
                GenerationError::InvalidReport(format!(
                    "score for '{}' is not an integer: {}",
                    name, raw_score
                ))
            })?;

        if !(1..=5).contains(&score) {
            return Err(GenerationError::InvalidReport(format!(
                "score for '{}' out of range 1-5: {}",
                name, score
            )));
        }

        scores.insert(name.to_string(), score);
    }

    let overall_score = value
        .get("overall_score")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| GenerationError::InvalidReport("missing overall_score".to_string()))?;

    let progress_update = value
        .get("progress_update")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let summary = value
        .get("summary")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(Report {
        scores,
        overall_score,
        progress_update,
        summary,
    })
}
