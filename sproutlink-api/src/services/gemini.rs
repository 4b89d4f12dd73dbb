//! Gemini generateContent wire types
//!
//! Shared request/response shapes for the two Gemini-backed clients
//! (vision OCR and report scoring).

use serde::{Deserialize, Serialize};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "inline_data", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline_image(mime_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: base64_data.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineData {
    #[serde(rename = "mime_type")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// First text part of the first candidate, the usual payload location
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.text.as_deref())
    }
}

/// Endpoint URL for a model's generateContent call
pub fn generate_content_url(model: &str, api_key: &str) -> String {
    format!("{}/{}:generateContent?key={}", GEMINI_BASE_URL, model, api_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::inline_image("image/jpeg", "AAAA"),
                    Part::text("extract this"),
                ],
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(json["contents"][0]["parts"][1]["text"], "extract this");
        // Unused part fields stay absent from the payload
        assert!(json["contents"][0]["parts"][1].get("inline_data").is_none());
    }

    #[test]
    fn test_first_text_extraction() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"hello"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.first_text(), Some("hello"));
    }

    #[test]
    fn test_empty_candidates() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(response.first_text(), None);
    }
}
