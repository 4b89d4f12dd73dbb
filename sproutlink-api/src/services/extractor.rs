//! Handwritten-text extraction from journal images
//!
//! The production implementation downloads the uploaded image and asks
//! the Gemini vision model for a verbatim transcription. Orchestrators
//! depend on the `TextExtractor` trait so tests can inject a fake.

use std::time::Duration;

use base64::Engine;
use thiserror::Error;

use super::gemini::{
    generate_content_url, Content, GenerateContentRequest, GenerateContentResponse, Part,
};

const VISION_MODEL: &str = "gemini-2.5-flash-lite";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transcription prompt: raw text only, no cleanup or commentary
const OCR_PROMPT: &str = "You are an OCR assistant. Extract all handwritten text from the image.\n\
    - Return the extracted text as a single paragraph.\n\
    - Do not include line breaks, summaries, or any omitted content.\n\
    - Do not correct spelling, grammar, or any mistakes in the original text.\n\
    - Do not add titles, commentary, or explanations.\n\
    - Output only the raw text in one continuous paragraph, exactly as it appears in the handwriting.";

/// Text extraction errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Could not fetch image: {0}")]
    ImageFetch(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Vision API error {0}: {1}")]
    Api(u16, String),

    #[error("Vision API returned no text")]
    Empty,
}

/// Image reference → extracted raw text
#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, image_url: &str) -> Result<String, ExtractionError>;
}

/// Gemini vision OCR client
pub struct GeminiVisionClient {
    http_client: reqwest::Client,
    api_key: String,
}

impl GeminiVisionClient {
    pub fn new(api_key: String) -> Result<Self, ExtractionError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
        })
    }

    /// Download the journal image and return its bytes and MIME type
    async fn fetch_image(&self, image_url: &str) -> Result<(Vec<u8>, String), ExtractionError> {
        let response = self
            .http_client
            .get(image_url)
            .send()
            .await
            .map_err(|e| ExtractionError::ImageFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExtractionError::ImageFetch(format!(
                "HTTP {} from image host",
                response.status().as_u16()
            )));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExtractionError::ImageFetch(e.to_string()))?;

        Ok((bytes.to_vec(), mime_type))
    }
}

#[async_trait::async_trait]
impl TextExtractor for GeminiVisionClient {
    async fn extract(&self, image_url: &str) -> Result<String, ExtractionError> {
        let (image_bytes, mime_type) = self.fetch_image(image_url).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&image_bytes);

        tracing::debug!(
            image_url = image_url,
            bytes = image_bytes.len(),
            "Requesting OCR transcription"
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::inline_image(mime_type, encoded),
                    Part::text(OCR_PROMPT),
                ],
            }],
        };

        let response = self
            .http_client
            .post(generate_content_url(VISION_MODEL, &self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api(status.as_u16(), error_text));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        let text = body
            .first_text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ExtractionError::Empty)?;

        tracing::info!(
            image_url = image_url,
            chars = text.len(),
            "OCR transcription complete"
        );

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GeminiVisionClient::new("test_key".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn test_empty_response_is_error() {
        let body: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        let text = body
            .first_text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ExtractionError::Empty);
        assert!(matches!(text, Err(ExtractionError::Empty)));
    }
}
