//! Direct-field extraction through an OpenAI-compatible vision model.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::compare::GOVERNMENT_WARNING_BODY;
use crate::error::{Error, Result};
use crate::model::{ExpectedFields, ExtractedFields, FieldExtraction, MatchHints};

use super::FieldExtractor;

/// Configuration for the vision extraction provider.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Completion token cap per request.
    pub max_tokens: u32,
    /// Timeout for a single attempt. Retries are budgeted separately by the
    /// batch controller; this must never bound the whole retry sequence.
    pub timeout: Duration,
}

impl VisionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 300,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Field extractor backed by a vision-capable chat-completions model.
///
/// Sends the label image as a base64 data URL together with the expected
/// values, and parses the model's JSON reply into fields plus per-field
/// match hints.
pub struct VisionExtractor {
    client: reqwest::Client,
    config: VisionConfig,
}

impl VisionExtractor {
    /// Build an extractor with its own HTTP client.
    pub fn new(config: VisionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Provider(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn prompt(expected: &ExpectedFields) -> String {
        format!(
            "You are a U.S. TTB alcohol label compliance expert.\n\n\
             Extract the following information from this alcohol beverage label and determine \
             if extracted values match the expected values:\n\n\
             Brand Name -> expected: {brand}. NOTE: Additional nouns like \"Brewery\" may not \
             necessarily be part of the brand name.\n\
             Class/Type -> expected: {class}. NOTE: Additional descriptor words may not \
             necessarily be part of the class/type, but the expected value must be a word in \
             the image.\n\
             Alcohol Content -> expected: {alcohol}. Make sure to search for this numerical \
             value in image.\n\
             Net Contents -> expected: {net}. NOTE: Field could vary in wording/formatting and \
             still be correct (i.e \"1 Pint, 0.9 FL. OZ.\" = \"1 0.9 Pint Fl oz\")\n\n\
             Government Warning must:\n\
             - MUST contain \"GOVERNMENT WARNING:\" exact and in ALL CAPS\n\
             - MUST contain exact text: {warning_body}\n\n\
             Ignore capitalization differences EXCEPT for \"GOVERNMENT WARNING:\" which must \
             be exact.\n\n\
             Respond with ONLY valid JSON:\n\n\
             {{\n\
             \"brand_name\": \"\",\n\
             \"brand_name_matches\": True/False,\n\
             \"class_type\": \"\",\n\
             \"class_type_matches\": True/False,\n\
             \"alcohol_content\": \"\",\n\
             \"alcohol_content_matches\": True/False,\n\
             \"net_contents\": \"\",\n\
             \"net_contents_matches\": True/False,\n\
             \"government_warning_present\": True/False,\n\
             \"government_warning_all_caps\": True/False,\n\
             \"government_warning_text\": \"\",\n\
             \"government_warning_matches\": True/False\n\
             }}\n\n\
             If a field is not visible, use empty string.",
            brand = expected.brand_name,
            class = expected.class_type,
            alcohol = expected.alcohol_content,
            net = expected.net_contents,
            warning_body = GOVERNMENT_WARNING_BODY,
        )
    }

    /// Parse the model's reply content into a field extraction.
    ///
    /// Code fences are tolerated; anything that still fails to parse is a
    /// [`Error::MalformedResponse`].
    fn parse_content(content: &str) -> Result<FieldExtraction> {
        let stripped = content.replace("```json", "").replace("```", "");
        let reply: VisionReply = serde_json::from_str(stripped.trim())
            .map_err(|e| Error::MalformedResponse(format!("{e}: {content}")))?;
        Ok(reply.into_extraction())
    }
}

#[async_trait]
impl FieldExtractor for VisionExtractor {
    async fn extract(&self, image: &[u8], expected: &ExpectedFields) -> Result<FieldExtraction> {
        let encoded = BASE64_STANDARD.encode(image);
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:image/jpeg;base64,{encoded}"),
                            "detail": "high"
                        }
                    },
                    { "type": "text", "text": Self::prompt(expected) }
                ]
            }]
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Provider(e.to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());
            return Err(Error::RateLimited { retry_after });
        }
        if !response.status().is_success() {
            return Err(Error::Provider(format!("HTTP {}", response.status())));
        }

        let envelope: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;

        let content = envelope
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| Error::MalformedResponse("empty completion".to_string()))?;

        Self::parse_content(content)
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// The model's JSON reply. Absent keys default to empty/false.
#[derive(Debug, Default, Deserialize)]
struct VisionReply {
    #[serde(default)]
    brand_name: String,
    #[serde(default)]
    brand_name_matches: bool,
    #[serde(default)]
    class_type: String,
    #[serde(default)]
    class_type_matches: bool,
    #[serde(default)]
    alcohol_content: String,
    #[serde(default)]
    alcohol_content_matches: bool,
    #[serde(default)]
    net_contents: String,
    #[serde(default)]
    net_contents_matches: bool,
    #[serde(default)]
    government_warning_present: bool,
    #[serde(default)]
    government_warning_all_caps: bool,
    #[serde(default)]
    government_warning_text: String,
    #[serde(default)]
    government_warning_matches: bool,
}

impl VisionReply {
    fn into_extraction(self) -> FieldExtraction {
        FieldExtraction {
            fields: ExtractedFields {
                brand_name: self.brand_name,
                class_type: self.class_type,
                alcohol_content: self.alcohol_content,
                net_contents: self.net_contents,
                government_warning_text: self.government_warning_text,
                government_warning_present: self.government_warning_present,
                government_warning_all_caps: self.government_warning_all_caps,
            },
            hints: MatchHints {
                brand_name: self.brand_name_matches,
                class_type: self.class_type_matches,
                alcohol_content: self.alcohol_content_matches,
                net_contents: self.net_contents_matches,
                government_warning: self.government_warning_matches,
            },
        }
    }
}
