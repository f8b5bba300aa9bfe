//! Remote classifier backed by the Gemini `generateContent` API.

use crate::config::ClassifierConfig;
use crate::pipeline::text_preview;
use blackline_core::{parse_classifier_output, CoreError, SensitiveSpan, SpanClassifier};
use serde_json::{json, Value};
use std::time::Duration;

const PROMPT: &str = "You are a precise data extraction tool. Scan the document text below and \
extract every instance of the following sensitive information.

1. PERSON: names of individuals, including titles, signatories, proprietors, directors and officers.
   ORG: names of companies, institutions, agencies and trade names.
2. ADDRESS: complete street addresses including building, street, sector, landmark and postal code.
   GPE: countries, states and cities. LOC: other places that are not part of a full address.
3. Email addresses and phone numbers.
4. Government and financial identifiers: GSTIN, PAN, Aadhaar, TAN, DIN, ARN, bank account numbers, IFSC codes.
5. Case numbers, notice numbers and reference IDs.

Rules:
- Extract the value, never its label (for \"Company Name: ABC Tech Pvt. Ltd.\" extract \"ABC Tech Pvt. Ltd.\").
- Copy each value exactly as it appears in the text, without summarizing or abbreviating.
- Be exhaustive across the whole document.

Document text:

---

";

pub struct GeminiClassifier {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

impl GeminiClassifier {
    pub fn new(config: &ClassifierConfig, api_key: String) -> Result<Self, CoreError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CoreError::Classifier(e.to_string()))?;
        Ok(Self {
            client,
            url: generate_url(&config.endpoint, &config.model),
            api_key,
        })
    }

    /// Build a client with the key read from the configured environment variable.
    pub fn from_env(config: &ClassifierConfig) -> Result<Self, CoreError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CoreError::Classifier(format!("{} is not set", config.api_key_env)))?;
        Self::new(config, api_key)
    }
}

fn generate_url(endpoint: &str, model: &str) -> String {
    format!("{}/models/{}:generateContent", endpoint.trim_end_matches('/'), model)
}

fn request_body(text: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": format!("{}{}", PROMPT, text) }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": {
                            "type": "STRING",
                            "description": "Category of the sensitive data, e.g. PERSON, ORG, ADDRESS, Email, GSTIN, PAN."
                        },
                        "text": {
                            "type": "STRING",
                            "description": "The sensitive text exactly as it appears in the document."
                        }
                    },
                    "required": ["type", "text"]
                }
            },
            "temperature": 0
        }
    })
}

/// Model text of the first candidate, if the response has one.
fn response_text(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    Some(text)
}

impl SpanClassifier for GeminiClassifier {
    fn classify(&self, text: &str) -> blackline_core::Result<Vec<SensitiveSpan>> {
        if text.trim().is_empty() {
            log::warn!("[Classifier] empty text, nothing to classify");
            return Ok(Vec::new());
        }

        log::info!(
            "[Classifier] sending {} chars to {}: {}",
            text.chars().count(),
            self.url,
            text_preview(text)
        );

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .body(request_body(text).to_string())
            .send()
            .map_err(|e| CoreError::Classifier(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| CoreError::Classifier(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            let snippet: String = body.chars().take(200).collect();
            return Err(CoreError::Classifier(format!("HTTP {}: {}", status, snippet)));
        }

        let value: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("[Classifier] response is not JSON, treating as empty: {}", e);
                return Ok(Vec::new());
            }
        };

        match response_text(&value) {
            Some(output) => {
                let spans = parse_classifier_output(&output);
                log::info!("[Classifier] {} spans returned", spans.len());
                Ok(spans)
            }
            None => {
                log::warn!("[Classifier] response has no candidate text, treating as empty");
                Ok(Vec::new())
            }
        }
    }
}
