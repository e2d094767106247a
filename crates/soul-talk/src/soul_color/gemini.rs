//! Gemini-backed soul-color classifier (REST `generateContent`).

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::catalog;
use super::classifier::{Classification, ClassifierError, SoulColorClassifier};
use crate::config::GeminiSettings;

pub struct GeminiClassifier {
    api_key: String,
    model: String,
    url: String,
    client: reqwest::Client,
}

impl GeminiClassifier {
    pub fn new(settings: &GeminiSettings, timeout: Duration) -> Result<Self, ClassifierError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ClassifierError::ClassifierUnavailable("GEMINI_API_KEY not set".into()))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::ClassifierUnavailable(e.to_string()))?;

        Ok(Self {
            api_key,
            model: settings.model.clone(),
            url: settings.url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.url, self.model)
    }
}

#[async_trait]
impl SoulColorClassifier for GeminiClassifier {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn classify(&self, responses: &[String]) -> Result<Classification, ClassifierError> {
        if responses.is_empty() {
            return Err(ClassifierError::NoResponses);
        }

        let request_body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": build_prompt(responses) }]
            }],
            "generationConfig": {
                "temperature": 0.4,
                "maxOutputTokens": 256
            }
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ClassifierError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::RequestFailed(format!(
                "Gemini API error ({}): {}",
                status, body
            )));
        }

        let resp_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClassifierError::ParseError(e.to_string()))?;

        let text = resp_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| ClassifierError::ParseError("reply has no text part".into()))?;
        debug!(model = %self.model, reply = %text, "Gemini reply");

        parse_reply(text)
    }
}

/// The classification prompt: catalog, numbered responses, reply format.
pub fn build_prompt(responses: &[String]) -> String {
    let numbered = responses
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}", i + 1, r))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a Soul Color analyzer. Based on these user responses, analyze and assign ONE Soul Color that best matches their personality.\n\n\
         Available Soul Colors:\n{}\n\n\
         User Responses:\n{}\n\n\
         Respond in this format ONLY:\n\
         soul_color_id: [ID]\n\
         reasoning: [1-2 sentence explanation]",
        catalog::prompt_list(),
        numbered
    )
}

/// Parse `soul_color_id:` / `reasoning:` lines out of a model reply.
pub fn parse_reply(text: &str) -> Result<Classification, ClassifierError> {
    let mut soul_color_id = None;
    let mut reasoning = String::new();

    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("soul_color_id:") {
            soul_color_id = Some(rest.trim().trim_matches(|c| c == '"' || c == '`').to_lowercase());
        } else if let Some(rest) = line.strip_prefix("reasoning:") {
            reasoning = rest.trim().to_string();
        }
    }

    let soul_color_id = soul_color_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ClassifierError::ParseError("missing soul_color_id line".into()))?;
    if !catalog::is_valid(&soul_color_id) {
        return Err(ClassifierError::UnknownColor(soul_color_id));
    }

    Ok(Classification {
        soul_color_id,
        reasoning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply() {
        let c = parse_reply(
            "soul_color_id: Deep-Indigo\nreasoning: Reflective answers with a lot of care.",
        )
        .unwrap();
        assert_eq!(c.soul_color_id, "deep-indigo");
        assert_eq!(c.reasoning, "Reflective answers with a lot of care.");
    }

    #[test]
    fn test_parse_reply_tolerates_noise() {
        let c = parse_reply("Sure!\n  soul_color_id: \"fog-blue\"  \n").unwrap();
        assert_eq!(c.soul_color_id, "fog-blue");
        assert_eq!(c.reasoning, "");
    }

    #[test]
    fn test_parse_reply_errors() {
        assert!(matches!(
            parse_reply("reasoning: no id here"),
            Err(ClassifierError::ParseError(_))
        ));
        assert!(matches!(
            parse_reply("soul_color_id: neon-plaid"),
            Err(ClassifierError::UnknownColor(id)) if id == "neon-plaid"
        ));
    }

    #[test]
    fn test_prompt_numbers_responses() {
        let prompt = build_prompt(&["first".into(), "second".into()]);
        assert!(prompt.contains("1. first\n2. second"));
        assert!(prompt.contains("- golden-peach: Golden Peach"));
        assert!(prompt.ends_with("reasoning: [1-2 sentence explanation]"));
    }

    #[test]
    fn test_requires_api_key() {
        let settings = GeminiSettings {
            api_key: None,
            model: "gemini-1.5-pro".into(),
            url: "http://localhost".into(),
        };
        assert!(matches!(
            GeminiClassifier::new(&settings, Duration::from_secs(1)),
            Err(ClassifierError::ClassifierUnavailable(_))
        ));
    }
}
