//! Voice-phrase verification.
//!
//! The user reads a phrase aloud; the recording is transcribed and compared
//! with the phrase. Used only as a gate in front of session creation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ElevenLabsSettings;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Verifier unavailable: {0}")]
    Unavailable(String),

    #[error("No audio supplied")]
    EmptyAudio,

    #[error("No phrase supplied")]
    EmptyPhrase,

    #[error("Transcription request failed: {0}")]
    RequestFailed(String),

    #[error("Response parse error: {0}")]
    ParseError(String),
}

/// Outcome of one verification attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    pub transcript: String,
}

impl VerificationResult {
    /// Compare a transcript with the expected phrase.
    pub fn from_transcript(transcript: impl Into<String>, phrase: &str) -> Self {
        let transcript = transcript.into();
        Self {
            verified: phrase_matches(&transcript, phrase),
            transcript,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhraseVerifier: Send + Sync {
    async fn verify(
        &self,
        audio: &[u8],
        expected_phrase: &str,
    ) -> Result<VerificationResult, VerifyError>;
}

/// Case-insensitive, trimmed; either side may contain the other.
/// An empty transcript or phrase never matches.
pub fn phrase_matches(transcript: &str, phrase: &str) -> bool {
    let heard = normalize(transcript);
    let expected = normalize(phrase);
    if heard.is_empty() || expected.is_empty() {
        return false;
    }
    heard.contains(&expected) || expected.contains(&heard)
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// ElevenLabs speech-to-text verifier
pub struct ElevenLabsVerifier {
    api_key: String,
    model: String,
    url: String,
    client: reqwest::Client,
}

impl ElevenLabsVerifier {
    pub fn new(settings: &ElevenLabsSettings, timeout: Duration) -> Result<Self, VerifyError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| VerifyError::Unavailable("ELEVENLABS_API_KEY not set".into()))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifyError::Unavailable(e.to_string()))?;

        Ok(Self {
            api_key,
            model: settings.model.clone(),
            url: settings.url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn transcribe(&self, audio: &[u8]) -> Result<String, VerifyError> {
        let file = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| VerifyError::RequestFailed(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("model_id", self.model.clone());

        let response = self
            .client
            .post(format!("{}/speech-to-text", self.url))
            .header("xi-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VerifyError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VerifyError::RequestFailed(format!(
                "ElevenLabs API error ({}): {}",
                status, body
            )));
        }

        let resp_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| VerifyError::ParseError(e.to_string()))?;
        Ok(resp_json["text"].as_str().unwrap_or("").trim().to_string())
    }
}

#[async_trait]
impl PhraseVerifier for ElevenLabsVerifier {
    async fn verify(
        &self,
        audio: &[u8],
        expected_phrase: &str,
    ) -> Result<VerificationResult, VerifyError> {
        if audio.is_empty() {
            return Err(VerifyError::EmptyAudio);
        }
        if expected_phrase.trim().is_empty() {
            return Err(VerifyError::EmptyPhrase);
        }

        debug!(bytes = audio.len(), phrase = %expected_phrase, "Sending audio for transcription");
        let transcript = self.transcribe(audio).await?;
        let result = VerificationResult::from_transcript(transcript, expected_phrase);
        info!(verified = result.verified, transcript = %result.transcript, "Voice phrase checked");
        Ok(result)
    }
}
