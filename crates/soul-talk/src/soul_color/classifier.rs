use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::catalog::{self, SoulColor, SOUL_COLORS};

pub const REASON_API_ERROR: &str = "Assigned due to API error";
pub const REASON_UNAVAILABLE_ID: &str = "Auto-assigned based on availability";

/// Errors from soul-color classification
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("No responses to classify")]
    NoResponses,

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Classifier request failed: {0}")]
    RequestFailed(String),

    #[error("Response parse error: {0}")]
    ParseError(String),

    #[error("Unknown soul color id: {0}")]
    UnknownColor(String),
}

/// A classifier verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub soul_color_id: String,
    pub reasoning: String,
}

impl Classification {
    pub fn color(&self) -> Option<&'static SoulColor> {
        catalog::lookup(&self.soul_color_id)
    }
}

/// Maps onboarding responses to a catalog soul color.
#[async_trait]
pub trait SoulColorClassifier: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(&self, responses: &[String]) -> Result<Classification, ClassifierError>;
}

/// Wraps a classifier so that failures never reach the user.
///
/// On any error, or a reply naming a color outside the catalog, a color is
/// picked from a hash of the responses. The same responses always land on
/// the same color. With no inner classifier every call takes the fallback.
pub struct FallbackClassifier {
    inner: Option<Box<dyn SoulColorClassifier>>,
}

impl FallbackClassifier {
    pub fn new(inner: impl SoulColorClassifier + 'static) -> Self {
        Self {
            inner: Some(Box::new(inner)),
        }
    }

    /// No upstream; always use the hash pick.
    pub fn offline() -> Self {
        Self { inner: None }
    }

    pub fn has_upstream(&self) -> bool {
        self.inner.is_some()
    }
}

#[async_trait]
impl SoulColorClassifier for FallbackClassifier {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn classify(&self, responses: &[String]) -> Result<Classification, ClassifierError> {
        if responses.iter().all(|r| r.trim().is_empty()) {
            return Err(ClassifierError::NoResponses);
        }

        let Some(inner) = &self.inner else {
            return Ok(fallback(responses, REASON_API_ERROR));
        };

        match inner.classify(responses).await {
            Ok(c) if catalog::is_valid(&c.soul_color_id) => Ok(c),
            Ok(c) => {
                warn!(classifier = inner.name(), id = %c.soul_color_id, "Classifier returned unknown color, using fallback");
                Ok(fallback(responses, REASON_UNAVAILABLE_ID))
            }
            Err(ClassifierError::UnknownColor(id)) => {
                warn!(classifier = inner.name(), %id, "Classifier returned unknown color, using fallback");
                Ok(fallback(responses, REASON_UNAVAILABLE_ID))
            }
            Err(e) => {
                warn!(classifier = inner.name(), error = %e, "Classifier failed, using fallback");
                Ok(fallback(responses, REASON_API_ERROR))
            }
        }
    }
}

fn fallback(responses: &[String], reasoning: &str) -> Classification {
    Classification {
        soul_color_id: fallback_color(responses).id.to_string(),
        reasoning: reasoning.to_string(),
    }
}

/// Deterministic catalog pick from a blake3 hash of the responses.
pub fn fallback_color(responses: &[String]) -> &'static SoulColor {
    let mut hasher = blake3::Hasher::new();
    for response in responses {
        hasher.update(response.trim().as_bytes());
        hasher.update(&[0]);
    }
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    let index = u64::from_le_bytes(head) % SOUL_COLORS.len() as u64;
    &SOUL_COLORS[index as usize]
}
