//! Soul colors: the catalog and the classifiers that assign one.
//!
//! `GeminiClassifier` asks the model; `FallbackClassifier` wraps it so a
//! failed or nonsensical reply still yields a catalog color.

pub mod catalog;
pub mod classifier;
pub mod gemini;

pub use catalog::{gradient_for, is_valid, lookup, Gradient, SoulColor, DEFAULT_GRADIENT, SOUL_COLORS};
pub use classifier::{
    fallback_color, Classification, ClassifierError, FallbackClassifier, SoulColorClassifier,
};
pub use gemini::GeminiClassifier;
