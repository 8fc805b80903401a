//! Spam gate — pre-pipeline classification of inbound email.
//!
//! The HTTP layer checks every email against a `SpamClassifier` before the
//! response pipeline runs; spam gets no generated reply. Model training and
//! packaging live outside this repository — the trait is the seam for a
//! served model, and `LexicalSpamClassifier` is the built-in implementation.

mod lexical;

pub use lexical::LexicalSpamClassifier;

use serde::{Deserialize, Serialize};

/// Classification decision threshold on `spam_probability`.
pub const SPAM_THRESHOLD: f32 = 0.5;

/// Predicted label for an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpamLabel {
    Spam,
    Ham,
}

impl std::fmt::Display for SpamLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spam => write!(f, "spam"),
            Self::Ham => write!(f, "ham"),
        }
    }
}

/// Spam-classification result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpamVerdict {
    pub prediction: SpamLabel,
    /// Confidence in the predicted label (probability of that label).
    pub confidence: f32,
    /// Raw probability that the email is spam.
    pub spam_probability: f32,
}

impl SpamVerdict {
    /// Build a verdict from a spam probability, applying the 0.5 threshold.
    pub fn from_probability(spam_probability: f32) -> Self {
        let is_spam = spam_probability > SPAM_THRESHOLD;
        Self {
            prediction: if is_spam { SpamLabel::Spam } else { SpamLabel::Ham },
            confidence: if is_spam {
                spam_probability
            } else {
                1.0 - spam_probability
            },
            spam_probability,
        }
    }

    pub fn is_spam(&self) -> bool {
        self.prediction == SpamLabel::Spam
    }
}

/// Spam classification over raw email text.
pub trait SpamClassifier: Send + Sync {
    fn classify(&self, text: &str) -> SpamVerdict;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_applies_threshold() {
        let spam = SpamVerdict::from_probability(0.9);
        assert!(spam.is_spam());
        assert!((spam.confidence - 0.9).abs() < 1e-6);

        let ham = SpamVerdict::from_probability(0.1);
        assert!(!ham.is_spam());
        assert!((ham.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn verdict_at_threshold_is_ham() {
        let verdict = SpamVerdict::from_probability(0.5);
        assert_eq!(verdict.prediction, SpamLabel::Ham);
    }

    #[test]
    fn label_serialization() {
        assert_eq!(
            serde_json::to_value(SpamLabel::Spam).unwrap(),
            serde_json::json!("spam")
        );
        assert_eq!(SpamLabel::Ham.to_string(), "ham");
    }
}
