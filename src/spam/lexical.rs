//! Lexical spam classifier — weighted regex signals over cleaned text.
//!
//! Normalizes the email the same way the training pipeline does (strip URLs,
//! addresses, phone numbers, digits, punctuation), scores a set of weighted
//! spam signals, and squashes the sum through a logistic into a probability.

use regex::Regex;

use super::{SpamClassifier, SpamVerdict};

/// A weighted spam signal matched against the cleaned text.
struct Signal {
    name: &'static str,
    regex: Regex,
    weight: f32,
}

/// Bias term — the score of an email with no signals at all.
const BIAS: f32 = -2.2;

/// Weight for shouted words (two or more all-caps words of 3+ letters).
const SHOUTING_WEIGHT: f32 = 0.8;

/// Weight for repeated exclamation marks.
const EXCLAMATION_WEIGHT: f32 = 0.5;

/// Weight for dollar amounts in the raw text.
const MONEY_AMOUNT_WEIGHT: f32 = 0.6;

/// Regex-based spam classifier over normalized email text.
pub struct LexicalSpamClassifier {
    url_re: Regex,
    email_re: Regex,
    long_digits_re: Regex,
    phone_re: Regex,
    non_alpha_re: Regex,
    whitespace_re: Regex,
    shouting_re: Regex,
    dollar_re: Regex,
    signals: Vec<Signal>,
}

impl LexicalSpamClassifier {
    pub fn new() -> Self {
        let signals = vec![
            Signal {
                name: "free offer",
                regex: Regex::new(r"\bfree\b").unwrap(),
                weight: 0.9,
            },
            Signal {
                name: "winner bait",
                regex: Regex::new(r"\b(win|winner|won)\b").unwrap(),
                weight: 1.1,
            },
            Signal {
                name: "prize bait",
                regex: Regex::new(r"\b(prize|reward|jackpot|lottery)\b").unwrap(),
                weight: 1.0,
            },
            Signal {
                name: "click here",
                regex: Regex::new(r"\bclick here\b").unwrap(),
                weight: 1.2,
            },
            Signal {
                name: "urgency",
                regex: Regex::new(r"\b(urgent|act now|limited time|expires)\b").unwrap(),
                weight: 1.0,
            },
            Signal {
                name: "congratulations",
                regex: Regex::new(r"\bcongratulations?\b").unwrap(),
                weight: 0.9,
            },
            Signal {
                name: "claim prompt",
                regex: Regex::new(r"\bclaim\b").unwrap(),
                weight: 0.8,
            },
            Signal {
                name: "easy money",
                regex: Regex::new(r"\b(cash|money)\b").unwrap(),
                weight: 0.7,
            },
            Signal {
                name: "call/text prompt",
                regex: Regex::new(r"\b(call now|text (yes|stop|win)|reply (yes|now))\b").unwrap(),
                weight: 1.1,
            },
            Signal {
                name: "account scare",
                regex: Regex::new(r"\baccount\b.*\b(closed|suspended|locked)\b").unwrap(),
                weight: 1.0,
            },
            Signal {
                name: "verify prompt",
                regex: Regex::new(r"\bverify\b").unwrap(),
                weight: 0.8,
            },
        ];

        Self {
            url_re: Regex::new(r"(?i)\b(?:https?://|www\.)\S+").unwrap(),
            email_re: Regex::new(r"\S+@\S+").unwrap(),
            long_digits_re: Regex::new(r"\b\d{10,}\b").unwrap(),
            phone_re: Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap(),
            non_alpha_re: Regex::new(r"[^a-z\s]").unwrap(),
            whitespace_re: Regex::new(r"\s+").unwrap(),
            shouting_re: Regex::new(r"\b[A-Z]{3,}\b").unwrap(),
            dollar_re: Regex::new(r"\$\d").unwrap(),
            signals,
        }
    }

    /// Normalize text the way the training preprocessing does: lowercase,
    /// strip URLs/addresses/phone numbers/digit runs, keep letters only.
    fn clean_text(&self, text: &str) -> String {
        let text = text.to_lowercase();
        let text = self.url_re.replace_all(&text, "");
        let text = self.email_re.replace_all(&text, "");
        let text = self.long_digits_re.replace_all(&text, "");
        let text = self.phone_re.replace_all(&text, "");
        let text = self.non_alpha_re.replace_all(&text, " ");
        self.whitespace_re.replace_all(&text, " ").trim().to_string()
    }

    /// Raw score before the logistic squash.
    fn score(&self, raw: &str, cleaned: &str) -> f32 {
        let mut score = BIAS;

        for signal in &self.signals {
            if signal.regex.is_match(cleaned) {
                tracing::trace!(signal = signal.name, "Spam signal matched");
                score += signal.weight;
            }
        }

        // Shouting and punctuation density are only visible in the raw text.
        if self.shouting_re.find_iter(raw).count() >= 2 {
            score += SHOUTING_WEIGHT;
        }
        if raw.matches('!').count() >= 2 {
            score += EXCLAMATION_WEIGHT;
        }
        if self.dollar_re.is_match(raw) {
            score += MONEY_AMOUNT_WEIGHT;
        }

        score
    }
}

impl Default for LexicalSpamClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SpamClassifier for LexicalSpamClassifier {
    fn classify(&self, text: &str) -> SpamVerdict {
        let cleaned = self.clean_text(text);
        let score = self.score(text, &cleaned);
        let probability = 1.0 / (1.0 + (-score).exp());
        SpamVerdict::from_probability(probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spam::SpamLabel;

    #[test]
    fn clean_text_strips_noise() {
        let classifier = LexicalSpamClassifier::new();
        let cleaned = classifier.clean_text(
            "Visit https://deals.example.com or email sales@example.com, call 555-123-4567!",
        );
        assert!(!cleaned.contains("http"));
        assert!(!cleaned.contains('@'));
        assert!(!cleaned.contains('5'));
        assert!(!cleaned.contains('!'));
    }

    #[test]
    fn flags_free_money_bait() {
        let classifier = LexicalSpamClassifier::new();
        let verdict =
            classifier.classify("FREE MONEY! Click here to win $1000 now! Call 1-800-WINNER");
        assert_eq!(verdict.prediction, SpamLabel::Spam);
        assert!(verdict.spam_probability > 0.9);
    }

    #[test]
    fn flags_prize_claim_bait() {
        let classifier = LexicalSpamClassifier::new();
        let verdict =
            classifier.classify("Congratulations! You've won a FREE iPhone! Text YES to claim");
        assert_eq!(verdict.prediction, SpamLabel::Spam);
    }

    #[test]
    fn flags_account_scare() {
        let classifier = LexicalSpamClassifier::new();
        let verdict =
            classifier.classify("URGENT! Your account will be closed unless you verify now!");
        assert_eq!(verdict.prediction, SpamLabel::Spam);
    }

    #[test]
    fn passes_customer_service_email() {
        let classifier = LexicalSpamClassifier::new();
        let verdict =
            classifier.classify("Hi, I would like to return my damaged product. Can you help?");
        assert_eq!(verdict.prediction, SpamLabel::Ham);
        assert!(verdict.spam_probability < 0.5);
    }

    #[test]
    fn passes_plain_scheduling_email() {
        let classifier = LexicalSpamClassifier::new();
        let verdict = classifier.classify("Meeting scheduled for tomorrow at 3pm. See you there.");
        assert_eq!(verdict.prediction, SpamLabel::Ham);
    }

    #[test]
    fn passes_return_request() {
        let classifier = LexicalSpamClassifier::new();
        let verdict = classifier.classify(
            "I would like to return my laptop purchased last week, screen is cracked.",
        );
        assert_eq!(verdict.prediction, SpamLabel::Ham);
    }

    #[test]
    fn empty_text_is_ham() {
        let classifier = LexicalSpamClassifier::new();
        let verdict = classifier.classify("");
        assert_eq!(verdict.prediction, SpamLabel::Ham);
    }
}
