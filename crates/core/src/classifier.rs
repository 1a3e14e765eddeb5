//! Emergency classification.
//!
//! A conservative keyword heuristic: a request is flagged when the model output or the
//! patient's own description mentions any indicator phrase, or when the self-reported severity
//! reaches [`EMERGENCY_SEVERITY_THRESHOLD`]. False positives are accepted; the flag is advisory
//! and only drives record keeping and display.
//!
//! Checks run in a fixed order (model output, symptoms, severity) so the reported
//! [`EmergencySignal`] is deterministic. The boolean result is a plain OR of the three.

use crate::constants::EMERGENCY_SEVERITY_THRESHOLD;
use quackhub_types::lenient;

/// Phrases that mark a request as a potential emergency. Matched case-insensitively as
/// substrings.
pub const EMERGENCY_INDICATORS: [&str; 12] = [
    "emergency",
    "urgent",
    "911",
    "chest pain",
    "difficulty breathing",
    "severe bleeding",
    "unconscious",
    "stroke",
    "heart attack",
    "severe pain",
    "immediate",
    "life-threatening",
];

/// Which check produced a positive classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmergencySignal {
    ModelOutput { phrase: String },
    Symptoms { phrase: String },
    Severity(i64),
}

/// Pluggable emergency decision.
///
/// Implementations must be pure: same inputs, same answer, no side effects, no failure.
pub trait EmergencyPredicate: Send + Sync {
    /// Returns the first matching signal, or `None` when nothing indicates an emergency.
    fn assess(
        &self,
        model_output: &str,
        symptoms: &str,
        severity: Option<i64>,
    ) -> Option<EmergencySignal>;

    fn is_emergency(&self, model_output: &str, symptoms: &str, severity: Option<i64>) -> bool {
        self.assess(model_output, symptoms, severity).is_some()
    }
}

/// Keyword and severity-threshold classifier.
#[derive(Clone, Debug)]
pub struct KeywordClassifier {
    phrases: Vec<String>,
    severity_threshold: i64,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(EMERGENCY_INDICATORS, EMERGENCY_SEVERITY_THRESHOLD)
    }
}

impl KeywordClassifier {
    /// Builds a classifier over a custom phrase list. Blank phrases are dropped.
    pub fn new<I, S>(phrases: I, severity_threshold: i64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        Self {
            phrases,
            severity_threshold,
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn severity_threshold(&self) -> i64 {
        self.severity_threshold
    }

    fn first_phrase_in(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.phrases
            .iter()
            .find(|phrase| lowered.contains(phrase.as_str()))
            .map(String::as_str)
    }
}

impl EmergencyPredicate for KeywordClassifier {
    fn assess(
        &self,
        model_output: &str,
        symptoms: &str,
        severity: Option<i64>,
    ) -> Option<EmergencySignal> {
        if let Some(phrase) = self.first_phrase_in(model_output) {
            return Some(EmergencySignal::ModelOutput {
                phrase: phrase.to_string(),
            });
        }

        if let Some(phrase) = self.first_phrase_in(symptoms) {
            return Some(EmergencySignal::Symptoms {
                phrase: phrase.to_string(),
            });
        }

        severity
            .filter(|s| *s >= self.severity_threshold)
            .map(EmergencySignal::Severity)
    }
}

/// Classifies with the default indicator list and threshold.
pub fn classify(model_output: &str, symptoms: &str, severity: Option<i64>) -> bool {
    KeywordClassifier::default().is_emergency(model_output, symptoms, severity)
}

/// Reads a severity from free text. Real-valued text is truncated; anything that is not a
/// number counts as absent.
pub fn parse_severity(input: &str) -> Option<i64> {
    lenient::parse_truncated(input)
}
