use serde::{Deserialize, Serialize};

use crate::api::{AssistantReply, SymptomPayload};
use crate::locale::Language;
use crate::MAX_SYMPTOM_CHARS;

pub const DISCLAIMER: &str = "This tool gives general information only and is not a medical \
diagnosis. Please consult a doctor or visit the nearest health centre for proper care. In an \
emergency call 108.";

pub type SymptomCheckResult = AssistantReply;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomRequest {
    pub id: u64,
    pub payload: SymptomPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomChecker {
    pub input: String,
    pub result: Option<SymptomCheckResult>,
    #[serde(skip)]
    request_id: Option<u64>,
    #[serde(skip)]
    next_id: u64,
}

impl SymptomChecker {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.request_id.is_some()
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    #[must_use]
    pub fn input_too_long(&self) -> bool {
        self.input.trim().chars().count() > MAX_SYMPTOM_CHARS
    }

    #[must_use]
    pub fn can_check(&self) -> bool {
        !self.is_pending() && !self.input.trim().is_empty() && !self.input_too_long()
    }

    /// Starts a check of the current input; `None` on blank or over-long
    /// input, or while one is already running. The previous result stays
    /// until the new one arrives.
    pub fn check(&mut self, language: Language) -> Option<SymptomRequest> {
        if !self.can_check() {
            return None;
        }
        let symptoms = self.input.trim().to_string();
        self.next_id += 1;
        self.request_id = Some(self.next_id);
        Some(SymptomRequest {
            id: self.next_id,
            payload: SymptomPayload { symptoms, language },
        })
    }

    /// Replaces the previous result wholesale.
    pub fn receive(&mut self, id: u64, result: SymptomCheckResult) -> bool {
        if self.request_id != Some(id) {
            return false;
        }
        self.request_id = None;
        self.result = Some(result);
        true
    }

    pub fn receive_failure(&mut self, id: u64, message: impl Into<String>) -> bool {
        self.receive(
            id,
            SymptomCheckResult {
                success: false,
                response: message.into(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_does_nothing() {
        let mut checker = SymptomChecker::default();
        checker.set_input("  ");
        assert!(checker.check(Language::En).is_none());
        assert!(!checker.is_pending());
    }

    #[test]
    fn check_while_pending_is_a_no_op() {
        let mut checker = SymptomChecker::default();
        checker.set_input("fever and headache");
        let request = checker.check(Language::Hi).unwrap();
        assert_eq!(request.payload.symptoms, "fever and headache");
        assert_eq!(request.payload.language, Language::Hi);
        assert!(checker.check(Language::Hi).is_none());
    }

    #[test]
    fn over_long_input_is_rejected_whole() {
        let mut checker = SymptomChecker::default();
        checker.set_input("a".repeat(MAX_SYMPTOM_CHARS + 1));
        assert!(checker.input_too_long());
        assert!(checker.check(Language::En).is_none());
        assert!(!checker.is_pending());
        assert_eq!(checker.input.len(), MAX_SYMPTOM_CHARS + 1);

        checker.set_input("a".repeat(MAX_SYMPTOM_CHARS));
        let request = checker.check(Language::En).unwrap();
        assert_eq!(request.payload.symptoms.len(), MAX_SYMPTOM_CHARS);
    }

    #[test]
    fn result_replaces_previous_one() {
        let mut checker = SymptomChecker::default();
        checker.set_input("cough");
        let first = checker.check(Language::En).unwrap();
        checker.receive(
            first.id,
            SymptomCheckResult {
                success: true,
                response: "Rest and fluids".into(),
            },
        );

        let second = checker.check(Language::En).unwrap();
        assert_eq!(checker.result.as_ref().unwrap().response, "Rest and fluids");
        checker.receive_failure(second.id, "Unable to connect");
        let result = checker.result.as_ref().unwrap();
        assert!(!result.success);
        assert_eq!(result.response, "Unable to connect");
    }

    #[test]
    fn stale_answers_are_ignored() {
        let mut checker = SymptomChecker::default();
        checker.set_input("cough");
        let request = checker.check(Language::En).unwrap();
        assert!(!checker.receive(request.id + 1, SymptomCheckResult::default()));
        assert!(checker.is_pending());
    }
}
