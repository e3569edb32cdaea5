//! Motivational feedback: boundary with the external text generator.
//!
//! The engine only hands over two scalars and always ends up with a message:
//! if no generator is configured, or the call fails, the canned default is used.

use thiserror::Error;

use crate::models::RiskLabel;

/// Message used whenever the generator cannot produce one.
pub const DEFAULT_FEEDBACK: &str =
    "Keep up the good work! Consistency is key to your health journey.";

#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    #[error("Generator returned an empty message")]
    EmptyResponse,
}

/// Text generation collaborator (hosted LLM or similar).
pub trait FeedbackGenerator {
    fn generate(&self, prompt: &str) -> Result<String, FeedbackError>;
}

/// Prompt sent to the generator.
pub fn build_feedback_prompt(adherence_percent: f64, risk: RiskLabel) -> String {
    format!(
        "You are a health coach. Patient adherence = {adherence_percent:.1}%, risk = {}. \
         Write one motivational message.",
        risk.as_str()
    )
}

/// Ask the generator for a message, falling back to [`DEFAULT_FEEDBACK`].
pub fn feedback_or_default<G: FeedbackGenerator + ?Sized>(
    generator: Option<&G>,
    adherence_percent: f64,
    risk: RiskLabel,
) -> String {
    let Some(generator) = generator else {
        return DEFAULT_FEEDBACK.to_string();
    };

    let prompt = build_feedback_prompt(adherence_percent, risk);
    let result = generator.generate(&prompt).and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Err(FeedbackError::EmptyResponse)
        } else {
            Ok(trimmed.to_string())
        }
    });

    match result {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(error = %e, "Feedback generation failed, using default message");
            DEFAULT_FEEDBACK.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FixedGenerator(&'static str);

    impl FeedbackGenerator for FixedGenerator {
        fn generate(&self, _prompt: &str) -> Result<String, FeedbackError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;

    impl FeedbackGenerator for FailingGenerator {
        fn generate(&self, _prompt: &str) -> Result<String, FeedbackError> {
            Err(FeedbackError::Unavailable("timeout".into()))
        }
    }

    #[derive(Default)]
    struct RecordingGenerator {
        prompts: RefCell<Vec<String>>,
    }

    impl FeedbackGenerator for RecordingGenerator {
        fn generate(&self, prompt: &str) -> Result<String, FeedbackError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok("Nice streak!".into())
        }
    }

    #[test]
    fn prompt_carries_both_inputs() {
        let prompt = build_feedback_prompt(75.0, RiskLabel::Medium);
        assert_eq!(
            prompt,
            "You are a health coach. Patient adherence = 75.0%, risk = Medium. \
             Write one motivational message."
        );
    }

    #[test]
    fn generated_text_is_trimmed() {
        let g = FixedGenerator("  Great job this week!\n");
        assert_eq!(
            feedback_or_default(Some(&g), 90.0, RiskLabel::Low),
            "Great job this week!"
        );
    }

    #[test]
    fn failure_uses_default() {
        assert_eq!(
            feedback_or_default(Some(&FailingGenerator), 40.0, RiskLabel::High),
            DEFAULT_FEEDBACK
        );
    }

    #[test]
    fn blank_response_uses_default() {
        let g = FixedGenerator("   ");
        assert_eq!(feedback_or_default(Some(&g), 40.0, RiskLabel::High), DEFAULT_FEEDBACK);
    }

    #[test]
    fn missing_generator_uses_default() {
        assert_eq!(
            feedback_or_default::<FixedGenerator>(None, 40.0, RiskLabel::High),
            DEFAULT_FEEDBACK
        );
    }

    #[test]
    fn generator_receives_prompt() {
        let g = RecordingGenerator::default();
        feedback_or_default(Some(&g), 62.5, RiskLabel::Medium);
        let prompts = g.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("adherence = 62.5%"));
        assert!(prompts[0].contains("risk = Medium"));
    }
}
