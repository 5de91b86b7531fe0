//! Judge feedback: requesting it and classifying it.

use std::sync::Arc;

use promptlab_core::message::Message;
use promptlab_core::step::StepKind;
use promptlab_providers::ModelRole;
use tracing::warn;

use super::client::{StepClient, StepReply};
use super::prompts::{EVALUATION_PROMPT, render};

const POSITIVE_KEYWORDS: &[&str] = &[
    "no suggestions",
    "proceed to output",
    "excellent reasoning",
    "no further improvements",
    "complete and correct",
    "ready for output",
];

const SUGGESTION_KEYWORDS: &[&str] = &[
    "should consider",
    "suggest",
    "recommend",
    "improve",
    "add",
    "include",
    "clarify",
    "missing",
    "consider",
];

/// How the orchestrator should read a piece of judge feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The reasoning is good enough to produce the answer.
    Positive,
    /// The judge asks for concrete changes.
    Suggestions,
    Neutral,
}

/// Lower-cased substring match against the positive phrases.
pub fn is_positive(evaluation: &str) -> bool {
    contains_any(evaluation, POSITIVE_KEYWORDS)
}

/// Lower-cased substring match against the suggestion phrases.
///
/// Matching is literal: "add" also hits "address", and "No suggestions"
/// hits "suggest".
pub fn has_suggestions(evaluation: &str) -> bool {
    contains_any(evaluation, SUGGESTION_KEYWORDS)
}

/// Positive wins over suggestions when both match.
pub fn classify(evaluation: &str) -> Verdict {
    if is_positive(evaluation) {
        Verdict::Positive
    } else if has_suggestions(evaluation) {
        Verdict::Suggestions
    } else {
        Verdict::Neutral
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Asks the judge model to critique a THINK step.
pub struct EvaluationService {
    client: Arc<StepClient>,
    temperature: f32,
}

impl EvaluationService {
    pub fn new(client: Arc<StepClient>, temperature: f32) -> Self {
        Self {
            client,
            temperature,
        }
    }

    /// Critique `thought` given the recent `context`. Always yields an
    /// EVALUATE step; transport failures become the step's content.
    pub async fn evaluate(&self, thought: &str, context: &str) -> StepReply {
        let prompt = render(
            EVALUATION_PROMPT,
            &[("context", context), ("thought", thought)],
        );

        let content = match self
            .client
            .generate_text(
                ModelRole::Evaluator,
                vec![Message::user(prompt)],
                self.temperature,
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Evaluation failed");
                format!("Evaluation error: {e}. Please continue with the next step.")
            }
        };

        StepReply::new(StepKind::Evaluate, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_helpers::*;
    use promptlab_core::error::ProviderError;

    #[test]
    fn positive_phrases_are_case_insensitive() {
        assert!(is_positive("No suggestions - ready for output."));
        assert!(is_positive("EXCELLENT REASONING overall"));
        assert!(!is_positive("Looks fine."));
    }

    #[test]
    fn suggestion_matching_is_literal() {
        assert!(has_suggestions("You should clarify the base case"));
        assert!(has_suggestions("Please address the overflow"));
        assert!(has_suggestions("No suggestions - ready for output."));
        assert!(!has_suggestions("Looks fine."));
    }

    #[test]
    fn classify_prefers_positive() {
        assert_eq!(classify("No suggestions - ready for output."), Verdict::Positive);
        assert_eq!(classify("Consider negative inputs"), Verdict::Suggestions);
        assert_eq!(classify("Looks fine."), Verdict::Neutral);
    }

    #[tokio::test]
    async fn evaluate_uses_judge_model() {
        let main = Arc::new(SequentialMockProvider::texts(&[]));
        let judge = Arc::new(SequentialMockProvider::texts(&["Recommend handling 1"]));
        let client = Arc::new(StepClient::new(
            routed(main.clone(), "main"),
            routed(judge.clone(), "judge"),
        ));
        let service = EvaluationService::new(client, 0.1);

        let reply = service.evaluate("check divisors up to n", "START: primes").await;
        assert_eq!(reply, StepReply::new(StepKind::Evaluate, "Recommend handling 1"));
        assert_eq!(main.call_count(), 0);

        let prompt = &judge.requests()[0].messages[0].content;
        assert!(prompt.contains("check divisors up to n"));
        assert!(prompt.contains("START: primes"));
    }

    #[tokio::test]
    async fn evaluate_error_becomes_content() {
        let main = Arc::new(SequentialMockProvider::texts(&[]));
        let judge = Arc::new(SequentialMockProvider::new(vec![Err(ProviderError::Timeout(
            "30s".into(),
        ))]));
        let client = Arc::new(StepClient::new(routed(main, "main"), routed(judge, "judge")));

        let reply = EvaluationService::new(client, 0.1).evaluate("t", "c").await;
        assert_eq!(reply.kind, StepKind::Evaluate);
        assert!(reply.content.starts_with("Evaluation error: Request timed out: 30s"));
    }
}
