//! Self-consistency — sample one question several times and vote.
//!
//! The same chain-of-thought prompt is sent N times with a gradient of
//! sampling parameters. Each completion's `Final Answer:` line is extracted
//! and the most frequent answer wins.

use promptlab_core::message::Message;
use promptlab_core::provider::ProviderRequest;
use promptlab_providers::RoutedModel;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Answer recorded when a completion has no usable `Final Answer:` line.
pub const UNKNOWN_ANSWER: &str = "Unknown";

const FINAL_ANSWER_MARKER: &str = "final answer:";

/// The step-by-step prompt sent on every attempt.
pub fn cot_prompt(question: &str) -> String {
    format!(
        "Think step by step about this question. Provide a well-reasoned answer.\n\
         \n\
         Question: {question}\n\
         \n\
         Reasoning process:\n\
         1. Analyze what is being asked\n\
         2. Consider the most logical approach\n\
         3. Work through the solution carefully\n\
         4. Arrive at a reasonable conclusion\n\
         \n\
         Final Answer: [Provide the direct answer here]"
    )
}

/// Sampling parameters for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub max_tokens: u32,
}

impl SamplingParams {
    /// Parameters for the 0-based attempt `index`.
    ///
    /// Temperature 0.3, 0.45, 0.6, …; top_p 0.8, 0.84, …; frequency penalty
    /// 0.0, 0.1, …. top_p is capped at 1.0 for long runs.
    pub fn for_attempt(index: usize) -> Self {
        let i = index as f32;
        Self {
            temperature: (0.3 + 0.15 * i).min(2.0),
            top_p: (0.8 + 0.04 * i).min(1.0),
            frequency_penalty: (0.1 * i).min(2.0),
            max_tokens: 800,
        }
    }
}

/// Pull the answer out of a completion's `Final Answer:` line.
///
/// The marker is matched case-insensitively. Bold markers and a single pair
/// of surrounding brackets are removed. Returns [`UNKNOWN_ANSWER`] if the
/// marker is missing or nothing follows it.
pub fn extract_final_answer(content: &str) -> String {
    let lowered = content.to_ascii_lowercase();
    let Some(pos) = lowered.find(FINAL_ANSWER_MARKER) else {
        return UNKNOWN_ANSWER.to_string();
    };

    let rest = content[pos + FINAL_ANSWER_MARKER.len()..].trim_start();
    let line = rest.split('\n').next().unwrap_or_default();

    let cleaned = line.trim().replace("**", "");
    let cleaned = cleaned.strip_prefix('[').unwrap_or(&cleaned);
    let cleaned = cleaned.strip_suffix(']').unwrap_or(cleaned).trim();

    if cleaned.is_empty() {
        UNKNOWN_ANSWER.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Outcome of a majority vote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteResult {
    pub answer: String,
    pub votes: usize,
    pub total: usize,
    /// `votes / total`
    pub confidence: f64,
    /// Every distinct answer with its count, in first-seen order
    pub distribution: Vec<(String, usize)>,
}

/// Count answers and pick the most frequent one.
///
/// Ties go to the answer seen first. Returns `None` for an empty slice.
pub fn majority_vote<S: AsRef<str>>(answers: &[S]) -> Option<VoteResult> {
    let mut distribution: Vec<(String, usize)> = Vec::new();
    for answer in answers {
        let answer = answer.as_ref();
        match distribution.iter_mut().find(|(a, _)| a == answer) {
            Some((_, count)) => *count += 1,
            None => distribution.push((answer.to_string(), 1)),
        }
    }

    let mut winner: Option<&(String, usize)> = None;
    for entry in &distribution {
        if winner.is_none_or(|w| entry.1 > w.1) {
            winner = Some(entry);
        }
    }
    let (answer, votes) = winner.cloned()?;

    let total = answers.len();
    Some(VoteResult {
        answer,
        votes,
        total,
        confidence: votes as f64 / total as f64,
        distribution,
    })
}

/// One sampled completion.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    /// 1-based
    pub attempt: usize,
    pub params: SamplingParams,
    pub content: String,
    pub final_answer: String,
}

/// Everything a self-consistency run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SelfConsistencyReport {
    pub question: String,
    pub requested: usize,
    /// Successful attempts only
    pub attempts: Vec<AttemptRecord>,
    /// `None` if every attempt failed
    pub vote: Option<VoteResult>,
}

/// Runs self-consistency voting against one model.
pub struct SelfConsistency {
    model: RoutedModel,
    pause: Duration,
}

impl SelfConsistency {
    pub fn new(model: RoutedModel) -> Self {
        Self {
            model,
            pause: Duration::from_millis(300),
        }
    }

    /// Set the pause between attempts.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Sample `attempts` completions sequentially and vote on their answers.
    ///
    /// A failed attempt is logged and left out of the vote.
    pub async fn solve(&self, question: &str, attempts: usize) -> SelfConsistencyReport {
        let prompt = cot_prompt(question);
        let mut records = Vec::with_capacity(attempts);

        info!(attempts, model = %self.model.model, "Self-consistency: sampling");

        for index in 0..attempts {
            let params = SamplingParams::for_attempt(index);
            let request = ProviderRequest::new(&self.model.model, vec![Message::user(&prompt)])
                .with_temperature(params.temperature)
                .with_top_p(params.top_p)
                .with_frequency_penalty(params.frequency_penalty)
                .with_max_tokens(params.max_tokens);

            match self.model.provider.complete(request).await {
                Ok(response) => {
                    let content = response.message.content;
                    let final_answer = extract_final_answer(&content);
                    info!(
                        attempt = index + 1,
                        temperature = params.temperature,
                        answer = %final_answer,
                        "Self-consistency: attempt complete"
                    );
                    records.push(AttemptRecord {
                        attempt: index + 1,
                        params,
                        content,
                        final_answer,
                    });
                }
                Err(e) => {
                    warn!(attempt = index + 1, error = %e, "Self-consistency: attempt failed");
                }
            }

            if index + 1 < attempts && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
        }

        let answers: Vec<&str> = records.iter().map(|r| r.final_answer.as_str()).collect();
        let vote = majority_vote(&answers);

        SelfConsistencyReport {
            question: question.to_string(),
            requested: attempts,
            attempts: records,
            vote,
        }
    }
}
