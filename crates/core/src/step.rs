//! Conversation steps — the append-only log of a chain-of-thought run.
//!
//! Every step produced by the main model or the judge is recorded here in
//! order. Steps are never edited or removed; an improved thought is a new
//! THINK step, not a rewrite of the old one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four fixed step tags of the START → THINK → EVALUATE → OUTPUT protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepKind {
    Start,
    Think,
    Evaluate,
    Output,
}

impl StepKind {
    pub const ALL: [StepKind; 4] = [
        StepKind::Start,
        StepKind::Think,
        StepKind::Evaluate,
        StepKind::Output,
    ];

    /// The wire tag, e.g. `"THINK"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Start => "START",
            StepKind::Think => "THINK",
            StepKind::Evaluate => "EVALUATE",
            StepKind::Output => "OUTPUT",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown step tag: {0:?}")]
pub struct StepParseError(pub String);

impl FromStr for StepKind {
    type Err = StepParseError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        StepKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| StepParseError(tag.to_string()))
    }
}

/// A single recorded step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationStep {
    /// `"<kind>-<number>-<unix millis>"`, e.g. `think-2-1718000000000`
    pub id: String,

    #[serde(rename = "step")]
    pub kind: StepKind,

    pub content: String,

    /// 1-based, contiguous within a log
    pub number: usize,

    pub created_at: DateTime<Utc>,

    /// Display name of the model that produced the step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Ordered, append-only list of steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepLog {
    steps: Vec<ConversationStep>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step, assigning its number, timestamp and id.
    pub fn push(
        &mut self,
        kind: StepKind,
        content: impl Into<String>,
        model: Option<&str>,
    ) -> &ConversationStep {
        let number = self.steps.len() + 1;
        let created_at = Utc::now();
        let id = format!(
            "{}-{}-{}",
            kind.as_str().to_lowercase(),
            number,
            created_at.timestamp_millis()
        );

        self.steps.push(ConversationStep {
            id,
            kind,
            content: content.into(),
            number,
            created_at,
            model: model.map(str::to_string),
        });

        &self.steps[number - 1]
    }

    pub fn steps(&self) -> &[ConversationStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationStep> {
        self.steps.last()
    }

    /// The last `count` steps, oldest first.
    pub fn recent(&self, count: usize) -> &[ConversationStep] {
        let start = self.steps.len().saturating_sub(count);
        &self.steps[start..]
    }

    pub fn by_kind(&self, kind: StepKind) -> Vec<&ConversationStep> {
        self.steps.iter().filter(|s| s.kind == kind).collect()
    }

    pub fn find(&self, id: &str) -> Option<&ConversationStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Most recent step of `kind`, not counting the last step itself.
    pub fn previous_of_kind(&self, kind: StepKind) -> Option<&ConversationStep> {
        let end = self.steps.len().saturating_sub(1);
        self.steps[..end].iter().rev().find(|s| s.kind == kind)
    }

    /// Every step as `"<KIND> <number>: <content>"`, one per line.
    pub fn full_context(&self) -> String {
        self.steps
            .iter()
            .map(|s| format!("{} {}: {}", s.kind, s.number, s.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The last `count` steps as `"<KIND>: <content>"`, one per line.
    pub fn recent_context(&self, count: usize) -> String {
        self.recent(count)
            .iter()
            .map(|s| format!("{}: {}", s.kind, s.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Step counts per kind, in order of first appearance.
    pub fn kind_counts(&self) -> Vec<(StepKind, usize)> {
        let mut counts: Vec<(StepKind, usize)> = Vec::new();
        for step in &self.steps {
            match counts.iter_mut().find(|(k, _)| *k == step.kind) {
                Some((_, n)) => *n += 1,
                None => counts.push((step.kind, 1)),
            }
        }
        counts
    }

    /// Time between the first and the last step.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        let first = self.steps.first()?;
        let last = self.steps.last()?;
        Some(last.created_at - first.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> StepLog {
        let mut log = StepLog::new();
        log.push(StepKind::Start, "begin", Some("main"));
        log.push(StepKind::Think, "first idea", Some("main"));
        log.push(StepKind::Evaluate, "add edge cases", Some("judge"));
        log.push(StepKind::Think, "better idea", Some("main"));
        log
    }

    #[test]
    fn numbers_are_contiguous_from_one() {
        let log = sample_log();
        let numbers: Vec<usize> = log.steps().iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn id_embeds_kind_and_number() {
        let mut log = StepLog::new();
        let step = log.push(StepKind::Evaluate, "ok", None);
        assert!(step.id.starts_with("evaluate-1-"));
        let id = step.id.clone();
        assert_eq!(log.find(&id).map(|s| s.number), Some(1));
        assert!(log.find("missing").is_none());
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let log = sample_log();
        let tail: Vec<&str> = log.recent(2).iter().map(|s| s.content.as_str()).collect();
        assert_eq!(tail, vec!["add edge cases", "better idea"]);
        assert_eq!(log.recent(10).len(), 4);
        assert!(log.recent(0).is_empty());
    }

    #[test]
    fn previous_of_kind_skips_last_step() {
        let log = sample_log();
        let prev = log.previous_of_kind(StepKind::Think).unwrap();
        assert_eq!(prev.content, "first idea");
        assert!(StepLog::new().previous_of_kind(StepKind::Think).is_none());
    }

    #[test]
    fn context_rendering() {
        let log = sample_log();
        assert!(log.full_context().starts_with("START 1: begin\nTHINK 2: first idea"));
        assert_eq!(log.recent_context(1), "THINK: better idea");
    }

    #[test]
    fn kind_counts_follow_first_appearance() {
        let log = sample_log();
        assert_eq!(
            log.kind_counts(),
            vec![
                (StepKind::Start, 1),
                (StepKind::Think, 2),
                (StepKind::Evaluate, 1)
            ]
        );
        assert_eq!(log.by_kind(StepKind::Think).len(), 2);
    }

    #[test]
    fn step_kind_parses_case_insensitively() {
        assert_eq!(" think ".parse::<StepKind>(), Ok(StepKind::Think));
        assert_eq!("OUTPUT".parse::<StepKind>(), Ok(StepKind::Output));
        assert!("PLAN".parse::<StepKind>().is_err());
    }

    #[test]
    fn step_serializes_with_wire_tag() {
        let mut log = StepLog::new();
        log.push(StepKind::Output, "done", None);
        let json = serde_json::to_value(&log.steps()[0]).unwrap();
        assert_eq!(json["step"], "OUTPUT");
        assert!(json.get("model").is_none());
    }

    #[test]
    fn elapsed_is_none_for_empty_log() {
        assert!(StepLog::new().elapsed().is_none());
        let log = sample_log();
        assert!(log.elapsed().unwrap() >= chrono::Duration::zero());
    }
}
