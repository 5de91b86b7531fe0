//! The judged chain-of-thought loop.
//!
//! ```text
//! START ─▶ THINK ─▶ EVALUATE ─┬─ positive ───────────────▶ OUTPUT
//!            ▲                ├─ suggestions ─▶ improved THINK
//!            └────────────────┴─ neutral ─────▶ next THINK
//! ```
//!
//! The main model writes START, THINK and OUTPUT steps; the judge model
//! writes EVALUATE steps. The run always ends with exactly one OUTPUT,
//! forced once the step budget is spent.

use std::sync::Arc;

use promptlab_core::error::{ChainError, Result};
use promptlab_core::step::{ConversationStep, StepKind, StepLog};
use promptlab_providers::ModelRole;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::client::{StepClient, StepReply};
use super::evaluation::{EvaluationService, Verdict, classify, has_suggestions};
use super::settings::ChainSettings;
use crate::chain_event::ChainEvent;

/// Drives one query through the START → THINK ⇄ EVALUATE → OUTPUT protocol.
pub struct ChainOrchestrator {
    client: Arc<StepClient>,
    evaluator: EvaluationService,
    settings: ChainSettings,
    events: Option<mpsc::Sender<ChainEvent>>,
}

impl ChainOrchestrator {
    pub fn new(client: StepClient, settings: ChainSettings) -> Self {
        let client = Arc::new(client);
        let evaluator = EvaluationService::new(client.clone(), settings.evaluation_temperature);
        Self {
            client,
            evaluator,
            settings,
            events: None,
        }
    }

    /// Send progress events to `tx` while running.
    pub fn with_events(mut self, tx: mpsc::Sender<ChainEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    /// Run the chain for `query` on a fresh step log.
    pub async fn run(&self, query: &str) -> Result<ChainOutcome> {
        let mut log = StepLog::new();
        let temperature = self.settings.main_temperature;

        info!(
            query = %query,
            main = %self.client.route(ModelRole::Main).label,
            evaluator = %self.client.route(ModelRole::Evaluator).label,
            max_steps = self.settings.max_steps,
            "Starting judged chain"
        );

        self.announce(StepKind::Start, ModelRole::Main).await;
        let start = self.client.start_step(query, temperature).await;
        self.record(&mut log, start, ModelRole::Main).await;

        while log.len() < self.settings.max_steps {
            let last = log.last().ok_or(ChainError::EmptyConversation)?;

            match last.kind {
                StepKind::Start | StepKind::Evaluate => {
                    let improve = last.kind == StepKind::Evaluate && has_suggestions(&last.content);
                    self.announce(StepKind::Think, ModelRole::Main).await;
                    let think = if improve {
                        self.improved_think(&log).await?
                    } else {
                        let context = log.recent_context(self.settings.improver_context);
                        self.client.next_think_step(&context, temperature).await
                    };
                    self.record(&mut log, think, ModelRole::Main).await;
                }
                StepKind::Think => {
                    let thought = last.content.clone();
                    let context = log.recent_context(self.settings.evaluator_context);

                    self.announce(StepKind::Evaluate, ModelRole::Evaluator).await;
                    let evaluation = self.evaluator.evaluate(&thought, &context).await;
                    self.record(&mut log, evaluation, ModelRole::Evaluator).await;

                    let evaluation = log.last().ok_or(ChainError::EmptyConversation)?;
                    debug!(
                        verdict = ?classify(&evaluation.content),
                        step = evaluation.number,
                        "Evaluation classified"
                    );
                    if self.should_proceed(&evaluation.content, log.len()) {
                        self.output(&mut log).await;
                        break;
                    }
                }
                StepKind::Output => break,
            }

            tokio::time::sleep(self.settings.thinking_delay).await;
        }

        if log.last().map(|s| s.kind) != Some(StepKind::Output) {
            warn!(steps = log.len(), "Step budget spent, forcing OUTPUT");
            self.output(&mut log).await;
        }

        let outcome = ChainOutcome {
            query: query.to_string(),
            log,
        };
        let stats = outcome.stats();
        info!(
            total_steps = stats.total,
            elapsed_ms = stats.elapsed_ms,
            "Judged chain finished"
        );
        self.emit(ChainEvent::Finished {
            total_steps: stats.total,
            elapsed_ms: stats.elapsed_ms,
        })
        .await;

        Ok(outcome)
    }

    /// Proceed on a positive verdict, or near the step budget when the judge
    /// asks for nothing specific.
    fn should_proceed(&self, evaluation: &str, steps: usize) -> bool {
        match classify(evaluation) {
            Verdict::Positive => true,
            _ => {
                steps >= self.settings.max_steps.saturating_sub(2) && !has_suggestions(evaluation)
            }
        }
    }

    async fn improved_think(&self, log: &StepLog) -> Result<StepReply> {
        let evaluation = log.last().ok_or(ChainError::EmptyConversation)?;
        let previous = log
            .previous_of_kind(StepKind::Think)
            .ok_or(ChainError::NoPreviousThink)?;
        let context = log.recent_context(self.settings.improver_context);

        debug!(revises = %previous.id, "Generating improved thinking from feedback");
        Ok(self
            .client
            .improved_think_step(
                previous,
                &evaluation.content,
                &context,
                self.settings.main_temperature,
            )
            .await)
    }

    async fn output(&self, log: &mut StepLog) {
        self.announce(StepKind::Output, ModelRole::Main).await;
        let conversation = log.full_context();
        let output = self
            .client
            .output_step(&conversation, self.settings.main_temperature)
            .await;
        self.record(log, output, ModelRole::Main).await;
    }

    async fn record(&self, log: &mut StepLog, reply: StepReply, role: ModelRole) {
        let label = self.client.route(role).label.as_str();
        let step = log.push(reply.kind, reply.content, Some(label)).clone();
        debug!(step = step.number, kind = %step.kind, model = %label, "Recorded step");
        self.emit(ChainEvent::Step { step }).await;
    }

    async fn announce(&self, kind: StepKind, role: ModelRole) {
        let model = self.client.route(role).label.clone();
        self.emit(ChainEvent::Generating { kind, model }).await;
    }

    async fn emit(&self, event: ChainEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(event).await;
        }
    }
}

/// The finished step log of one run.
#[derive(Debug, Clone, Serialize)]
pub struct ChainOutcome {
    pub query: String,
    #[serde(rename = "steps")]
    pub log: StepLog,
}

impl ChainOutcome {
    pub fn steps(&self) -> &[ConversationStep] {
        self.log.steps()
    }

    /// Content of the OUTPUT step.
    pub fn final_answer(&self) -> Option<&str> {
        self.log
            .steps()
            .iter()
            .rev()
            .find(|s| s.kind == StepKind::Output)
            .map(|s| s.content.as_str())
    }

    pub fn stats(&self) -> ChainStats {
        ChainStats {
            total: self.log.len(),
            counts: self.log.kind_counts(),
            elapsed_ms: self
                .log
                .elapsed()
                .map(|d| d.num_milliseconds())
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainStats {
    pub total: usize,
    /// Per-kind counts in order of first appearance
    pub counts: Vec<(StepKind, usize)>,
    pub elapsed_ms: i64,
}

impl ChainStats {
    pub fn count(&self, kind: StepKind) -> usize {
        self.counts
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}
