//! Progress events of a judged chain run.
//!
//! The orchestrator can be given a channel sender; each event is sent as it
//! happens so a front end can print steps live.

use promptlab_core::step::{ConversationStep, StepKind};
use serde::{Deserialize, Serialize};

/// Events emitted by [`ChainOrchestrator`](crate::ChainOrchestrator).
///
/// - `generating` — a request for the next step is about to be sent
/// - `step`       — a step was appended to the log
/// - `finished`   — the run is over
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChainEvent {
    /// A model is producing the next step.
    Generating { kind: StepKind, model: String },

    /// A step was recorded.
    Step { step: ConversationStep },

    /// The run produced its OUTPUT step.
    Finished { total_steps: usize, elapsed_ms: i64 },
}

impl ChainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Generating { .. } => "generating",
            Self::Step { .. } => "step",
            Self::Finished { .. } => "finished",
        }
    }
}
