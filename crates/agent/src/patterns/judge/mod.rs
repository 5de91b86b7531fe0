//! Chain-of-thought with an external judge ("LLM as judge").
//!
//! A main model reasons step by step in a fixed JSON protocol while a second
//! model critiques every THINK step. Feedback with concrete suggestions makes
//! the main model revise its previous thought.

pub mod client;
pub mod evaluation;
pub mod orchestrator;
pub mod prompts;
pub mod settings;

pub use client::{StepClient, StepReply, parse_step};
pub use evaluation::{EvaluationService, Verdict, classify, has_suggestions, is_positive};
pub use orchestrator::{ChainOrchestrator, ChainOutcome, ChainStats};
pub use settings::ChainSettings;
