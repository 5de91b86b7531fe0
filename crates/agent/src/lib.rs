//! Prompt-engineering patterns for PromptLab.
//!
//! Every pattern talks to models only through [`RoutedModel`]s, so the same
//! code runs against OpenAI, Gemini, or a scripted test provider.
//!
//! [`RoutedModel`]: promptlab_providers::RoutedModel

pub mod chain_event;
pub mod patterns;

pub use chain_event::ChainEvent;
pub use patterns::{ChainOrchestrator, ChainOutcome, ChainSettings, ChainStats, StepClient};
pub use patterns::{PromptAnswer, PromptTemplate, run_prompt};
pub use patterns::{
    AttemptRecord, SamplingParams, SelfConsistency, SelfConsistencyReport, VoteResult,
    majority_vote,
};
