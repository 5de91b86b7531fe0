//! Prompting patterns.
//!
//! 1. **Zero/few-shot** — a persona prompt with or without worked examples
//! 2. **Self-consistency** — several varied samples, majority vote on the answer
//! 3. **Judge** — chain-of-thought reviewed step by step by a second model

pub mod judge;
pub mod prompting;
pub mod self_consistency;

pub use judge::{ChainOrchestrator, ChainOutcome, ChainSettings, ChainStats, StepClient};
pub use prompting::{PromptAnswer, PromptTemplate, run_prompt};
pub use self_consistency::{
    AttemptRecord, SamplingParams, SelfConsistency, SelfConsistencyReport, VoteResult,
    majority_vote,
};

#[cfg(test)]
pub(crate) mod test_helpers;
