//! # PromptLab Core
//!
//! Domain types, traits, and error definitions shared by every PromptLab crate.
//! Nothing here performs I/O: the provider trait is implemented by
//! `promptlab-providers`, the reasoning patterns live in `promptlab-agent`.

pub mod error;
pub mod message;
pub mod provider;
pub mod step;

// Re-export key types at crate root for ergonomics
pub use error::{ChainError, Error, ProviderError, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ResponseFormat, Usage};
pub use step::{ConversationStep, StepKind, StepLog, StepParseError};
