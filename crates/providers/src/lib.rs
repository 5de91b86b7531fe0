//! Chat-completion provider implementations for PromptLab.
//!
//! All providers implement the `promptlab_core::Provider` trait.
//! The router hands out one retried provider per model role.

pub mod openai_compat;
pub mod retry;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use retry::{RetryPolicy, RetryProvider};
pub use router::{ModelRole, ProviderRouter, RoutedModel};
