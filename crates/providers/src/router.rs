//! Provider router — maps each model role to a provider and a model name.
//!
//! PromptLab talks to two endpoints: the main model and the judge. The
//! router builds both from config and wraps them in the retry policy.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use promptlab_config::{AppConfig, EndpointConfig};
use promptlab_core::provider::Provider;
use crate::openai_compat::{GEMINI_BASE_URL, OPENAI_BASE_URL, OpenAiCompatProvider};
use crate::retry::{RetryPolicy, RetryProvider};

/// Which side of the conversation a call is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelRole {
    /// Writes START, THINK and OUTPUT steps, answers the prompting demos
    Main,
    /// The external judge
    Evaluator,
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelRole::Main => f.write_str("main"),
            ModelRole::Evaluator => f.write_str("evaluator"),
        }
    }
}

/// A provider together with the model to request from it.
#[derive(Clone)]
pub struct RoutedModel {
    pub provider: Arc<dyn Provider>,
    /// Model id sent in requests
    pub model: String,
    /// Name recorded on steps
    pub label: String,
}

impl RoutedModel {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            provider,
            label: model.clone(),
            model,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Routes requests to the provider registered for a role.
#[derive(Clone, Default)]
pub struct ProviderRouter {
    routes: HashMap<ModelRole, RoutedModel>,
}

impl ProviderRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the route for a role.
    pub fn register(&mut self, role: ModelRole, routed: RoutedModel) {
        self.routes.insert(role, routed);
    }

    pub fn get(&self, role: ModelRole) -> Option<&RoutedModel> {
        self.routes.get(&role)
    }

    /// List registered roles with their provider and model.
    pub fn list(&self) -> Vec<(ModelRole, &str, &str)> {
        let mut entries: Vec<_> = self
            .routes
            .iter()
            .map(|(role, r)| (*role, r.provider.name(), r.model.as_str()))
            .collect();
        entries.sort_by_key(|(role, _, _)| *role == ModelRole::Evaluator);
        entries
    }
}

/// Build both routes from configuration.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let policy = RetryPolicy::from_config(&config.retry);
    let timeout = Duration::from_secs(config.retry.request_timeout_secs);

    let mut router = ProviderRouter::new();
    router.register(ModelRole::Main, build_route(&config.main, policy, timeout));
    router.register(
        ModelRole::Evaluator,
        build_route(&config.evaluator, policy, timeout),
    );
    router
}

fn build_route(endpoint: &EndpointConfig, policy: RetryPolicy, timeout: Duration) -> RoutedModel {
    let base_url = endpoint
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(&endpoint.provider));

    let http = Arc::new(OpenAiCompatProvider::with_timeout(
        &endpoint.provider,
        base_url,
        endpoint.api_key.clone().unwrap_or_default(),
        timeout,
    ));

    RoutedModel::new(Arc::new(RetryProvider::new(http, policy)), &endpoint.model)
        .with_label(endpoint.label())
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => OPENAI_BASE_URL.into(),
        "gemini" => GEMINI_BASE_URL.into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
