//! Shared test helpers for pattern tests.

use promptlab_core::error::ProviderError;
use promptlab_core::message::Message;
use promptlab_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use promptlab_providers::RoutedModel;
use std::sync::{Arc, Mutex};

/// A mock provider that returns a sequence of scripted replies.
///
/// Each call to `complete` returns the next reply in the queue and records
/// the request. Panics if more calls are made than replies provided.
pub struct SequentialMockProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every reply succeeds with the given text.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let replies = self.replies.lock().unwrap();
        let index = requests.len();

        if index >= replies.len() {
            panic!(
                "SequentialMockProvider: no more replies (call #{}, have {})",
                index,
                replies.len()
            );
        }

        requests.push(request);
        replies[index].clone().map(make_text_response)
    }
}

/// Create a simple text response.
pub fn make_text_response(text: String) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A `{"step": .., "content": ..}` reply as the main model would send it.
pub fn step_json(step: &str, content: &str) -> String {
    serde_json::json!({ "step": step, "content": content }).to_string()
}

/// Wrap a mock provider as a routed model with the given label.
pub fn routed(provider: Arc<SequentialMockProvider>, label: &str) -> RoutedModel {
    RoutedModel::new(provider, "mock-model").with_label(label)
}
