//! Step client — turns prompts into START/THINK/EVALUATE/OUTPUT replies.
//!
//! The main model answers in JSON mode with `{"step": .., "content": ..}`.
//! A reply that does not parse is requested again with backoff; once
//! attempts run out a fallback step is produced so the loop can go on.

use promptlab_core::error::ProviderError;
use promptlab_core::message::Message;
use promptlab_core::provider::ProviderRequest;
use promptlab_core::step::{ConversationStep, StepKind};
use promptlab_providers::{ModelRole, RetryPolicy, RoutedModel};
use serde::Deserialize;
use tracing::{debug, warn};

use super::prompts::{IMPROVEMENT_PROMPT, OUTPUT_PROMPT, SYSTEM_PROMPT, render};

/// A generated step that has not been recorded yet.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReply {
    pub kind: StepKind,
    pub content: String,
}

impl StepReply {
    pub fn new(kind: StepKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(default)]
    step: Option<String>,
    #[serde(default)]
    content: Option<serde_json::Value>,
}

/// Parse a `{"step": .., "content": ..}` reply.
///
/// Both fields must be present and non-empty and the tag must be one of the
/// four step kinds. A Markdown code fence around the object is tolerated.
pub fn parse_step(raw: &str) -> Result<StepReply, ProviderError> {
    let body = strip_code_fence(raw);
    let parsed: RawStep = serde_json::from_str(body).map_err(|_| {
        let preview: String = raw.chars().take(100).collect();
        ProviderError::InvalidResponse(format!("Invalid JSON response: {preview}..."))
    })?;

    let tag = parsed.step.filter(|s| !s.trim().is_empty());
    let content = match parsed.content {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
    .filter(|c| !c.trim().is_empty());

    let (Some(tag), Some(content)) = (tag, content) else {
        return Err(ProviderError::InvalidResponse(
            "Response missing step or content fields".into(),
        ));
    };

    let kind = tag
        .parse::<StepKind>()
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    Ok(StepReply::new(kind, content))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Talks to the main model and the judge on behalf of the orchestrator.
pub struct StepClient {
    main: RoutedModel,
    evaluator: RoutedModel,
    parse_retry: RetryPolicy,
}

impl StepClient {
    pub fn new(main: RoutedModel, evaluator: RoutedModel) -> Self {
        Self {
            main,
            evaluator,
            parse_retry: RetryPolicy::default(),
        }
    }

    /// Set how often an unparseable JSON reply is requested again.
    pub fn with_parse_retry(mut self, policy: RetryPolicy) -> Self {
        self.parse_retry = policy;
        self
    }

    pub fn route(&self, role: ModelRole) -> &RoutedModel {
        match role {
            ModelRole::Main => &self.main,
            ModelRole::Evaluator => &self.evaluator,
        }
    }

    /// Request a JSON step reply and tag it as `expected`.
    ///
    /// Never fails: after the last attempt a fallback step of kind
    /// `expected` describing the error is returned.
    pub async fn generate_step(
        &self,
        role: ModelRole,
        messages: Vec<Message>,
        temperature: f32,
        expected: StepKind,
    ) -> StepReply {
        let routed = self.route(role);
        let request = ProviderRequest::new(&routed.model, messages)
            .with_temperature(temperature)
            .json();
        let max = self.parse_retry.max_attempts;
        let mut attempt = 1;

        let fallback = |e: ProviderError| {
            warn!(%role, error = %e, "Step generation failed, using fallback");
            StepReply::new(
                expected,
                format!("I encountered an error: {e}. Please continue with the next step."),
            )
        };

        loop {
            // Transport errors were already retried by the provider.
            let response = match routed.provider.complete(request.clone()).await {
                Ok(response) => response,
                Err(e) => return fallback(e),
            };

            match parse_step(&response.message.content) {
                Ok(reply) => {
                    if reply.kind != expected {
                        debug!(
                            returned = %reply.kind,
                            expected = %expected,
                            "Model returned a different step tag; recording as expected"
                        );
                    }
                    return StepReply::new(expected, reply.content);
                }
                Err(e) if attempt < max => {
                    warn!(%role, attempt, max_attempts = max, error = %e, "Unusable step reply");
                    tokio::time::sleep(self.parse_retry.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return fallback(e),
            }
        }
    }

    /// Request a free-text reply.
    pub async fn generate_text(
        &self,
        role: ModelRole,
        messages: Vec<Message>,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let routed = self.route(role);
        let request = ProviderRequest::new(&routed.model, messages).with_temperature(temperature);
        let response = routed.provider.complete(request).await?;
        Ok(response.message.content)
    }

    /// The opening START step for a user query.
    pub async fn start_step(&self, query: &str, temperature: f32) -> StepReply {
        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!("User query: \"{query}\"")),
        ];
        self.generate_step(ModelRole::Main, messages, temperature, StepKind::Start)
            .await
    }

    /// A regular THINK step continuing from the recent context.
    pub async fn next_think_step(&self, context: &str, temperature: f32) -> StepReply {
        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!(
                "Based on the recent conversation, provide your next thinking step:\n\n{context}"
            )),
        ];
        self.generate_step(ModelRole::Main, messages, temperature, StepKind::Think)
            .await
    }

    /// A THINK step that revises `previous` according to `evaluation`.
    pub async fn improved_think_step(
        &self,
        previous: &ConversationStep,
        evaluation: &str,
        context: &str,
        temperature: f32,
    ) -> StepReply {
        let number = previous.number.to_string();
        let prompt = render(
            IMPROVEMENT_PROMPT,
            &[
                ("thought_id", previous.id.as_str()),
                ("thought_number", number.as_str()),
                ("previous_thought", previous.content.as_str()),
                ("evaluation", evaluation),
                ("context", context),
            ],
        );

        let content = match self
            .generate_text(ModelRole::Main, vec![Message::user(prompt)], temperature)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Improved thinking failed");
                format!("Error: {e}. Please continue.")
            }
        };

        StepReply::new(StepKind::Think, content)
    }

    /// The final OUTPUT step summarising the whole conversation.
    pub async fn output_step(&self, conversation: &str, temperature: f32) -> StepReply {
        let prompt = render(OUTPUT_PROMPT, &[("conversation", conversation)]);
        self.generate_step(
            ModelRole::Main,
            vec![Message::user(prompt)],
            temperature,
            StepKind::Output,
        )
        .await
    }
}
