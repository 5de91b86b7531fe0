//! End-to-end integration tests for PromptLab.
//!
//! These tests drive the library crates the way the CLI does: config into
//! settings, providers behind the retry layer and router, and each prompting
//! pattern from question to final answer.

use std::sync::Arc;
use std::time::Duration;

use promptlab_agent::{
    ChainEvent, ChainOrchestrator, ChainSettings, PromptTemplate, SelfConsistency, StepClient,
    run_prompt,
};
use promptlab_config::AppConfig;
use promptlab_core::error::ProviderError;
use promptlab_core::message::Message;
use promptlab_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use promptlab_core::step::StepKind;
use promptlab_providers::router::build_from_config;
use promptlab_providers::{ModelRole, ProviderRouter, RetryPolicy, RetryProvider, RoutedModel};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted replies in sequence.
struct ScriptedProvider {
    replies: std::sync::Mutex<Vec<Result<String, ProviderError>>>,
    call_count: std::sync::Mutex<usize>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies),
            call_count: std::sync::Mutex::new(0),
        }
    }

    fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let replies = self.replies.lock().unwrap();
        if *count >= replies.len() {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                *count,
                replies.len()
            );
        }
        let reply = replies[*count].clone();
        *count += 1;
        reply.map(|text| text_response(&text))
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock".into(),
    }
}

fn step(kind: &str, content: &str) -> String {
    serde_json::json!({ "step": kind, "content": content }).to_string()
}

fn retried(provider: Arc<ScriptedProvider>, label: &str) -> RoutedModel {
    let policy = RetryPolicy::new(3, Duration::from_millis(100));
    RoutedModel::new(Arc::new(RetryProvider::new(provider, policy)), "mock-model").with_label(label)
}

fn server_error() -> ProviderError {
    ProviderError::ApiError {
        status_code: 503,
        message: "overloaded".into(),
    }
}

// ── E2E: Judged chain ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn e2e_judge_chain_survives_transient_failures() {
    let main = Arc::new(ScriptedProvider::new(vec![
        Err(server_error()),
        Ok(step("START", "The user wants a JS prime checker")),
        Ok(step("THINK", "Loop from 2 to n-1 and test divisibility")),
        Ok("Loop from 2 to sqrt(n) and test divisibility".into()),
        Ok(step(
            "OUTPUT",
            "function isPrime(n) { for (let i = 2; i * i <= n; i++) if (n % i === 0) return false; return n > 1; }",
        )),
    ]));
    let judge = Arc::new(ScriptedProvider::new(vec![
        Ok("You should consider stopping at sqrt(n).".into()),
        Err(ProviderError::Timeout("30s".into())),
        Ok("Excellent reasoning. No further improvements.".into()),
    ]));

    let client = StepClient::new(
        retried(main.clone(), "GPT-4.1-mini"),
        retried(judge.clone(), "Gemini-2.5-flash"),
    );
    let orchestrator = ChainOrchestrator::new(client, ChainSettings::default());

    let outcome = orchestrator
        .run("Write code in JS to find a prime number")
        .await
        .unwrap();

    use StepKind::*;
    let kinds: Vec<StepKind> = outcome.steps().iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![Start, Think, Evaluate, Think, Evaluate, Output]);

    for (i, s) in outcome.steps().iter().enumerate() {
        assert_eq!(s.number, i + 1);
        let expected_model = if s.kind == Evaluate {
            "Gemini-2.5-flash"
        } else {
            "GPT-4.1-mini"
        };
        assert_eq!(s.model.as_deref(), Some(expected_model));
    }

    assert!(outcome.final_answer().unwrap().contains("isPrime"));
    assert_eq!(main.calls(), 5);
    assert_eq!(judge.calls(), 3);

    let stats = outcome.stats();
    assert_eq!(stats.total, 6);
    assert_eq!(stats.counts[0], (Start, 1));
    assert_eq!(stats.count(Evaluate), 2);
}

#[tokio::test(start_paused = true)]
async fn e2e_judge_chain_streams_events_in_order() {
    let main = Arc::new(ScriptedProvider::new(vec![
        Ok(step("START", "s")),
        Ok(step("THINK", "t")),
        Ok(step("OUTPUT", "o")),
    ]));
    let judge = Arc::new(ScriptedProvider::texts(&["No suggestions - ready for output."]));

    let (tx, mut rx) = tokio::sync::mpsc::channel(32);
    let client = StepClient::new(retried(main, "main"), retried(judge, "judge"));
    let orchestrator = ChainOrchestrator::new(client, ChainSettings::default()).with_events(tx);

    orchestrator.run("q").await.unwrap();
    drop(orchestrator);

    let mut recorded = Vec::new();
    let mut last_type = "";
    while let Some(event) = rx.recv().await {
        last_type = event.event_type();
        if let ChainEvent::Step { step } = event {
            recorded.push(step.kind);
        }
    }
    assert_eq!(
        recorded,
        vec![StepKind::Start, StepKind::Think, StepKind::Evaluate, StepKind::Output]
    );
    assert_eq!(last_type, "finished");
}

#[tokio::test(start_paused = true)]
async fn e2e_judge_outcome_serializes_for_json_mode() {
    let main = Arc::new(ScriptedProvider::new(vec![
        Ok(step("START", "s")),
        Ok(step("THINK", "t")),
        Ok(step("OUTPUT", "final")),
    ]));
    let judge = Arc::new(ScriptedProvider::texts(&["Complete and correct."]));
    let client = StepClient::new(retried(main, "main"), retried(judge, "judge"));

    let outcome = ChainOrchestrator::new(client, ChainSettings::default())
        .run("q")
        .await
        .unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["query"], "q");
    let steps = json["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[3]["step"], "OUTPUT");
    assert_eq!(steps[3]["content"], "final");
    assert_eq!(steps[2]["model"], "judge");
}

// ── E2E: Self-consistency ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn e2e_self_consistency_majority_vote() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok("Cozy and short.\nFinal Answer: Bean There".into()),
        Ok("Reasoning...\nfinal answer: **Bean There**".into()),
        Err(ProviderError::AuthenticationFailed("revoked".into())),
        Ok("Final Answer: [Brew Haven]".into()),
        Ok("No marker at all".into()),
    ]));

    let solver = SelfConsistency::new(retried(provider.clone(), "main"));
    let report = solver
        .solve("Suggest a good name for a coffee shop", 5)
        .await;

    assert_eq!(report.requested, 5);
    assert_eq!(report.attempts.len(), 4);
    // Authentication failures are not retried.
    assert_eq!(provider.calls(), 5);

    let vote = report.vote.unwrap();
    assert_eq!(vote.answer, "Bean There");
    assert_eq!(vote.votes, 2);
    assert_eq!(vote.total, 4);
    assert!((vote.confidence - 0.5).abs() < f64::EPSILON);
    assert_eq!(
        vote.distribution,
        vec![
            ("Bean There".to_string(), 2),
            ("Brew Haven".to_string(), 1),
            ("Unknown".to_string(), 1),
        ]
    );
}

// ── E2E: Zero/few-shot through the router ────────────────────────────────

#[tokio::test]
async fn e2e_few_shot_through_router() {
    let provider = Arc::new(ScriptedProvider::texts(&[
        "Yes! We publish weekly JavaScript lessons.",
    ]));
    let mut router = ProviderRouter::new();
    router.register(
        ModelRole::Main,
        RoutedModel::new(provider.clone(), "gpt-4.1-mini"),
    );

    let main = router.get(ModelRole::Main).unwrap();
    let answer = run_prompt(
        main,
        &PromptTemplate::few_shot_demo(),
        "Hey, do you have a video channel?",
        0.7,
    )
    .await
    .unwrap();

    assert_eq!(answer.content, "Yes! We publish weekly JavaScript lessons.");
    assert_eq!(provider.calls(), 1);
}

// ── E2E: Config into runtime settings ────────────────────────────────────

#[test]
fn e2e_config_file_drives_chain_and_router() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[main]
provider = "openrouter"
model = "openai/gpt-4.1-mini"
display_name = "Router-Main"

[chain]
max_steps = 8
thinking_delay_ms = 0
"#,
    )
    .unwrap();

    let mut config = AppConfig::load_from(&path).unwrap();
    config.apply_env(|key| match key {
        "OPENAI_API_KEY" => Some("sk-test".into()),
        "PROMPTLAB_EVALUATOR_MODEL" => Some("gemini-2.5-pro".into()),
        _ => None,
    });

    let settings = ChainSettings::from(&config.chain);
    assert_eq!(settings.max_steps, 8);
    assert!(settings.thinking_delay.is_zero());
    assert_eq!(settings.evaluator_context, 5);

    let router = build_from_config(&config);
    let main = router.get(ModelRole::Main).unwrap();
    assert_eq!(main.model, "openai/gpt-4.1-mini");
    assert_eq!(main.label, "Router-Main");
    let evaluator = router.get(ModelRole::Evaluator).unwrap();
    assert_eq!(evaluator.model, "gemini-2.5-pro");
    assert_eq!(evaluator.label, "gemini-2.5-pro");

    assert!(config.require_main_key().is_ok());
    let err = config.require_all_keys().unwrap_err();
    assert!(err.to_string().contains("GEMINI_API_KEY"));
}
