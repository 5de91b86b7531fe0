//! `promptlab judge` — chain-of-thought with an external evaluator.

use promptlab_agent::patterns::judge::is_positive;
use promptlab_agent::{ChainEvent, ChainOrchestrator, ChainOutcome, ChainSettings, StepClient};
use promptlab_core::step::StepKind;
use promptlab_providers::router::build_from_config;
use promptlab_providers::{ModelRole, RetryPolicy};
use tokio::sync::mpsc;

use super::{load_config, preview, route};

const DEFAULT_QUERY: &str = "Write code in JS to find a prime number";

pub async fn run(query: Option<String>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    config.require_all_keys()?;

    let query = query.unwrap_or_else(|| DEFAULT_QUERY.into());
    let router = build_from_config(&config);
    let client = StepClient::new(
        route(&router, ModelRole::Main)?,
        route(&router, ModelRole::Evaluator)?,
    )
    .with_parse_retry(RetryPolicy::from_config(&config.retry));

    let mut orchestrator = ChainOrchestrator::new(client, ChainSettings::from(&config.chain));

    let printer = if json {
        None
    } else {
        println!("🚀 Starting Chain-of-Thought Reasoning");
        println!("📝 User Query: \"{query}\"");
        println!("{}", "=".repeat(60));

        let (tx, rx) = mpsc::channel(32);
        orchestrator = orchestrator.with_events(tx);
        Some(tokio::spawn(print_events(rx)))
    };

    let outcome = orchestrator.run(&query).await;
    // Closes the event channel so the printer can finish.
    drop(orchestrator);
    if let Some(printer) = printer {
        printer.await?;
    }
    let outcome = outcome?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_summary(&outcome);
    }
    Ok(())
}

async fn print_events(mut rx: mpsc::Receiver<ChainEvent>) {
    let mut next_number = 1;
    while let Some(event) = rx.recv().await {
        match event {
            ChainEvent::Generating { kind, model } => {
                println!(
                    "\n{} Step {next_number}: Generating {kind} [{model}]...",
                    emoji(kind)
                );
            }
            ChainEvent::Step { step } => {
                next_number = step.number + 1;
                println!("{} Step {}: {}", emoji(step.kind), step.number, step.kind);
                println!("   Content: {}", preview(&step.content, 100));
                if step.kind == StepKind::Evaluate {
                    let verdict = if is_positive(&step.content) {
                        "✅ Positive"
                    } else {
                        "💡 Suggestions provided"
                    };
                    println!("   Evaluation: {verdict}");
                }
            }
            ChainEvent::Finished { total_steps, .. } => {
                println!("\n{}", "=".repeat(60));
                println!("✅ Reasoning completed successfully!");
                println!("📊 Total steps: {total_steps}");
            }
        }
    }
}

fn print_summary(outcome: &ChainOutcome) {
    println!("\n📊 COMPLETE CONVERSATION HISTORY:");
    println!("{}", "=".repeat(60));
    for step in outcome.steps() {
        let model = step
            .model
            .as_deref()
            .map(|m| format!(" [{m}]"))
            .unwrap_or_default();
        println!("\n{}. {}{model}:", step.number, step.kind);
        println!("{}", step.content);
        println!(
            "   Time: {}",
            step.created_at.with_timezone(&chrono::Local).format("%H:%M:%S")
        );
        println!("{}", "-".repeat(50));
    }

    if let Some(answer) = outcome.final_answer() {
        println!("\n✨ FINAL ANSWER:");
        println!("⭐ {answer}");
    }

    let stats = outcome.stats();
    println!("\n📈 STATISTICS:");
    println!("Total steps: {}", stats.total);
    for (kind, count) in &stats.counts {
        println!("{kind}: {count}");
    }
    println!("\n⏱️  Total time: {}ms", stats.elapsed_ms);
}

fn emoji(kind: StepKind) -> &'static str {
    match kind {
        StepKind::Start => "🚀",
        StepKind::Think => "🧠",
        StepKind::Evaluate => "⚖️",
        StepKind::Output => "🎯",
    }
}
