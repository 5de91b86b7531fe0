//! `promptlab self-consistency` — majority vote over sampled answers.

use std::time::Duration;

use promptlab_agent::{AttemptRecord, SelfConsistency, SelfConsistencyReport};
use promptlab_providers::ModelRole;
use promptlab_providers::router::build_from_config;

use super::{load_config, route};

const DEFAULT_QUESTION: &str = "Suggest a good name for a coffee shop";

pub async fn run(
    question: Option<String>,
    attempts: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    config.require_main_key()?;

    let question = question.unwrap_or_else(|| DEFAULT_QUESTION.into());
    let attempts = attempts.unwrap_or(config.self_consistency.attempts);
    if attempts == 0 {
        return Err("--attempts must be at least 1".into());
    }

    let router = build_from_config(&config);
    let solver = SelfConsistency::new(route(&router, ModelRole::Main)?)
        .with_pause(Duration::from_millis(config.self_consistency.pause_ms));

    println!("❓ QUESTION: {question}");
    println!("🔄 Running {attempts} attempts with varied parameters...\n");

    let report = solver.solve(&question, attempts).await;
    print_report(&report)
}

fn print_report(report: &SelfConsistencyReport) -> Result<(), Box<dyn std::error::Error>> {
    for attempt in &report.attempts {
        println!("{}", format_attempt(attempt));
    }

    let vote = report
        .vote
        .as_ref()
        .ok_or("Every attempt failed; nothing to vote on")?;

    println!("\n🎯 SELF-CONSISTENCY RESULT:");
    println!("Majority Answer: {}", vote.answer);
    println!("Confidence: {}", format_confidence(vote.confidence));
    println!("Based on {} reasoning paths", vote.total);
    if report.attempts.len() < report.requested {
        println!(
            "⚠️  {} of {} attempts failed",
            report.requested - report.attempts.len(),
            report.requested
        );
    }

    println!("\n📊 Answer distribution:");
    for (answer, count) in &vote.distribution {
        println!("  {count} × {answer}");
    }

    println!("\n🔧 Parameters varied across attempts:");
    for attempt in &report.attempts {
        println!(
            "Attempt {}: Temp={:.2}, TopP={:.2}",
            attempt.attempt, attempt.params.temperature, attempt.params.top_p
        );
    }

    Ok(())
}

/// The attempt's reasoning, indented, followed by its extracted answer.
fn format_attempt(attempt: &AttemptRecord) -> String {
    let mut out = format!("--- Attempt {} ---\n", attempt.attempt);
    for line in attempt.content.trim().lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&format!("  => {}\n", attempt.final_answer));
    out
}

fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}
