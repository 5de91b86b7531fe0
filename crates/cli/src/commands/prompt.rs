//! `promptlab hello` and `promptlab few-shot` — single templated prompts.

use promptlab_agent::{PromptTemplate, run_prompt};
use promptlab_providers::ModelRole;
use promptlab_providers::router::build_from_config;

use super::{load_config, route};

const HELLO_QUESTION: &str = "Which model are you?";
const FEW_SHOT_QUESTION: &str = "Hey, do you have a video channel?";
const TEMPERATURE: f32 = 0.7;

pub async fn hello(question: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let question = question.unwrap_or_else(|| HELLO_QUESTION.into());
    ask(&PromptTemplate::zero_shot_demo(), &question, true).await
}

pub async fn few_shot(question: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let question = question.unwrap_or_else(|| FEW_SHOT_QUESTION.into());
    ask(&PromptTemplate::few_shot_demo(), &question, false).await
}

async fn ask(
    template: &PromptTemplate,
    question: &str,
    show_model: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    config.require_main_key()?;

    let router = build_from_config(&config);
    let main = route(&router, ModelRole::Main)?;

    let answer = run_prompt(&main, template, question, TEMPERATURE).await?;

    if show_model {
        println!("Answer: {}", answer.model);
    }
    println!("{}", answer.content);
    Ok(())
}
