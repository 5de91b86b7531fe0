//! `promptlab config` — Configuration management commands.

use promptlab_config::{AppConfig, EVALUATOR_API_KEY_VAR, MAIN_API_KEY_VAR};

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    let path = AppConfig::config_path();
    match AppConfig::load_from(&path) {
        Ok(mut config) => {
            if path.exists() {
                println!("   ✅ Config parsed successfully");
            } else {
                println!("   ℹ️  No config file, using defaults");
            }
            config.apply_env(|key| std::env::var(key).ok());

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!(
                "   Main:       {} ({})",
                config.main.model, config.main.provider
            );
            println!(
                "   Evaluator:  {} ({})",
                config.evaluator.model, config.evaluator.provider
            );
            println!("   Max steps:  {}", config.chain.max_steps);
            println!("   Retries:    {}", config.retry.max_attempts);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    if config.main.api_key.is_none() {
        warnings.push(format!("No main API key set (set {MAIN_API_KEY_VAR})"));
    }
    if config.evaluator.api_key.is_none() {
        warnings.push(format!(
            "No evaluator API key set (set {EVALUATOR_API_KEY_VAR}); `judge` will not run"
        ));
    }
    if config.chain.thinking_delay_ms == 0 {
        warnings.push("chain.thinking_delay_ms is 0; providers may rate-limit the chain".into());
    }
    warnings
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let toml_str = toml::to_string_pretty(&redacted(config))?;
    println!("{toml_str}");
    Ok(())
}

fn redacted(mut config: AppConfig) -> AppConfig {
    for endpoint in [&mut config.main, &mut config.evaluator] {
        if endpoint.api_key.is_some() {
            endpoint.api_key = Some("[REDACTED]".into());
        }
    }
    config
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}
