//! `promptlab doctor` — Diagnose configuration and connectivity.

use promptlab_config::AppConfig;
use promptlab_providers::ModelRole;
use promptlab_providers::router::build_from_config;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 PromptLab Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_path();
    if !config_path.exists() {
        println!("  ⚠️  No config file — run `promptlab init` (defaults will be used)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  {} issue(s) found. See above for details.", issues + 1);
            return Ok(());
        }
    };

    let router = build_from_config(&config);
    for (role, endpoint) in [
        (ModelRole::Main, &config.main),
        (ModelRole::Evaluator, &config.evaluator),
    ] {
        if endpoint.api_key.is_none() {
            println!("  ⚠️  No API key for the {role} model ({})", endpoint.model);
            issues += 1;
            continue;
        }

        let Some(routed) = router.get(role) else {
            continue;
        };
        match routed.provider.health_check().await {
            Ok(true) => println!("  ✅ {role}: {} reachable", routed.label),
            Ok(false) => {
                println!("  ⚠️  {role}: {} answered but is not healthy", routed.label);
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ {role}: {} unreachable: {e}", routed.label);
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
