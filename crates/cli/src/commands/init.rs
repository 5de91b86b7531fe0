//! `promptlab init` — First-time setup.

use std::path::Path;

use promptlab_config::{AppConfig, EVALUATOR_API_KEY_VAR, MAIN_API_KEY_VAR};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧪 PromptLab — First-Time Setup");
    println!("===============================\n");

    let config_path = AppConfig::config_path();
    if write_default_config(&config_path)? {
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Export {MAIN_API_KEY_VAR} (and {EVALUATOR_API_KEY_VAR} for `judge`)");
        println!("      or add api_key under [main] / [evaluator]");
        println!("   2. Run: promptlab doctor");
        println!("   3. Try: promptlab judge\n");
    } else {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run init.\n");
    }

    Ok(())
}

/// Write the default config unless `path` exists. Returns whether it wrote.
fn write_default_config(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}
