pub mod config_cmd;
pub mod doctor;
pub mod init;
pub mod judge;
pub mod prompt;
pub mod self_consistency;

use promptlab_config::AppConfig;
use promptlab_providers::{ModelRole, ProviderRouter, RoutedModel};
use tracing::debug;

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    debug!(
        main = %config.main.model,
        evaluator = %config.evaluator.model,
        "Configuration loaded"
    );
    Ok(config)
}

pub(crate) fn route(
    router: &ProviderRouter,
    role: ModelRole,
) -> Result<RoutedModel, Box<dyn std::error::Error>> {
    router
        .get(role)
        .cloned()
        .ok_or_else(|| format!("No {role} model configured").into())
}

/// First `max` characters of `content`, with an ellipsis when cut.
pub(crate) fn preview(content: &str, max: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_on_char_boundary() {
        assert_eq!(preview("short", 100), "short");
        assert_eq!(preview("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn route_reports_missing_role() {
        let router = ProviderRouter::new();
        let Err(err) = route(&router, ModelRole::Evaluator) else {
            panic!("expected a missing-route error");
        };
        assert_eq!(err.to_string(), "No evaluator model configured");
    }
}
