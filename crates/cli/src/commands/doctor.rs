//! `maildraft doctor`: Diagnose configuration.

use std::path::PathBuf;

use maildraft_config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug)]
struct Check {
    level: Level,
    text: String,
}

impl Check {
    fn pass(text: impl Into<String>) -> Self {
        Self {
            level: Level::Pass,
            text: text.into(),
        }
    }

    fn warn(text: impl Into<String>) -> Self {
        Self {
            level: Level::Warn,
            text: text.into(),
        }
    }

    fn fail(text: impl Into<String>) -> Self {
        Self {
            level: Level::Fail,
            text: text.into(),
        }
    }

    fn print(&self) {
        let icon = match self.level {
            Level::Pass => "✅",
            Level::Warn => "⚠️ ",
            Level::Fail => "❌",
        };
        println!("  {icon} {}", self.text);
    }
}

/// Checks against a loaded configuration. Only `Fail` counts as an issue.
fn diagnose(config: &AppConfig) -> Vec<Check> {
    let mut checks = Vec::new();

    // Proxy mode only needs the upstream; the orchestrator settings then
    // matter just for `maildraft orchestrator` on this host.
    let proxy = match config.require_upstream_url() {
        Ok(url) => {
            checks.push(Check::pass(format!("Gateway proxies to {url}")));
            true
        }
        Err(_) => {
            checks.push(Check::pass("Gateway drafts in-process"));
            false
        }
    };

    match config.require_orchestrator() {
        Ok(()) => {
            if let Ok(kb) = config.require_knowledge_base_id() {
                checks.push(Check::pass(format!("Knowledge base: {kb}")));
            }
            if let Ok(url) = config.require_runtime_url() {
                checks.push(Check::pass(format!("Model runtime: {url}")));
            }
            if let Ok(url) = config.require_agent_runtime_url() {
                checks.push(Check::pass(format!("Knowledge base runtime: {url}")));
            }
        }
        Err(e) if proxy => {
            checks.push(Check::warn(format!("Orchestrator not configured locally: {e}")));
        }
        Err(e) => checks.push(Check::fail(e.to_string())),
    }

    if config.bedrock.api_key.is_some() {
        checks.push(Check::pass("API key configured"));
    } else {
        checks.push(Check::warn(
            "No API key configured; requests go out unauthenticated (set MAILDRAFT_API_KEY or bedrock.api_key)",
        ));
    }

    checks.push(Check::pass(format!(
        "Default model: {} ({})",
        config.default_model.label(),
        config.default_model
    )));

    checks
}

pub async fn run(path: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 maildraft Doctor: Configuration Diagnostics");
    println!("===============================================\n");

    let config_path = path
        .cloned()
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file at {} (environment only)", config_path.display());
    }

    let config = match AppConfig::load_with_env(&config_path) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    let checks = diagnose(&config);
    checks.iter().for_each(Check::print);
    let issues = checks.iter().filter(|c| c.level == Level::Fail).count();

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
