//! 规则组装命令行
//!
//! 读取声明式规则定义，执行预设并输出最终的字段约束映射（JSON）。

use anyhow::{Context, Result};
use clap::Parser;
use preset_rules::config::EngineConfig;
use preset_rules::{facade, observability, Resolver, RuleSetDefinition};
use std::path::PathBuf;
use tracing::info;

const SERVICE_NAME: &str = "preset-rules";

#[derive(Debug, Parser)]
#[command(name = "rule-assemble", version, about = "Assemble field rules from preset definitions")]
struct Cli {
    /// Path to the JSON rule definition
    definition: PathBuf,

    /// Preset to apply, in order (repeatable)
    #[arg(short, long = "preset")]
    presets: Vec<String>,

    /// Action name used as the preset when none is given
    #[arg(short, long)]
    action: Option<String>,

    /// Disable preset guessing from the action name
    #[arg(long)]
    no_guess: bool,

    /// Print every field as a flat rule string
    #[arg(long)]
    flat: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = EngineConfig::load(SERVICE_NAME).unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        EngineConfig::default()
    });
    observability::init(&config.observability)?;

    let definition = RuleSetDefinition::from_path(&cli.definition)
        .with_context(|| format!("failed to load {}", cli.definition.display()))?;

    let mut resolver = Resolver::with_presets(definition, cli.presets)?;
    if cli.no_guess || !config.guess || cli.action.is_none() {
        resolver.set_guess(false);
    }

    let rules = facade::rules(&mut resolver, cli.action.as_deref().unwrap_or_default());
    info!(
        fields = rules.len(),
        presets = ?resolver.get_presets(),
        "规则组装完成"
    );

    let output = if cli.flat {
        let flat: indexmap::IndexMap<String, String> = rules
            .into_iter()
            .map(|(field, value)| (field, value.to_rule_string()))
            .collect();
        serde_json::to_string_pretty(&flat)?
    } else {
        serde_json::to_string_pretty(&rules)?
    };
    println!("{}", output);

    Ok(())
}
