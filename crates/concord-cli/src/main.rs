//! Concord CLI
//!
//! Evaluate a set of completed agent responses from the command line.
//!
//! Exit codes: 0 approve, 1 escalate, 2 reject, 3 on load or usage errors.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use concord_core::{
    CapabilityRegistry, ConsensusConfiguration, ConsensusEngine, ConsensusInput, ConsensusResult,
    Decision,
};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

const EXIT_LOAD_ERROR: u8 = 3;

/// Output format for evaluation results
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Full result as JSON
    Json,
    /// Full result as YAML
    Yaml,
}

/// Output format for configuration dumps
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConfigFormat {
    Json,
    Yaml,
}

#[derive(Parser, Debug)]
#[command(name = "concord")]
#[command(author, version, about = "Deterministic multi-agent consensus for civic content")]
struct Cli {
    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate agent responses and print the consensus result
    Evaluate {
        /// Consensus input (YAML or JSON)
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        /// Agent capability directory (YAML or JSON list)
        #[arg(short, long, value_name = "PATH")]
        agents: PathBuf,

        /// Consensus configuration; defaults apply when omitted
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the default consensus configuration
    Config {
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(EXIT_LOAD_ERROR)
        }
    }
}

/// `RUST_LOG` wins when set; otherwise verbosity picks the level.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Evaluate {
            input,
            agents,
            config,
            format,
        } => evaluate(&input, &agents, config.as_deref(), format),
        Command::Config { format } => {
            let config = ConsensusConfiguration::default();
            let output = match format {
                ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
                ConfigFormat::Yaml => serde_yaml::to_string(&config)?,
            };
            println!("{}", output.trim_end());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn evaluate(
    input_path: &Path,
    agents_path: &Path,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let registry = load_registry(agents_path)
        .with_context(|| format!("Failed to load agents from {}", agents_path.display()))?;
    tracing::info!(agents = registry.len(), "Capability directory loaded");

    let config = match config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ConsensusConfiguration::default(),
    };

    let input: ConsensusInput = load(input_path)
        .with_context(|| format!("Failed to load input from {}", input_path.display()))?;
    tracing::info!(
        responses = input.agent_responses.len(),
        flow = %input.submission_flow,
        "Evaluating consensus"
    );

    let engine = ConsensusEngine::builder()
        .directory(Arc::new(registry))
        .config(config)
        .build();
    let result = engine.evaluate(&input);

    let output = match format {
        OutputFormat::Text => format_text(&result),
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Yaml => serde_yaml::to_string(&result)?,
    };
    println!("{}", output.trim_end());

    Ok(ExitCode::from(match result.decision {
        Decision::Approve => 0,
        Decision::Escalate => 1,
        Decision::Reject => 2,
    }))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn load_registry(path: &Path) -> Result<CapabilityRegistry> {
    if is_json(path) {
        Ok(CapabilityRegistry::from_json_file(path)?)
    } else {
        Ok(CapabilityRegistry::from_yaml_file(path)?)
    }
}

fn load_config(path: &Path) -> Result<ConsensusConfiguration> {
    if is_json(path) {
        Ok(ConsensusConfiguration::from_json_file(path)?)
    } else {
        Ok(ConsensusConfiguration::from_yaml_file(path)?)
    }
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    if is_json(path) {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}

fn format_text(result: &ConsensusResult) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Decision: {} (confidence {:.2}, quality {:.2})\n",
        result.decision, result.confidence, result.quality_score
    ));
    out.push_str(&format!("{}\n", result.reasoning.primary));

    if !result.votes.is_empty() {
        out.push_str("\nVotes:\n");
        for vote in &result.votes {
            out.push_str(&format!(
                "  {:<16} {:<12} {:<8} weight {:.3}  confidence {:.2}\n",
                vote.agent_id,
                vote.provider,
                if vote.decision.is_approve() { "approve" } else { "reject" },
                vote.weight,
                vote.confidence
            ));
        }
    }

    let risk = &result.risk_factors;
    out.push_str(&format!(
        "\nRisk: uncertainty {:.2}, novelty {:.2}, sensitivity {:.2}, adversarial {:.2}\n",
        risk.uncertainty, risk.novelty, risk.sensitivity, risk.adversarial
    ));
    out.push_str(&format!(
        "Diversity: {:.2} (provider spread {:.2})\n",
        result.diversity.score, result.diversity.provider_spread
    ));
    out.push_str(&format!("Cost: ${:.4}\n", result.economics.total_cost));

    let sections = [
        ("Supporting", &result.reasoning.supporting),
        ("Dissenting", &result.reasoning.dissenting),
        ("Next actions", &result.recommendations.next_actions),
        ("Improvements", &result.recommendations.improvements),
        ("Escalation reasons", &result.recommendations.escalation_reasons),
    ];
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{}:\n", title));
        for item in items {
            out.push_str(&format!("  - {}\n", item));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_evaluate() {
        let cli = Cli::try_parse_from([
            "concord", "-vv", "evaluate", "--input", "in.json", "--agents", "agents.yaml",
            "--format", "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Evaluate {
                input,
                config,
                format,
                ..
            } => {
                assert_eq!(input, PathBuf::from("in.json"));
                assert!(config.is_none());
                assert!(matches!(format, OutputFormat::Json));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_format_detection() {
        assert!(is_json(Path::new("input.JSON")));
        assert!(!is_json(Path::new("input.yaml")));
        assert!(!is_json(Path::new("input")));
    }
}
