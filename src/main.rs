use anyhow::Context;
use clap::{Parser, Subcommand};
use liquidlog::{LabwareDocument, MergePolicy, PipelineConfig, Result};
use liquidlog::{build_protocol_graph, log, render};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "liquidlog")]
#[command(about = "Recover a structured protocol from a liquid-handling robot log", long_about = None)]
struct Cli {
    /// Pipeline config (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the config's merge policy.
    #[arg(long, global = true, value_enum)]
    merge_policy: Option<MergePolicy>,

    /// Debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the merged step records as JSON.
    Steps {
        #[arg(long)]
        log: PathBuf,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// Write the protocol graph (node-link JSON).
    Graph {
        #[arg(long)]
        log: PathBuf,

        #[arg(long)]
        labware: PathBuf,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// Print the segmented phases.
    Phases {
        #[arg(long)]
        log: PathBuf,

        /// Also print preposition tokens for each line.
        #[arg(long)]
        tokens: bool,
    },
    /// Print the distinct action words found in the log.
    Actions {
        #[arg(long)]
        log: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "liquidlog=debug" } else { "liquidlog=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn read_log(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read log file {}", path.display()))
}

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
            info!(path = %path.display(), "wrote output");
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // 1) Config file, then CLI overrides.
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(policy) = cli.merge_policy {
        config.merge_policy = policy;
    }

    match cli.cmd {
        Commands::Steps { log: log_path, out } => {
            let text = read_log(&log_path)?;
            let steps = liquidlog::parse_protocol_log(&text, &config)?;
            info!(steps = steps.len(), "extracted protocol steps");
            write_output(out.as_deref(), &render::render_steps_json(&steps)?)?;
        }
        Commands::Graph {
            log: log_path,
            labware,
            out,
        } => {
            // 2) Fatal inputs first: labware descriptor must be valid.
            let resources = LabwareDocument::load(&labware)?.validate_and_build()?;

            let text = read_log(&log_path)?;
            let steps = liquidlog::parse_protocol_log(&text, &config)?;
            let graph = build_protocol_graph(&resources, &steps);
            graph.topological_order()?;

            write_output(out.as_deref(), &render::render_graph_json(&graph)?)?;
        }
        Commands::Phases {
            log: log_path,
            tokens,
        } => {
            let text = read_log(&log_path)?;
            let normalizer = log::Normalizer::with_extra_prefixes(&config.extra_excluded_prefixes);
            let phases = log::segment(&normalizer.normalize(&text));
            print!("{}", render::render_phases(&phases, tokens)?);
        }
        Commands::Actions { log: log_path } => {
            let text = read_log(&log_path)?;
            let normalizer = log::Normalizer::with_extra_prefixes(&config.extra_excluded_prefixes);
            for action in log::distinct_actions(&normalizer.normalize(&text)) {
                println!("{}", action);
            }
        }
    }

    Ok(())
}
