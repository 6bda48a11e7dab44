mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use ruleflow_core::TieBreak;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ruleflow",
    about = "Priority-ordered rule engine: fire rules against a JSON state until none are eligible",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: nearest ruleflow.yaml at or above the current directory)
    #[arg(long, global = true, env = "RULEFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a knowledge base to quiescence and print the final state
    Run {
        /// Knowledge base file (.yaml, .yml or .json)
        #[arg(long)]
        rules: PathBuf,

        /// Start state file (default: empty object)
        #[arg(long)]
        state: Option<PathBuf>,

        /// Directory of action definitions (overrides config)
        #[arg(long)]
        actions: Option<PathBuf>,

        /// Tiebreak policy among equal-priority eligible rules: first or last
        #[arg(long)]
        tiebreak: Option<TieBreak>,

        /// Fail instead of firing more than N times
        #[arg(long)]
        max_firings: Option<u64>,

        /// Also write the final state to this file
        #[arg(long)]
        out: Option<PathBuf>,

        /// Log every selection and firing
        #[arg(long)]
        trace: bool,
    },

    /// List the actions discovered in the actions directory
    Actions {
        /// Directory of action definitions (overrides config)
        #[arg(long)]
        actions: Option<PathBuf>,
    },

    /// Resolve and construct every rule without running, then show the tiers
    Check {
        /// Knowledge base file (.yaml, .yml or .json)
        #[arg(long)]
        rules: PathBuf,

        /// Directory of action definitions (overrides config)
        #[arg(long)]
        actions: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { trace: true, .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = match root::load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run {
            rules,
            state,
            actions,
            tiebreak,
            max_firings,
            out,
            trace,
        } => cmd::run::run(
            &settings,
            cmd::run::RunArgs {
                rules,
                state,
                actions,
                tiebreak,
                max_firings,
                out,
                trace,
            },
            cli.json,
        ),
        Commands::Actions { actions } => cmd::actions::run(&settings, actions, cli.json),
        Commands::Check { rules, actions } => cmd::check::run(&settings, &rules, actions, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
