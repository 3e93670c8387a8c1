mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stepform",
    about = "Inspect, validate and replay multi-step form wizards",
    version
)]
struct Cli {
    /// Directory holding wizard definitions (default: walk up to .stepform/wizards, else ./wizards)
    #[arg(long, global = true, env = "STEPFORM_DIR")]
    dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, short = 'j', global = true)]
    json: bool,

    /// Log verbosely (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the wizards in the definitions directory
    List,

    /// Show one wizard's steps and fields
    Show {
        /// Wizard id
        id: String,
    },

    /// Check definitions for errors and warnings
    Validate {
        /// Wizard id (default: every wizard)
        id: Option<String>,
    },

    /// Drive a wizard session from a script of input events
    Run {
        /// Wizard id
        id: String,

        /// YAML file with the list of actions to apply
        #[arg(long)]
        script: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let dir = root::resolve_wizards_dir(cli.dir.as_deref());

    let result = match cli.command {
        Commands::List => cmd::list::run(&dir, cli.json),
        Commands::Show { id } => cmd::show::run(&dir, &id, cli.json),
        Commands::Validate { id } => cmd::validate::run(&dir, id.as_deref(), cli.json),
        Commands::Run { id, script } => cmd::run::run(&dir, &id, &script, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
