use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tree_change_aggregator::config::resolve_settings;
use tree_change_aggregator::replay::{ReplayScript, replay};

/// Aggregate scripted tree edits into ancestor-anchored change summaries
#[derive(Parser)]
#[command(name = "tree-change-aggregator")]
#[command(version)]
#[command(about = "Aggregate scripted tree edits into ancestor-anchored change summaries")]
struct Cli {
    /// Settings file (default: $XDG_CONFIG_HOME/tree-change-aggregator/settings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an edit script and print the aggregated changes
    Replay {
        /// TOML script describing the tree and its edits
        script: PathBuf,

        /// Print the result as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the effective settings as TOML
    Settings,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let settings = match resolve_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Replay { script, json } => {
            let result = ReplayScript::load(&script).and_then(|script| replay(&script, settings));
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            let summary = outcome.summary();
            if json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                print!("{}", summary);
            }
        }
        Commands::Settings => match toml::to_string_pretty(&settings) {
            Ok(text) => print!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
    }
}
