mod app;
mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "linkdeck-cli",
    about = "Import linked markdown notes into Anki",
    version
)]
struct Cli {
    /// Config file (default: <config dir>/linkdeck/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Args, Debug, Default)]
struct ImportArgs {
    /// Root notes to start from (defaults to `roots` in the config)
    roots: Vec<String>,
    /// Folder holding the notes
    #[arg(long)]
    folder: Option<PathBuf>,
    /// Target deck
    #[arg(long)]
    deck: Option<String>,
    /// Stop following links this many hops from a root
    #[arg(long)]
    max_depth: Option<usize>,
    /// Also index notes in sub-folders
    #[arg(long)]
    recursive: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Import every note reachable from the roots
    Import {
        #[command(flatten)]
        args: ImportArgs,
        /// AnkiConnect URL
        #[arg(long)]
        url: Option<String>,
    },

    /// Show what an import would do without contacting Anki
    Preview {
        #[command(flatten)]
        args: ImportArgs,
    },

    /// Check that AnkiConnect is reachable
    Check {
        /// AnkiConnect URL
        #[arg(long)]
        url: Option<String>,
    },
}

fn overrides(args: ImportArgs, url: Option<String>) -> app::Overrides {
    app::Overrides {
        roots: args.roots,
        folder: args.folder,
        deck: args.deck,
        url,
        max_depth: args.max_depth,
        recursive: args.recursive,
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Command::Import { args, url } => {
            let app = app::App::new(config, overrides(args, url))?;
            commands::import::run(&app, &cli.format)?;
        }
        Command::Preview { args } => {
            let app = app::App::new(config, overrides(args, None))?;
            commands::import::run_preview(&app, &cli.format)?;
        }
        Command::Check { url } => {
            let app = app::App::new(config, overrides(ImportArgs::default(), url))?;
            commands::check::run(&app, &cli.format)?;
        }
    }

    Ok(())
}
