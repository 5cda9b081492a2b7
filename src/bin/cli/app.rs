use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use linkdeck_lib::anki::AnkiConnectClient;
use linkdeck_lib::config::Config;

/// Values given on the command line, applied over the config file
#[derive(Debug, Default)]
pub struct Overrides {
    pub roots: Vec<String>,
    pub folder: Option<PathBuf>,
    pub deck: Option<String>,
    pub url: Option<String>,
    pub max_depth: Option<usize>,
    pub recursive: bool,
}

/// Shared state for CLI commands
pub struct App {
    pub config: Config,
}

impl App {
    /// Load the config file and apply command-line overrides
    pub fn new(config_path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = Config::load_or_default(config_path).context("Failed to load config")?;

        if !overrides.roots.is_empty() {
            config.roots = overrides.roots;
        }
        if let Some(folder) = overrides.folder {
            config.folder = folder;
        }
        if let Some(deck) = overrides.deck {
            config.deck = deck;
        }
        if let Some(url) = overrides.url {
            config.anki.url = url;
        }
        if overrides.max_depth.is_some() {
            config.import.max_depth = overrides.max_depth;
        }
        if overrides.recursive {
            config.import.recursive = true;
        }

        config.validate().context("Invalid settings")?;
        Ok(Self { config })
    }

    pub fn client(&self) -> Result<AnkiConnectClient> {
        AnkiConnectClient::new(&self.config.anki)
            .with_context(|| format!("Invalid AnkiConnect URL '{}'", self.config.anki.url))
    }
}
