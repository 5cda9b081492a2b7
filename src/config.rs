//! Importer configuration, read from a TOML file

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::TagRules;
use crate::markdown::{TransformOptions, IMAGE_PLACEHOLDER};
use crate::notes::IndexOptions;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder holding the notes
    pub folder: PathBuf,
    /// Target deck
    pub deck: String,
    /// Notes the import starts from
    pub roots: Vec<String>,
    pub anki: AnkiConfig,
    pub import: ImportSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("."),
            deck: "Default".to_string(),
            roots: Vec::new(),
            anki: AnkiConfig::default(),
            import: ImportSettings::default(),
        }
    }
}

/// AnkiConnect connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnkiConfig {
    pub url: String,
    /// Note type used for new cards
    pub model: String,
    pub front_field: String,
    pub back_field: String,
    pub timeout_secs: u64,
    /// Pause after each submission
    pub submit_delay_ms: u64,
    /// Search the deck before adding, for setups where AnkiConnect accepts duplicates
    pub check_before_add: bool,
}

impl Default for AnkiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8765".to_string(),
            model: "Basic".to_string(),
            front_field: "Front".to_string(),
            back_field: "Back".to_string(),
            timeout_secs: 30,
            submit_delay_ms: 100,
            check_before_add: false,
        }
    }
}

impl AnkiConfig {
    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }
}

/// How notes are found and turned into cards
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub extensions: Vec<String>,
    /// Index notes in sub-folders too
    pub recursive: bool,
    /// Stop following links past this many hops from a root
    pub max_depth: Option<usize>,
    pub exclusion_tag: String,
    /// Tag for notes without any; empty string disables it
    pub default_tag: Option<String>,
    pub image_placeholder: String,
    /// Drop a leading `# Title` heading that repeats the note name
    pub strip_title_heading: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string(), "markdown".to_string()],
            recursive: false,
            max_depth: None,
            exclusion_tag: "not_included".to_string(),
            default_tag: Some("default".to_string()),
            image_placeholder: IMAGE_PLACEHOLDER.to_string(),
            strip_title_heading: true,
        }
    }
}

impl ImportSettings {
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            extensions: self.extensions.clone(),
            recursive: self.recursive,
        }
    }

    pub fn tag_rules(&self) -> TagRules {
        TagRules {
            default_tag: self
                .default_tag
                .clone()
                .filter(|tag| !tag.trim().is_empty()),
            exclusion_tag: self.exclusion_tag.clone(),
        }
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            image_placeholder: self.image_placeholder.clone(),
        }
    }
}

impl Config {
    /// Default location: `<config dir>/linkdeck/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("linkdeck").join("config.toml"))
    }

    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the default location if it exists, else defaults.
    ///
    /// An explicitly named file must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(default) if default.is_file() => {
                log::debug!("Loading config from {:?}", default);
                Self::load(&default)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.deck.trim().is_empty() {
            return Err(ConfigError::Invalid("deck name is empty".to_string()));
        }
        if self.anki.url.trim().is_empty() {
            return Err(ConfigError::Invalid("anki.url is empty".to_string()));
        }
        if self.anki.model.trim().is_empty() {
            return Err(ConfigError::Invalid("anki.model is empty".to_string()));
        }
        if self.anki.front_field.trim().is_empty() || self.anki.back_field.trim().is_empty() {
            return Err(ConfigError::Invalid("anki field names must not be empty".to_string()));
        }
        if self
            .import
            .extensions
            .iter()
            .all(|ext| ext.trim_start_matches('.').trim().is_empty())
        {
            return Err(ConfigError::Invalid("import.extensions lists no extension".to_string()));
        }
        if self.import.exclusion_tag.trim().is_empty() {
            return Err(ConfigError::Invalid("import.exclusion_tag is empty".to_string()));
        }
        Ok(())
    }
}
