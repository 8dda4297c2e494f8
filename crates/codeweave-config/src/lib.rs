use codeweave_engine::{DEFAULT_CONTEXT_LINES, EditStrategy, IndentStyle, SessionOptions, StrategyMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// User defaults for edit sessions; command-line flags override these
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: StrategyMode,
    pub strategy: EditStrategy,
    pub hoist_imports: bool,
    pub code_blocks_only: bool,
    /// Lines above and below the target range marked as sent
    pub context_lines: usize,
    /// Indent width; guessed from the document when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_spaces: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        let options = SessionOptions::default();
        Self {
            mode: options.mode,
            strategy: options.strategy,
            hoist_imports: options.hoist_imports,
            code_blocks_only: options.code_blocks_only,
            context_lines: DEFAULT_CONTEXT_LINES,
            tab_size: None,
            insert_spaces: None,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/codeweave");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Expand a user-supplied path such as `~/code/$PROJECT/main.rs`
    ///
    /// Paths that fail to expand (an unset variable, say) are returned as given.
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => path.to_path_buf(),
        }
    }

    /// Session options carried by this config
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            mode: self.mode,
            strategy: self.strategy,
            hoist_imports: self.hoist_imports,
            code_blocks_only: self.code_blocks_only,
        }
    }

    /// Indent style to force, if the config pins one
    ///
    /// Setting only one of the two keys fills the other from the default style.
    pub fn indent_style(&self) -> Option<IndentStyle> {
        if self.tab_size.is_none() && self.insert_spaces.is_none() {
            return None;
        }
        let default = IndentStyle::default();
        Some(IndentStyle::from_options(
            self.tab_size.unwrap_or(default.tab_size()),
            self.insert_spaces.unwrap_or(default.insert_spaces()),
        ))
    }
}
