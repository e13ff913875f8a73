use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;

pub const DEFAULT_PLACEHOLDER: &str = "Ask a question...";
pub const DEFAULT_LOG_FILTER: &str = "question_input_tui=info,question_input_cli=info";

/// Settings read from `config.toml`. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionInputConfig {
    pub clear_on_send: bool,
    pub placeholder: String,
    pub log_filter: String,
}

impl Default for QuestionInputConfig {
    fn default() -> Self {
        Self {
            clear_on_send: true,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Result of [`ConfigStore::load`]. `warning` is set when the file exists but could not be parsed;
/// it is reported once logging is up, since the log filter itself lives in the file.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: QuestionInputConfig,
    pub warning: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        Ok(Self::new(home_dir()?.join("config.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<LoadedConfig> {
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(LoadedConfig {
                config: QuestionInputConfig::default(),
                warning: None,
            });
        };

        match content.parse::<DocumentMut>() {
            Ok(doc) => Ok(LoadedConfig {
                config: read_config(&doc),
                warning: None,
            }),
            Err(err) => Ok(LoadedConfig {
                config: QuestionInputConfig::default(),
                warning: Some(format!(
                    "ignoring unparseable {}: {err}",
                    self.path.display()
                )),
            }),
        }
    }
}

/// `~/.question-input`, which holds the config file and the log directory.
pub fn home_dir() -> anyhow::Result<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        anyhow::bail!("cannot determine home directory for config path");
    };
    Ok(default_home(&home))
}

fn default_home(home: &Path) -> PathBuf {
    home.join(".question-input")
}

fn read_config(doc: &DocumentMut) -> QuestionInputConfig {
    let defaults = QuestionInputConfig::default();
    let clear_on_send = doc
        .get("clear_on_send")
        .and_then(TomlItem::as_value)
        .and_then(|v| v.as_bool())
        .unwrap_or(defaults.clear_on_send);
    let placeholder = doc
        .get("placeholder")
        .and_then(TomlItem::as_str)
        .map_or(defaults.placeholder, str::to_string);
    let log_filter = doc
        .get("log")
        .and_then(TomlItem::as_table)
        .and_then(|log| log.get("filter"))
        .and_then(TomlItem::as_str)
        .map_or(defaults.log_filter, str::to_string);

    QuestionInputConfig {
        clear_on_send,
        placeholder,
        log_filter,
    }
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("read {}", path.display())),
    }
}
