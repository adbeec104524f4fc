use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::cli::Cli;
use crate::paths::{config_file_path, default_cache_dir};

const CONFIG_FILE_COMMENT: &str = "TellMe configuration file";

/// Flat `KEY -> value` view shared by the defaults, the config file and the
/// command line before validation.
pub type RawConfig = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("words given as arguments cannot be combined with a word file ({file})")]
    Conflict { file: String },

    #[error("missing configuration key {0}")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}: expected {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("unknown key '{key}' in config file {}, line {line}", .path.display())]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("malformed line in config file {}, line {line}", .path.display())]
    Syntax { path: PathBuf, line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Mp3,
    Ogg,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "mp3" => Ok(Self::Mp3),
            "ogg" => Ok(Self::Ogg),
            _ => Err(()),
        }
    }
}

/// Validated settings threaded through every engine call.
#[derive(Debug, Clone)]
pub struct Config {
    pub language: String,
    pub audio_format: AudioFormat,
    pub cache: bool,
    pub download: bool,
    pub interactive: bool,
    pub pronunciation_check: bool,
    pub verbose: bool,
    pub cache_dir: PathBuf,
    pub word_file: Option<PathBuf>,
}

impl Config {
    pub fn from_map(raw: &RawConfig) -> Result<Self, ConfigError> {
        let language = required(raw, "LANG")?;
        if language.is_empty() || !language.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidValue {
                key: "LANG",
                value: language.to_string(),
                expected: "a language code such as en or nl",
            });
        }

        let audio_format_raw = required(raw, "ATYPE")?;
        let audio_format =
            audio_format_raw
                .parse::<AudioFormat>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "ATYPE",
                    value: audio_format_raw.to_string(),
                    expected: "mp3 or ogg",
                })?;

        let cache_dir = required(raw, "CACHE_DIR")?;
        if cache_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "CACHE_DIR",
                value: String::new(),
                expected: "a directory path",
            });
        }

        let word_file = raw
            .get("FILE")
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            language: language.to_string(),
            audio_format,
            cache: yes_no(raw, "CACHE")?,
            download: yes_no(raw, "DOWNLOAD")?,
            interactive: yes_no(raw, "INTERACTIVE")?,
            pronunciation_check: yes_no(raw, "PRONUNCIATION_CHECK")?,
            verbose: yes_no(raw, "VERBOSE")?,
            cache_dir: PathBuf::from(cache_dir),
            word_file,
        })
    }

    /// Words on the command line and a word file are mutually exclusive.
    pub fn check_word_sources(&self, word_args: &[String]) -> Result<(), ConfigError> {
        match &self.word_file {
            Some(file) if !word_args.is_empty() => Err(ConfigError::Conflict {
                file: file.display().to_string(),
            }),
            _ => Ok(()),
        }
    }
}

fn required<'a>(raw: &'a RawConfig, key: &'static str) -> Result<&'a str, ConfigError> {
    raw.get(key)
        .map(|value| value.trim())
        .ok_or(ConfigError::Missing(key))
}

fn yes_no(raw: &RawConfig, key: &'static str) -> Result<bool, ConfigError> {
    match required(raw, key)? {
        "yes" => Ok(true),
        "no" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key,
            value: other.to_string(),
            expected: "yes or no",
        }),
    }
}

#[derive(Debug, Clone)]
pub struct DefaultEntry {
    pub key: &'static str,
    pub comment: &'static str,
    pub value: String,
}

pub fn default_entries(cache_dir: &Path) -> Vec<DefaultEntry> {
    let entry = |key, comment, value: &str| DefaultEntry {
        key,
        comment,
        value: value.to_string(),
    };
    vec![
        entry("INTERACTIVE", "interactive mode [yes | no]", "no"),
        entry(
            "PRONUNCIATION_CHECK",
            "check existence of pronunciation [yes | no]",
            "yes",
        ),
        entry(
            "DOWNLOAD",
            "download audiofiles in current directory [yes | no]",
            "yes",
        ),
        entry("CACHE", "cache files [yes | no]", "yes"),
        entry(
            "CACHE_DIR",
            "cache directory",
            &cache_dir.display().to_string(),
        ),
        entry("LANG", "language (en, es, de, etc)", "nl"),
        entry("ATYPE", "audiofiles type (mp3 | ogg)", "mp3"),
        entry("VERBOSE", "verbose mode [yes | no]", "no"),
    ]
}

pub fn defaults_map(entries: &[DefaultEntry]) -> RawConfig {
    let mut raw: RawConfig = entries
        .iter()
        .map(|entry| (entry.key.to_string(), entry.value.clone()))
        .collect();
    raw.insert("FILE".to_string(), String::new());
    raw
}

pub fn render_config_file(entries: &[DefaultEntry]) -> String {
    let mut out = format!("# {CONFIG_FILE_COMMENT}\n\n");
    for entry in entries {
        out.push_str(&format!(
            "# {}\n{}={}\n\n",
            entry.comment, entry.key, entry.value
        ));
    }
    out
}

/// Overlays `KEY=VALUE` lines onto `raw`. Only keys that already exist in
/// `raw` are accepted.
pub fn apply_config_text(raw: &mut RawConfig, text: &str, origin: &Path) -> Result<(), ConfigError> {
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            return Err(ConfigError::Syntax {
                path: origin.to_path_buf(),
                line: line_no,
            });
        };
        let key = key.trim();
        if key.is_empty() || !key.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(ConfigError::Syntax {
                path: origin.to_path_buf(),
                line: line_no,
            });
        }

        match raw.get_mut(key) {
            Some(slot) => *slot = value.trim().to_string(),
            None => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                    path: origin.to_path_buf(),
                    line: line_no,
                });
            }
        }
    }
    Ok(())
}

/// Defaults, then the config file (created on first run), then flags.
pub fn load(cli: &Cli) -> Result<Config> {
    let cache_dir = default_cache_dir()?;
    fs::create_dir_all(&cache_dir)
        .with_context(|| format!("failed to create cache directory {}", cache_dir.display()))?;

    let entries = default_entries(&cache_dir);
    let mut raw = defaults_map(&entries);

    let config_path = config_file_path()?;
    if config_path.exists() {
        let text = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file {}", config_path.display()))?;
        apply_config_text(&mut raw, &text, &config_path)?;
    } else {
        write_default_config(&config_path, &entries)?;
    }

    for (key, value) in cli.overrides() {
        raw.insert(key.to_string(), value);
    }

    Ok(Config::from_map(&raw)?)
}

fn write_default_config(path: &Path, entries: &[DefaultEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create config directory {}", parent.display())
        })?;
    }
    fs::write(path, render_config_file(entries))
        .with_context(|| format!("failed to write default config {}", path.display()))
}
