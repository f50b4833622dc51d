//! Configuration for listeny.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (LISTENY_HOME, LISTENY_NOTES, LISTENY_TZ,
//!    OLLAMA_HOST, WHISPER_PATH)
//! 2. Config file (.listeny/config.yaml)
//! 3. Defaults (~/.listeny)
//!
//! Config file discovery:
//! - Searches current directory and parents for .listeny/config.yaml
//! - Paths in config file are relative to the .listeny/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::adapters::{ollama, speech};
use crate::domain::Mode;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Default notes timezone
pub const DEFAULT_TIMEZONE: &str = "America/Chicago";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    /// IANA timezone name for note timestamps
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub ollama: Option<OllamaConfig>,
    #[serde(default)]
    pub whisper: Option<WhisperConfig>,
    #[serde(default)]
    pub speech: Option<SpeechConfig>,
    #[serde(default)]
    pub session: Option<SessionConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .listeny/)
    pub home: Option<String>,
    /// Daily notes directory (relative to .listeny/)
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    pub host: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhisperConfig {
    pub binary: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub command: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub mode: Option<Mode>,
    pub cooldown_ms: Option<u64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to listeny home
    pub home: PathBuf,
    /// Directory holding the daily logs
    pub notes_dir: PathBuf,
    /// Timezone notes are stamped in
    pub timezone: Tz,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub ollama: OllamaSettings,
    pub whisper: WhisperSettings,
    pub speech: SpeechSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaSettings {
    pub host: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            host: ollama::DEFAULT_HOST.to_string(),
            model: ollama::DEFAULT_MODEL.to_string(),
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhisperSettings {
    pub binary: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for WhisperSettings {
    fn default() -> Self {
        Self {
            binary: "/opt/homebrew/bin/whisper".to_string(),
            model: "base".to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechSettings {
    pub command: String,
    pub enabled: bool,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            command: speech::default_program().to_string(),
            enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub mode: Mode,
    pub cooldown_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Note,
            cooldown_ms: 2000,
        }
    }
}

impl SessionSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".listeny").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", name, e))
}

/// Merge defaults, an optional config file and environment lookups
fn resolve(
    default_home: PathBuf,
    file: Option<(&Path, ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let (config_path, file) = match file {
        Some((path, file)) => (Some(path), file),
        None => (None, ConfigFile::default()),
    };

    // Paths in the file are relative to .listeny/
    let base_dir = config_path
        .and_then(|p| p.parent())
        .map(Path::to_path_buf);

    let from_file = |value: &Option<String>| -> Option<PathBuf> {
        let value = value.as_deref()?;
        Some(match &base_dir {
            Some(base) => resolve_path(base, value),
            None => PathBuf::from(value),
        })
    };

    let home = env("LISTENY_HOME")
        .map(PathBuf::from)
        .or_else(|| from_file(&file.paths.home))
        .unwrap_or(default_home);

    let notes_dir = env("LISTENY_NOTES")
        .map(PathBuf::from)
        .or_else(|| from_file(&file.paths.notes))
        .unwrap_or_else(|| home.join("notes"));

    let tz_name = env("LISTENY_TZ")
        .or(file.timezone)
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    let timezone = parse_timezone(&tz_name)?;

    let mut ollama = OllamaSettings::default();
    if let Some(cfg) = file.ollama {
        if let Some(host) = cfg.host {
            ollama.host = host;
        }
        if let Some(model) = cfg.model {
            ollama.model = model;
        }
        if let Some(secs) = cfg.timeout_seconds {
            ollama.timeout_seconds = secs;
        }
    }
    if let Some(host) = env("OLLAMA_HOST") {
        ollama.host = host;
    }

    let mut whisper = WhisperSettings::default();
    if let Some(cfg) = file.whisper {
        if let Some(binary) = cfg.binary {
            whisper.binary = binary;
        }
        if let Some(model) = cfg.model {
            whisper.model = model;
        }
        if let Some(secs) = cfg.timeout_seconds {
            whisper.timeout_seconds = secs;
        }
    }
    if let Some(binary) = env("WHISPER_PATH") {
        whisper.binary = binary;
    }

    let mut speech = SpeechSettings::default();
    if let Some(cfg) = file.speech {
        if let Some(command) = cfg.command {
            speech.command = command;
        }
        if let Some(enabled) = cfg.enabled {
            speech.enabled = enabled;
        }
    }

    let mut session = SessionSettings::default();
    if let Some(cfg) = file.session {
        if let Some(mode) = cfg.mode {
            session.mode = mode;
        }
        if let Some(ms) = cfg.cooldown_ms {
            session.cooldown_ms = ms;
        }
    }

    Ok(ResolvedConfig {
        home,
        notes_dir,
        timezone,
        config_file: config_path.map(Path::to_path_buf),
        ollama,
        whisper,
        speech,
        session,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".listeny");

    let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

    match find_config_file() {
        Some(path) => {
            let file = load_config_file(&path)?;
            resolve(default_home, Some((path.as_path(), file)), env)
        }
        None => resolve(default_home, None, env),
    }
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the directory holding the daily logs
pub fn notes_dir() -> Result<PathBuf> {
    Ok(config()?.notes_dir.clone())
}
