// Configuration loading and parsing (grana.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub store: StoreConfig,
    pub credentials: CredentialsConfig,
}

// ---------------------------------------------------------------------------
// grana.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire grana.toml file.
#[derive(Debug, Clone, Deserialize)]
struct GranaFile {
    server: ServerConfig,
    llm: LlmConfig,
    store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on, e.g. `127.0.0.1:3000`.
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound on model calls per chat request.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Supabase,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
    #[serde(default)]
    pub supabase_url: Option<String>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_steps() -> usize {
    8
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_sqlite_path() -> String {
    "grana.db".to_string()
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub openai_api_key: Option<String>,
    pub supabase_service_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/grana.toml` and
/// (optionally) `config/credentials.toml`, relative to `base_dir`.
///
/// `env` looks up environment overrides (`OPENAI_API_KEY`, `SUPABASE_URL`,
/// `SUPABASE_SERVICE_ROLE_KEY`); they win over file values.
///
/// This does not auto-copy defaults. Prefer `load_config()`.
pub fn load_config_from<F>(base_dir: &Path, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config_dir = base_dir.join("config");

    // --- grana.toml (required) ---
    let grana_path = config_dir.join("grana.toml");
    let grana_text = read_file(&grana_path)?;
    let grana_file: GranaFile =
        toml::from_str(&grana_text).map_err(|e| ConfigError::ParseError {
            path: grana_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let mut config = Config {
        server: grana_file.server,
        llm: grana_file.llm,
        store: grana_file.store,
        credentials,
    };

    apply_env_overrides(&mut config, env);
    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working
/// directory with process environment overrides. Ensures default config
/// files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd, |key| std::env::var(key).ok())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn apply_env_overrides<F>(config: &mut Config, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = non_empty("OPENAI_API_KEY") {
        config.credentials.openai_api_key = Some(key);
    }
    if let Some(url) = non_empty("SUPABASE_URL") {
        config.store.supabase_url = Some(url);
    }
    if let Some(key) = non_empty("SUPABASE_SERVICE_ROLE_KEY") {
        config.credentials.supabase_service_key = Some(key);
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.server.bind.parse::<std::net::SocketAddr>().is_err() {
        return Err(ConfigError::ValidationError {
            field: "server.bind".into(),
            message: format!("not a socket address: {}", config.server.bind),
        });
    }

    if config.llm.model.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "llm.model".into(),
            message: "must not be empty".into(),
        });
    }

    if config.llm.max_steps == 0 {
        return Err(ConfigError::ValidationError {
            field: "llm.max_steps".into(),
            message: "must be greater than 0".into(),
        });
    }

    let temp = config.llm.temperature;
    if !(0.0..=2.0).contains(&temp) {
        return Err(ConfigError::ValidationError {
            field: "llm.temperature".into(),
            message: format!("must be between 0.0 and 2.0 inclusive, got {temp}"),
        });
    }

    match config.store.backend {
        StoreBackend::Sqlite => {
            if config.store.sqlite_path.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    field: "store.sqlite_path".into(),
                    message: "must not be empty".into(),
                });
            }
        }
        StoreBackend::Supabase => {
            if is_blank(&config.store.supabase_url) {
                return Err(ConfigError::ValidationError {
                    field: "store.supabase_url".into(),
                    message: "required when store.backend = \"supabase\"".into(),
                });
            }
            if is_blank(&config.credentials.supabase_service_key) {
                return Err(ConfigError::ValidationError {
                    field: "credentials.supabase_service_key".into(),
                    message: "required when store.backend = \"supabase\"".into(),
                });
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
