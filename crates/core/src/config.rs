use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub llm: LlmConfig,
    pub web_search: WebSearchConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub url: String,
    /// When false the session store skips the connectivity probe and uses
    /// the in-process fallback directly.
    pub enabled: bool,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct WebSearchConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub max_results: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub session_capacity: usize,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub redis_enabled: Option<bool>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub web_search_api_key: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://estately.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            redis: RedisConfig { url: "redis://127.0.0.1:6379".to_string(), enabled: true },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://router.huggingface.co/v1".to_string(),
                model: "meta-llama/Llama-3.2-3B-Instruct:novita".to_string(),
                max_tokens: 200,
                temperature: 0.1,
                timeout_secs: 30,
            },
            web_search: WebSearchConfig {
                api_key: None,
                base_url: "https://api.tavily.com/search".to_string(),
                max_results: 3,
                timeout_secs: 10,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                session_capacity: 256,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("estately.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(redis) = patch.redis {
            if let Some(url) = redis.url {
                self.redis.url = url;
            }
            if let Some(enabled) = redis.enabled {
                self.redis.enabled = enabled;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(max_tokens) = llm.max_tokens {
                self.llm.max_tokens = max_tokens;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(web_search) = patch.web_search {
            if let Some(web_search_api_key_value) = web_search.api_key {
                self.web_search.api_key = Some(secret_value(web_search_api_key_value));
            }
            if let Some(base_url) = web_search.base_url {
                self.web_search.base_url = base_url;
            }
            if let Some(max_results) = web_search.max_results {
                self.web_search.max_results = max_results;
            }
            if let Some(timeout_secs) = web_search.timeout_secs {
                self.web_search.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(session_capacity) = server.session_capacity {
                self.server.session_capacity = session_capacity;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ESTATELY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("ESTATELY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("ESTATELY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("ESTATELY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("ESTATELY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ESTATELY_REDIS_URL") {
            self.redis.url = value;
        }
        if let Some(value) = read_env("ESTATELY_REDIS_ENABLED") {
            self.redis.enabled = parse_bool("ESTATELY_REDIS_ENABLED", &value)?;
        }

        if let Some(value) = read_env("ESTATELY_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("ESTATELY_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("ESTATELY_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("ESTATELY_LLM_MAX_TOKENS") {
            self.llm.max_tokens = parse_u32("ESTATELY_LLM_MAX_TOKENS", &value)?;
        }
        if let Some(value) = read_env("ESTATELY_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("ESTATELY_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("ESTATELY_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("ESTATELY_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ESTATELY_WEB_SEARCH_API_KEY") {
            self.web_search.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("ESTATELY_WEB_SEARCH_BASE_URL") {
            self.web_search.base_url = value;
        }
        if let Some(value) = read_env("ESTATELY_WEB_SEARCH_MAX_RESULTS") {
            self.web_search.max_results = parse_u32("ESTATELY_WEB_SEARCH_MAX_RESULTS", &value)?;
        }
        if let Some(value) = read_env("ESTATELY_WEB_SEARCH_TIMEOUT_SECS") {
            self.web_search.timeout_secs = parse_u64("ESTATELY_WEB_SEARCH_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ESTATELY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("ESTATELY_SERVER_PORT") {
            self.server.port = parse_u16("ESTATELY_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("ESTATELY_SERVER_SESSION_CAPACITY") {
            self.server.session_capacity =
                parse_u32("ESTATELY_SERVER_SESSION_CAPACITY", &value)? as usize;
        }
        if let Some(value) = read_env("ESTATELY_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("ESTATELY_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("ESTATELY_LOGGING_LEVEL").or_else(|| read_env("ESTATELY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ESTATELY_LOGGING_FORMAT").or_else(|| read_env("ESTATELY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(redis_url) = overrides.redis_url {
            self.redis.url = redis_url;
        }
        if let Some(redis_enabled) = overrides.redis_enabled {
            self.redis.enabled = redis_enabled;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(web_search_api_key) = overrides.web_search_api_key {
            self.web_search.api_key = Some(secret_value(web_search_api_key));
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_redis(&self.redis)?;
        validate_llm(&self.llm)?;
        validate_web_search(&self.web_search)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("estately.toml"), PathBuf::from("config/estately.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_redis(redis: &RedisConfig) -> Result<(), ConfigError> {
    if redis.enabled && !redis.url.starts_with("redis://") && !redis.url.starts_with("rediss://") {
        return Err(ConfigError::Validation(
            "redis.url must start with redis:// or rediss:// when redis is enabled".to_string(),
        ));
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.max_tokens == 0 {
        return Err(ConfigError::Validation(
            "llm.max_tokens must be greater than zero".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if !llm.base_url.starts_with("http://") && !llm.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if let Some(api_key) = &llm.api_key {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "llm.api_key must not be empty when provided".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_web_search(web_search: &WebSearchConfig) -> Result<(), ConfigError> {
    if web_search.max_results == 0 {
        return Err(ConfigError::Validation(
            "web_search.max_results must be greater than zero".to_string(),
        ));
    }

    if web_search.timeout_secs == 0 || web_search.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "web_search.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    if !web_search.base_url.starts_with("http://")
        && !web_search.base_url.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "web_search.base_url must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    if server.session_capacity == 0 {
        return Err(ConfigError::Validation(
            "server.session_capacity must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    redis: Option<RedisPatch>,
    llm: Option<LlmPatch>,
    web_search: Option<WebSearchPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RedisPatch {
    url: Option<String>,
    enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WebSearchPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    max_results: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    session_capacity: Option<usize>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
