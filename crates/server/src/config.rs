use log::{info, warn};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const ENV_FILE: &str = "crates/server/.env.server";
const CONFIG_FILE: &str = "coin-dash.toml";

pub const DEFAULT_API_BASE: &str = "https://api.coingecko.com/api/v3";

pub struct ServerConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub log_level: String,
    pub http_host: String,
    pub http_port: u16,
    pub refresh_interval_seconds: u32,
    pub page_size: u32,
    pub preferences_path: String,
    pub min_refresh_visible: Duration,
}

/// Optional `coin-dash.toml`. Every key may be omitted; environment
/// variables take precedence over anything set here.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub log_level: Option<String>,
    pub http_host: Option<String>,
    pub http_port: Option<u16>,
    pub refresh_interval_seconds: Option<u32>,
    pub page_size: Option<u32>,
    pub preferences_path: Option<String>,
    pub min_refresh_visible_ms: Option<u64>,
}

impl FileConfig {
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE, e))
    }

    fn read(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(FileConfig::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_string(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}={}", key, raw);
            None
        }
    }
}

impl ServerConfig {
    pub fn load() -> Result<Self, String> {
        match dotenv::from_filename(ENV_FILE) {
            Ok(path) => println!("Loaded environment from: {}", path.display()),
            Err(e) => println!("No {} loaded: {}", ENV_FILE, e),
        }

        let file = FileConfig::read(Path::new(CONFIG_FILE))?;
        Ok(Self::from_sources(file))
    }

    /// Merges the config file with the process environment.
    pub fn from_sources(file: FileConfig) -> Self {
        let api_base = env_string("COINGECKO_API_BASE")
            .or(file.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let api_key = env_string("COINGECKO_API_KEY").or(file.api_key);
        if api_key.is_none() {
            info!("COINGECKO_API_KEY not set, using the public API without a key");
        }

        let log_level = env_string("LOG_LEVEL")
            .or(file.log_level)
            .unwrap_or_else(|| "INFO".to_string());

        let http_host = env_string("HTTP_HOST")
            .or(file.http_host)
            .unwrap_or_else(|| "0.0.0.0".to_string());

        let http_port = env_parsed("HTTP_PORT").or(file.http_port).unwrap_or(8080);

        let refresh_interval_seconds = env_parsed("REFRESH_INTERVAL_SECONDS")
            .or(file.refresh_interval_seconds)
            .unwrap_or(shared::scheduler::DEFAULT_INTERVAL_SECONDS);

        let page_size = env_parsed("PAGE_SIZE").or(file.page_size).unwrap_or(100);

        let preferences_path = env_string("PREFERENCES_PATH")
            .or(file.preferences_path)
            .unwrap_or_else(|| "coin-dash-preferences.json".to_string());

        let min_refresh_visible = file
            .min_refresh_visible_ms
            .map(Duration::from_millis)
            .unwrap_or(shared::scheduler::DEFAULT_MIN_VISIBLE);

        ServerConfig {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            log_level,
            http_host,
            http_port,
            refresh_interval_seconds,
            page_size,
            preferences_path,
            min_refresh_visible,
        }
    }

    pub fn setup_logging(&self) {
        let mut builder = shared::logging::logger_builder(&self.log_level);

        // Request logs from actix's Logger middleware stay at INFO
        builder.filter_module("actix_web::middleware::logger", log::LevelFilter::Info);

        if builder.try_init().is_err() {
            warn!("Logger already initialized");
        }

        info!("Logging initialized with level: {}", self.log_level);
    }
}
