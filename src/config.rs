use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the report client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoutineReportConfig {
    /// Moderation backend settings
    pub backend: BackendConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the moderation API
    pub base_url: String,
    /// Bearer token identifying the reporter (can be set via env var)
    pub api_token: Option<String>,
    /// Client-side timeout for one report call
    pub timeout_seconds: u64,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl Default for RoutineReportConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://localhost:8080/api".to_string(),
                api_token: None, // Read from env var or config file
                timeout_seconds: 30,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: true,
            },
        }
    }
}

impl RoutineReportConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (routine-report.toml)
    /// 3. Environment variables (prefixed with ROUTINE_REPORT__)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("routine-report.toml"))
    }

    /// Same as `load`, reading the given file when it exists
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("ROUTINE_REPORT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut loaded: RoutineReportConfig = builder.build()?.try_deserialize()?;

        if loaded.backend.api_token.is_none() {
            if let Ok(token) = std::env::var("ROUTINE_REPORT_TOKEN") {
                loaded.backend.api_token = Some(token);
            }
        }

        Ok(loaded)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<RoutineReportConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = RoutineReportConfig::load_env_file();
        RoutineReportConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static RoutineReportConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
