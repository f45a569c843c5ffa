mod engine;

pub use engine::EngineConfig;

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let mut engine = match env::var("ENGINE_TABLES_PATH") {
            Ok(path) if !path.trim().is_empty() => load_engine_file(PathBuf::from(path))?,
            _ => EngineConfig::default(),
        };

        if let Ok(country) = env::var("ENGINE_DOMESTIC_COUNTRY") {
            let country = country.trim();
            if !country.is_empty() {
                engine.tables.domestic_country = country.to_ascii_uppercase();
            }
        }

        if let Ok(raw) = env::var("ENGINE_NOT_ELIGIBLE_CEILING") {
            engine.matching.not_eligible_ceiling = raw
                .trim()
                .parse::<f64>()
                .map_err(|_| ConfigError::InvalidCeiling { value: raw.clone() })?;
        }

        engine.validate()?;

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            engine,
        })
    }
}

fn load_engine_file(path: PathBuf) -> Result<EngineConfig, ConfigError> {
    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::TablesFile {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::TablesFormat { path, source })
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidCeiling {
        value: String,
    },
    InvalidTables(String),
    TablesFile {
        path: PathBuf,
        source: std::io::Error,
    },
    TablesFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCeiling { value } => write!(
                f,
                "ENGINE_NOT_ELIGIBLE_CEILING must be a number between 0 and 100 (found '{value}')"
            ),
            ConfigError::InvalidTables(detail) => write!(f, "invalid scoring tables: {detail}"),
            ConfigError::TablesFile { path, .. } => {
                write!(f, "unable to read ENGINE_TABLES_PATH '{}'", path.display())
            }
            ConfigError::TablesFormat { path, .. } => {
                write!(f, "ENGINE_TABLES_PATH '{}' is not valid JSON", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidCeiling { .. } | ConfigError::InvalidTables(_) => None,
            ConfigError::TablesFile { source, .. } => Some(source),
            ConfigError::TablesFormat { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("ENGINE_TABLES_PATH");
        env::remove_var("ENGINE_DOMESTIC_COUNTRY");
        env::remove_var("ENGINE_NOT_ELIGIBLE_CEILING");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn environment_overrides_engine_dials() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "prod");
        env::set_var("ENGINE_DOMESTIC_COUNTRY", "nz");
        env::set_var("ENGINE_NOT_ELIGIBLE_CEILING", "25");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.engine.tables.domestic_country, "NZ");
        assert_eq!(config.engine.matching.not_eligible_ceiling, 25.0);
        reset_env();
    }

    #[test]
    fn rejects_out_of_range_ceiling() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ENGINE_NOT_ELIGIBLE_CEILING", "140");
        let err = AppConfig::load().expect_err("ceiling above 100 rejected");
        assert!(matches!(err, ConfigError::InvalidCeiling { .. }));

        env::set_var("ENGINE_NOT_ELIGIBLE_CEILING", "lots");
        let err = AppConfig::load().expect_err("non-numeric ceiling rejected");
        assert!(matches!(err, ConfigError::InvalidCeiling { .. }));
        reset_env();
    }

    #[test]
    fn missing_tables_file_is_reported() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ENGINE_TABLES_PATH", "/nonexistent/pathway-engine/tables.json");
        let err = AppConfig::load().expect_err("missing file rejected");
        assert!(matches!(err, ConfigError::TablesFile { .. }));
        reset_env();
    }
}
