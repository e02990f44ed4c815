use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be a positive number of seconds, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// | Env Var                          | Default                          |
/// |----------------------------------|----------------------------------|
/// | `DATABASE_URL`                   | required                         |
/// | `REPORTS_ROOT`                   | `./storage/reports`              |
/// | `TEMPLATES_ROOT`                 | `./templates`                    |
/// | `REPORT_FONT_PATH`               | `./fonts/NotoSansJP-Regular.ttf` |
/// | `REPORT_GENERATION_TIMEOUT_SECS` | `120`                            |
/// | `BIND_ADDRESS`                   | `0.0.0.0:8080`                   |
/// | `CORS_ORIGINS`                   | `http://localhost:3000,http://localhost:5173` |
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub database_url: String,
    pub reports_root: PathBuf,
    pub templates_root: PathBuf,
    pub font_path: PathBuf,
    pub generation_timeout: Duration,
    pub bind_address: String,
    pub cors_origins: Vec<String>,
}

impl ReportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let timeout_raw = var("REPORT_GENERATION_TIMEOUT_SECS", "120");
        let timeout_secs = timeout_raw
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidNumber {
                name: "REPORT_GENERATION_TIMEOUT_SECS",
                value: timeout_raw.clone(),
            })?;

        let cors_origins = var("CORS_ORIGINS", "http://localhost:3000,http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url,
            reports_root: PathBuf::from(var("REPORTS_ROOT", "./storage/reports")),
            templates_root: PathBuf::from(var("TEMPLATES_ROOT", "./templates")),
            font_path: PathBuf::from(var("REPORT_FONT_PATH", "./fonts/NotoSansJP-Regular.ttf")),
            generation_timeout: Duration::from_secs(timeout_secs),
            bind_address: var("BIND_ADDRESS", "0.0.0.0:8080"),
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ReportConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/db")]))
            .unwrap();
        assert_eq!(config.reports_root, PathBuf::from("./storage/reports"));
        assert_eq!(config.templates_root, PathBuf::from("./templates"));
        assert_eq!(config.generation_timeout, Duration::from_secs(120));
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn test_overrides() {
        let config = ReportConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("REPORTS_ROOT", "/var/reports"),
            ("REPORT_GENERATION_TIMEOUT_SECS", "30"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
        ]))
        .unwrap();
        assert_eq!(config.reports_root, PathBuf::from("/var/reports"));
        assert_eq!(config.generation_timeout.as_secs(), 30);
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_missing_database_url() {
        assert_eq!(
            ReportConfig::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn test_invalid_timeout() {
        let result = ReportConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("REPORT_GENERATION_TIMEOUT_SECS", "soon"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));

        let result = ReportConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("REPORT_GENERATION_TIMEOUT_SECS", "0"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
    }
}
