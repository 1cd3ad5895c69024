// config.rs
use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// SMTP settings. Absent when no credentials are configured, in which case
/// outgoing mail is only logged.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
}

/// Limits above which the superadmin health signal reports `degraded`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthThresholds {
    pub max_unassigned: i64,
    pub max_overdue: i64,
    pub max_urgent: i64,
    pub max_inactive_agents: i64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        HealthThresholds {
            max_unassigned: 10,
            max_overdue: 5,
            max_urgent: 5,
            max_inactive_agents: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub app_env: String,
    pub cors_origins: Vec<String>,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub smtp: Option<SmtpConfig>,
    pub seed_default_slas: bool,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub health_thresholds: HealthThresholds,
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET_KEY")?;
        let jwt_maxage = parsed("JWT_MAXAGE", 60)?;
        let port = parsed("PORT", 8000)?;
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "production".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        let max_upload_bytes = parsed("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?;

        // Mail stays log-only unless both credentials are present.
        let smtp = match (env::var("SMTP_USERNAME"), env::var("SMTP_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(SmtpConfig {
                    host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
                    port: parsed("SMTP_PORT", 587)?,
                    from_email: env::var("FROM_EMAIL").unwrap_or_else(|_| username.clone()),
                    username,
                    password,
                })
            }
            _ => None,
        };

        let seed_default_slas = parsed("SEED_DEFAULT_SLAS", false)?;

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_SUPERADMIN_EMAIL"),
            env::var("BOOTSTRAP_SUPERADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(BootstrapAdmin { email, password }),
            _ => None,
        };

        let defaults = HealthThresholds::default();
        let health_thresholds = HealthThresholds {
            max_unassigned: parsed("HEALTH_MAX_UNASSIGNED", defaults.max_unassigned)?,
            max_overdue: parsed("HEALTH_MAX_OVERDUE", defaults.max_overdue)?,
            max_urgent: parsed("HEALTH_MAX_URGENT", defaults.max_urgent)?,
            max_inactive_agents: parsed(
                "HEALTH_MAX_INACTIVE_AGENTS",
                defaults.max_inactive_agents,
            )?,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            app_env,
            cors_origins,
            upload_dir,
            max_upload_bytes,
            smtp,
            seed_default_slas,
            bootstrap_admin,
            health_thresholds,
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/helpdesk".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_maxage: 60,
        port: 8000,
        app_env: "development".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        upload_dir: std::env::temp_dir()
            .join("helpdesk-test-uploads")
            .to_string_lossy()
            .into_owned(),
        max_upload_bytes: 1024 * 1024,
        smtp: None,
        seed_default_slas: false,
        bootstrap_admin: None,
        health_thresholds: HealthThresholds::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds() {
        let thresholds = HealthThresholds::default();
        assert_eq!(thresholds.max_unassigned, 10);
        assert_eq!(thresholds.max_overdue, 5);
        assert_eq!(thresholds.max_urgent, 5);
        assert_eq!(thresholds.max_inactive_agents, 3);
    }

    #[test]
    fn development_flag_is_case_insensitive() {
        let mut config = test_config();
        config.app_env = "Development".to_string();
        assert!(config.is_development());
        config.app_env = "production".to_string();
        assert!(!config.is_development());
    }
}
