/// Worker configuration
///
/// Built with the `config` crate from defaults, `WORKER__*` environment
/// variables (`__` separates nested keys) and a few unprefixed variables
/// shared with the API:
///
/// | Variable | Key | Default |
/// |----------|-----|---------|
/// | `WORKER__POLL_INTERVAL_SECS` | `poll_interval_secs` | `2` |
/// | `WORKER__BATCH_SIZE` | `batch_size` | `20` |
/// | `WORKER__CLAIM_LEASE_SECS` | `claim_lease_secs` | `300` |
/// | `WORKER__DATABASE__MAX_CONNECTIONS` | `database.max_connections` | `5` |
/// | `DATABASE_URL` | `database.url` | required |
/// | `MAIL_API_URL` | `mail.api_url` | `https://api.resend.com/emails` |
/// | `MAIL_API_KEY` | `mail.api_key` | unset (emails are only logged) |
/// | `MAIL_FROM` | `mail.from` | `Agora <no-reply@agora.example>` |
/// | `WORKER__MAIL__TIMEOUT_SECS` | `mail.timeout_secs` | `10` |

use agora_shared::integrations::mail::MailerConfig;
use config::{ConfigError, Environment};
use serde::Deserialize;
use std::collections::HashMap;

const DEFAULT_MAIL_API_URL: &str = "https://api.resend.com/emails";
const DEFAULT_MAIL_FROM: &str = "Agora <no-reply@agora.example>";

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Sleep between polls when the outbox is empty
    pub poll_interval_secs: u64,

    /// Rows claimed per poll
    pub batch_size: i64,

    /// Age after which an unsettled `sending` row is claimed again
    pub claim_lease_secs: u64,

    pub database: DatabaseSettings,
    pub mail: MailSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub from: String,
    pub timeout_secs: u64,
}

impl WorkerConfig {
    /// Loads `.env` if present, then reads the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars().collect())
    }

    /// Builds the configuration from an explicit variable set
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let plain = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty()).cloned();

        let settings = config::Config::builder()
            .set_default("poll_interval_secs", 2_i64)?
            .set_default("batch_size", 20_i64)?
            .set_default("claim_lease_secs", 300_i64)?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 5_i64)?
            .set_default("mail.api_url", DEFAULT_MAIL_API_URL)?
            .set_default("mail.from", DEFAULT_MAIL_FROM)?
            .set_default("mail.timeout_secs", 10_i64)?
            .add_source(
                Environment::with_prefix("WORKER")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            )
            .set_override_option("database.url", plain("DATABASE_URL"))?
            .set_override_option("mail.api_url", plain("MAIL_API_URL"))?
            .set_override_option("mail.api_key", plain("MAIL_API_KEY"))?
            .set_override_option("mail.from", plain("MAIL_FROM"))?
            .build()?;

        let config: WorkerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Message("DATABASE_URL is required".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Message(
                "WORKER__POLL_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }
        if self.batch_size < 1 {
            return Err(ConfigError::Message(
                "WORKER__BATCH_SIZE must be at least 1".to_string(),
            ));
        }
        if self.claim_lease_secs == 0 {
            return Err(ConfigError::Message(
                "WORKER__CLAIM_LEASE_SECS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Mail API settings, or `None` when no API key is configured
    pub fn mailer(&self) -> Option<MailerConfig> {
        let api_key = self.mail.api_key.as_ref().filter(|k| !k.trim().is_empty())?;

        Some(MailerConfig {
            api_url: self.mail.api_url.clone(),
            api_key: api_key.clone(),
            from: self.mail.from.clone(),
            timeout_secs: self.mail.timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/agora")])).unwrap();

        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.claim_lease_secs, 300);
        assert_eq!(config.database.url, "postgres://localhost/agora");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.mail.api_url, DEFAULT_MAIL_API_URL);
        assert!(config.mailer().is_none());
    }

    #[test]
    fn test_prefixed_overrides() {
        let config = WorkerConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/agora"),
            ("WORKER__POLL_INTERVAL_SECS", "7"),
            ("WORKER__BATCH_SIZE", "50"),
            ("WORKER__CLAIM_LEASE_SECS", "60"),
            ("WORKER__DATABASE__MAX_CONNECTIONS", "2"),
            ("WORKER__MAIL__TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.poll_interval_secs, 7);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.claim_lease_secs, 60);
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.mail.timeout_secs, 3);
    }

    #[test]
    fn test_mail_settings() {
        let config = WorkerConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/agora"),
            ("MAIL_API_KEY", "re_123"),
            ("MAIL_FROM", "Agora <hello@agora.example>"),
        ]))
        .unwrap();

        let mailer = config.mailer().unwrap();
        assert_eq!(mailer.api_key, "re_123");
        assert_eq!(mailer.from, "Agora <hello@agora.example>");
        assert_eq!(mailer.timeout_secs, 10);
    }

    #[test]
    fn test_blank_api_key_disables_mailer() {
        let config = WorkerConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/agora"),
            ("MAIL_API_KEY", "  "),
        ]))
        .unwrap();

        assert!(config.mailer().is_none());
    }

    #[test]
    fn test_database_url_required() {
        let err = WorkerConfig::from_vars(HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let result = WorkerConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/agora"),
            ("WORKER__POLL_INTERVAL_SECS", "0"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_claim_lease_rejected() {
        let err = WorkerConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/agora"),
            ("WORKER__CLAIM_LEASE_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("CLAIM_LEASE_SECS"));
    }
}
