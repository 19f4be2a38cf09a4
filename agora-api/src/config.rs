/// Configuration management for the API server
///
/// Configuration is read from environment variables (a `.env` file is
/// loaded first when present).
///
/// # Environment Variables
///
/// | Variable | Default | |
/// |---|---|---|
/// | `API_HOST` | `0.0.0.0` | bind host |
/// | `API_PORT` | `8080` | bind port |
/// | `API_CORS_ORIGINS` | `*` | comma-separated origins |
/// | `API_PRODUCTION` | `false` | enables HSTS |
/// | `DATABASE_URL` | required | PostgreSQL URL |
/// | `DATABASE_MAX_CONNECTIONS` | `10` | |
/// | `REDIS_URL` | unset | rate limiting is disabled without it |
/// | `AUTH_JWT_SECRET` | required | session signing secret, >= 32 chars |
/// | `AUTH_ISSUER` | `agora-auth` | expected `iss` claim |
/// | `MEDIA_CLOUD_NAME`, `MEDIA_API_KEY`, `MEDIA_API_SECRET` | unset | uploads are disabled without them |
/// | `MEDIA_API_BASE_URL` | `https://api.cloudinary.com/v1_1` | |
/// | `MEDIA_FOLDER` | `agora` | |
/// | `MEDIA_MAX_BYTES` | `26214400` | |
/// | `MAIL_LINK_BASE_URL` | `http://localhost:3000` | base of links in emails |
/// | `CONTRIBUTION_POLL_SECS` | `5` | SSE poll interval |
/// | `CONTRIBUTION_RETRY_MS` | `5000` | SSE `retry:` field |
/// | `RATE_LIMIT_PER_MINUTE` | `120` | mutations per user |
/// | `RATE_LIMIT_BURST` | `30` | bucket capacity |
///
/// # Example
///
/// ```no_run
/// use agora_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use agora_shared::integrations::media::HostedMediaConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub mail: MailConfig,
    pub contributions: ContributionStreamConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS on)
    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Rate limiting is off when unset
    pub url: Option<String>,
}

/// Session tokens issued by the authentication provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub session_secret: String,

    pub issuer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub api_base_url: String,
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,

    #[serde(skip_serializing)]
    pub api_secret: Option<String>,

    pub folder: String,
    pub max_bytes: usize,
    pub timeout_secs: u64,
}

impl MediaConfig {
    /// Hosting client settings, or `None` when credentials are missing
    pub fn hosted(&self) -> Option<HostedMediaConfig> {
        match (&self.cloud_name, &self.api_key, &self.api_secret) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(HostedMediaConfig {
                api_base_url: self.api_base_url.clone(),
                cloud_name: cloud_name.clone(),
                api_key: api_key.clone(),
                api_secret: api_secret.clone(),
                root_folder: self.folder.clone(),
                timeout_secs: self.timeout_secs,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Public web URL used to build links in notification emails
    pub link_base_url: String,
}

/// Live contribution counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionStreamConfig {
    pub poll_secs: u64,
    pub retry_ms: u64,
    pub keep_alive_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst: u32,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or `AUTH_JWT_SECRET` is missing
    /// - `AUTH_JWT_SECRET` is shorter than 32 characters
    /// - A numeric variable does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let session_secret = var("AUTH_JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("AUTH_JWT_SECRET environment variable is required"))?;

        if session_secret.len() < 32 {
            anyhow::bail!("AUTH_JWT_SECRET must be at least 32 characters long");
        }

        let cors_origins = var("API_CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let config = Self {
            api: ApiConfig {
                host: var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(var("API_PORT"), "API_PORT", 8080)?,
                cors_origins,
                production: parse_or(var("API_PRODUCTION"), "API_PRODUCTION", false)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or(var("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            redis: RedisConfig {
                url: var("REDIS_URL"),
            },
            auth: AuthConfig {
                session_secret,
                issuer: var("AUTH_ISSUER").unwrap_or_else(|| "agora-auth".to_string()),
            },
            media: MediaConfig {
                api_base_url: var("MEDIA_API_BASE_URL")
                    .unwrap_or_else(|| "https://api.cloudinary.com/v1_1".to_string()),
                cloud_name: var("MEDIA_CLOUD_NAME"),
                api_key: var("MEDIA_API_KEY"),
                api_secret: var("MEDIA_API_SECRET"),
                folder: var("MEDIA_FOLDER").unwrap_or_else(|| "agora".to_string()),
                max_bytes: parse_or(var("MEDIA_MAX_BYTES"), "MEDIA_MAX_BYTES", 25 * 1024 * 1024)?,
                timeout_secs: parse_or(var("MEDIA_TIMEOUT_SECS"), "MEDIA_TIMEOUT_SECS", 60)?,
            },
            mail: MailConfig {
                link_base_url: var("MAIL_LINK_BASE_URL")
                    .unwrap_or_else(|| "http://localhost:3000".to_string()),
            },
            contributions: ContributionStreamConfig {
                poll_secs: parse_or(var("CONTRIBUTION_POLL_SECS"), "CONTRIBUTION_POLL_SECS", 5)?,
                retry_ms: parse_or(var("CONTRIBUTION_RETRY_MS"), "CONTRIBUTION_RETRY_MS", 5000)?,
                keep_alive_secs: 15,
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: parse_or(var("RATE_LIMIT_PER_MINUTE"), "RATE_LIMIT_PER_MINUTE", 120)?,
                burst: parse_or(var("RATE_LIMIT_BURST"), "RATE_LIMIT_BURST", 30)?,
            },
        };

        if config.contributions.poll_secs == 0 {
            anyhow::bail!("CONTRIBUTION_POLL_SECS must be greater than zero");
        }

        if config.rate_limit.requests_per_minute == 0 || config.rate_limit.burst == 0 {
            anyhow::bail!("RATE_LIMIT_PER_MINUTE and RATE_LIMIT_BURST must be greater than zero");
        }

        Ok(config)
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/agora"),
            ("AUTH_JWT_SECRET", SECRET),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api.cors_origins, vec!["*".to_string()]);
        assert!(!config.api.production);
        assert!(config.redis.url.is_none());
        assert_eq!(config.auth.issuer, "agora-auth");
        assert_eq!(config.contributions.poll_secs, 5);
        assert_eq!(config.contributions.retry_ms, 5000);
        assert_eq!(config.rate_limit.requests_per_minute, 120);
        assert!(config.media.hosted().is_none());
    }

    #[test]
    fn test_missing_required() {
        assert!(load(&[("AUTH_JWT_SECRET", SECRET)]).is_err());
        assert!(load(&[("DATABASE_URL", "postgresql://localhost/agora")]).is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgresql://localhost/agora"),
            ("AUTH_JWT_SECRET", "too-short"),
        ])
        .unwrap_err();

        assert!(err.to_string().contains("32 characters"));
    }

    #[test]
    fn test_invalid_number() {
        let err = load(&[
            ("DATABASE_URL", "postgresql://localhost/agora"),
            ("AUTH_JWT_SECRET", SECRET),
            ("API_PORT", "eighty"),
        ])
        .unwrap_err();

        assert!(err.to_string().contains("API_PORT"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/agora"),
            ("AUTH_JWT_SECRET", SECRET),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "9000"),
            ("API_CORS_ORIGINS", "https://agora.example, https://admin.agora.example"),
            ("API_PRODUCTION", "true"),
            ("REDIS_URL", "redis://localhost:6379"),
            ("CONTRIBUTION_POLL_SECS", "2"),
            ("MEDIA_CLOUD_NAME", "agora"),
            ("MEDIA_API_KEY", "key"),
            ("MEDIA_API_SECRET", "secret"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.api.cors_origins.len(), 2);
        assert!(config.api.production);
        assert_eq!(config.redis.url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.contributions.poll_secs, 2);

        let media = config.media.hosted().unwrap();
        assert_eq!(media.cloud_name, "agora");
        assert_eq!(media.root_folder, "agora");
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        assert!(load(&[
            ("DATABASE_URL", "postgresql://localhost/agora"),
            ("AUTH_JWT_SECRET", SECRET),
            ("CONTRIBUTION_POLL_SECS", "0"),
        ])
        .is_err());
    }
}
