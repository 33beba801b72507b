use std::time::Duration;

use anyhow::{bail, Context};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::Deserialize;
use tracing::warn;

/// Secret used when `JWT_SECRET` is unset outside of production.
pub const DEV_JWT_SECRET: &str = "taskvault-dev-secret-change-me";

/// Accepted `JWT_TTL_MINUTES`: one minute up to one year.
pub const JWT_TTL_RANGE: std::ops::RangeInclusive<i64> = 1..=525_600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_attempts: u32,
    pub connect_retry: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Password policy and Argon2 cost parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl PasswordConfig {
    pub fn argon2(&self) -> anyhow::Result<Argon2<'static>> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: AppEnv,
    pub host: String,
    pub port: u16,
    pub database: DbConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, so tests can feed a map.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV").as_deref().map(str::trim) {
            None | Some("") | Some("development") | Some("dev") => AppEnv::Development,
            Some("production") | Some("prod") => AppEnv::Production,
            Some(other) => bail!("unknown APP_ENV {other:?}"),
        };

        let database_url = lookup("DATABASE_URL")
            .or_else(|| lookup("DB_DSN"))
            .context("DATABASE_URL is not set")?;

        let secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if env == AppEnv::Production => {
                bail!("JWT_SECRET must be set when APP_ENV=production")
            }
            None => {
                warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let ttl_minutes = parse_or(&lookup, "JWT_TTL_MINUTES", 60 * 24)?;
        if !JWT_TTL_RANGE.contains(&ttl_minutes) {
            bail!(
                "JWT_TTL_MINUTES={ttl_minutes} is out of range {}..={}",
                JWT_TTL_RANGE.start(),
                JWT_TTL_RANGE.end()
            );
        }

        let defaults = Params::default();

        Ok(Self {
            env,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: match parse_opt(&lookup, "APP_PORT")? {
                Some(port) => port,
                None => parse_or(&lookup, "PORT", 8080)?,
            },
            database: DbConfig {
                url: database_url,
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
                connect_attempts: parse_or(&lookup, "DB_CONNECT_ATTEMPTS", 30)?,
                connect_retry: Duration::from_secs(parse_or(&lookup, "DB_CONNECT_RETRY_SECS", 3)?),
            },
            jwt: JwtConfig {
                secret,
                issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "taskvault".into()),
                audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "taskvault-users".into()),
                ttl_minutes,
            },
            password: PasswordConfig {
                min_length: parse_or(&lookup, "PASSWORD_MIN_LENGTH", 6)?,
                memory_kib: parse_or(&lookup, "ARGON2_MEMORY_KIB", defaults.m_cost())?,
                iterations: parse_or(&lookup, "ARGON2_ITERATIONS", defaults.t_cost())?,
                parallelism: parse_or(&lookup, "ARGON2_PARALLELISM", defaults.p_cost())?,
            },
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty() && *o != "*")
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

/// Parses `key` if present; a present but malformed value is an error.
fn parse_opt<F, T>(lookup: &F, key: &str) -> anyhow::Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}"))
        })
        .transpose()
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_in_development() {
        let cfg = config_from(&[("DATABASE_URL", "postgres://localhost/tasks")]).unwrap();
        assert_eq!(cfg.env, AppEnv::Development);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.jwt.secret, DEV_JWT_SECRET);
        assert_eq!(cfg.jwt.ttl_minutes, 1440);
        assert_eq!(cfg.password.min_length, 6);
        assert_eq!(cfg.database.connect_attempts, 30);
        assert_eq!(cfg.database.connect_retry, Duration::from_secs(3));
        assert!(cfg.cors_allowed_origins.is_empty());
    }

    #[test]
    fn production_requires_secret() {
        let err = config_from(&[
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://localhost/tasks"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn database_url_is_required() {
        assert!(config_from(&[]).is_err());
        let cfg = config_from(&[("DB_DSN", "postgres://db/tasks")]).unwrap();
        assert_eq!(cfg.database.url, "postgres://db/tasks");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = config_from(&[
            ("DATABASE_URL", "postgres://localhost/tasks"),
            ("JWT_SECRET", "s3cret"),
            ("PORT", "9000"),
            ("PASSWORD_MIN_LENGTH", "10"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:3000, https://app.example.com"),
        ])
        .unwrap();
        assert_eq!(cfg.jwt.secret, "s3cret");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.password.min_length, 10);
        assert_eq!(
            cfg.cors_allowed_origins,
            vec!["http://localhost:3000", "https://app.example.com"]
        );
    }

    #[test]
    fn malformed_number_is_an_error() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/tasks"),
            ("JWT_TTL_MINUTES", "a day"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("JWT_TTL_MINUTES"));
    }

    #[test]
    fn token_ttl_must_be_in_range() {
        for bad in ["0", "-5", "525601", "9223372036854775807"] {
            let err = config_from(&[
                ("DATABASE_URL", "postgres://localhost/tasks"),
                ("JWT_TTL_MINUTES", bad),
            ])
            .unwrap_err();
            assert!(err.to_string().contains("out of range"), "{bad}: {err}");
        }

        let cfg = config_from(&[
            ("DATABASE_URL", "postgres://localhost/tasks"),
            ("JWT_TTL_MINUTES", "525600"),
        ])
        .unwrap();
        assert_eq!(cfg.jwt.ttl_minutes, 525_600);
    }
}
