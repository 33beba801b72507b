use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::config::DbConfig;

/// Error surface shared by the repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A unique constraint rejected the write.
    #[error("unique constraint violated")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Conflict,
            _ => RepoError::Other(e.into()),
        }
    }
}

/// Connects to Postgres, retrying up to `connect_attempts` times.
/// Running out of attempts is fatal to startup.
pub async fn connect_with_retry(cfg: &DbConfig) -> anyhow::Result<PgPool> {
    let attempts = cfg.connect_attempts.max(1);
    let mut attempt = 1;
    loop {
        match PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .connect(&cfg.url)
            .await
        {
            Ok(pool) => {
                info!(attempt, "connected to database");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                warn!(attempt, attempts, error = %e, "database not reachable yet; retrying");
                tokio::time::sleep(cfg.connect_retry).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("connect to database (gave up after {attempts} attempts)")
                })
            }
        }
    }
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run database migrations")?;
    info!("migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let cfg = DbConfig {
            url: "not-a-postgres-url".into(),
            max_connections: 1,
            connect_attempts: 2,
            connect_retry: Duration::from_millis(1),
        };
        let err = connect_with_retry(&cfg).await.unwrap_err();
        assert!(err.to_string().contains("gave up after 2 attempts"));
    }

    #[test]
    fn non_database_errors_are_not_conflicts() {
        let err = RepoError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, RepoError::Other(_)));
    }
}
