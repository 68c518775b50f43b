//! # Exchange Rate Repository
//!
//! Recorded SDG/USD rates. Each user keeps one "current" rate that is
//! overwritten in place; older rows only exist if they were recorded before
//! that rule applied (or imported).
//!
//! ```text
//! record(600) ──► no rate yet      ──► INSERT
//! record(650) ──► latest exists    ──► UPDATE latest SET rate=650, date=now
//! ```
//!
//! Invoices never read this table. Callers pass the current rate on every
//! line, usually taken from [`ExchangeRateRepository::latest`].

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use super::{generate_id, EXCHANGE_RATE_COLUMNS};
use crate::error::{DbError, DbResult};
use nile_core::{ExchangeRate, FxRate};

#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    pool: SqlitePool,
}

impl ExchangeRateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExchangeRateRepository { pool }
    }

    /// Records the user's current rate.
    ///
    /// Overwrites the latest existing record, or inserts the first one.
    /// Both steps share one transaction that opens with the write.
    pub async fn record(
        &self,
        user_id: &str,
        rate: FxRate,
        date: Option<DateTime<Utc>>,
    ) -> DbResult<ExchangeRate> {
        let now = Utc::now();
        let date = date.unwrap_or(now);

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let sql = format!(
            r#"
            UPDATE exchange_rates
            SET rate = ?1, date = ?2, updated_at = ?3
            WHERE id = (
                SELECT id FROM exchange_rates
                WHERE user_id = ?4
                ORDER BY date DESC, created_at DESC
                LIMIT 1
            )
            RETURNING {EXCHANGE_RATE_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, ExchangeRate>(&sql)
            .bind(rate)
            .bind(date)
            .bind(now)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        let record = match updated {
            Some(existing) => {
                info!(id = %existing.id, rate = %rate, "Exchange rate updated");
                existing
            }
            None => {
                let record = ExchangeRate {
                    id: generate_id(),
                    user_id: user_id.to_string(),
                    rate,
                    date,
                    created_at: now,
                    updated_at: now,
                };

                sqlx::query(
                    r#"
                    INSERT INTO exchange_rates (id, user_id, rate, date, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                )
                .bind(&record.id)
                .bind(&record.user_id)
                .bind(record.rate)
                .bind(record.date)
                .bind(record.created_at)
                .bind(record.updated_at)
                .execute(&mut *tx)
                .await?;

                info!(id = %record.id, rate = %rate, "Exchange rate recorded");
                record
            }
        };

        tx.commit().await.map_err(DbError::transaction)?;
        Ok(record)
    }

    /// Returns the most recent rate, if any was recorded.
    pub async fn latest(&self, user_id: &str) -> DbResult<Option<ExchangeRate>> {
        let sql = format!(
            "SELECT {EXCHANGE_RATE_COLUMNS} FROM exchange_rates WHERE user_id = ?1 \
             ORDER BY date DESC, created_at DESC LIMIT 1"
        );

        let rate = sqlx::query_as::<_, ExchangeRate>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(rate)
    }

    /// All recorded rates, newest first.
    pub async fn history(&self, user_id: &str) -> DbResult<Vec<ExchangeRate>> {
        let sql = format!(
            "SELECT {EXCHANGE_RATE_COLUMNS} FROM exchange_rates WHERE user_id = ?1 \
             ORDER BY date DESC, created_at DESC"
        );

        let rates = sqlx::query_as::<_, ExchangeRate>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rates)
    }
}
