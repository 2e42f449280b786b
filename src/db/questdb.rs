//! QuestDB persistence for daily signals (PostgreSQL wire protocol)

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::{Client, NoTls, Row};

use crate::config;
use crate::db::store::SignalStore;
use crate::models::signal::{DailySignal, NewSignal, SignalAction, SignalStatus};

const SIGNAL_COLUMNS: &str = "id, symbol, action, entry_price, target_price, stop_loss, \
     ai_confidence, analysis_summary, status, timestamp, updated_at";

pub struct QuestDatabase {
    client: Arc<RwLock<Option<Client>>>,
}

fn db_error(context: &str, e: impl std::fmt::Display) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::other(format!("{}: {}", context, e)))
}

fn not_connected() -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "Database connection not available",
    ))
}

impl QuestDatabase {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Self::connect(&config::get_questdb_url()).await
    }

    pub async fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let (client, connection) = tokio_postgres::connect(url, NoTls).await.map_err(|e| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("Failed to connect to QuestDB: {}", e),
            )) as Box<dyn std::error::Error + Send + Sync>
        })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "QuestDB connection error");
            }
        });

        let db = Self {
            client: Arc::new(RwLock::new(Some(client))),
        };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let client = self.client.read().await;
        let c = client.as_ref().ok_or_else(not_connected)?;

        // QuestDB syntax: designated timestamp and partitioning come after the columns
        c.execute(
            "CREATE TABLE IF NOT EXISTS daily_signals (
                timestamp TIMESTAMP,
                id LONG,
                symbol SYMBOL,
                action SYMBOL,
                entry_price DOUBLE,
                target_price DOUBLE,
                stop_loss DOUBLE,
                ai_confidence DOUBLE,
                analysis_summary STRING,
                status SYMBOL,
                updated_at TIMESTAMP
            ) TIMESTAMP(timestamp) PARTITION BY MONTH",
            &[],
        )
        .await
        .map_err(|e| db_error("Failed to create daily_signals table", e))?;

        Ok(())
    }

    fn row_to_signal(row: &Row) -> Result<DailySignal, Box<dyn std::error::Error + Send + Sync>> {
        let action: String = row.get(2);
        let status: String = row.get(8);
        let created_naive: NaiveDateTime = row.get(9);
        let updated_naive: Option<NaiveDateTime> = row.get(10);
        let created_at = DateTime::from_naive_utc_and_offset(created_naive, Utc);

        Ok(DailySignal {
            id: row.get(0),
            symbol: row.get(1),
            action: action
                .parse::<SignalAction>()
                .map_err(|e| db_error("Invalid stored action", e))?,
            entry_price: row.get(3),
            target_price: row.get(4),
            stop_loss: row.get(5),
            ai_confidence: row.get(6),
            analysis_summary: row.get::<_, Option<String>>(7).unwrap_or_default(),
            status: status
                .parse::<SignalStatus>()
                .map_err(|e| db_error("Invalid stored status", e))?,
            created_at,
            updated_at: updated_naive
                .map(|n| DateTime::from_naive_utc_and_offset(n, Utc))
                .unwrap_or(created_at),
        })
    }
}

#[async_trait]
impl SignalStore for QuestDatabase {
    async fn insert_signal(
        &self,
        signal: NewSignal,
    ) -> Result<DailySignal, Box<dyn std::error::Error + Send + Sync>> {
        let client = self.client.read().await;
        let c = client.as_ref().ok_or_else(not_connected)?;

        // No auto-increment in QuestDB; the creation time doubles as id
        let id = signal.created_at.timestamp_millis();
        let created_naive = signal.created_at.naive_utc();

        c.execute(
            "INSERT INTO daily_signals (timestamp, id, symbol, action, entry_price, target_price,
                 stop_loss, ai_confidence, analysis_summary, status, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            &[
                &created_naive,
                &id,
                &signal.symbol,
                &signal.action.as_str(),
                &signal.entry_price,
                &signal.target_price,
                &signal.stop_loss,
                &signal.ai_confidence,
                &signal.analysis_summary,
                &signal.status.as_str(),
                &created_naive,
            ],
        )
        .await
        .map_err(|e| db_error("Failed to store signal", e))?;

        Ok(signal.into_signal(id))
    }

    async fn list_open_signals(
        &self,
    ) -> Result<Vec<DailySignal>, Box<dyn std::error::Error + Send + Sync>> {
        let client = self.client.read().await;
        let Some(ref c) = *client else {
            return Ok(Vec::new());
        };

        let query = format!(
            "SELECT {} FROM daily_signals WHERE status = $1 ORDER BY timestamp ASC",
            SIGNAL_COLUMNS
        );
        let rows = c
            .query(&query, &[&SignalStatus::Open.as_str()])
            .await
            .map_err(|e| db_error("Failed to query open signals", e))?;

        rows.iter().map(Self::row_to_signal).collect()
    }

    async fn update_signal_status(
        &self,
        id: i64,
        status: SignalStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let client = self.client.read().await;
        let c = client.as_ref().ok_or_else(not_connected)?;

        // Only OPEN rows move; resolved signals are never re-opened
        let rows_affected = c
            .execute(
                "UPDATE daily_signals SET status = $1, updated_at = $2
                 WHERE id = $3 AND status = $4",
                &[
                    &status.as_str(),
                    &updated_at.naive_utc(),
                    &id,
                    &SignalStatus::Open.as_str(),
                ],
            )
            .await
            .map_err(|e| db_error("Failed to update signal status", e))?;

        if rows_affected == 0 {
            return Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Open signal with id {} not found", id),
            )));
        }

        Ok(())
    }
}
