//! Database access used by bootstrap and export.
//!
//! Every operation opens its own [`Connection`] and closes it when done; no
//! connection outlives a single bootstrap or export call.

use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection as _, PgConnection};

use crate::config::ConnectionDescriptor;
use crate::constants::{CHUNK_INTERVAL, PARTITION_COLUMN, PRODUCTION_TABLE};
use crate::error::DbError;
use crate::record::ProductionRecord;

#[async_trait]
pub trait Database: Send + Sync {
    type Conn: Connection;

    async fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<Self::Conn, DbError>;
}

#[async_trait]
pub trait Connection: Send {
    /// Sets the zone on `database` and `role`, returning the effective
    /// session zone as reported by the server.
    async fn apply_timezone(
        &mut self,
        database: &str,
        role: &str,
        timezone: &str,
    ) -> Result<String, DbError>;

    async fn create_table(&mut self) -> Result<(), DbError>;

    async fn is_hypertable(&mut self) -> Result<bool, DbError>;

    async fn create_hypertable(&mut self) -> Result<(), DbError>;

    /// Rows sharing the table's latest `date_time`, oldest insert first.
    async fn latest_records(&mut self) -> Result<Vec<ProductionRecord>, DbError>;

    async fn close(self) -> Result<(), DbError>;
}

const CREATE_TABLE_SQL: &str = "
CREATE TABLE IF NOT EXISTS hourly_good_production (
    created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP,
    date_time TIMESTAMP NOT NULL,
    plant_name VARCHAR(20) NOT NULL,
    line_name VARCHAR(20) NOT NULL,
    output_1 INT NOT NULL CHECK (output_1 >= 0),
    output_2 INT NOT NULL CHECK (output_2 >= 0),
    total_output INT NOT NULL CHECK (total_output >= 0),
    record_status INT DEFAULT 0
)";

const IS_HYPERTABLE_SQL: &str = "
SELECT EXISTS (
    SELECT 1 FROM timescaledb_information.hypertables
    WHERE hypertable_name = $1
)";

const LATEST_RECORDS_SQL: &str = "
SELECT date_time, plant_name, line_name, output_1, output_2, total_output
FROM hourly_good_production
WHERE date_time = (SELECT MAX(date_time) FROM hourly_good_production)
ORDER BY created_at ASC, date_time ASC";

/// Postgres/TimescaleDB backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgDatabase;

pub struct PgStoreConnection {
    conn: PgConnection,
}

pub fn connect_options(descriptor: &ConnectionDescriptor) -> Result<PgConnectOptions, DbError> {
    let port = descriptor
        .port()
        .trim()
        .parse::<u16>()
        .map_err(|_| DbError::InvalidPort(descriptor.port().to_string()))?;

    Ok(PgConnectOptions::new()
        .host(descriptor.host())
        .port(port)
        .username(descriptor.username())
        .password(descriptor.password())
        .database(descriptor.database())
        .disable_statement_logging())
}

/// Double-quotes an identifier for statements that cannot take bind parameters.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[async_trait]
impl Database for PgDatabase {
    type Conn = PgStoreConnection;

    async fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<Self::Conn, DbError> {
        let options = connect_options(descriptor)?;
        let conn = PgConnection::connect_with(&options).await?;
        Ok(PgStoreConnection { conn })
    }
}

#[async_trait]
impl Connection for PgStoreConnection {
    async fn apply_timezone(
        &mut self,
        database: &str,
        role: &str,
        timezone: &str,
    ) -> Result<String, DbError> {
        let alter_database = format!(
            "ALTER DATABASE {} SET TIMEZONE = {}",
            quote_ident(database),
            quote_literal(timezone)
        );
        sqlx::Executor::execute(&mut self.conn, alter_database.as_str()).await?;
        tracing::info!(database, timezone, "Database timezone set");

        let alter_role = format!(
            "ALTER ROLE {} SET TIMEZONE = {}",
            quote_ident(role),
            quote_literal(timezone)
        );
        sqlx::Executor::execute(&mut self.conn, alter_role.as_str()).await?;
        tracing::info!(role, timezone, "Role timezone set");

        let effective: String = sqlx::query_scalar("SELECT current_setting('TimeZone')")
            .fetch_one(&mut self.conn)
            .await?;
        Ok(effective)
    }

    async fn create_table(&mut self) -> Result<(), DbError> {
        sqlx::Executor::execute(&mut self.conn, CREATE_TABLE_SQL).await?;
        Ok(())
    }

    async fn is_hypertable(&mut self) -> Result<bool, DbError> {
        let exists: bool = sqlx::query_scalar(IS_HYPERTABLE_SQL)
            .bind(PRODUCTION_TABLE)
            .fetch_one(&mut self.conn)
            .await?;
        Ok(exists)
    }

    async fn create_hypertable(&mut self) -> Result<(), DbError> {
        let sql = format!(
            "SELECT create_hypertable({}, {}, chunk_time_interval => INTERVAL {})",
            quote_literal(PRODUCTION_TABLE),
            quote_literal(PARTITION_COLUMN),
            quote_literal(CHUNK_INTERVAL)
        );
        sqlx::Executor::execute(&mut self.conn, sql.as_str()).await?;
        Ok(())
    }

    async fn latest_records(&mut self) -> Result<Vec<ProductionRecord>, DbError> {
        let rows = sqlx::query_as::<_, ProductionRecord>(LATEST_RECORDS_SQL)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(rows)
    }

    async fn close(self) -> Result<(), DbError> {
        self.conn.close().await?;
        Ok(())
    }
}
