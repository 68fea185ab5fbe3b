use crate::config::ConnectionDescriptor;
use crate::constants::{DATABASE_TIMEZONE, PRODUCTION_TABLE};
use crate::error::ExportError;
use crate::store::{Connection, Database};

/// What a bootstrap pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaOutcome {
    /// Session zone read back after the change, `None` if the step failed.
    pub effective_timezone: Option<String>,
    pub hypertable_created: bool,
}

/// Ensures the production table exists and is a hypertable.
///
/// Safe to run on every start: the table is created with `IF NOT EXISTS` and
/// the hypertable conversion only happens when the catalog says it has not
/// been done. The check-then-act is not atomic; the exporter runs as a single
/// instance.
pub async fn ensure_schema<D: Database>(
    db: &D,
    descriptor: &ConnectionDescriptor,
) -> Result<SchemaOutcome, ExportError> {
    let mut conn = db
        .connect(descriptor)
        .await
        .map_err(ExportError::DatabaseConnection)?;

    let result = run_steps(&mut conn, descriptor).await;

    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "Failed to close bootstrap connection");
    }
    result
}

async fn run_steps<C: Connection>(
    conn: &mut C,
    descriptor: &ConnectionDescriptor,
) -> Result<SchemaOutcome, ExportError> {
    let mut outcome = SchemaOutcome::default();

    match conn
        .apply_timezone(descriptor.database(), descriptor.username(), DATABASE_TIMEZONE)
        .await
    {
        Ok(effective) => {
            tracing::info!(timezone = %effective, "Applied timezone");
            outcome.effective_timezone = Some(effective);
        }
        // Non-fatal: the table can still be created under the server default zone.
        Err(e) => tracing::warn!(error = %e, "Error setting timezone"),
    }

    conn.create_table().await.map_err(ExportError::Query)?;

    if conn.is_hypertable().await.map_err(ExportError::Query)? {
        tracing::debug!(table = PRODUCTION_TABLE, "Table is already a hypertable");
    } else {
        conn.create_hypertable().await.map_err(ExportError::Query)?;
        outcome.hypertable_created = true;
        tracing::info!(table = PRODUCTION_TABLE, "Converted table to hypertable");
    }

    tracing::info!(table = PRODUCTION_TABLE, "Table checked/created successfully");
    Ok(outcome)
}
