use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::config::ConnectionDescriptor;
use crate::error::ExportError;
use crate::record::ExportSnapshot;
use crate::store::{Connection, Database};

/// Runs one export cycle: query the latest bucket, reorder, serialize, and
/// replace `output_path`. The existing file is untouched on any failure.
pub async fn export<D: Database>(
    db: &D,
    descriptor: &ConnectionDescriptor,
    output_path: &Path,
) -> Result<ExportSnapshot, ExportError> {
    let snapshot = fetch_snapshot(db, descriptor).await?;
    if snapshot.is_empty() {
        tracing::warn!("Latest-bucket query returned no rows; exporting empty data");
    }
    let json = snapshot.to_pretty_json()?;
    write_atomic(output_path, json.as_bytes()).await?;

    tracing::info!(
        path = %output_path.display(),
        rows = snapshot.len(),
        "Data exported"
    );
    Ok(snapshot)
}

pub async fn fetch_snapshot<D: Database>(
    db: &D,
    descriptor: &ConnectionDescriptor,
) -> Result<ExportSnapshot, ExportError> {
    let mut conn = db
        .connect(descriptor)
        .await
        .map_err(ExportError::DatabaseConnection)?;

    let rows = conn.latest_records().await;

    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "Failed to close export connection");
    }

    let rows = rows.map_err(ExportError::Query)?;
    Ok(ExportSnapshot::from_query(rows))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("export"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `contents` next to `path` and renames it into place, creating the
/// parent directory if needed.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ExportError::filesystem(dir, e))?;
    }

    let tmp = temp_path(path);
    if let Err(e) = write_synced(&tmp, contents).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(ExportError::filesystem(&tmp, e));
    }

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(ExportError::filesystem(path, e));
    }
    Ok(())
}

async fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_all().await
}
