use std::path::PathBuf;

use thiserror::Error;

use crate::config::Unconfigured;

/// Failure reported by a database backend.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("invalid port '{0}'")]
    InvalidPort(String),
    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConfigurationMissing,
    DatabaseConnectionFailure,
    QueryFailure,
    SerializationFailure,
    FilesystemFailure,
    FatalUnclassified,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    ConfigurationMissing(#[from] Unconfigured),
    #[error("database connection failed: {0}")]
    DatabaseConnection(#[source] DbError),
    #[error("query failed: {0}")]
    Query(#[source] DbError),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unclassified fault: {0}")]
    Unclassified(String),
}

impl ExportError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigurationMissing(_) => ErrorKind::ConfigurationMissing,
            Self::DatabaseConnection(_) => ErrorKind::DatabaseConnectionFailure,
            Self::Query(_) => ErrorKind::QueryFailure,
            Self::Serialization(_) => ErrorKind::SerializationFailure,
            Self::Filesystem { .. } => ErrorKind::FilesystemFailure,
            Self::Unclassified(_) => ErrorKind::FatalUnclassified,
        }
    }

    /// Cycle-local errors abort the current attempt only; anything else
    /// restarts the supervisor.
    pub fn is_cycle_local(&self) -> bool {
        self.kind() != ErrorKind::FatalUnclassified
    }
}
