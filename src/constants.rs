use std::time::Duration;

/// Table holding the hourly production counters.
pub const PRODUCTION_TABLE: &str = "hourly_good_production";

/// Column the hypertable is partitioned on.
pub const PARTITION_COLUMN: &str = "date_time";

/// Chunk span for the hypertable.
pub const CHUNK_INTERVAL: &str = "3 months";

/// Zone applied to the database and role during bootstrap.
pub const DATABASE_TIMEZONE: &str = "Asia/Jakarta";

/// Line name moved to the front of every export.
pub const SENTINEL_LINE: &str = "Mespack BH";

/// Minute past the hour at which scheduled exports fire.
pub const BOUNDARY_MINUTE: u32 = 1;

/// Wall-clock format of `date_time` in the exported JSON.
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DEFAULT_OUTPUT_DIR: &str = "reckit_json";
pub const DEFAULT_OUTPUT_FILE: &str = "data.json";

/// Pause before touching the database on every restart.
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(10);

/// Pause after a fault before the next restart.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(15);

pub const ENV_DATABASE_HOST: &str = "DATABASE_HOST";
pub const ENV_DATABASE_PORT: &str = "DATABASE_PORT";
pub const ENV_DATABASE_USERNAME: &str = "DATABASE_USERNAME";
pub const ENV_DATABASE_PASSWORD: &str = "DATABASE_PASSWORD";
pub const ENV_DATABASE_NAME: &str = "DATABASE_NAME";
