use reckit_exporter::clock::SystemClock;
use reckit_exporter::config::{Config, EnvConfigProvider};
use reckit_exporter::logging::{init_tracing, LogConfig};
use reckit_exporter::store::PgDatabase;
use reckit_exporter::supervisor::Supervisor;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    if let Err(e) = init_tracing(&LogConfig {
        log_level: config.log_level.clone(),
        enable_file_logs: config.enable_file_logs,
        log_dir: config.log_dir.clone(),
    }) {
        eprintln!("{e}");
        std::process::exit(1);
    }
    tracing::info!(
        output = %config.export.output_path().display(),
        startup_delay_secs = config.supervisor.startup_delay.as_secs(),
        "Starting reckit-exporter"
    );

    let supervisor = Supervisor::new(
        EnvConfigProvider::new(),
        PgDatabase,
        SystemClock,
        config.supervisor.clone(),
    );

    match supervisor.run().await {}
}
