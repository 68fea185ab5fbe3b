pub mod bootstrap;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod exporter;
pub mod logging;
pub mod record;
pub mod scheduler;
pub mod store;
pub mod supervisor;
