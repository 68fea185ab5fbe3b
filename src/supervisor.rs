//! Crash-and-restart envelope around bootstrap and the hourly export loop.
//!
//! ```text
//! Starting ──ok──▶ Running ──tick ok──▶ Running
//!    ▲               │
//!    │             fault
//!    │               ▼
//!    └──cool-down── Faulted
//! ```
//!
//! Cycle-local errors (see [`ExportError::is_cycle_local`]) are logged and the
//! loop carries on. Unclassified errors and panics restart everything from
//! configuration reload.

use std::any::Any;
use std::convert::Infallible;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::bootstrap;
use crate::clock::Clock;
use crate::config::{ConfigProvider, ConnectionDescriptor, SupervisorConfig, Unconfigured};
use crate::error::{ErrorKind, ExportError};
use crate::exporter;
use crate::scheduler;
use crate::store::Database;

/// Outcome of resolving configuration at the start of an iteration.
pub type Resolved = Result<ConnectionDescriptor, Unconfigured>;

#[derive(Debug)]
pub enum SupervisorState {
    Starting,
    Running(Resolved),
    Faulted(ExportError),
}

impl SupervisorState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running(_) => "running",
            Self::Faulted(_) => "faulted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Exported { rows: usize },
    Failed(ErrorKind),
}

pub struct Supervisor<P, D, C> {
    provider: P,
    db: D,
    clock: C,
    config: SupervisorConfig,
    state: SupervisorState,
    restarts: u64,
    cycles: u64,
    last_cycle: Option<CycleOutcome>,
}

impl<P, D, C> Supervisor<P, D, C>
where
    P: ConfigProvider,
    D: Database,
    C: Clock,
{
    pub fn new(provider: P, db: D, clock: C, config: SupervisorConfig) -> Self {
        Self {
            provider,
            db,
            clock,
            config,
            state: SupervisorState::Starting,
            restarts: 0,
            cycles: 0,
            last_cycle: None,
        }
    }

    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    /// Number of times the supervisor left `Faulted` for `Starting`.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Export attempts made so far, successful or not.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn last_cycle(&self) -> Option<CycleOutcome> {
        self.last_cycle
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Runs forever. Only process termination stops it.
    pub async fn run(mut self) -> Infallible {
        loop {
            self.step().await;
        }
    }

    /// Performs exactly one state transition.
    pub async fn step(&mut self) -> &SupervisorState {
        let next = match std::mem::replace(&mut self.state, SupervisorState::Starting) {
            SupervisorState::Starting => {
                let result = guarded(self.start()).await;
                match result {
                    Ok(resolved) => SupervisorState::Running(resolved),
                    Err(e) => self.fault(e),
                }
            }
            SupervisorState::Running(resolved) => {
                let result = guarded(self.tick(&resolved)).await;
                match result {
                    Ok(()) => SupervisorState::Running(resolved),
                    Err(e) => self.fault(e),
                }
            }
            SupervisorState::Faulted(_) => {
                tracing::warn!(
                    delay_secs = self.config.restart_delay.as_secs(),
                    "Restarting the exporter after cool-down"
                );
                self.clock.sleep(self.config.restart_delay).await;
                self.restarts += 1;
                SupervisorState::Starting
            }
        };

        tracing::debug!(state = next.name(), "Supervisor transition");
        self.state = next;
        &self.state
    }

    fn fault(&self, error: ExportError) -> SupervisorState {
        tracing::error!(
            at = %self.clock.now().format("%Y-%m-%d %H:%M:%S"),
            kind = ?error.kind(),
            error = %error,
            "FATAL ERROR"
        );
        SupervisorState::Faulted(error)
    }

    async fn start(&mut self) -> Result<Resolved, ExportError> {
        tracing::info!(
            at = %self.clock.now().format("%Y-%m-%d %H:%M:%S"),
            "Exporter starting"
        );

        let resolved = self.provider.resolve();
        if let Err(e) = &resolved {
            tracing::warn!(error = %e, "Database configuration is incomplete");
        }

        tracing::info!(
            delay_secs = self.config.startup_delay.as_secs(),
            "Waiting before connecting to the database"
        );
        self.clock.sleep(self.config.startup_delay).await;

        match &resolved {
            Ok(descriptor) => {
                let outcome = bootstrap::ensure_schema(&self.db, descriptor).await;
                contain("bootstrap", outcome.map(|_| ()))?;
            }
            Err(_) => tracing::warn!("Skipping schema bootstrap: configuration missing"),
        }

        self.run_cycle(&resolved).await?;
        Ok(resolved)
    }

    async fn tick(&mut self, resolved: &Resolved) -> Result<(), ExportError> {
        let now = self.clock.now();
        let delay = scheduler::delay_until_next_boundary(now)?;
        tracing::info!(
            now = %now.format("%Y-%m-%d %H:%M:%S"),
            delay_secs = delay.as_secs(),
            "Waiting for next export boundary"
        );
        self.clock.sleep(delay).await;

        self.run_cycle(resolved).await
    }

    async fn run_cycle(&mut self, resolved: &Resolved) -> Result<(), ExportError> {
        self.cycles += 1;

        let result = match resolved {
            Ok(descriptor) => {
                exporter::export(&self.db, descriptor, &self.config.output_path).await
            }
            Err(e) => Err(ExportError::ConfigurationMissing(e.clone())),
        };

        self.last_cycle = Some(match &result {
            Ok(snapshot) => CycleOutcome::Exported {
                rows: snapshot.len(),
            },
            Err(e) => CycleOutcome::Failed(e.kind()),
        });

        contain("export", result.map(|_| ()))
    }
}

/// Logs and swallows cycle-local errors; everything else propagates.
fn contain(operation: &'static str, result: Result<(), ExportError>) -> Result<(), ExportError> {
    match result {
        Err(e) if e.is_cycle_local() => {
            tracing::error!(operation, kind = ?e.kind(), error = %e, "Cycle failed");
            Ok(())
        }
        other => other,
    }
}

async fn guarded<T, F>(fut: F) -> Result<T, ExportError>
where
    F: Future<Output = Result<T, ExportError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(ExportError::Unclassified(format!(
            "panic: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
