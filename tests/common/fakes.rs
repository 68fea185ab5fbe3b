use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeDelta};

use reckit_exporter::clock::Clock;
use reckit_exporter::config::{ConfigProvider, ConnectionDescriptor, Unconfigured};
use reckit_exporter::error::DbError;
use reckit_exporter::record::ProductionRecord;
use reckit_exporter::store::{Connection, Database};

#[derive(Debug, Default)]
pub struct FakeState {
    pub rows: Vec<ProductionRecord>,
    pub table_created: bool,
    pub hypertable: bool,
    pub timezone: Option<String>,
    pub fail_connect: bool,
    pub fail_query: bool,
    pub fail_timezone: bool,
    pub panic_on_query: bool,
    pub connects: usize,
    pub closes: usize,
    pub create_hypertable_calls: usize,
    pub queries: usize,
}

/// In-memory stand-in for the production database, shared by every
/// connection it hands out.
#[derive(Debug, Clone, Default)]
pub struct FakeDatabase {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDatabase {
    pub fn with_rows(rows: Vec<ProductionRecord>) -> Self {
        let db = Self::default();
        db.update(|s| s.rows = rows);
        db
    }

    pub fn update(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().expect("fake state"));
    }

    pub fn read<T>(&self, f: impl FnOnce(&FakeState) -> T) -> T {
        f(&self.state.lock().expect("fake state"))
    }
}

pub struct FakeConnection {
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl Database for FakeDatabase {
    type Conn = FakeConnection;

    async fn connect(&self, _descriptor: &ConnectionDescriptor) -> Result<Self::Conn, DbError> {
        let mut state = self.state.lock().expect("fake state");
        if state.fail_connect {
            return Err(DbError::Backend("connection refused".into()));
        }
        state.connects += 1;
        Ok(FakeConnection {
            state: self.state.clone(),
        })
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn apply_timezone(
        &mut self,
        _database: &str,
        _role: &str,
        timezone: &str,
    ) -> Result<String, DbError> {
        let mut state = self.state.lock().expect("fake state");
        if state.fail_timezone {
            return Err(DbError::Backend("must be owner of database".into()));
        }
        state.timezone = Some(timezone.to_string());
        Ok(timezone.to_string())
    }

    async fn create_table(&mut self) -> Result<(), DbError> {
        self.state.lock().expect("fake state").table_created = true;
        Ok(())
    }

    async fn is_hypertable(&mut self) -> Result<bool, DbError> {
        Ok(self.state.lock().expect("fake state").hypertable)
    }

    async fn create_hypertable(&mut self) -> Result<(), DbError> {
        let mut state = self.state.lock().expect("fake state");
        if state.hypertable {
            return Err(DbError::Backend("table is already a hypertable".into()));
        }
        state.hypertable = true;
        state.create_hypertable_calls += 1;
        Ok(())
    }

    async fn latest_records(&mut self) -> Result<Vec<ProductionRecord>, DbError> {
        let (rows, fail, panic) = {
            let mut state = self.state.lock().expect("fake state");
            state.queries += 1;
            (state.rows.clone(), state.fail_query, state.panic_on_query)
        };
        if panic {
            panic!("driver invariant violated");
        }
        if fail {
            return Err(DbError::Backend("relation does not exist".into()));
        }
        Ok(rows)
    }

    async fn close(self) -> Result<(), DbError> {
        self.state.lock().expect("fake state").closes += 1;
        Ok(())
    }
}

/// Virtual wall clock: `sleep` returns at once and moves time forward.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Saturates at the end of representable time.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock");
        let delta = TimeDelta::from_std(by).expect("delta");
        *now = now.checked_add_signed(delta).unwrap_or(NaiveDateTime::MAX);
    }

    pub fn set(&self, to: NaiveDateTime) {
        *self.now.lock().expect("clock") = to;
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("clock").clone()
    }

    pub fn last_sleep(&self) -> Option<Duration> {
        self.sleeps.lock().expect("clock").last().copied()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().expect("clock")
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("clock").push(duration);
        self.advance(duration);
    }
}

/// Provider whose answer can be swapped while the supervisor owns it.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    value: Arc<Mutex<Result<ConnectionDescriptor, Unconfigured>>>,
    resolves: Arc<Mutex<usize>>,
}

impl SharedConfig {
    pub fn new(value: Result<ConnectionDescriptor, Unconfigured>) -> Self {
        Self {
            value: Arc::new(Mutex::new(value)),
            resolves: Arc::new(Mutex::new(0)),
        }
    }

    pub fn set(&self, value: Result<ConnectionDescriptor, Unconfigured>) {
        *self.value.lock().expect("config") = value;
    }

    pub fn resolves(&self) -> usize {
        *self.resolves.lock().expect("config")
    }
}

impl ConfigProvider for SharedConfig {
    fn resolve(&self) -> Result<ConnectionDescriptor, Unconfigured> {
        *self.resolves.lock().expect("config") += 1;
        self.value.lock().expect("config").clone()
    }
}

pub fn unconfigured() -> Unconfigured {
    Unconfigured {
        missing: vec!["DATABASE_HOST"],
    }
}
