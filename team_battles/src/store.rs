//! Durable storage of the cycle state.
//!
//! The state is a single small record, read whole at the start of an
//! invocation and written whole after every transition. A missing or
//! unreadable record is never fatal: the seeded idle state is used instead.

use crate::cycle::CycleState;
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// State store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("In-memory state lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable record of cycle progress
pub trait StateStore: Send + Sync {
    /// Read the stored state, `Ok(None)` if nothing was stored yet
    fn try_load(&self) -> StoreResult<Option<CycleState>>;

    /// Replace the stored state
    fn save(&self, state: &CycleState) -> StoreResult<()>;

    /// Read the stored state, falling back to [`CycleState::seeded`]
    fn load(&self) -> CycleState {
        let mut state = match self.try_load() {
            Ok(Some(state)) => state,
            Ok(None) => {
                debug!("No stored cycle state, starting from seed");
                CycleState::seeded()
            }
            Err(e) => {
                warn!("Cycle state unreadable, starting from seed: {}", e);
                CycleState::seeded()
            }
        };

        if state.normalize() {
            warn!("Stored cycle state was inactive with a batch index, reset to idle");
        }
        state
    }
}

/// Pretty-printed JSON file store
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for JsonFileStore {
    fn try_load(&self) -> StoreResult<Option<CycleState>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, state: &CycleState) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        // Write then rename so a crash never leaves a truncated record
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let json = serde_json::to_string_pretty(state)?;
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!("Saved cycle state to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store, used for rehearsals and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<CycleState>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: CycleState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            saves: Mutex::new(0),
        }
    }

    /// Currently stored state, if any
    ///
    /// # Panics
    ///
    /// Panics if a writer panicked while holding the lock
    pub fn snapshot(&self) -> Option<CycleState> {
        self.state.lock().expect("memory store lock poisoned").clone()
    }

    /// Number of successful saves
    ///
    /// # Panics
    ///
    /// Panics if a writer panicked while holding the lock
    pub fn save_count(&self) -> usize {
        *self.saves.lock().expect("memory store lock poisoned")
    }

    fn lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
        mutex.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl StateStore for MemoryStore {
    fn try_load(&self) -> StoreResult<Option<CycleState>> {
        Ok(Self::lock(&self.state)?.clone())
    }

    fn save(&self, state: &CycleState) -> StoreResult<()> {
        let mut stored = Self::lock(&self.state)?;
        let mut saves = Self::lock(&self.saves)?;
        *stored = Some(state.clone());
        *saves += 1;
        Ok(())
    }
}
