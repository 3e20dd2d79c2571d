//! # Team Battles
//!
//! Schedules a recurring series of online team battles and creates them
//! through the remote tournament API a few at a time.
//!
//! ## Architecture
//!
//! A cycle covers seven days with an Opening and a Closing battle each day.
//! Its 14 slots are created in four batches (4, 4, 4 and 2 slots) spaced at
//! least five hours apart, and a new cycle opens seven days after the
//! previous one closed. The process is meant to be run by an external timer
//! and performs exactly one tick per run.
//!
//! ## Core Modules
//!
//! - [`schedule`]: deterministic cycle schedule and batch slices
//! - [`remote`]: credential checks, HTTP client and paced creation
//! - [`cycle`]: persisted cycle state and the tick state machine
//! - [`store`]: durable storage for the cycle state
//! - [`config`]: environment driven configuration

pub mod config;
pub mod cycle;
pub mod remote;
pub mod schedule;
pub mod store;

pub use config::{BattleConfig, BattleSettings, ConfigError};
pub use cycle::{CycleError, CycleMachine, CyclePhase, CycleState, TickReport};
pub use remote::{ArenaClient, BatchOutcome, CreationError, TournamentCreator};
pub use schedule::{GenerationMode, SlotKind, TournamentSlot};
pub use store::{JsonFileStore, MemoryStore, StateStore, StoreError};
