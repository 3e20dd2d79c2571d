//! Batch-cycle state machine.
//!
//! Every invocation performs one tick: it may open a new cycle, wait for
//! the next batch, create the due batch or close a finished cycle. All
//! progress is persisted through a [`StateStore`](crate::store::StateStore)
//! so the process can exit between ticks.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use team_battles::config::BattleConfig;
//! use team_battles::cycle::CycleMachine;
//! use team_battles::remote::{ArenaClient, TokioPacer};
//! use team_battles::store::JsonFileStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BattleConfig::new("https://lichess.org", "my-team");
//!     let client = ArenaClient::new(config.clone(), "lip_0123456789abcdef".to_string())?;
//!     let machine = CycleMachine::new(
//!         config.clone(),
//!         Arc::new(JsonFileStore::new(&config.state_file)),
//!         Arc::new(client),
//!         Arc::new(TokioPacer),
//!     );
//!
//!     let report = machine.tick(chrono::Utc::now()).await?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod machine;
pub mod state;

pub use machine::{CycleError, CycleMachine, CycleResult, TickReport};
pub use state::{CyclePhase, CycleState, batch_interval, cycle_cooldown};
