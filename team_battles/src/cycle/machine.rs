//! One tick of the batch-cycle state machine.

use super::state::CyclePhase;
use crate::config::BattleConfig;
use crate::remote::{BatchOutcome, Pacer, TournamentCreator, create_paced};
use crate::schedule::{BATCH_COUNT, ScheduleError, SequenceNumber, select_batch};
use crate::store::{StateStore, StoreError};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Fatal tick errors. Per-slot creation failures are not errors here,
/// they are reported through [`TickReport::BatchRan`].
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),
}

pub type CycleResult<T> = Result<T, CycleError>;

/// What a tick did
#[derive(Debug)]
pub enum TickReport {
    /// No active cycle and the cooldown has not elapsed
    NoCycleDue {
        next_cycle_at: Option<DateTime<Utc>>,
    },
    /// Active cycle, current batch not yet due
    BatchNotDue {
        batch: u32,
        next_eligible_at: DateTime<Utc>,
    },
    /// A cycle whose batches were all done got closed
    CycleClosed {
        last_completed_sequence_number: SequenceNumber,
    },
    /// A batch was attempted
    BatchRan {
        batch: u32,
        started_cycle: bool,
        outcome: BatchOutcome,
        cycle_closed: bool,
    },
}

impl TickReport {
    /// True when some slot of the executed batch failed
    pub fn has_failures(&self) -> bool {
        matches!(self, TickReport::BatchRan { outcome, .. } if outcome.failure_count() > 0)
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickReport::NoCycleDue {
                next_cycle_at: Some(at),
            } => write!(f, "No cycle due, next cycle may start at {}", at.to_rfc3339()),
            TickReport::NoCycleDue { next_cycle_at: None } => write!(f, "No cycle due"),
            TickReport::BatchNotDue {
                batch,
                next_eligible_at,
            } => write!(
                f,
                "Batch {}/{} not due until {}",
                batch,
                BATCH_COUNT,
                next_eligible_at.to_rfc3339()
            ),
            TickReport::CycleClosed {
                last_completed_sequence_number,
            } => write!(
                f,
                "Cycle closed, last completed sequence #{}",
                last_completed_sequence_number
            ),
            TickReport::BatchRan {
                batch,
                outcome,
                cycle_closed,
                ..
            } => {
                write!(
                    f,
                    "Batch {}/{}: {} created, {} failed",
                    batch,
                    BATCH_COUNT,
                    outcome.success_count(),
                    outcome.failure_count()
                )?;
                if *cycle_closed {
                    write!(f, ", cycle closed")?;
                }
                Ok(())
            }
        }
    }
}

/// Drives the cycle with an explicit configuration and injected
/// collaborators
pub struct CycleMachine {
    config: BattleConfig,
    store: Arc<dyn StateStore>,
    creator: Arc<dyn TournamentCreator>,
    pacer: Arc<dyn Pacer>,
}

impl CycleMachine {
    pub fn new(
        config: BattleConfig,
        store: Arc<dyn StateStore>,
        creator: Arc<dyn TournamentCreator>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            config,
            store,
            creator,
            pacer,
        }
    }

    /// Phase of the stored cycle at `now`
    pub fn phase(&self, now: DateTime<Utc>) -> CyclePhase {
        self.store.load().phase(now)
    }

    /// Advance the cycle by one step at `now`
    ///
    /// # Errors
    ///
    /// Fails if the state cannot be persisted or the batch index is out of
    /// range. Everything persisted before the error stays persisted.
    pub async fn tick(&self, now: DateTime<Utc>) -> CycleResult<TickReport> {
        let mut state = self.store.load();

        let started_cycle = state.should_start_cycle(now);
        if started_cycle {
            state.start_cycle(now);
            self.store.save(&state)?;
            info!(
                "Started new cycle at {} after sequence #{}",
                now.to_rfc3339(),
                state.last_completed_sequence_number
            );
        }

        if !state.is_cycle_active {
            return Ok(TickReport::NoCycleDue {
                next_cycle_at: state.next_cycle_at(),
            });
        }

        if state.due_batch(now) < state.current_batch_index {
            return Ok(TickReport::BatchNotDue {
                batch: state.current_batch_index,
                next_eligible_at: state.next_eligible_at(),
            });
        }

        if state.current_batch_index > BATCH_COUNT {
            state.close_cycle(now)?;
            self.store.save(&state)?;
            info!(
                "Closed cycle, last completed sequence #{}",
                state.last_completed_sequence_number
            );
            return Ok(TickReport::CycleClosed {
                last_completed_sequence_number: state.last_completed_sequence_number,
            });
        }

        let batch = state.current_batch_index;
        let schedule = state.cycle_schedule()?;
        let slots = select_batch(&schedule, batch)?;

        info!(
            "Running batch {}/{} with {} slot(s){}",
            batch,
            BATCH_COUNT,
            slots.len(),
            if self.config.dry_run { " (dry run)" } else { "" }
        );

        let outcome = create_paced(
            self.creator.as_ref(),
            self.pacer.as_ref(),
            self.config.pacing_delay,
            slots,
        )
        .await;

        let mut closure = Ok(());
        if outcome.success_count() > 0 {
            state.current_batch_index += 1;
            if state.current_batch_index > BATCH_COUNT {
                closure = state.close_cycle(now);
            }
        } else {
            warn!("Batch {} created nothing, it will be retried", batch);
        }
        self.store.save(&state)?;
        closure?;
        let cycle_closed = !state.is_cycle_active;

        Ok(TickReport::BatchRan {
            batch,
            started_cycle,
            outcome,
            cycle_closed,
        })
    }
}
