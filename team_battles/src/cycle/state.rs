//! Persisted cycle progress and the phases derived from it.

use crate::schedule::{
    BATCH_COUNT, DAYS_PER_CYCLE, GenerationMode, SEED_SEQUENCE_NUMBER, ScheduleError,
    ScheduleResult, SequenceNumber, TournamentSlot, generate,
};
use chrono::{DateTime, Days, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spacing between the batches of one cycle
pub fn batch_interval() -> TimeDelta {
    TimeDelta::hours(5)
}

/// Minimum gap between closing one cycle and starting the next
pub fn cycle_cooldown() -> TimeDelta {
    TimeDelta::days(7)
}

/// Cycle progress, persisted between invocations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleState {
    /// Highest sequence number fully created by a closed cycle
    pub last_completed_sequence_number: SequenceNumber,
    /// 0 when idle, 1..=4 while active, above 4 when closure is pending
    pub current_batch_index: u32,
    /// When the active cycle's batching clock started
    pub cycle_start_timestamp: DateTime<Utc>,
    /// When the previous cycle was closed
    #[serde(default)]
    pub last_cycle_completion_timestamp: Option<DateTime<Utc>>,
    pub is_cycle_active: bool,
}

impl Default for CycleState {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Where a cycle stands at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// No active cycle
    Idle,
    /// Active, batch `n` not yet due
    AwaitingBatch(u32),
    /// Active, batch `n` ready to run
    BatchDue(u32),
    /// All batches done, closure pending
    CycleComplete,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingBatch(n) => write!(f, "awaiting batch {n}/{BATCH_COUNT}"),
            Self::BatchDue(n) => write!(f, "batch {n}/{BATCH_COUNT} due"),
            Self::CycleComplete => write!(f, "cycle complete, closure pending"),
        }
    }
}

impl CycleState {
    /// Idle state whose next cycle starts at the seed sequence number
    pub fn seeded() -> Self {
        Self {
            last_completed_sequence_number: SEED_SEQUENCE_NUMBER - 1,
            current_batch_index: 0,
            cycle_start_timestamp: DateTime::<Utc>::default(),
            last_cycle_completion_timestamp: None,
            is_cycle_active: false,
        }
    }

    /// Restore the idle invariant (inactive implies batch index 0).
    /// Returns true if anything changed.
    pub fn normalize(&mut self) -> bool {
        if !self.is_cycle_active && self.current_batch_index != 0 {
            self.current_batch_index = 0;
            return true;
        }
        false
    }

    /// Whether a new cycle may start at `now`
    pub fn should_start_cycle(&self, now: DateTime<Utc>) -> bool {
        !self.is_cycle_active
            && self
                .last_cycle_completion_timestamp
                .is_none_or(|completed| now - completed >= cycle_cooldown())
    }

    /// Earliest instant a new cycle may start, `None` if it may start now
    /// or a cycle is already active
    pub fn next_cycle_at(&self) -> Option<DateTime<Utc>> {
        if self.is_cycle_active {
            return None;
        }
        self.last_cycle_completion_timestamp
            .map(|completed| completed + cycle_cooldown())
    }

    /// Activate a new cycle at batch 1
    pub fn start_cycle(&mut self, now: DateTime<Utc>) {
        self.is_cycle_active = true;
        self.current_batch_index = 1;
        self.cycle_start_timestamp = now;
    }

    /// Close the active cycle and advance the sequence by one week.
    /// Leaves the state untouched if the sequence would overflow.
    pub fn close_cycle(&mut self, now: DateTime<Utc>) -> ScheduleResult<()> {
        let last_completed = self
            .last_completed_sequence_number
            .checked_add(DAYS_PER_CYCLE)
            .ok_or(ScheduleError::SequenceOverflow(self.last_completed_sequence_number))?;
        self.is_cycle_active = false;
        self.current_batch_index = 0;
        self.last_cycle_completion_timestamp = Some(now);
        self.last_completed_sequence_number = last_completed;
        Ok(())
    }

    /// Batch number due at `now`, counted from the cycle start in whole
    /// batch intervals. Not aligned to calendar boundaries.
    pub fn due_batch(&self, now: DateTime<Utc>) -> u32 {
        let elapsed = (now - self.cycle_start_timestamp).num_seconds().max(0);
        let intervals = elapsed / batch_interval().num_seconds();
        u32::try_from(intervals).unwrap_or(u32::MAX).saturating_add(1)
    }

    /// Instant at which the current batch becomes due
    pub fn next_eligible_at(&self) -> DateTime<Utc> {
        let waits = i32::try_from(self.current_batch_index.saturating_sub(1)).unwrap_or(i32::MAX);
        self.cycle_start_timestamp + batch_interval() * waits
    }

    /// Phase of the cycle at `now`
    pub fn phase(&self, now: DateTime<Utc>) -> CyclePhase {
        if !self.is_cycle_active {
            CyclePhase::Idle
        } else if self.due_batch(now) < self.current_batch_index {
            CyclePhase::AwaitingBatch(self.current_batch_index)
        } else if self.current_batch_index > BATCH_COUNT {
            CyclePhase::CycleComplete
        } else {
            CyclePhase::BatchDue(self.current_batch_index)
        }
    }

    /// First sequence number of the active (or next) cycle
    pub fn next_start_sequence(&self) -> ScheduleResult<SequenceNumber> {
        self.last_completed_sequence_number
            .checked_add(1)
            .ok_or(ScheduleError::SequenceOverflow(self.last_completed_sequence_number))
    }

    /// Calendar day the active cycle's schedule starts on
    pub fn anchor_date(&self) -> NaiveDate {
        self.cycle_start_timestamp.date_naive() + Days::new(1)
    }

    /// Full schedule of the active cycle
    pub fn cycle_schedule(&self) -> ScheduleResult<Vec<TournamentSlot>> {
        generate(GenerationMode::for_cycle(self.next_start_sequence()?, self.anchor_date()))
    }
}
