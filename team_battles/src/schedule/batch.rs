//! Batch selection over a generated cycle schedule.

use super::generator::TournamentSlot;
use std::ops::Range;
use thiserror::Error;

/// Number of batches a cycle is split into
pub const BATCH_COUNT: u32 = 4;

/// Schedule errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid batch index {0}: expected 1..=4")]
    InvalidBatchIndex(u32),

    #[error("Schedule has {actual} slots, batch needs {needed}")]
    ShortSchedule { needed: usize, actual: usize },

    #[error("Sequence numbers starting at {0} overflow within one cycle")]
    SequenceOverflow(u32),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Slot index range covered by a batch. Sizes are 4, 4, 4 and 2.
pub fn batch_range(index: u32) -> ScheduleResult<Range<usize>> {
    match index {
        1 => Ok(0..4),
        2 => Ok(4..8),
        3 => Ok(8..12),
        4 => Ok(12..14),
        other => Err(ScheduleError::InvalidBatchIndex(other)),
    }
}

/// Slice of `schedule` that batch `index` creates
pub fn select_batch(schedule: &[TournamentSlot], index: u32) -> ScheduleResult<&[TournamentSlot]> {
    let range = batch_range(index)?;
    if range.end > schedule.len() {
        return Err(ScheduleError::ShortSchedule {
            needed: range.end,
            actual: schedule.len(),
        });
    }
    Ok(&schedule[range])
}
