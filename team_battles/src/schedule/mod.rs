//! Cycle schedule generation and batch selection.
//!
//! A cycle covers seven calendar days with two battles per day. The
//! generator is a pure function of its [`GenerationMode`], so every
//! invocation that belongs to the same cycle regenerates an identical
//! schedule and only the batch index decides what gets created.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use team_battles::schedule::{GenerationMode, generate, select_batch};
//!
//! let anchor = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
//! let schedule = generate(GenerationMode::for_cycle(120, anchor)).unwrap();
//! assert_eq!(schedule.len(), 14);
//!
//! let first = select_batch(&schedule, 1).unwrap();
//! assert_eq!(first.len(), 4);
//! ```

pub mod batch;
pub mod generator;

pub use batch::{BATCH_COUNT, ScheduleError, ScheduleResult, batch_range, select_batch};
pub use generator::{
    DAYS_PER_CYCLE, GenerationMode, SEED_SEQUENCE_NUMBER, SLOTS_PER_CYCLE, SequenceNumber,
    SlotKind, TournamentSlot, generate, seed_anchor_date, seed_closing_start,
};
