//! Schedule generator for one seven-day cycle.

use super::batch::{ScheduleError, ScheduleResult};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use std::fmt;

/// Sequence number of a battle day
pub type SequenceNumber = u32;

/// Calendar days covered by one cycle
pub const DAYS_PER_CYCLE: u32 = 7;

/// Slots generated for one cycle (two per day)
pub const SLOTS_PER_CYCLE: usize = 14;

/// First sequence number ever scheduled. Generating from this value
/// produces the bootstrap schedule instead of the regular recurrence.
pub const SEED_SEQUENCE_NUMBER: SequenceNumber = 57;

/// Start of the bootstrap Closing battle that opened the series.
pub fn seed_closing_start() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2025, 6, 1)
        .expect("Seed closing date is valid")
        .and_time(NaiveTime::default())
        .and_utc()
        + SlotKind::Closing.offset_from_midnight()
}

/// Day the bootstrap schedule is anchored to. Its remaining slots start
/// on the following day.
pub fn seed_anchor_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("Seed anchor date is valid")
}

/// Which of the two daily battles a slot is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Morning battle, 07:00 UTC
    Opening,
    /// Evening battle, 18:58 UTC
    Closing,
}

impl SlotKind {
    /// Human readable label used in names
    pub fn label(self) -> &'static str {
        match self {
            Self::Opening => "Opening",
            Self::Closing => "Closing",
        }
    }

    fn offset_from_midnight(self) -> TimeDelta {
        match self {
            Self::Opening => TimeDelta::hours(7),
            Self::Closing => TimeDelta::hours(18) + TimeDelta::minutes(58),
        }
    }

    /// Start instant of this kind of battle on `date`
    pub fn start_on(self, date: NaiveDate) -> DateTime<Utc> {
        date.and_time(NaiveTime::default()).and_utc() + self.offset_from_midnight()
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One scheduled battle. Names are derived from `(sequence_number, kind)`
/// only, so regenerating a slot always yields the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentSlot {
    sequence_number: SequenceNumber,
    kind: SlotKind,
    scheduled_start: DateTime<Utc>,
    display_name: String,
    description: String,
}

impl TournamentSlot {
    /// Create a slot, deriving its name and description
    pub fn new(
        sequence_number: SequenceNumber,
        kind: SlotKind,
        scheduled_start: DateTime<Utc>,
    ) -> Self {
        Self {
            sequence_number,
            kind,
            scheduled_start,
            display_name: display_name(sequence_number, kind),
            description: description(sequence_number, kind),
        }
    }

    pub fn sequence_number(&self) -> SequenceNumber {
        self.sequence_number
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn scheduled_start(&self) -> DateTime<Utc> {
        self.scheduled_start
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for TournamentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}",
            self.display_name,
            self.scheduled_start.format("%Y-%m-%d %H:%M UTC")
        )
    }
}

fn display_name(sequence_number: SequenceNumber, kind: SlotKind) -> String {
    format!("Team Battle #{sequence_number} {}", kind.label())
}

fn description(sequence_number: SequenceNumber, kind: SlotKind) -> String {
    let session = match kind {
        SlotKind::Opening => "morning",
        SlotKind::Closing => "evening",
    };
    format!(
        "Battle day #{sequence_number}, {session} session. \
         Every point scored counts towards the weekly team standings."
    )
}

/// How a cycle's schedule is generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Regular cycle: seven days from `anchor_date`, one sequence number per day
    Recurring {
        start_sequence: SequenceNumber,
        anchor_date: NaiveDate,
    },
    /// One-time bootstrap schedule pinned to historical dates
    Seed,
}

impl GenerationMode {
    /// Pick the mode for a cycle starting at `start_sequence`
    pub fn for_cycle(start_sequence: SequenceNumber, anchor_date: NaiveDate) -> Self {
        if start_sequence == SEED_SEQUENCE_NUMBER {
            Self::Seed
        } else {
            Self::Recurring {
                start_sequence,
                anchor_date,
            }
        }
    }
}

/// Generate the 14 slots of a cycle in start order
///
/// # Errors
///
/// Returns [`ScheduleError::SequenceOverflow`] if the cycle's last
/// sequence number does not fit in a [`SequenceNumber`]
pub fn generate(mode: GenerationMode) -> ScheduleResult<Vec<TournamentSlot>> {
    match mode {
        GenerationMode::Recurring {
            start_sequence,
            anchor_date,
        } => recurring(start_sequence, anchor_date),
        GenerationMode::Seed => Ok(seed()),
    }
}

fn recurring(
    start_sequence: SequenceNumber,
    anchor_date: NaiveDate,
) -> ScheduleResult<Vec<TournamentSlot>> {
    start_sequence
        .checked_add(DAYS_PER_CYCLE - 1)
        .ok_or(ScheduleError::SequenceOverflow(start_sequence))?;

    Ok((0..DAYS_PER_CYCLE)
        .flat_map(|day| {
            let date = anchor_date + Days::new(u64::from(day));
            let sequence_number = start_sequence + day;
            [SlotKind::Opening, SlotKind::Closing]
                .into_iter()
                .map(move |kind| TournamentSlot::new(sequence_number, kind, kind.start_on(date)))
        })
        .collect())
}

// The bootstrap cycle begins with an evening battle, so each following
// morning battle carries the number of the previous evening.
fn seed() -> Vec<TournamentSlot> {
    let mut slots = Vec::with_capacity(SLOTS_PER_CYCLE);
    slots.push(TournamentSlot::new(
        SEED_SEQUENCE_NUMBER,
        SlotKind::Closing,
        seed_closing_start(),
    ));

    let first_day = seed_anchor_date() + Days::new(1);
    for offset in 0..SLOTS_PER_CYCLE - 1 {
        let date = first_day + Days::new((offset / 2) as u64);
        let kind = if offset % 2 == 0 {
            SlotKind::Opening
        } else {
            SlotKind::Closing
        };
        let sequence_number = SEED_SEQUENCE_NUMBER + ((offset + 1) / 2) as SequenceNumber;
        slots.push(TournamentSlot::new(sequence_number, kind, kind.start_on(date)));
    }

    slots
}
