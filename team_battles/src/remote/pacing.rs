//! Paced sequential creation of a batch.

use super::client::{CreatedTournament, TournamentCreator};
use super::errors::CreationError;
use crate::schedule::{SequenceNumber, SlotKind, TournamentSlot};
use async_trait::async_trait;
use std::time::Duration;

/// Delay between successive creations within one batch
pub const PACING_DELAY: Duration = Duration::from_secs(10);

/// Suspends between two creations
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Pacer backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// A slot whose creation failed
#[derive(Debug)]
pub struct SlotFailure {
    pub sequence_number: SequenceNumber,
    pub kind: SlotKind,
    pub display_name: String,
    pub error: CreationError,
}

/// Result of creating one batch
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub created: Vec<CreatedTournament>,
    pub failures: Vec<SlotFailure>,
}

impl BatchOutcome {
    pub fn success_count(&self) -> usize {
        self.created.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// True when every slot of the batch was created
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Create `slots` one at a time, pausing `delay` between successive
/// creations whatever the previous outcome. Failures are collected and
/// never stop the remaining slots.
pub async fn create_paced<C, P>(
    creator: &C,
    pacer: &P,
    delay: Duration,
    slots: &[TournamentSlot],
) -> BatchOutcome
where
    C: TournamentCreator + ?Sized,
    P: Pacer + ?Sized,
{
    let mut outcome = BatchOutcome::default();

    for (i, slot) in slots.iter().enumerate() {
        if i > 0 {
            pacer.pause(delay).await;
        }

        match creator.create(slot).await {
            Ok(created) => outcome.created.push(created),
            Err(e) => {
                outcome.failures.push(SlotFailure {
                    sequence_number: slot.sequence_number(),
                    kind: slot.kind(),
                    display_name: slot.display_name().to_string(),
                    error: e,
                });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::errors::CreationResult;
    use chrono::{Duration as TimeDelta, TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Timeline {
        events: Mutex<Vec<String>>,
    }

    impl Timeline {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    struct FlakyCreator<'a> {
        timeline: &'a Timeline,
        fail_sequence: SequenceNumber,
    }

    #[async_trait]
    impl TournamentCreator for FlakyCreator<'_> {
        async fn create(&self, slot: &TournamentSlot) -> CreationResult<CreatedTournament> {
            self.timeline.push(format!("create {}", slot.sequence_number()));
            if slot.sequence_number() == self.fail_sequence {
                return Err(CreationError::RemoteRequestFailed {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(CreatedTournament {
                id: format!("id{}", slot.sequence_number()),
                url: format!("https://example.org/tournament/id{}", slot.sequence_number()),
                sequence_number: slot.sequence_number(),
                kind: slot.kind(),
                dry_run: false,
            })
        }
    }

    struct RecordingPacer<'a>(&'a Timeline);

    #[async_trait]
    impl Pacer for RecordingPacer<'_> {
        async fn pause(&self, delay: Duration) {
            self.0.push(format!("pause {}", delay.as_secs()));
        }
    }

    fn slots(n: u32) -> Vec<TournamentSlot> {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 7, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                TournamentSlot::new(i + 1, SlotKind::Opening, start + TimeDelta::days(i.into()))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_pauses_between_but_not_before_first() {
        let timeline = Timeline::default();
        let creator = FlakyCreator { timeline: &timeline, fail_sequence: 0 };
        let pacer = RecordingPacer(&timeline);

        let outcome = create_paced(&creator, &pacer, PACING_DELAY, &slots(3)).await;

        assert_eq!(outcome.success_count(), 3);
        assert!(outcome.is_complete_success());
        assert_eq!(
            *timeline.events.lock().unwrap(),
            vec!["create 1", "pause 10", "create 2", "pause 10", "create 3"]
        );
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch_or_skip_pause() {
        let timeline = Timeline::default();
        let creator = FlakyCreator { timeline: &timeline, fail_sequence: 1 };
        let pacer = RecordingPacer(&timeline);

        let outcome = create_paced(&creator, &pacer, PACING_DELAY, &slots(2)).await;

        assert_eq!(outcome.success_count(), 1);
        assert_eq!(outcome.failure_count(), 1);
        assert_eq!(outcome.failures[0].sequence_number, 1);
        assert_eq!(
            *timeline.events.lock().unwrap(),
            vec!["create 1", "pause 10", "create 2"]
        );
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let timeline = Timeline::default();
        let creator = FlakyCreator { timeline: &timeline, fail_sequence: 0 };
        let outcome = create_paced(&creator, &RecordingPacer(&timeline), PACING_DELAY, &[]).await;
        assert_eq!(outcome.success_count(), 0);
        assert!(timeline.events.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_pacer_sleeps() {
        let before = tokio::time::Instant::now();
        TokioPacer.pause(PACING_DELAY).await;
        assert!(before.elapsed() >= PACING_DELAY);
    }
}
