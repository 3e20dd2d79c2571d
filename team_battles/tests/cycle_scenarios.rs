//! End-to-end ticks of the cycle machine against in-memory collaborators.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use team_battles::config::BattleConfig;
use team_battles::cycle::{CycleError, CycleMachine, CyclePhase, CycleState, TickReport};
use team_battles::remote::{
    ArenaClient, CreatedTournament, CreationError, CreationResult, Pacer, TournamentCreator,
};
use team_battles::schedule::{SEED_SEQUENCE_NUMBER, ScheduleError, SequenceNumber, TournamentSlot};
use team_battles::store::{MemoryStore, StateStore};

/// Records every creation and fails the slots at the listed positions
#[derive(Default)]
struct ScriptedCreator {
    calls: Mutex<Vec<TournamentSlot>>,
    fail_positions: HashSet<usize>,
}

impl ScriptedCreator {
    fn failing_at(positions: &[usize]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_positions: positions.iter().copied().collect(),
        }
    }

    fn calls(&self) -> Vec<TournamentSlot> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TournamentCreator for ScriptedCreator {
    async fn create(&self, slot: &TournamentSlot) -> CreationResult<CreatedTournament> {
        let position = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(slot.clone());
            calls.len() - 1
        };

        if self.fail_positions.contains(&position) {
            return Err(CreationError::RemoteRequestFailed {
                status: 400,
                body: "{\"error\":\"rejected\"}".to_string(),
            });
        }

        Ok(CreatedTournament {
            id: format!("t{}", position),
            url: format!("https://example.org/tournament/t{}", position),
            sequence_number: slot.sequence_number(),
            kind: slot.kind(),
            dry_run: false,
        })
    }
}

#[derive(Default)]
struct CountingPacer {
    pauses: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Pacer for CountingPacer {
    async fn pause(&self, delay: Duration) {
        self.pauses.lock().unwrap().push(delay);
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    creator: Arc<ScriptedCreator>,
    pacer: Arc<CountingPacer>,
    machine: CycleMachine,
}

fn harness(store: MemoryStore, creator: ScriptedCreator) -> Harness {
    let store = Arc::new(store);
    let creator = Arc::new(creator);
    let pacer = Arc::new(CountingPacer::default());
    let config = BattleConfig::new("https://example.org", "host-team");
    let machine = CycleMachine::new(config, store.clone(), creator.clone(), pacer.clone());
    Harness {
        store,
        creator,
        pacer,
        machine,
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 12, 9, 15, 0).unwrap()
}

fn active_state(index: u32, last_completed: SequenceNumber) -> CycleState {
    CycleState {
        last_completed_sequence_number: last_completed,
        current_batch_index: index,
        cycle_start_timestamp: t0(),
        last_cycle_completion_timestamp: Some(t0() - TimeDelta::days(8)),
        is_cycle_active: true,
    }
}

#[tokio::test]
async fn test_fresh_state_starts_cycle_and_runs_first_batch() {
    let h = harness(MemoryStore::new(), ScriptedCreator::default());

    let report = h.machine.tick(t0()).await.unwrap();

    match &report {
        TickReport::BatchRan {
            batch,
            started_cycle,
            outcome,
            cycle_closed,
        } => {
            assert_eq!(*batch, 1);
            assert!(*started_cycle);
            assert_eq!(outcome.success_count(), 4);
            assert!(!cycle_closed);
        }
        other => panic!("unexpected report {:?}", other),
    }
    assert!(!report.has_failures());

    let state = h.store.snapshot().unwrap();
    assert!(state.is_cycle_active);
    assert_eq!(state.current_batch_index, 2);
    assert_eq!(state.cycle_start_timestamp, t0());
    assert_eq!(state.last_completed_sequence_number, SEED_SEQUENCE_NUMBER - 1);

    let calls = h.creator.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0].sequence_number(), SEED_SEQUENCE_NUMBER);
    assert_eq!(h.pacer.pauses.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_last_batch_closes_cycle() {
    let h = harness(
        MemoryStore::with_state(active_state(4, 300)),
        ScriptedCreator::default(),
    );
    let now = t0() + TimeDelta::hours(16);

    let report = h.machine.tick(now).await.unwrap();

    assert!(matches!(
        report,
        TickReport::BatchRan { batch: 4, cycle_closed: true, .. }
    ));
    let calls = h.creator.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].sequence_number(), 307);
    assert_eq!(calls[1].sequence_number(), 307);

    let state = h.store.snapshot().unwrap();
    assert!(!state.is_cycle_active);
    assert_eq!(state.current_batch_index, 0);
    assert_eq!(state.last_completed_sequence_number, 307);
    assert_eq!(state.last_cycle_completion_timestamp, Some(now));
}

#[tokio::test]
async fn test_cooldown_is_a_no_op() {
    let now = t0();
    let mut idle = CycleState::seeded();
    idle.last_completed_sequence_number = 200;
    idle.last_cycle_completion_timestamp = Some(now - TimeDelta::days(3));
    let h = harness(MemoryStore::with_state(idle.clone()), ScriptedCreator::default());

    let report = h.machine.tick(now).await.unwrap();

    match report {
        TickReport::NoCycleDue { next_cycle_at } => {
            assert_eq!(next_cycle_at, Some(now + TimeDelta::days(4)));
        }
        other => panic!("unexpected report {:?}", other),
    }
    assert_eq!(h.store.snapshot(), Some(idle));
    assert_eq!(h.store.save_count(), 0);
    assert!(h.creator.calls().is_empty());
}

#[tokio::test]
async fn test_cooldown_elapsed_starts_next_cycle() {
    let now = t0();
    let mut idle = CycleState::seeded();
    idle.last_completed_sequence_number = 200;
    idle.last_cycle_completion_timestamp = Some(now - TimeDelta::days(7));
    let h = harness(MemoryStore::with_state(idle), ScriptedCreator::default());

    let report = h.machine.tick(now).await.unwrap();

    assert!(matches!(report, TickReport::BatchRan { batch: 1, started_cycle: true, .. }));
    let calls = h.creator.calls();
    assert_eq!(calls[0].sequence_number(), 201);
    assert_eq!(calls[0].scheduled_start().date_naive(), (now + TimeDelta::days(1)).date_naive());
}

#[tokio::test]
async fn test_batch_not_due_leaves_state_untouched() {
    let state = active_state(3, 150);
    let h = harness(MemoryStore::with_state(state.clone()), ScriptedCreator::default());

    let report = h.machine.tick(t0() + TimeDelta::hours(9)).await.unwrap();

    match report {
        TickReport::BatchNotDue {
            batch,
            next_eligible_at,
        } => {
            assert_eq!(batch, 3);
            assert_eq!(next_eligible_at, t0() + TimeDelta::hours(10));
        }
        other => panic!("unexpected report {:?}", other),
    }
    assert_eq!(h.store.snapshot(), Some(state));
    assert_eq!(h.store.save_count(), 0);
    assert!(h.creator.calls().is_empty());
}

#[tokio::test]
async fn test_partial_failure_advances_and_reports() {
    let h = harness(
        MemoryStore::with_state(active_state(2, 150)),
        ScriptedCreator::failing_at(&[1, 3]),
    );

    let report = h.machine.tick(t0() + TimeDelta::hours(5)).await.unwrap();

    assert!(report.has_failures());
    match &report {
        TickReport::BatchRan { outcome, .. } => {
            assert_eq!(outcome.success_count(), 2);
            assert_eq!(outcome.failure_count(), 2);
        }
        other => panic!("unexpected report {:?}", other),
    }
    assert_eq!(h.creator.calls().len(), 4);
    assert_eq!(h.pacer.pauses.lock().unwrap().len(), 3);
    assert_eq!(h.store.snapshot().unwrap().current_batch_index, 3);
}

#[tokio::test]
async fn test_total_failure_keeps_batch_index() {
    let h = harness(
        MemoryStore::with_state(active_state(2, 150)),
        ScriptedCreator::failing_at(&[0, 1, 2, 3]),
    );

    let report = h.machine.tick(t0() + TimeDelta::hours(6)).await.unwrap();

    assert!(report.has_failures());
    let state = h.store.snapshot().unwrap();
    assert_eq!(state.current_batch_index, 2);
    assert!(state.is_cycle_active);
    assert_eq!(h.store.save_count(), 1);
}

#[tokio::test]
async fn test_same_batch_regenerates_same_slots() {
    let first = harness(
        MemoryStore::with_state(active_state(3, 150)),
        ScriptedCreator::failing_at(&[0, 1, 2, 3]),
    );
    first.machine.tick(t0() + TimeDelta::hours(11)).await.unwrap();
    first.machine.tick(t0() + TimeDelta::hours(14)).await.unwrap();

    let calls = first.creator.calls();
    assert_eq!(calls.len(), 8);
    assert_eq!(calls[..4], calls[4..]);
}

#[tokio::test]
async fn test_pending_closure_is_performed() {
    let h = harness(
        MemoryStore::with_state(active_state(5, 90)),
        ScriptedCreator::default(),
    );
    let now = t0() + TimeDelta::hours(21);
    assert_eq!(h.machine.phase(now), CyclePhase::CycleComplete);

    let report = h.machine.tick(now).await.unwrap();

    assert!(matches!(
        report,
        TickReport::CycleClosed { last_completed_sequence_number: 97 }
    ));
    assert!(h.creator.calls().is_empty());
    assert!(!h.store.snapshot().unwrap().is_cycle_active);
}

#[tokio::test]
async fn test_full_cycle_over_four_invocations() {
    let h = harness(MemoryStore::new(), ScriptedCreator::default());

    for (hours, batch) in [(0, 1), (5, 2), (10, 3), (15, 4)] {
        let report = h.machine.tick(t0() + TimeDelta::hours(hours)).await.unwrap();
        assert!(
            matches!(report, TickReport::BatchRan { batch: b, .. } if b == batch),
            "hour {hours}: {report:?}"
        );
    }

    let calls = h.creator.calls();
    assert_eq!(calls.len(), 14);
    let mut starts: Vec<_> = calls.iter().map(|s| s.scheduled_start()).collect();
    starts.dedup();
    assert_eq!(starts.len(), 14);

    let state = h.store.snapshot().unwrap();
    assert!(!state.is_cycle_active);
    assert_eq!(state.last_completed_sequence_number, SEED_SEQUENCE_NUMBER + 6);

    let report = h.machine.tick(t0() + TimeDelta::days(2)).await.unwrap();
    assert!(matches!(report, TickReport::NoCycleDue { .. }));
}

#[tokio::test]
async fn test_dry_run_never_fails() {
    let store = Arc::new(MemoryStore::with_state(active_state(1, 400)));
    let mut config = BattleConfig::new("http://127.0.0.1:1", "host-team");
    config.dry_run = true;
    let client = ArenaClient::new(config.clone(), "PLACEHOLDER".to_string()).unwrap();
    let machine = CycleMachine::new(
        config,
        store.clone(),
        Arc::new(client),
        Arc::new(CountingPacer::default()),
    );

    let report = machine.tick(t0()).await.unwrap();

    match &report {
        TickReport::BatchRan { outcome, .. } => {
            assert_eq!(outcome.success_count(), 4);
            assert!(outcome.created.iter().all(|c| c.dry_run));
        }
        other => panic!("unexpected report {:?}", other),
    }
    assert!(!report.has_failures());
    assert_eq!(store.load().current_batch_index, 2);
}

#[tokio::test]
async fn test_invalid_credential_fails_every_slot() {
    let store = Arc::new(MemoryStore::with_state(active_state(1, 400)));
    let config = BattleConfig::new("http://127.0.0.1:1", "host-team");
    let client = ArenaClient::new(config.clone(), "***".to_string()).unwrap();
    let machine = CycleMachine::new(
        config,
        store.clone(),
        Arc::new(client),
        Arc::new(CountingPacer::default()),
    );

    let report = machine.tick(t0()).await.unwrap();

    match &report {
        TickReport::BatchRan { outcome, .. } => {
            assert_eq!(outcome.failure_count(), 4);
            assert!(outcome
                .failures
                .iter()
                .all(|f| matches!(f.error, CreationError::InvalidCredential(_))));
        }
        other => panic!("unexpected report {:?}", other),
    }
    assert_eq!(store.load().current_batch_index, 1);
}

#[tokio::test]
async fn test_active_cycle_with_index_zero_is_fatal() {
    let h = harness(
        MemoryStore::with_state(active_state(0, 150)),
        ScriptedCreator::default(),
    );

    let err = h.machine.tick(t0() + TimeDelta::hours(1)).await.unwrap_err();

    assert!(matches!(
        err,
        CycleError::Schedule(ScheduleError::InvalidBatchIndex(0))
    ));
    assert!(h.creator.calls().is_empty());
    assert_eq!(h.store.save_count(), 0);
}

#[tokio::test]
async fn test_exhausted_sequence_numbers_stop_the_cycle() {
    let last_completed = SequenceNumber::MAX - 5;
    let h = harness(
        MemoryStore::with_state(active_state(1, last_completed)),
        ScriptedCreator::default(),
    );

    let err = h.machine.tick(t0() + TimeDelta::hours(1)).await.unwrap_err();

    assert!(matches!(
        err,
        CycleError::Schedule(ScheduleError::SequenceOverflow(start)) if start == last_completed + 1
    ));
    assert!(h.creator.calls().is_empty());
    assert_eq!(h.store.save_count(), 0);
}
