//! Shared, mutex-guarded state sets.

use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use super::error::CheckpointError;
use super::types::{Checkpoint, Progress, ProgressCallback, TaskState, Transition};

/// Whether a flush call performed the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    Written,
    /// An earlier flush already ran.
    Skipped,
}

#[derive(Default)]
struct StateSets {
    waiting: Vec<String>,
    in_flight: Vec<String>,
    done: Vec<String>,
    states: HashMap<String, TaskState>,
    observer: Option<ProgressCallback>,
}

impl StateSets {
    fn push(&mut self, id: String, state: TaskState) {
        if self.states.contains_key(&id) {
            warn!("Ignoring duplicate id {} while seeding checkpoint", id);
            return;
        }
        self.states.insert(id.clone(), state);
        self.set_mut(state).push(id);
    }

    fn set_mut(&mut self, state: TaskState) -> &mut Vec<String> {
        match state {
            TaskState::Waiting => &mut self.waiting,
            TaskState::InFlight => &mut self.in_flight,
            TaskState::Done => &mut self.done,
        }
    }

    fn move_id(&mut self, id: &str, from: TaskState, to: TaskState) -> Result<(), CheckpointError> {
        let found = self.states.get(id).copied();
        if found != Some(from) {
            return Err(CheckpointError::InvalidTransition {
                id: id.to_string(),
                expected: from,
                found,
            });
        }

        let source = self.set_mut(from);
        if let Some(pos) = source.iter().position(|x| x == id) {
            source.remove(pos);
        }
        self.set_mut(to).push(id.to_string());
        self.states.insert(id.to_string(), to);
        Ok(())
    }

    fn progress(&self) -> Progress {
        Progress {
            waiting: self.waiting.len(),
            in_flight: self.in_flight.len(),
            done: self.done.len(),
        }
    }

    fn snapshot(&self) -> Checkpoint {
        Checkpoint {
            waiting_ids: self.waiting.clone(),
            downloading_ids: self.in_flight.clone(),
            done_ids: self.done.clone(),
        }
    }
}

struct Inner {
    sets: Mutex<StateSets>,
    flushed: AtomicBool,
}

/// Owner of the three state sets.
///
/// Cheaply cloneable; every clone shares the same state, so the engine, the
/// resolver and the termination hook all see one set of ids.
#[derive(Clone)]
pub struct CheckpointStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CheckpointStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointStore")
            .field("progress", &self.progress())
            .field("flushed", &self.is_flushed())
            .finish()
    }
}

impl CheckpointStore {
    /// Creates a store with the given waiting and already-done ids.
    pub fn new(waiting_ids: Vec<String>, done_ids: Vec<String>) -> Self {
        let mut sets = StateSets::default();
        // Done first so a stray id in both lists stays done.
        for id in done_ids {
            sets.push(id, TaskState::Done);
        }
        for id in waiting_ids {
            sets.push(id, TaskState::Waiting);
        }

        Self {
            inner: Arc::new(Inner {
                sets: Mutex::new(sets),
                flushed: AtomicBool::new(false),
            }),
        }
    }

    /// Sets the observer notified after every transition.
    pub fn with_observer(self, observer: ProgressCallback) -> Self {
        self.lock().observer = Some(observer);
        self
    }

    // A panic while holding the lock must not prevent the final flush.
    fn lock(&self) -> MutexGuard<'_, StateSets> {
        self.inner.sets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves `id` from waiting to in flight.
    pub fn mark_in_flight(&self, id: &str) -> Result<Progress, CheckpointError> {
        self.transition(id, TaskState::Waiting, TaskState::InFlight)
    }

    /// Moves `id` from in flight to done.
    pub fn mark_done(&self, id: &str) -> Result<Progress, CheckpointError> {
        self.transition(id, TaskState::InFlight, TaskState::Done)
    }

    fn transition(
        &self,
        id: &str,
        from: TaskState,
        to: TaskState,
    ) -> Result<Progress, CheckpointError> {
        let (progress, observer) = {
            let mut sets = self.lock();
            sets.move_id(id, from, to)?;
            (sets.progress(), sets.observer.clone())
        };

        debug!("{} -> {} ({})", id, to, progress);
        if let Some(observer) = observer {
            observer(&Transition {
                id: id.to_string(),
                state: to,
                progress,
                at: Utc::now(),
            });
        }
        Ok(progress)
    }

    /// Current state of `id`, or `None` if it is not part of this run.
    pub fn state_of(&self, id: &str) -> Option<TaskState> {
        self.lock().states.get(id).copied()
    }

    pub fn is_waiting(&self, id: &str) -> bool {
        self.state_of(id) == Some(TaskState::Waiting)
    }

    /// Waiting ids in insertion order.
    pub fn waiting_ids(&self) -> Vec<String> {
        self.lock().waiting.clone()
    }

    pub fn progress(&self) -> Progress {
        self.lock().progress()
    }

    /// Consistent copy of all three sets.
    pub fn snapshot(&self) -> Checkpoint {
        self.lock().snapshot()
    }

    pub fn is_flushed(&self) -> bool {
        self.inner.flushed.load(Ordering::SeqCst)
    }

    /// Writes the current snapshot to `path`. Only the first call writes.
    pub fn flush(&self, path: &Path) -> Result<FlushOutcome, CheckpointError> {
        if self
            .inner
            .flushed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Checkpoint already flushed, skipping");
            return Ok(FlushOutcome::Skipped);
        }

        let snapshot = self.snapshot();
        snapshot.write_to(path)?;
        info!("Checkpoint written to {:?} ({})", path, snapshot.progress());
        Ok(FlushOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn assert_partition(store: &CheckpointStore, universe: &[&str]) {
        let snapshot = store.snapshot();
        let mut seen = HashSet::new();
        for id in snapshot
            .waiting_ids
            .iter()
            .chain(&snapshot.downloading_ids)
            .chain(&snapshot.done_ids)
        {
            assert!(seen.insert(id.clone()), "{} appears in two sets", id);
        }
        let expected: HashSet<String> = universe.iter().map(|s| s.to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_transitions_keep_sets_partitioned() {
        let universe = ["a/1", "a/2", "b/1", "old/1"];
        let store = CheckpointStore::new(ids(&["a/1", "a/2", "b/1"]), ids(&["old/1"]));
        assert_partition(&store, &universe);

        store.mark_in_flight("a/2").unwrap();
        assert_partition(&store, &universe);
        assert_eq!(store.state_of("a/2"), Some(TaskState::InFlight));

        let progress = store.mark_done("a/2").unwrap();
        assert_partition(&store, &universe);
        assert_eq!(
            progress,
            Progress {
                waiting: 2,
                in_flight: 0,
                done: 2
            }
        );

        let snapshot = store.snapshot();
        assert_eq!(snapshot.waiting_ids, ids(&["a/1", "b/1"]));
        assert_eq!(snapshot.done_ids, ids(&["old/1", "a/2"]));
    }

    #[test]
    fn test_mark_in_flight_rejects_non_waiting() {
        let store = CheckpointStore::new(ids(&["a/1"]), ids(&["d/1"]));

        let err = store.mark_in_flight("d/1").unwrap_err();
        assert!(matches!(
            err,
            CheckpointError::InvalidTransition {
                expected: TaskState::Waiting,
                found: Some(TaskState::Done),
                ..
            }
        ));

        let err = store.mark_in_flight("unknown/1").unwrap_err();
        assert!(matches!(
            err,
            CheckpointError::InvalidTransition { found: None, .. }
        ));

        store.mark_in_flight("a/1").unwrap();
        assert!(store.mark_in_flight("a/1").is_err());
    }

    #[test]
    fn test_mark_done_requires_in_flight() {
        let store = CheckpointStore::new(ids(&["a/1"]), vec![]);
        let err = store.mark_done("a/1").unwrap_err();
        assert!(matches!(
            err,
            CheckpointError::InvalidTransition {
                expected: TaskState::InFlight,
                found: Some(TaskState::Waiting),
                ..
            }
        ));
        assert!(store.is_waiting("a/1"));
    }

    #[test]
    fn test_duplicate_seed_ids_prefer_done() {
        let store = CheckpointStore::new(ids(&["a/1", "a/1", "a/2"]), ids(&["a/2"]));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.waiting_ids, ids(&["a/1"]));
        assert_eq!(snapshot.done_ids, ids(&["a/2"]));
    }

    #[test]
    fn test_observer_sees_every_transition() {
        let seen: Arc<StdMutex<Vec<(String, TaskState, Progress)>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let store = CheckpointStore::new(ids(&["a/1"]), vec![]).with_observer(Arc::new(
            move |t: &Transition| {
                sink.lock().unwrap().push((t.id.clone(), t.state, t.progress));
            },
        ));

        store.mark_in_flight("a/1").unwrap();
        store.mark_done("a/1").unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].1, TaskState::InFlight);
        assert_eq!(seen[0].2.in_flight, 1);
        assert_eq!(seen[1].1, TaskState::Done);
        assert_eq!(seen[1].2.done, 1);
    }

    #[test]
    fn test_observer_may_read_store() {
        let store = CheckpointStore::new(ids(&["a/1"]), vec![]);
        let reader = store.clone();
        let store = store.with_observer(Arc::new(move |_t: &Transition| {
            // Must not deadlock: the lock is released before the callback runs.
            let _ = reader.progress();
        }));
        store.mark_in_flight("a/1").unwrap();
    }

    #[test]
    fn test_flush_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.json");
        let store = CheckpointStore::new(ids(&["a/1", "a/2"]), vec![]);
        store.mark_in_flight("a/1").unwrap();

        assert_eq!(store.flush(&path).unwrap(), FlushOutcome::Written);
        assert!(store.is_flushed());

        store.mark_done("a/1").unwrap();
        assert_eq!(store.flush(&path).unwrap(), FlushOutcome::Skipped);

        let written: Checkpoint =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.waiting_ids, ids(&["a/2"]));
        assert_eq!(written.downloading_ids, ids(&["a/1"]));
        assert!(written.done_ids.is_empty());
    }

    #[test]
    fn test_flush_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should go makes the rename fail.
        let path = dir.path().join("build.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let store = CheckpointStore::new(ids(&["a/1"]), vec![]);
        assert!(store.flush(&path).is_err());
    }

    #[test]
    fn test_clones_share_state() {
        let store = CheckpointStore::new(ids(&["a/1"]), vec![]);
        let other = store.clone();
        other.mark_in_flight("a/1").unwrap();
        assert_eq!(store.state_of("a/1"), Some(TaskState::InFlight));
    }
}
