//! Build lifecycle integration tests.
//!
//! These tests drive full builds against mock collaborators:
//! - Set membership stays exhaustive and exclusive
//! - Re-running from a final checkpoint does no work
//! - Local extraction pre-empts remote acquisition
//! - In-flight ids from an unclean shutdown are re-queued
//! - The concurrency bound holds
//! - Interrupts cancel the build and flush the checkpoint

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use bgmbuild_core::{
    build_registry,
    checkpoint::{CheckpointError, ExitFn, FlushOutcome},
    testing::{
        fixtures::{manifest_entry, MockSet},
        MockContainer, MockRemoteSource, MockTagWriter,
    },
    BuildPipeline, Checkpoint, Config, ManifestEntry, TerminationHook, TerminationReason, Transition,
};

/// Test helper holding a temp output tree and one set of mocks.
struct TestHarness {
    mocks: MockSet,
    config: Config,
    _dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config::default();
        config.paths.output_dir = dir.path().join("dist");
        Self {
            mocks: MockSet::new(),
            config,
            _dir: dir,
        }
    }

    fn pipeline(&self) -> BuildPipeline {
        BuildPipeline::new(self.config.clone(), self.mocks.collaborators())
    }

    fn checkpoint_path(&self) -> PathBuf {
        self.config.paths.checkpoint_path()
    }

    fn output_dir(&self) -> &Path {
        &self.config.paths.output_dir
    }

    fn container(&self) -> &MockContainer {
        &self.mocks.container
    }

    fn remote(&self) -> &MockRemoteSource {
        &self.mocks.remote
    }
}

fn numbered_entries(group: &str, count: usize) -> Vec<ManifestEntry> {
    (1..=count)
        .map(|i| manifest_entry(group, &i.to_string(), &format!("{}-{}", group, i)))
        .collect()
}

fn assert_partition(checkpoint: &Checkpoint, universe: &HashSet<String>) {
    let mut seen = HashSet::new();
    for id in checkpoint
        .waiting_ids
        .iter()
        .chain(&checkpoint.downloading_ids)
        .chain(&checkpoint.done_ids)
    {
        assert!(seen.insert(id.clone()), "{} appears in more than one set", id);
    }
    assert_eq!(&seen, universe);
}

fn recording_exit() -> (ExitFn, Arc<Mutex<Vec<i32>>>) {
    let codes: Arc<Mutex<Vec<i32>>> = Arc::default();
    let sink = Arc::clone(&codes);
    (Arc::new(move |code| sink.lock().unwrap().push(code)), codes)
}

// =============================================================================
// Set membership
// =============================================================================

#[tokio::test]
async fn test_sets_partition_universe_throughout_run() {
    let harness = TestHarness::new();
    harness.remote().set_delay(Duration::from_millis(5)).await;
    for i in 1..=3 {
        harness
            .container()
            .add_sound("Bgm00.img", &i.to_string(), b"local".to_vec())
            .await;
    }

    let mut entries = numbered_entries("Bgm00", 3);
    entries.extend(numbered_entries("Bgm01", 6));
    entries.push(manifest_entry("Bgm02", "NoSource", ""));
    let universe: HashSet<String> = entries
        .iter()
        .filter(|e| !e.youtube.is_empty())
        .map(|e| format!("{}/{}", e.source.structure, e.filename))
        .collect();

    let mut config = harness.config.clone();
    config.engine.concurrency = 2;
    let snapshots: Arc<Mutex<Vec<usize>>> = Arc::default();
    let sink = Arc::clone(&snapshots);
    let build = Arc::new(
        BuildPipeline::new(config, harness.mocks.collaborators())
            .with_observer(Arc::new(move |t: &Transition| sink.lock().unwrap().push(t.progress.total())))
            .prepare(&entries, None),
    );

    assert_partition(&build.store().snapshot(), &universe);

    let running = {
        let build = Arc::clone(&build);
        tokio::spawn(async move { build.run().await })
    };
    while !running.is_finished() {
        assert_partition(&build.store().snapshot(), &universe);
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    let report = running.await.unwrap().unwrap();

    assert_eq!(report.local_done, 3);
    assert_eq!(report.remote_done, 6);
    assert_partition(&build.store().snapshot(), &universe);
    assert!(snapshots.lock().unwrap().iter().all(|total| *total == universe.len()));
}

// =============================================================================
// Idempotence and resumption
// =============================================================================

#[tokio::test]
async fn test_second_run_from_final_checkpoint_does_nothing() {
    let harness = TestHarness::new();
    let entries = numbered_entries("Bgm01", 4);

    let first = harness.pipeline().prepare(&entries, None);
    first.run().await.unwrap();
    assert_eq!(
        first.store().flush(&harness.checkpoint_path()).unwrap(),
        FlushOutcome::Written
    );
    assert_eq!(harness.remote().call_count().await, 4);

    let prior = Checkpoint::load(&harness.checkpoint_path()).await.unwrap();
    let second = harness.pipeline().prepare(&entries, Some(&prior));
    assert!(second.store().waiting_ids().is_empty());

    let report = second.run().await.unwrap();
    assert_eq!(report.local_done, 0);
    assert_eq!(report.remote_done, 0);
    assert_eq!(report.progress.done, 4);
    assert_eq!(harness.remote().call_count().await, 4);
}

#[tokio::test]
async fn test_in_flight_ids_resume_as_waiting() {
    let harness = TestHarness::new();
    let entries = numbered_entries("Bgm01", 3);
    let prior = Checkpoint {
        waiting_ids: vec!["Bgm01/3".to_string()],
        downloading_ids: vec!["Bgm01/2".to_string()],
        done_ids: vec!["Bgm01/1".to_string()],
    };

    let build = harness.pipeline().prepare(&entries, Some(&prior));

    let waiting = build.store().waiting_ids();
    assert!(waiting.contains(&"Bgm01/2".to_string()));
    assert!(!build.store().snapshot().done_ids.contains(&"Bgm01/2".to_string()));

    let report = build.run().await.unwrap();
    assert_eq!(report.remote_done, 2);
    assert!(harness.remote().was_called_for("Bgm01-2").await);
    assert!(!harness.remote().was_called_for("Bgm01-1").await);
}

// =============================================================================
// Source preference and concurrency
// =============================================================================

#[tokio::test]
async fn test_local_hit_never_goes_remote() {
    let harness = TestHarness::new();
    harness
        .container()
        .add_sound("Bgm00.img", "X", b"local-x".to_vec())
        .await;
    let entries = vec![
        manifest_entry("Bgm00", "X", "remote-x"),
        manifest_entry("Bgm00", "Y", "remote-y"),
    ];

    let report = harness.pipeline().prepare(&entries, None).run().await.unwrap();

    assert_eq!(report.local_done, 1);
    assert!(!harness.remote().was_called_for("remote-x").await);
    assert!(harness.remote().was_called_for("remote-y").await);
}

#[tokio::test]
async fn test_no_data_node_falls_back_to_remote() {
    let harness = TestHarness::new();
    harness.container().add_sound("Bgm00.img", "X", Vec::new()).await;

    let report = harness
        .pipeline()
        .prepare(&[manifest_entry("Bgm00", "X", "remote-x")], None)
        .run()
        .await
        .unwrap();

    assert_eq!(report.local_done, 0);
    assert_eq!(report.remote_done, 1);
    assert!(harness.remote().was_called_for("remote-x").await);
}

#[tokio::test]
async fn test_concurrency_bound_of_three() {
    let mut harness = TestHarness::new();
    harness.config.engine.concurrency = 3;
    harness.remote().set_delay(Duration::from_millis(30)).await;

    let report = harness
        .pipeline()
        .prepare(&numbered_entries("Bgm01", 10), None)
        .run()
        .await
        .unwrap();

    assert_eq!(report.remote_done, 10);
    assert_eq!(harness.remote().max_concurrent(), 3);
}

#[tokio::test]
async fn test_failed_task_does_not_stop_others() {
    let harness = TestHarness::new();
    harness.remote().fail_on("Bgm01-2").await;

    let build = harness.pipeline().prepare(&numbered_entries("Bgm01", 4), None);
    let report = build.run().await.unwrap();

    assert_eq!(report.remote_done, 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "Bgm01/2");
    assert_eq!(build.store().snapshot().downloading_ids, vec!["Bgm01/2"]);
}

// =============================================================================
// End to end
// =============================================================================

#[tokio::test]
async fn test_local_and_remote_end_to_end() {
    let mut harness = TestHarness::new();
    harness.config.local.category_prefix = "A".to_string();
    harness
        .container()
        .add_sound("A.img", "1", b"local-audio".to_vec())
        .await;
    let entries = vec![manifest_entry("A", "1", "vid-a1"), manifest_entry("B", "2", "vid-b2")];

    let build = harness.pipeline().prepare(&entries, None);
    let report = tokio_test::assert_ok!(build.run().await);
    assert_eq!((report.local_done, report.remote_done), (1, 1));
    build.store().flush(&harness.checkpoint_path()).unwrap();

    let checkpoint = Checkpoint::load(&harness.checkpoint_path()).await.unwrap();
    let done: HashSet<_> = checkpoint.done_ids.iter().map(String::as_str).collect();
    assert_eq!(done, HashSet::from(["A/1", "B/2"]));
    assert!(checkpoint.waiting_ids.is_empty());
    assert!(checkpoint.downloading_ids.is_empty());

    for entry in &entries {
        let path = harness
            .output_dir()
            .join(&entry.source.structure)
            .join(format!("{}.mp3", entry.filename));
        let bytes = std::fs::read(&path).unwrap();
        let tags = MockTagWriter::read_tags(&bytes).unwrap();
        assert_eq!(tags.artist.as_deref(), Some(entry.metadata.artist.as_str()));
        assert_eq!(tags.title.as_deref(), Some(entry.metadata.title.as_str()));
        assert_eq!(tags.year.as_deref(), Some(entry.metadata.year.as_str()));
    }

    let b2 = std::fs::read(harness.output_dir().join("B").join("2.mp3")).unwrap();
    assert_eq!(
        MockTagWriter::strip_tags(&b2),
        MockRemoteSource::payload_for("vid-b2").as_slice()
    );
    assert!(!harness.output_dir().join(".partial").exists());
}

// =============================================================================
// Interruption
// =============================================================================

#[tokio::test]
async fn test_interrupt_flushes_in_flight_for_retry() {
    let mut harness = TestHarness::new();
    harness.config.engine.concurrency = 2;
    harness.remote().set_delay(Duration::from_secs(30)).await;
    let entries = numbered_entries("Bgm01", 7);

    let build = harness.pipeline().prepare(&entries, None);
    let (exit, codes) = recording_exit();
    let store = build.store().clone();
    let trigger = async move {
        while store.progress().in_flight < 2 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        TerminationReason::Interrupt
    };

    let result = TerminationHook::new(build.store().clone(), harness.checkpoint_path())
        .with_exit(exit)
        .supervise_with(build.run(), trigger)
        .await;

    assert!(matches!(
        result,
        Err(CheckpointError::Stopped(TerminationReason::Interrupt))
    ));
    assert_eq!(*codes.lock().unwrap(), vec![0]);
    let checkpoint = Checkpoint::load(&harness.checkpoint_path()).await.unwrap();
    assert_eq!(checkpoint.waiting_ids.len(), 5);
    assert_eq!(checkpoint.downloading_ids.len(), 2);
    assert!(checkpoint.done_ids.is_empty());

    let resumed = build_registry(&entries, Some(&checkpoint), harness.output_dir());
    assert_eq!(resumed.waiting_ids.len(), 7);
    for id in &checkpoint.downloading_ids {
        assert!(resumed.waiting_ids.contains(id));
        assert!(!resumed.done_ids.contains(id));
    }
}
