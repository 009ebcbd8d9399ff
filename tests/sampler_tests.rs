use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use pov_recorder::kernel::event::{ActorId, Event, HostEvent};
use pov_recorder::kernel::query::{ActorProfile, Vec3};
use pov_recorder::kernel::sink::{FileSink, PersistError, SnapshotSink};
use pov_recorder::kernel::stats::TickOutcome;
use pov_recorder::kernel::time::ManualClock;
use pov_recorder::sim::{self, Lookup, SimWorld};
use pov_recorder::{RecorderConfig, Sampler};

const START_MS: i64 = 1_700_000_000_000;

#[derive(Default)]
struct MemorySink {
    writes: Mutex<Vec<String>>,
}

impl SnapshotSink for MemorySink {
    async fn persist(&self, text: &str) -> Result<(), PersistError> {
        self.writes.lock().push(text.to_string());
        Ok(())
    }
}

impl MemorySink {
    fn last(&self) -> serde_json::Value {
        let writes = self.writes.lock();
        serde_json::from_str(writes.last().expect("no write recorded")).unwrap()
    }
}

struct BrokenSink;

impl SnapshotSink for BrokenSink {
    async fn persist(&self, _text: &str) -> Result<(), PersistError> {
        Err(PersistError::Write {
            path: PathBuf::from("/readonly/latest.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

fn demo() -> (Arc<SimWorld>, ActorId, ManualClock) {
    let (sim, id) = SimWorld::demo("Alex");
    (Arc::new(sim), id, ManualClock::new(START_MS))
}

fn sampler<S: SnapshotSink>(config: &RecorderConfig, sim: &Arc<SimWorld>, clock: &ManualClock, sink: S) -> Sampler<S> {
    Sampler::new(config, sim.clone(), Arc::new(clock.clone()), sink)
}

fn host(event: HostEvent) -> Event {
    Event::Host { event, cancelled: false }
}

#[tokio::test]
async fn test_tick_writes_latest_snapshot_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/out/latest.json");
    let (sim, id, clock) = demo();
    let mut sampler = sampler(&RecorderConfig::default(), &sim, &clock, FileSink::new(&path));

    sampler.ingest(host(HostEvent::BlockBreak { actor: id, block: "STONE".into() }));
    assert_eq!(sampler.sample_once().await, TickOutcome::Written);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.ends_with('\n'));
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["player"]["name"], "Alex");
    assert_eq!(doc["timestampMs"], START_MS);
    assert_eq!(doc["action"]["label"], "BREAK_BLOCK");
    assert_eq!(doc["action"]["metadata"]["block"], "stone");
    assert_eq!(doc["state"]["nearbyBlocksRaw"].as_array().map(Vec::len), Some(125));

    clock.advance(2000);
    assert_eq!(sampler.sample_once().await, TickOutcome::Written);
    let doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["action"]["label"], "OBSERVER_IDLE", "file holds only the latest snapshot");
    assert_eq!(sampler.stats.written, 2);
    assert_eq!(sampler.tick.frame, 2);
}

#[tokio::test]
async fn test_no_actor_skips_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest.json");
    let (sim, id, clock) = demo();
    sim.set_online(&id, false);
    let mut sampler = sampler(&RecorderConfig::default(), &sim, &clock, FileSink::new(&path));

    assert_eq!(sampler.sample_once().await, TickOutcome::NoActor);
    assert!(!path.exists());
    assert_eq!(sampler.stats.no_actor, 1);

    sim.set_online(&id, true);
    assert_eq!(sampler.sample_once().await, TickOutcome::Written);
    assert!(path.exists());
}

#[tokio::test]
async fn test_configured_actor_is_preferred() {
    let (sim, _alex, clock) = demo();
    let sam = ActorId::new_v4();
    sim.add_actor(
        ActorProfile { id: sam, name: "Sam".into(), world: "world".into() },
        sim::standing_at(Vec3::new(8.5, 64.0, 8.5)),
    );

    let config = RecorderConfig { target_player: "  sAM ".into(), ..RecorderConfig::default() };
    let mut sampler = sampler(&config, &sim, &clock, MemorySink::default());
    assert_eq!(sampler.select_actor().map(|a| a.id), Some(sam));
    sampler.sample_once().await;
    assert_eq!(sampler.sink().last()["player"]["name"], "Sam");

    let fallback = RecorderConfig { target_player: "Nobody".into(), ..RecorderConfig::default() };
    sampler.reconfigure(&fallback, MemorySink::default());
    assert_eq!(sampler.select_actor().map(|a| a.name), Some("Alex".to_string()));
}

#[tokio::test]
async fn test_persist_failure_is_not_fatal() {
    let (sim, _id, clock) = demo();
    let mut sampler = sampler(&RecorderConfig::default(), &sim, &clock, BrokenSink);

    assert_eq!(sampler.sample_once().await, TickOutcome::PersistFailed);
    assert_eq!(sampler.sample_once().await, TickOutcome::PersistFailed);
    assert_eq!(sampler.stats.persist_failures, 2);
    assert_eq!(sampler.stats.write_ratio(), 0.0);
}

#[tokio::test]
async fn test_assembly_failure_skips_tick() {
    let (sim, _id, clock) = demo();
    let mut sampler = sampler(&RecorderConfig::default(), &sim, &clock, MemorySink::default());

    sim.fail(Lookup::ActorState);
    assert_eq!(sampler.sample_once().await, TickOutcome::AssemblyFailed);
    assert!(sampler.sink().writes.lock().is_empty());

    sim.heal(Lookup::ActorState);
    assert_eq!(sampler.sample_once().await, TickOutcome::Written);
}

#[tokio::test]
async fn test_cancelled_and_foreign_events_are_ignored() {
    let (sim, id, clock) = demo();
    let mut sampler = sampler(&RecorderConfig::default(), &sim, &clock, MemorySink::default());

    sampler.ingest(Event::Host {
        event: HostEvent::BlockPlace { actor: id, block: "DIRT".into() },
        cancelled: true,
    });
    sampler.ingest(host(HostEvent::DamageByEntity {
        damager: None,
        target_kind: "PLAYER".into(),
        damage: 3.0,
    }));

    assert_eq!(sampler.stats.events_ignored, 2);
    assert!(sampler.register().is_empty());
    sampler.sample_once().await;
    assert_eq!(sampler.sink().last()["action"]["label"], "OBSERVER_IDLE");
}

#[tokio::test]
async fn test_action_expires_after_ttl() {
    let (sim, id, clock) = demo();
    let config = RecorderConfig { action_ttl_ms: 500, ..RecorderConfig::default() };
    let mut sampler = sampler(&config, &sim, &clock, MemorySink::default());

    sampler.ingest(host(HostEvent::ToggleSneak { actor: id, sneaking: true }));
    clock.advance(500);
    sampler.sample_once().await;
    assert_eq!(sampler.sink().last()["action"]["label"], "START_SNEAK");
    assert_eq!(sampler.sink().last()["action"]["metadata"]["sneaking"], true);

    clock.advance(1);
    sampler.sample_once().await;
    assert_eq!(sampler.sink().last()["action"]["label"], "OBSERVER_IDLE");
    assert!(sampler.register().is_empty(), "expired records are pruned");
}

#[tokio::test]
async fn test_reconfigure_keeps_recorded_actions() {
    let (sim, id, clock) = demo();
    let mut sampler = sampler(&RecorderConfig::default(), &sim, &clock, MemorySink::default());
    sampler.ingest(host(HostEvent::ItemConsume { actor: id, item: "APPLE".into() }));

    let earlier = sampler.reconfigure(
        &RecorderConfig { action_ttl_ms: 0, nearby_block_radius: 1, ..RecorderConfig::default() },
        MemorySink::default(),
    );
    assert!(earlier.writes.lock().is_empty());
    assert_eq!(sampler.register().ttl_ms(), 250);
    sampler.sample_once().await;

    let doc = sampler.sink().last();
    assert_eq!(doc["action"]["label"], "EAT");
    assert_eq!(doc["state"]["nearbyBlocksRaw"].as_array().map(Vec::len), Some(27));
}

#[tokio::test]
async fn test_reconfigure_switches_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let (sim, _id, clock) = demo();
    let first = RecorderConfig { output_file: "a.json".into(), ..RecorderConfig::default() };
    let mut sampler = sampler(&first, &sim, &clock, FileSink::new(first.resolve_output_path(dir.path())));
    assert_eq!(sampler.sample_once().await, TickOutcome::Written);

    let second = RecorderConfig { output_file: "b.json".into(), ..RecorderConfig::default() };
    sampler.reconfigure(&second, FileSink::new(second.resolve_output_path(dir.path())));
    std::fs::remove_file(dir.path().join("a.json")).unwrap();
    clock.advance(100);
    assert_eq!(sampler.sample_once().await, TickOutcome::Written);

    assert!(!dir.path().join("a.json").exists(), "old file is no longer written");
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("b.json")).unwrap()).unwrap();
    assert_eq!(doc["timestampMs"], START_MS + 100);
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn count(&self, needle: &str) -> usize {
        String::from_utf8_lossy(&self.0.lock()).matches(needle).count()
    }
}

#[tokio::test]
async fn test_no_actor_warning_is_logged_once_from_startup() {
    let logs = Captured::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (sim, id, clock) = demo();
    sim.set_online(&id, false);
    let mut sampler = sampler(&RecorderConfig::default(), &sim, &clock, MemorySink::default());

    assert_eq!(sampler.sample_once().await, TickOutcome::NoActor);
    assert_eq!(sampler.sample_once().await, TickOutcome::NoActor);
    assert_eq!(logs.count("no observable actor"), 1);

    sim.set_online(&id, true);
    assert_eq!(sampler.sample_once().await, TickOutcome::Written);
    assert_eq!(logs.count("observing actor"), 1);

    sim.set_online(&id, false);
    assert_eq!(sampler.sample_once().await, TickOutcome::NoActor);
    assert_eq!(logs.count("no observable actor"), 2);
}

#[tokio::test]
async fn test_run_ingests_and_samples_until_cancelled() {
    let (sim, id, clock) = demo();
    let mut sampler = sampler(&RecorderConfig::default(), &sim, &clock, MemorySink::default());
    let (tx, rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();

    tx.send(host(HostEvent::BlockBreak { actor: id, block: "OAK_LOG".into() })).await.unwrap();
    drop(tx);

    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        stopper.cancel();
    });

    tokio::time::timeout(Duration::from_secs(5), sampler.run(rx, cancel))
        .await
        .expect("sampler did not stop after cancellation");

    assert_eq!(sampler.stats.actions_ingested, 1);
    assert!(sampler.stats.ticks >= 1);
    assert_eq!(sampler.stats.ticks, sampler.stats.written);
    assert_eq!(sampler.sink().last()["action"]["metadata"]["block"], "oak_log");
}
