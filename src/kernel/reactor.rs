use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::action::ActionRegister;
use super::event::Event;
use super::query::{ActorProfile, EnvironmentQuery};
use super::serializer::to_text;
use super::sink::SnapshotSink;
use super::snapshot::SnapshotAssembler;
use super::stats::{SamplerStats, TickOutcome};
use super::time::{Clock, Tick};
use crate::config::RecorderConfig;

/// The sampling loop: actions in, one latest-snapshot write per tick out.
///
/// Ticks never overlap: each one awaits its own write before the loop
/// polls for the next.
pub struct Sampler<S> {
    env: Arc<dyn EnvironmentQuery>,
    clock: Arc<dyn Clock>,
    register: Arc<ActionRegister>,
    assembler: SnapshotAssembler,
    sink: S,
    target: String,
    interval: Duration,
    pub stats: SamplerStats,
    pub tick: Tick,
    observed: Observed,
}

/// Who the previous tick observed. `Unset` until the first tick runs.
#[derive(Debug, Clone, PartialEq)]
enum Observed {
    Unset,
    Nobody,
    Actor(ActorProfile),
}

impl<S: SnapshotSink> Sampler<S> {
    pub fn new(config: &RecorderConfig, env: Arc<dyn EnvironmentQuery>, clock: Arc<dyn Clock>, sink: S) -> Self {
        let config = config.normalized();
        Self {
            register: Arc::new(ActionRegister::new(clock.clone(), config.action_ttl_ms)),
            assembler: SnapshotAssembler::new(config.assembler()),
            target: config.target_player.clone(),
            interval: config.sample_interval(),
            env,
            clock,
            sink,
            stats: SamplerStats::new(),
            tick: Tick::new(),
            observed: Observed::Unset,
        }
    }

    /// Shared handle for hosts that deliver actions from other threads.
    pub fn register(&self) -> Arc<ActionRegister> {
        Arc::clone(&self.register)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Applies new settings and swaps in `sink`, built by the caller for
    /// the new output path. Recorded actions survive; only their TTL changes.
    /// Returns the previous sink.
    pub fn reconfigure(&mut self, config: &RecorderConfig, sink: S) -> S {
        let config = config.normalized();
        self.register.set_ttl_ms(config.action_ttl_ms);
        self.assembler = SnapshotAssembler::new(config.assembler());
        self.target = config.target_player.clone();
        self.interval = config.sample_interval();
        info!(?config, "sampler reconfigured");
        std::mem::replace(&mut self.sink, sink)
    }

    pub fn ingest(&mut self, event: Event) {
        let action = match event {
            Event::Action(action) => Some(action),
            Event::Host { cancelled: true, .. } => None,
            Event::Host { event, cancelled: false } => event.into_action(),
        };
        match action {
            Some(action) => {
                debug!(actor = %action.actor, label = %action.label, "action recorded");
                self.register.record_event(action);
                self.stats.actions_ingested += 1;
            }
            None => self.stats.events_ignored += 1,
        }
    }

    /// The configured actor if online, else the first online actor.
    pub fn select_actor(&self) -> Option<ActorProfile> {
        let online = self.env.online_actors();
        if !self.target.is_empty() {
            if let Some(named) = online.iter().find(|a| a.name.eq_ignore_ascii_case(&self.target)) {
                return Some(named.clone());
            }
        }
        online.into_iter().next()
    }

    /// One tick: select, resolve, assemble, serialize, persist.
    pub async fn sample_once(&mut self) -> TickOutcome {
        self.tick = self.tick.next();
        self.register.prune();

        let outcome = self.sample_inner().await;
        self.stats.record(outcome);
        outcome
    }

    async fn sample_inner(&mut self) -> TickOutcome {
        let Some(actor) = self.select_actor() else {
            if self.observed != Observed::Nobody {
                warn!("no observable actor; skipping ticks until one is online");
                self.observed = Observed::Nobody;
            }
            return TickOutcome::NoActor;
        };
        if !matches!(&self.observed, Observed::Actor(current) if current.id == actor.id) {
            info!(name = %actor.name, id = %actor.id, "observing actor");
            self.observed = Observed::Actor(actor.clone());
        }

        let action = self.register.resolve(&actor.id);
        let now_ms = self.clock.now_ms();
        let snapshot = match self.assembler.assemble(self.env.as_ref(), &actor, action, now_ms) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(tick = self.tick.frame, "snapshot skipped: {}", err);
                return TickOutcome::AssemblyFailed;
            }
        };

        let text = to_text(&snapshot.to_value());
        match self.sink.persist(&text).await {
            Ok(()) => TickOutcome::Written,
            Err(err) => {
                warn!(tick = self.tick.frame, "failed to write telemetry file: {}", err);
                TickOutcome::PersistFailed
            }
        }
    }

    /// Drives sampling until `cancel` fires. Events are recorded as they
    /// arrive; a closed channel only stops ingestion, not sampling.
    pub async fn run(&mut self, mut events: mpsc::Receiver<Event>, cancel: CancellationToken) {
        info!(interval_ms = self.interval.as_millis() as u64, "sampler started");

        let mut cadence = interval(self.interval);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut events_open = true;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                received = events.recv(), if events_open => match received {
                    Some(event) => self.ingest(event),
                    None => {
                        debug!("event channel closed");
                        events_open = false;
                    }
                },
                _ = cadence.tick() => {
                    self.sample_once().await;
                }
            }
        }

        info!(
            ticks = self.stats.ticks,
            written = self.stats.written,
            skipped = self.stats.no_actor,
            failed = self.stats.assembly_failures + self.stats.persist_failures,
            "sampler stopped"
        );
    }
}
