use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::event::{ActionEvent, ActionLabel, ActorId};
use super::time::Clock;
use super::value::{Value, ValueMap};

/// Provenance tag stamped on every action this subsystem reports.
pub const ACTION_SOURCE: &str = "user-telemetry";

/// The most recent discrete thing an actor did.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub label: ActionLabel,
    pub source: &'static str,
    pub success: Option<bool>,
    pub metadata: ValueMap,
    /// `None` for the idle default.
    pub observed_at_ms: Option<i64>,
}

impl ActionRecord {
    pub fn idle() -> Self {
        Self {
            label: ActionLabel::Idle,
            source: ACTION_SOURCE,
            success: None,
            metadata: ValueMap::new(),
            observed_at_ms: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.label == ActionLabel::Idle
    }

    pub fn to_value(&self) -> Value {
        ValueMap::new()
            .with("label", self.label.as_str())
            .with("source", self.source)
            .with("success", self.success)
            .with("metadata", self.metadata.clone())
            .into()
    }
}

impl Default for ActionRecord {
    fn default() -> Self {
        Self::idle()
    }
}

/// Last action per actor, visible for `ttl_ms` after it was recorded.
///
/// Records are stored behind `Arc` and replaced whole, so a concurrent
/// `resolve` observes either the previous record or the new one.
pub struct ActionRegister {
    clock: Arc<dyn Clock>,
    ttl_ms: AtomicI64,
    table: RwLock<HashMap<ActorId, Arc<ActionRecord>>>,
}

impl ActionRegister {
    pub fn new(clock: Arc<dyn Clock>, ttl_ms: i64) -> Self {
        Self {
            clock,
            ttl_ms: AtomicI64::new(ttl_ms),
            table: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms.load(Ordering::Relaxed)
    }

    pub fn set_ttl_ms(&self, ttl_ms: i64) {
        self.ttl_ms.store(ttl_ms, Ordering::Relaxed);
    }

    /// Overwrites the actor's record, stamped with the current time.
    /// An absent actor is ignored; absent metadata is stored as empty.
    pub fn record(
        &self,
        actor: Option<ActorId>,
        label: ActionLabel,
        success: Option<bool>,
        metadata: Option<ValueMap>,
    ) {
        let Some(actor) = actor else {
            return;
        };
        let record = ActionRecord {
            label,
            source: ACTION_SOURCE,
            success,
            metadata: metadata.unwrap_or_default(),
            observed_at_ms: Some(self.clock.now_ms()),
        };
        self.table.write().insert(actor, Arc::new(record));
    }

    pub fn record_event(&self, event: ActionEvent) {
        self.record(Some(event.actor), event.label, event.success, Some(event.metadata));
    }

    /// The stored record if its age is at most `ttl_ms`, else the idle default.
    pub fn resolve_at(&self, actor: &ActorId, now_ms: i64, ttl_ms: i64) -> ActionRecord {
        let stored = self.table.read().get(actor).cloned();
        match stored {
            Some(record) if is_fresh(&record, now_ms, ttl_ms) => (*record).clone(),
            _ => ActionRecord::idle(),
        }
    }

    /// [`resolve_at`](Self::resolve_at) with the register's clock and TTL.
    pub fn resolve(&self, actor: &ActorId) -> ActionRecord {
        self.resolve_at(actor, self.clock.now_ms(), self.ttl_ms())
    }

    /// Drops expired records. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let now_ms = self.clock.now_ms();
        let ttl_ms = self.ttl_ms();
        let mut table = self.table.write();
        let before = table.len();
        table.retain(|_, record| is_fresh(record, now_ms, ttl_ms));
        before - table.len()
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }
}

fn is_fresh(record: &ActionRecord, now_ms: i64, ttl_ms: i64) -> bool {
    match record.observed_at_ms {
        Some(at) => now_ms.saturating_sub(at) <= ttl_ms,
        None => false,
    }
}
