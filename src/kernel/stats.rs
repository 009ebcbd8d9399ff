/// What one sampling tick ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Written,
    /// No online actor matched; nothing was written.
    NoActor,
    AssemblyFailed,
    PersistFailed,
}

/// Running counters for the sampling loop. Observability only; never read
/// back into sampling decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplerStats {
    pub ticks: u64,
    pub written: u64,
    pub no_actor: u64,
    pub assembly_failures: u64,
    pub persist_failures: u64,
    pub actions_ingested: u64,
    pub events_ignored: u64,
}

impl SamplerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Written => self.written += 1,
            TickOutcome::NoActor => self.no_actor += 1,
            TickOutcome::AssemblyFailed => self.assembly_failures += 1,
            TickOutcome::PersistFailed => self.persist_failures += 1,
        }
    }

    /// Share of ticks that produced a file write.
    pub fn write_ratio(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.written as f64 / self.ticks as f64
        }
    }
}
