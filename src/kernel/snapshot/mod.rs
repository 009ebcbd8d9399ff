//! Snapshot assembly: environment queries in, canonical record out.
//!
//! Every non-count floating value leaving this module is rounded with
//! [`round4`]. Keys whose value is unknown are kept with a null marker.

pub mod assembler;
pub mod blocks;
pub mod types;
pub mod view;
pub mod world;

pub use assembler::{AssembleError, AssemblerConfig, SnapshotAssembler};
pub use types::*;

/// Round half up to 4 decimal places: `floor(v * 10000 + 0.5) / 10000`.
///
/// Values too large to carry a fractional part at that scale pass through.
pub fn round4(value: f64) -> f64 {
    const EXACT_LIMIT: f64 = 4_503_599_627_370_496.0; // 2^52
    let scaled = value * 10_000.0;
    if !scaled.is_finite() || scaled.abs() >= EXACT_LIMIT {
        return value;
    }
    (scaled + 0.5).floor() / 10_000.0
}
