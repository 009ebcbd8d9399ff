pub mod config;
pub mod kernel;
pub mod reader;
pub mod sim;

pub use config::RecorderConfig;
pub use kernel::action::{ActionRecord, ActionRegister};
pub use kernel::reactor::Sampler;
pub use kernel::snapshot::{SnapshotAssembler, TelemetrySnapshot};
pub use kernel::value::{Value, ValueMap};
