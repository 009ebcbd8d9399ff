//! Sampling kernel.
//!
//! The action register and the environment are the only inputs; the
//! serialized snapshot handed to the sink is the only output. Nothing here
//! mutates the host environment.

pub mod action;
pub mod event;
pub mod query;
pub mod reactor;
pub mod serializer;
pub mod sink;
pub mod snapshot;
pub mod stats;
pub mod time;
pub mod value;
