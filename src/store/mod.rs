//! Store implementations. Production deployments plug a relational store into
//! the repository traits; [`memory`] provides the in-memory implementation
//! used by the demo CLI wiring and the test suites.

pub mod memory;

pub use memory::{MemoryStore, RecordingMailer};
