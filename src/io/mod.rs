//! Stream and grid I/O collaborators

pub mod grid;
pub mod ping;

pub use grid::TopoGrid;
pub use ping::{MemoryPingStore, PingSink, PingSource, Record, RecordCounts};
