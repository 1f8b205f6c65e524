//! swathline: A Fast, Modular Swath Sonar Sidescan Layout and Preprocessing Toolkit
//!
//! This library lays raw sidescan sonar traces onto flat or gridded seafloor
//! models and merges asynchronous navigation/attitude sensor streams onto
//! survey pings, re-deriving bathymetry through rigid-body corrections.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    Beam, BeamFlag, LeverArm, Ping, SidescanTrace, SonarError, SonarResult, SsComplex,
    TraceSamples, SIDESCAN_NULL,
};

pub use io::{MemoryPingStore, PingSink, PingSource, Record, RecordCounts, TopoGrid};

pub use crate::core::{
    run_layout, run_preprocess, AngleTable, BottomMode, BottomPick, Cursor, LayoutConfig,
    PreprocessConfig, SensorStreams, SidescanBinner, TimeSeries, TimeShift,
};
