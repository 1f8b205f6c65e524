//! Core swath sonar processing modules

pub mod geo;
pub mod layout;
pub mod binner;
pub mod resample;
pub mod correct;
pub mod pipeline;

// Re-export main types
pub use layout::{intersect_grid, AngleTable, AngleTableEntry};
pub use binner::{BinnerParams, OutputSwath, SidescanBinner};
pub use resample::{AttitudeSeries, Cursor, NavSeries, TimeSeries, TimeShift};
pub use correct::{apply_lever_arm, correct_attitude, correct_vertical, rotate_beam, CorrectionKind};
pub use pipeline::{
    accumulate_streams, layout_ping, preprocess_pass, run_layout, run_preprocess, BottomMode,
    BottomPick, LayoutConfig, PreprocessConfig, SensorStreams, ShiftTargets,
};
