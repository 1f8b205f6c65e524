use chrono::{DateTime, TimeZone, Utc};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Sidescan sample type for analytic (I + jQ) traces
pub type SsComplex = Complex<f64>;

/// Null sidescan sentinel marking bins with no accumulated energy
pub const SIDESCAN_NULL: f64 = -1_000_000_000.0;

/// Validity flag attached to every bathymetric sounding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeamFlag {
    /// Good detection
    Good,
    /// Detection flagged bad (manually or by a filter) but still present
    Flagged,
    /// No detection at all, values are padding
    Null,
}

impl BeamFlag {
    pub fn is_null(&self) -> bool {
        matches!(self, BeamFlag::Null)
    }
}

/// One bathymetric sounding: depth plus horizontal offsets from the sensor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Beam {
    pub flag: BeamFlag,
    /// Depth below the vessel reference point (meters, positive down)
    pub depth: f64,
    /// Across-track offset (meters, starboard positive)
    pub acrosstrack: f64,
    /// Along-track offset (meters, forward positive)
    pub alongtrack: f64,
}

impl Beam {
    pub fn null() -> Self {
        Self {
            flag: BeamFlag::Null,
            depth: 0.0,
            acrosstrack: 0.0,
            alongtrack: 0.0,
        }
    }
}

/// Raw sidescan samples, either plain magnitudes or analytic I/Q pairs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TraceSamples {
    Magnitude(Vec<f64>),
    Analytic(Vec<SsComplex>),
}

impl TraceSamples {
    pub fn len(&self) -> usize {
        match self {
            TraceSamples::Magnitude(v) => v.len(),
            TraceSamples::Analytic(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample amplitude: vector magnitude for analytic traces, raw value otherwise
    pub fn amplitude(&self, i: usize) -> f64 {
        match self {
            TraceSamples::Magnitude(v) => v[i],
            TraceSamples::Analytic(v) => v[i].norm(),
        }
    }
}

/// One raw sidescan trace (a single side of a ping)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidescanTrace {
    pub samples: TraceSamples,
    /// Two-way sample interval in nanoseconds
    pub sample_interval: f64,
    /// Per-trace gain normalization exponent; energy weight is 2^weighting_factor
    pub weighting_factor: i32,
}

impl SidescanTrace {
    /// Energy normalization weight derived from the trace header
    pub fn weight(&self) -> f64 {
        (std::f64::consts::LN_2 * self.weighting_factor as f64).exp()
    }
}

/// One sonar observation epoch: navigation, attitude, bathymetry
/// and optionally a pair of raw sidescan traces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ping {
    /// Timestamp in epoch seconds
    pub time_d: f64,
    /// Longitude in degrees
    pub navlon: f64,
    /// Latitude in degrees
    pub navlat: f64,
    /// Speed in km/hr
    pub speed: f64,
    /// Heading in degrees, clockwise from north
    pub heading: f64,
    /// Depth of the sensor below the sea surface (meters)
    pub sensordepth: f64,
    /// Roll in degrees, starboard down positive
    pub roll: f64,
    /// Pitch in degrees, bow up positive
    pub pitch: f64,
    /// Heave in meters, up positive
    pub heave: f64,
    /// Sensor altitude above the seafloor (meters)
    pub altitude: f64,
    pub beams: Vec<Beam>,
    pub ss_port: Option<SidescanTrace>,
    pub ss_stbd: Option<SidescanTrace>,
    /// Laid-out sidescan swath, populated by the sidescan layout stage
    pub ss: Vec<f64>,
    pub ss_acrosstrack: Vec<f64>,
    pub ss_alongtrack: Vec<f64>,
}

impl Ping {
    /// Draft (static transducer depth) implied by sensordepth and heave
    pub fn draft(&self) -> f64 {
        self.sensordepth - self.heave
    }

    /// Timestamp as UTC date/time for diagnostics
    pub fn timestamp(&self) -> DateTime<Utc> {
        let secs = self.time_d.floor() as i64;
        let nanos = ((self.time_d - secs as f64) * 1e9) as u32;
        Utc.timestamp_opt(secs, nanos).single().unwrap_or_default()
    }
}

/// Fixed lever-arm offset between the vessel reference point and a sensor
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LeverArm {
    /// Starboard offset (meters)
    pub x: f64,
    /// Forward offset (meters)
    pub y: f64,
    /// Downward offset (meters)
    pub z: f64,
}

/// Error types for swath sonar processing
#[derive(Debug, thiserror::Error)]
pub enum SonarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for swath sonar operations
pub type SonarResult<T> = Result<T, SonarError>;
