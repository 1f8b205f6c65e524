use crate::types::{Ping, SonarResult};
use serde::{Deserialize, Serialize};

/// One record from a swath data stream.
///
/// Survey records carry full pings; the asynchronous kinds carry one sparse
/// sensor sample each and are what the preprocessing first pass accumulates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Record {
    Survey(Ping),
    Navigation {
        time_d: f64,
        navlon: f64,
        navlat: f64,
        speed: f64,
    },
    Heading {
        time_d: f64,
        heading: f64,
    },
    SensorDepth {
        time_d: f64,
        sensordepth: f64,
    },
    Attitude {
        time_d: f64,
        roll: f64,
        pitch: f64,
        heave: f64,
    },
    Comment(String),
}

impl Record {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Record::Survey(_) => "survey",
            Record::Navigation { .. } => "navigation",
            Record::Heading { .. } => "heading",
            Record::SensorDepth { .. } => "sensordepth",
            Record::Attitude { .. } => "attitude",
            Record::Comment(_) => "comment",
        }
    }
}

/// Source side of the ping stream contract: `Ok(None)` is end of stream,
/// errors are fatal to the batch.
pub trait PingSource {
    fn read_record(&mut self) -> SonarResult<Option<Record>>;
}

/// Sink side of the ping stream contract; write errors are fatal.
pub trait PingSink {
    fn write_ping(&mut self, ping: &Ping) -> SonarResult<()>;
}

/// In-memory record store implementing both stream directions.
#[derive(Debug, Default, Clone)]
pub struct MemoryPingStore {
    pub records: Vec<Record>,
    cursor: usize,
    pub written: Vec<Ping>,
}

impl MemoryPingStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            cursor: 0,
            written: Vec::new(),
        }
    }

    /// Reset the read position, e.g. between the two preprocessing passes
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

impl PingSource for MemoryPingStore {
    fn read_record(&mut self) -> SonarResult<Option<Record>> {
        if self.cursor >= self.records.len() {
            return Ok(None);
        }
        let record = self.records[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(record))
    }
}

impl PingSink for MemoryPingStore {
    fn write_ping(&mut self, ping: &Ping) -> SonarResult<()> {
        self.written.push(ping.clone());
        Ok(())
    }
}

/// Per-run record tallies, the primary operator-facing diagnostic.
///
/// Kept as an explicit struct owned by each pipeline run rather than any
/// process-wide state, so independent runs never share counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecordCounts {
    pub survey: usize,
    pub navigation: usize,
    pub heading: usize,
    pub sensordepth: usize,
    pub attitude: usize,
    pub comment: usize,
    pub skipped: usize,
    pub written: usize,
}

impl RecordCounts {
    pub fn tally(&mut self, record: &Record) {
        match record {
            Record::Survey(_) => self.survey += 1,
            Record::Navigation { .. } => self.navigation += 1,
            Record::Heading { .. } => self.heading += 1,
            Record::SensorDepth { .. } => self.sensordepth += 1,
            Record::Attitude { .. } => self.attitude += 1,
            Record::Comment(_) => self.comment += 1,
        }
    }

    pub fn total_read(&self) -> usize {
        self.survey + self.navigation + self.heading + self.sensordepth + self.attitude
            + self.comment
    }

    /// Log the end-of-pass summary
    pub fn report(&self, label: &str) {
        log::info!("{} records read: {}", label, self.total_read());
        log::info!("     survey:      {}", self.survey);
        log::info!("     navigation:  {}", self.navigation);
        log::info!("     heading:     {}", self.heading);
        log::info!("     sensordepth: {}", self.sensordepth);
        log::info!("     attitude:    {}", self.attitude);
        log::info!("     comment:     {}", self.comment);
        if self.skipped > 0 {
            log::info!("     skipped:     {}", self.skipped);
        }
        log::info!("{} records written: {}", label, self.written);
    }

    pub fn merge(&mut self, other: &RecordCounts) {
        self.survey += other.survey;
        self.navigation += other.navigation;
        self.heading += other.heading;
        self.sensordepth += other.sensordepth;
        self.attitude += other.attitude;
        self.comment += other.comment;
        self.skipped += other.skipped;
        self.written += other.written;
    }
}
