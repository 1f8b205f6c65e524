use crate::types::{SonarError, SonarResult};

/// Interpolation cursor: remembers the last bracket index so that queries
/// arriving in increasing time order cost amortized O(1).
///
/// The cursor only walks forward. Each independently-iterating consumer
/// must own its own cursor; sharing one between query sequences silently
/// produces wrong values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cursor {
    last: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A sparse, irregularly-timed scalar sensor series.
///
/// Timestamps are non-decreasing by construction; an empty series means
/// "no override, keep the ping's native value".
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(f64, f64)]) -> SonarResult<Self> {
        let mut series = Self::new();
        for &(t, v) in pairs {
            series.push(t, v)?;
        }
        Ok(series)
    }

    /// Append one sample; timestamps must not decrease (ties are allowed
    /// and tolerated by the monotone cursor at query time).
    pub fn push(&mut self, time_d: f64, value: f64) -> SonarResult<()> {
        if let Some(&last) = self.times.last() {
            if time_d < last {
                return Err(SonarError::InvalidFormat(format!(
                    "time series timestamps must not decrease: {} after {}",
                    time_d, last
                )));
            }
        }
        self.times.push(time_d);
        self.values.push(value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Subtract a time shift from every timestamp in place.
    ///
    /// Must run before any interpolation queries against this series, since
    /// the timestamps themselves move.
    pub fn apply_time_shift(&mut self, shift: &TimeShift) {
        apply_time_shift(&mut self.times, shift);
    }

    /// Bracket index and interpolation fraction for a query time, advancing
    /// the cursor; `None` means the query clamps to an edge value.
    fn locate(&self, time_d: f64, cursor: &mut Cursor) -> Option<(usize, f64)> {
        let n = self.times.len();
        if n == 1 || time_d <= self.times[0] {
            return None;
        }
        if time_d >= self.times[n - 1] {
            cursor.last = n - 2;
            return None;
        }

        let mut c = cursor.last.min(n - 2);
        while c + 1 < n - 1 && self.times[c + 1] <= time_d {
            c += 1;
        }
        cursor.last = c;

        let fraction = (time_d - self.times[c]) / (self.times[c + 1] - self.times[c]);
        Some((c, fraction))
    }

    /// Linear interpolation at a query time, clamping to the edge values
    /// outside the sampled span.
    pub fn interp(&self, time_d: f64, cursor: &mut Cursor) -> f64 {
        debug_assert!(!self.is_empty());
        match self.locate(time_d, cursor) {
            Some((c, fraction)) => {
                self.values[c] + fraction * (self.values[c + 1] - self.values[c])
            }
            None => {
                if time_d <= self.times[0] {
                    self.values[0]
                } else {
                    self.values[self.len() - 1]
                }
            }
        }
    }

    /// Longitude interpolation: unwraps the ±180° seam before applying the
    /// fraction, re-wraps the result into [-180°, 180°].
    pub fn interp_longitude(&self, time_d: f64, cursor: &mut Cursor) -> f64 {
        debug_assert!(!self.is_empty());
        match self.locate(time_d, cursor) {
            Some((c, fraction)) => {
                let mut dv = self.values[c + 1] - self.values[c];
                if dv > 180.0 {
                    dv -= 360.0;
                } else if dv < -180.0 {
                    dv += 360.0;
                }
                let mut value = self.values[c] + fraction * dv;
                if value > 180.0 {
                    value -= 360.0;
                } else if value < -180.0 {
                    value += 360.0;
                }
                value
            }
            None => {
                if time_d <= self.times[0] {
                    self.values[0]
                } else {
                    self.values[self.len() - 1]
                }
            }
        }
    }

    /// Heading interpolation: takes the shortest circular path and
    /// normalizes the result into [0°, 360°).
    pub fn interp_heading(&self, time_d: f64, cursor: &mut Cursor) -> f64 {
        debug_assert!(!self.is_empty());
        let value = match self.locate(time_d, cursor) {
            Some((c, fraction)) => {
                let mut dv = self.values[c + 1] - self.values[c];
                if dv > 180.0 {
                    dv -= 360.0;
                } else if dv < -180.0 {
                    dv += 360.0;
                }
                self.values[c] + fraction * dv
            }
            None => {
                if time_d <= self.times[0] {
                    self.values[0]
                } else {
                    self.values[self.len() - 1]
                }
            }
        };
        if value < 0.0 {
            value + 360.0
        } else if value >= 360.0 {
            value - 360.0
        } else {
            value
        }
    }
}

/// Attitude tuple series: roll, pitch and heave sampled together on one
/// timestamp array with one shared cursor.
#[derive(Debug, Clone, Default)]
pub struct AttitudeSeries {
    times: Vec<f64>,
    roll: Vec<f64>,
    pitch: Vec<f64>,
    heave: Vec<f64>,
}

impl AttitudeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time_d: f64, roll: f64, pitch: f64, heave: f64) -> SonarResult<()> {
        if let Some(&last) = self.times.last() {
            if time_d < last {
                return Err(SonarError::InvalidFormat(format!(
                    "attitude timestamps must not decrease: {} after {}",
                    time_d, last
                )));
            }
        }
        self.times.push(time_d);
        self.roll.push(roll);
        self.pitch.push(pitch);
        self.heave.push(heave);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn apply_time_shift(&mut self, shift: &TimeShift) {
        apply_time_shift(&mut self.times, shift);
    }

    /// Interpolated (roll, pitch, heave) at a query time.
    pub fn interp(&self, time_d: f64, cursor: &mut Cursor) -> (f64, f64, f64) {
        debug_assert!(!self.is_empty());
        let n = self.times.len();
        if n == 1 || time_d <= self.times[0] {
            return (self.roll[0], self.pitch[0], self.heave[0]);
        }
        if time_d >= self.times[n - 1] {
            cursor.last = n - 2;
            return (self.roll[n - 1], self.pitch[n - 1], self.heave[n - 1]);
        }

        let mut c = cursor.last.min(n - 2);
        while c + 1 < n - 1 && self.times[c + 1] <= time_d {
            c += 1;
        }
        cursor.last = c;

        let fraction = (time_d - self.times[c]) / (self.times[c + 1] - self.times[c]);
        (
            self.roll[c] + fraction * (self.roll[c + 1] - self.roll[c]),
            self.pitch[c] + fraction * (self.pitch[c + 1] - self.pitch[c]),
            self.heave[c] + fraction * (self.heave[c + 1] - self.heave[c]),
        )
    }
}

/// Navigation tuple series: longitude, latitude and speed sampled together
/// on one timestamp array with one shared cursor. Longitude interpolation
/// unwraps the ±180° seam.
#[derive(Debug, Clone, Default)]
pub struct NavSeries {
    times: Vec<f64>,
    lon: Vec<f64>,
    lat: Vec<f64>,
    speed: Vec<f64>,
}

impl NavSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time_d: f64, lon: f64, lat: f64, speed: f64) -> SonarResult<()> {
        if let Some(&last) = self.times.last() {
            if time_d < last {
                return Err(SonarError::InvalidFormat(format!(
                    "navigation timestamps must not decrease: {} after {}",
                    time_d, last
                )));
            }
        }
        self.times.push(time_d);
        self.lon.push(lon);
        self.lat.push(lat);
        self.speed.push(speed);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn apply_time_shift(&mut self, shift: &TimeShift) {
        apply_time_shift(&mut self.times, shift);
    }

    /// Interpolated (lon, lat, speed) at a query time.
    pub fn interp(&self, time_d: f64, cursor: &mut Cursor) -> (f64, f64, f64) {
        debug_assert!(!self.is_empty());
        let n = self.times.len();
        if n == 1 || time_d <= self.times[0] {
            return (self.lon[0], self.lat[0], self.speed[0]);
        }
        if time_d >= self.times[n - 1] {
            cursor.last = n - 2;
            return (self.lon[n - 1], self.lat[n - 1], self.speed[n - 1]);
        }

        let mut c = cursor.last.min(n - 2);
        while c + 1 < n - 1 && self.times[c + 1] <= time_d {
            c += 1;
        }
        cursor.last = c;

        let fraction = (time_d - self.times[c]) / (self.times[c + 1] - self.times[c]);

        // longitude takes the short way around the antimeridian
        let mut dlon = self.lon[c + 1] - self.lon[c];
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }
        let mut lon = self.lon[c] + fraction * dlon;
        if lon > 180.0 {
            lon -= 360.0;
        } else if lon < -180.0 {
            lon += 360.0;
        }

        (
            lon,
            self.lat[c] + fraction * (self.lat[c + 1] - self.lat[c]),
            self.speed[c] + fraction * (self.speed[c + 1] - self.speed[c]),
        )
    }
}

/// Time shift applied to a stream's timestamps before resampling
#[derive(Debug, Clone, Default)]
pub enum TimeShift {
    #[default]
    None,
    /// Constant shift in seconds, subtracted from every timestamp
    Constant(f64),
    /// Time-varying latency model, interpolated at each timestamp
    Model(TimeSeries),
}

/// Subtract a constant or modeled time shift from a timestamp array.
pub fn apply_time_shift(times: &mut [f64], shift: &TimeShift) {
    match shift {
        TimeShift::None => {}
        TimeShift::Constant(dt) => {
            for t in times.iter_mut() {
                *t -= dt;
            }
        }
        TimeShift::Model(model) => {
            if model.is_empty() {
                return;
            }
            let mut cursor = Cursor::new();
            for t in times.iter_mut() {
                *t -= model.interp(*t, &mut cursor);
            }
        }
    }
}
