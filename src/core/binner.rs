use crate::core::layout::AngleTable;
use crate::types::{SidescanTrace, SIDESCAN_NULL};

/// Default output swath dimension in bins, centered on nadir
pub const DEFAULT_PIXEL_COUNT: usize = 4001;

/// Nominal swath width as a multiple of the flat-bottom horizontal extent
/// sqrt(maxRange^2 - altitude^2)
const SWATH_WIDTH_FACTOR: f64 = 2.2;

/// Converts two-way travel time in nanoseconds times sound speed in m/s to
/// one-way range in meters (0.5 for the two-way path, 1e-9 for ns to s)
const NS_TO_ONE_WAY_M: f64 = 0.0000000005;

/// Sidescan binner configuration
#[derive(Debug, Clone)]
pub struct BinnerParams {
    /// Number of output bins across the swath
    pub pixel_count: usize,
    /// Maximum run of empty bins bridged by linear interpolation
    pub interp_bins: usize,
    /// Fixed swath width in meters; None derives it from the trace extent
    pub swath_width: Option<f64>,
}

impl Default for BinnerParams {
    fn default() -> Self {
        Self {
            pixel_count: DEFAULT_PIXEL_COUNT,
            interp_bins: 0,
            swath_width: None,
        }
    }
}

/// One ping's worth of geographically binned sidescan
#[derive(Debug, Clone)]
pub struct OutputSwath {
    /// Averaged bin values; empty bins hold `SIDESCAN_NULL`
    pub values: Vec<f64>,
    /// Across-track center of each bin in meters
    pub acrosstrack: Vec<f64>,
    /// Mean along-track offset of the samples landing in each bin
    pub alongtrack: Vec<f64>,
    /// Swath width actually used, in meters
    pub swath_width: f64,
}

/// Bins raw sidescan traces onto a fixed-width output swath using a bottom
/// layout table.
#[derive(Debug, Clone, Default)]
pub struct SidescanBinner {
    params: BinnerParams,
}

impl SidescanBinner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: BinnerParams) -> Self {
        Self { params }
    }

    /// Bin one ping's port and starboard traces into an output swath.
    ///
    /// The angle table provides the sample range to seafloor position
    /// mapping; `sound_velocity` is in m/s. Callers are expected to have
    /// validated the altitude against the trace extent: a trace shorter
    /// than the altitude makes the derived swath width NaN.
    pub fn bin_ping(
        &self,
        port: &SidescanTrace,
        stbd: &SidescanTrace,
        table: &AngleTable,
        altitude: f64,
        sound_velocity: f64,
    ) -> OutputSwath {
        let pixel_count = self.params.pixel_count;

        // swath width from the longer trace's maximum range
        let max_range = {
            let rr_port = NS_TO_ONE_WAY_M
                * sound_velocity
                * (port.samples.len() as f64 * port.sample_interval);
            let rr_stbd = NS_TO_ONE_WAY_M
                * sound_velocity
                * (stbd.samples.len() as f64 * stbd.sample_interval);
            rr_port.max(rr_stbd)
        };
        let swath_width = self
            .params
            .swath_width
            .unwrap_or_else(|| SWATH_WIDTH_FACTOR * (max_range * max_range - altitude * altitude).sqrt());
        let pixel_width = swath_width / (pixel_count - 1) as f64;

        let mut values = vec![0.0; pixel_count];
        let mut acrosstrack = vec![0.0; pixel_count];
        let mut alongtrack = vec![0.0; pixel_count];
        let mut bin_count = vec![0usize; pixel_count];
        for (j, xt) in acrosstrack.iter_mut().enumerate() {
            *xt = pixel_width * (j as isize - (pixel_count / 2) as isize) as f64;
        }

        self.bin_trace(
            port,
            table,
            sound_velocity,
            pixel_width,
            Side::Port,
            &mut values,
            &mut alongtrack,
            &mut bin_count,
        );
        self.bin_trace(
            stbd,
            table,
            sound_velocity,
            pixel_width,
            Side::Starboard,
            &mut values,
            &mut alongtrack,
            &mut bin_count,
        );

        // reduce bins to means, null the empties
        for j in 0..pixel_count {
            if bin_count[j] > 0 {
                values[j] /= bin_count[j] as f64;
                alongtrack[j] /= bin_count[j] as f64;
            } else {
                values[j] = SIDESCAN_NULL;
            }
        }

        self.interpolate_gaps(&mut values, &mut alongtrack, &bin_count);

        OutputSwath {
            values,
            acrosstrack,
            alongtrack,
            swath_width,
        }
    }

    /// Accumulate one trace into the bins, walking the angle table outward
    /// from the minimum-range entry on this trace's side of nadir.
    #[allow(clippy::too_many_arguments)]
    fn bin_trace(
        &self,
        trace: &SidescanTrace,
        table: &AngleTable,
        sound_velocity: f64,
        pixel_width: f64,
        side: Side,
        values: &mut [f64],
        alongtrack: &mut [f64],
        bin_count: &mut [usize],
    ) {
        let pixel_count = self.params.pixel_count;
        let nangle = table.len();
        let kstart = table.min_range_index();
        let range_min = table.entries[kstart].range;

        let sample_to_range = NS_TO_ONE_WAY_M * sound_velocity * trace.sample_interval;
        let istart = (range_min / sample_to_range) as usize;
        let weight = trace.weight();

        for i in istart..trace.samples.len() {
            let value = trace.samples.amplitude(i);
            let rr = NS_TO_ONE_WAY_M * sound_velocity * (i as f64 * trace.sample_interval);

            // walk outward until a bracketing pair of table entries
            // straddles this sample's range; ranges need not be monotonic
            let mut found_position = None;
            let mut done = false;
            let mut kangle = kstart;
            while !done {
                let knext = match side {
                    Side::Port => {
                        if kangle == 0 {
                            break;
                        }
                        kangle - 1
                    }
                    Side::Starboard => {
                        if kangle + 1 >= nangle {
                            break;
                        }
                        kangle + 1
                    }
                };

                let r0 = table.entries[kangle].range;
                let r1 = table.entries[knext].range;
                if rr <= table.entries[kstart].range {
                    found_position = Some((
                        table.entries[kstart].acrosstrack,
                        table.entries[kstart].alongtrack,
                    ));
                    done = true;
                } else if (rr > r0 && rr <= r1) || (rr < r0 && rr >= r1) {
                    let factor = (rr - r0) / (r1 - r0);
                    let xtrack = table.entries[kangle].acrosstrack
                        + factor * (table.entries[knext].acrosstrack - table.entries[kangle].acrosstrack);
                    let ltrack = table.entries[kangle].alongtrack
                        + factor * (table.entries[knext].alongtrack - table.entries[kangle].alongtrack);
                    found_position = Some((xtrack, ltrack));
                    done = true;
                }
                kangle = knext;
            }

            // energy normalization happens per sample, before accumulation
            if let Some((xtrack, ltrack)) = found_position {
                let j = (pixel_count / 2) as isize + (xtrack / pixel_width) as isize;
                if j >= 0 && (j as usize) < pixel_count {
                    let j = j as usize;
                    values[j] += value / weight;
                    bin_count[j] += 1;
                    alongtrack[j] += ltrack;
                }
            }
        }
    }

    /// Bridge short runs of empty bins by linear interpolation of both the
    /// value and the along-track offset.
    fn interpolate_gaps(&self, values: &mut [f64], alongtrack: &mut [f64], bin_count: &[usize]) {
        let pixel_count = self.params.pixel_count;
        let mut previous = pixel_count as isize;
        for j in 0..pixel_count {
            if bin_count[j] > 0 {
                let interpable = j as isize - previous - 1;
                if interpable > 0 && interpable <= self.params.interp_bins as isize {
                    let prev = previous as usize;
                    let dss = values[j] - values[prev];
                    let dssl = alongtrack[j] - alongtrack[prev];
                    for jj in prev + 1..j {
                        let fraction = (jj - prev) as f64 / (j - prev) as f64;
                        values[jj] = values[prev] + fraction * dss;
                        alongtrack[jj] = alongtrack[prev] + fraction * dssl;
                    }
                }
                previous = j as isize;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Port,
    Starboard,
}

/// First trace sample exceeding `threshold` times the channel maximum,
/// the bottom arrival pick used for altitude detection.
pub fn first_arrival_pick(trace: &SidescanTrace, threshold: f64) -> usize {
    let mut channel_max = 0.0_f64;
    for i in 0..trace.samples.len() {
        channel_max = channel_max.max(trace.samples.amplitude(i));
    }
    let pick_threshold = threshold * channel_max;
    for i in 0..trace.samples.len() {
        if trace.samples.amplitude(i) >= pick_threshold {
            return i;
        }
    }
    0
}

/// Altitude implied by the bottom arrival picks of both traces: the picks
/// are averaged and converted through half the two-way travel time.
pub fn arrival_altitude(
    port: &SidescanTrace,
    stbd: &SidescanTrace,
    threshold: f64,
    sound_velocity: f64,
) -> f64 {
    let port_pick = first_arrival_pick(port, threshold);
    let stbd_pick = first_arrival_pick(stbd, threshold);
    let ttime = 1e-9 * 0.5 * ((port_pick + stbd_pick) as f64 * port.sample_interval);
    0.5 * sound_velocity * ttime
}
