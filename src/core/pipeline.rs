use crate::core::binner::{arrival_altitude, BinnerParams, SidescanBinner};
use crate::core::correct::{
    apply_lever_arm, correct_attitude, correct_vertical, CorrectionKind,
};
use crate::core::geo::coor_scale;
use crate::core::layout::{AngleTable, DEFAULT_ANGLE_MAX, DEFAULT_NUM_ANGLES};
use crate::core::resample::{AttitudeSeries, Cursor, NavSeries, TimeSeries, TimeShift};
use crate::io::grid::TopoGrid;
use crate::io::ping::{PingSink, PingSource, Record, RecordCounts};
use crate::types::{LeverArm, Ping, SonarError, SonarResult};

/// Default sound velocity in m/s when no profile is available
pub const DEFAULT_SOUND_VELOCITY: f64 = 1500.0;

/// Seafloor model used to lay out sidescan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BottomMode {
    /// Flat seafloor at the picked altitude
    Flat,
    /// Intersect beams with a 3-D topography grid
    Grid,
}

/// Where the per-ping altitude for sidescan layout comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BottomPick {
    /// Use the altitude carried by the ping
    Altitude,
    /// Pick the bottom arrival in the averaged sidescan traces
    Arrival { threshold: f64 },
    /// Derive altitude from the topography grid under the ping
    Grid,
}

/// Sidescan layout configuration, resolved once per run
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub bottom: BottomMode,
    pub pick: BottomPick,
    pub binner: BinnerParams,
    /// Number of nominal beam angles in the layout table
    pub nangle: usize,
    /// Half-fan angle in degrees; the table spans ±angle_max
    pub angle_max: f64,
    pub sound_velocity: f64,
    /// Exchange the port and starboard channels
    pub ss_flip: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            bottom: BottomMode::Flat,
            pick: BottomPick::Altitude,
            binner: BinnerParams::default(),
            nangle: DEFAULT_NUM_ANGLES,
            angle_max: DEFAULT_ANGLE_MAX,
            sound_velocity: DEFAULT_SOUND_VELOCITY,
            ss_flip: false,
        }
    }
}

/// Which streams a configured time shift applies to
#[derive(Debug, Clone, Copy)]
pub struct ShiftTargets {
    pub survey: bool,
    pub navigation: bool,
    pub sensordepth: bool,
    pub heading: bool,
    pub attitude: bool,
}

impl Default for ShiftTargets {
    fn default() -> Self {
        Self {
            survey: false,
            navigation: true,
            sensordepth: true,
            heading: true,
            attitude: true,
        }
    }
}

/// Preprocessing configuration, resolved once per run
#[derive(Debug, Clone, Default)]
pub struct PreprocessConfig {
    pub time_shift: TimeShift,
    pub shift_targets: ShiftTargets,
    /// Lever arm from the navigation reference to the sonar
    pub lever_arm: Option<LeverArm>,
    /// Correct navigation metadata but leave bathymetry untouched
    pub no_change_survey: bool,
}

/// Asynchronous sensor streams accumulated during the first pass.
///
/// Empty streams mean "no override"; the ping keeps its native value.
#[derive(Debug, Clone, Default)]
pub struct SensorStreams {
    pub nav: NavSeries,
    pub heading: TimeSeries,
    pub sensordepth: TimeSeries,
    pub attitude: AttitudeSeries,
}

impl SensorStreams {
    /// Apply the configured time shift to the targeted streams, once,
    /// before any resampling.
    pub fn apply_time_shift(&mut self, shift: &TimeShift, targets: &ShiftTargets) {
        if targets.navigation {
            self.nav.apply_time_shift(shift);
        }
        if targets.heading {
            self.heading.apply_time_shift(shift);
        }
        if targets.sensordepth {
            self.sensordepth.apply_time_shift(shift);
        }
        if targets.attitude {
            self.attitude.apply_time_shift(shift);
        }
    }
}

/// Per-stream interpolation cursors for one pass over one file set.
///
/// Never share these between independently-iterating consumers: the
/// cursors only advance.
#[derive(Debug, Clone, Copy, Default)]
struct StreamCursors {
    nav: Cursor,
    heading: Cursor,
    sensordepth: Cursor,
    attitude: Cursor,
}

/// First pass: scan the stream and accumulate the asynchronous sensor
/// series; ping data is not touched.
pub fn accumulate_streams<S: PingSource>(
    source: &mut S,
) -> SonarResult<(SensorStreams, RecordCounts)> {
    let mut streams = SensorStreams::default();
    let mut counts = RecordCounts::default();

    while let Some(record) = source.read_record()? {
        counts.tally(&record);
        let pushed = match &record {
            Record::Navigation {
                time_d,
                navlon,
                navlat,
                speed,
            } => streams.nav.push(*time_d, *navlon, *navlat, *speed),
            Record::Heading { time_d, heading } => streams.heading.push(*time_d, *heading),
            Record::SensorDepth {
                time_d,
                sensordepth,
            } => streams.sensordepth.push(*time_d, *sensordepth),
            Record::Attitude {
                time_d,
                roll,
                pitch,
                heave,
            } => streams.attitude.push(*time_d, *roll, *pitch, *heave),
            Record::Survey(_) | Record::Comment(_) => Ok(()),
        };
        // an out-of-order sensor sample degrades one record, not the batch
        if let Err(e) = pushed {
            log::warn!("skipping {} record: {}", record.kind_name(), e);
            counts.skipped += 1;
        }
    }

    log::info!(
        "sensor streams accumulated: {} nav, {} heading, {} sensordepth, {} attitude",
        streams.nav.len(),
        streams.heading.len(),
        streams.sensordepth.len(),
        streams.attitude.len()
    );
    counts.report("pass 1");
    Ok((streams, counts))
}

/// Second pass: merge the resampled streams onto each survey record,
/// correct the bathymetry accordingly, and write every ping out.
pub fn preprocess_pass<S: PingSource, W: PingSink>(
    source: &mut S,
    sink: &mut W,
    streams: &SensorStreams,
    config: &PreprocessConfig,
) -> SonarResult<RecordCounts> {
    let mut counts = RecordCounts::default();
    let mut cursors = StreamCursors::default();

    while let Some(record) = source.read_record()? {
        counts.tally(&record);
        let mut ping = match record {
            Record::Survey(ping) => ping,
            _ => continue,
        };

        log::debug!("correcting ping at {}", ping.timestamp());
        correct_ping(&mut ping, streams, config, &mut cursors);
        sink.write_ping(&ping)?;
        counts.written += 1;
    }

    counts.report("pass 2");
    Ok(counts)
}

/// Merge resampled ancillary values onto one ping and re-derive its
/// bathymetry through the correction state machine.
fn correct_ping(
    ping: &mut Ping,
    streams: &SensorStreams,
    config: &PreprocessConfig,
    cursors: &mut StreamCursors,
) {
    // original values the deltas are measured against
    let roll_org = ping.roll;
    let pitch_org = ping.pitch;
    let sensordepth_org = ping.sensordepth;
    let draft_org = ping.draft();

    if config.shift_targets.survey {
        let mut time = [ping.time_d];
        crate::core::resample::apply_time_shift(&mut time, &config.time_shift);
        ping.time_d = time[0];
    }
    let time_d = ping.time_d;

    // replace ancillary values from whatever streams are present
    if !streams.nav.is_empty() {
        let (navlon, navlat, speed) = streams.nav.interp(time_d, &mut cursors.nav);
        ping.navlon = navlon;
        ping.navlat = navlat;
        ping.speed = speed;
    }
    if !streams.heading.is_empty() {
        ping.heading = streams.heading.interp_heading(time_d, &mut cursors.heading);
    }
    let sensordepth_replaced = !streams.sensordepth.is_empty();
    if sensordepth_replaced {
        ping.sensordepth = streams
            .sensordepth
            .interp(time_d, &mut cursors.sensordepth);
    }
    let attitude_replaced = !streams.attitude.is_empty();
    if attitude_replaced {
        let (roll, pitch, heave) = streams.attitude.interp(time_d, &mut cursors.attitude);
        ping.roll = roll;
        ping.pitch = pitch;
        ping.heave = heave;
    }

    // lever arm translation before any bathymetry correction
    let mut lever_applied = false;
    if let Some(lever) = &config.lever_arm {
        let (mtodeglon, mtodeglat) = coor_scale(ping.navlat);
        let (navlon, navlat, sensordepth) = apply_lever_arm(
            ping.navlon,
            ping.navlat,
            ping.sensordepth,
            ping.heading,
            lever,
            mtodeglon,
            mtodeglat,
        );
        ping.navlon = navlon;
        ping.navlat = navlat;
        ping.sensordepth = sensordepth;
        lever_applied = lever.z != 0.0;
    }

    if config.no_change_survey {
        return;
    }

    let delta_roll = ping.roll - roll_org;
    let delta_pitch = ping.pitch - pitch_org;
    let attitude_changed = delta_roll != 0.0 || delta_pitch != 0.0;
    let vertical_changed =
        sensordepth_replaced || lever_applied || (attitude_replaced && ping.draft() != draft_org);

    match CorrectionKind::resolve(attitude_changed, vertical_changed) {
        CorrectionKind::None => {}
        CorrectionKind::VerticalOnly => {
            let draft_delta = ping.draft() - draft_org;
            correct_vertical(&mut ping.beams, draft_delta);
        }
        CorrectionKind::Rotate => {
            correct_attitude(
                &mut ping.beams,
                delta_roll,
                delta_pitch,
                sensordepth_org,
                ping.sensordepth,
            );
        }
    }
}

/// Two-pass preprocessing driver: pass 1 builds the sensor streams, the
/// time shift is applied once, pass 2 corrects and writes each ping.
///
/// `open` is called once per pass so file-backed sources can be reopened.
pub fn run_preprocess<S, W, F>(
    mut open: F,
    sink: &mut W,
    config: &PreprocessConfig,
) -> SonarResult<RecordCounts>
where
    S: PingSource,
    W: PingSink,
    F: FnMut() -> SonarResult<S>,
{
    log::info!("🌊 preprocessing pass 1: scanning ancillary sensor streams");
    let mut source = open()?;
    let (mut streams, pass1_counts) = accumulate_streams(&mut source)?;

    streams.apply_time_shift(&config.time_shift, &config.shift_targets);

    log::info!("🌊 preprocessing pass 2: correcting and writing survey records");
    let mut source = open()?;
    let pass2_counts = preprocess_pass(&mut source, sink, &streams, config)?;

    let mut total = pass1_counts;
    total.merge(&pass2_counts);
    log::info!("✅ preprocessing complete: {} pings written", pass2_counts.written);
    Ok(total)
}

/// Lay out one ping's raw sidescan onto the seafloor model.
///
/// Picks the altitude per the configured mode, builds the bottom layout
/// table, bins both traces and stores the result in the ping's output
/// sidescan arrays.
pub fn layout_ping(
    ping: &mut Ping,
    config: &LayoutConfig,
    grid: Option<&TopoGrid>,
) -> SonarResult<()> {
    let (port, stbd) = match (&ping.ss_port, &ping.ss_stbd) {
        (Some(p), Some(s)) => {
            if config.ss_flip {
                (s.clone(), p.clone())
            } else {
                (p.clone(), s.clone())
            }
        }
        _ => {
            return Err(SonarError::InvalidFormat(
                "survey record carries no sidescan trace pair".to_string(),
            ))
        }
    };

    let ss_altitude = match config.pick {
        BottomPick::Altitude => ping.altitude,
        BottomPick::Arrival { threshold } => {
            arrival_altitude(&port, &stbd, threshold, config.sound_velocity)
        }
        BottomPick::Grid => {
            let grid = grid.ok_or_else(|| {
                SonarError::Processing("grid bottom pick requires a topography grid".to_string())
            })?;
            match grid.topo_at(ping.navlon, ping.navlat) {
                Some(topo) => -ping.sensordepth - topo,
                None => {
                    log::warn!(
                        "ping at {:.6}/{:.6} outside topography grid, keeping native altitude",
                        ping.navlon,
                        ping.navlat
                    );
                    ping.altitude
                }
            }
        }
    };

    let table = match config.bottom {
        BottomMode::Flat => AngleTable::flat_bottom(
            -config.angle_max,
            config.angle_max,
            config.nangle,
            ss_altitude,
            0.0,
        ),
        BottomMode::Grid => {
            let grid = grid.ok_or_else(|| {
                SonarError::Processing("3-D bottom layout requires a topography grid".to_string())
            })?;
            AngleTable::grid_bottom(
                -config.angle_max,
                config.angle_max,
                config.nangle,
                ping.navlon,
                ping.navlat,
                ping.heading,
                ss_altitude,
                ping.sensordepth,
                ping.pitch,
                grid,
            )
        }
    };

    let binner = SidescanBinner::with_params(config.binner.clone());
    let swath = binner.bin_ping(&port, &stbd, &table, ss_altitude, config.sound_velocity);

    ping.altitude = ss_altitude;
    ping.ss = swath.values;
    ping.ss_acrosstrack = swath.acrosstrack;
    ping.ss_alongtrack = swath.alongtrack;
    Ok(())
}

/// Sidescan layout driver: lays out and writes every survey record in the
/// stream. Records without a usable trace pair are logged and skipped;
/// only stream I/O errors abort the batch.
pub fn run_layout<S: PingSource, W: PingSink>(
    source: &mut S,
    sink: &mut W,
    config: &LayoutConfig,
    grid: Option<&TopoGrid>,
) -> SonarResult<RecordCounts> {
    if config.bottom == BottomMode::Grid {
        if let Some(grid) = grid {
            grid.validate()?;
        } else {
            return Err(SonarError::Processing(
                "3-D bottom layout requires a topography grid".to_string(),
            ));
        }
    }

    log::info!("🌊 sidescan layout: {:?} bottom, {} output bins", config.bottom, config.binner.pixel_count);

    let mut counts = RecordCounts::default();
    while let Some(record) = source.read_record()? {
        counts.tally(&record);
        let mut ping = match record {
            Record::Survey(ping) => ping,
            _ => continue,
        };

        match layout_ping(&mut ping, config, grid) {
            Ok(()) => {
                sink.write_ping(&ping)?;
                counts.written += 1;
            }
            Err(SonarError::InvalidFormat(msg)) => {
                log::warn!("skipping survey record at {:.3}: {}", ping.time_d, msg);
                counts.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    counts.report("sidescan layout");
    Ok(counts)
}
