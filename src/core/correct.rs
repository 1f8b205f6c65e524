use crate::core::geo::DTR;
use crate::types::{Beam, LeverArm};

/// Below this range a beam is treated as pointing straight at the platform
/// and gets the conventional spherical angles
const RANGE_EPSILON: f64 = 0.001;

/// How a ping's bathymetry must be corrected after its ancillary values
/// were replaced by resampled streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionKind {
    /// Nothing replaced that affects the soundings
    None,
    /// Only the vertical reference moved: shift depths by the draft change
    VerticalOnly,
    /// Attitude changed: full roll/pitch rotation (subsumes the vertical
    /// offset correction)
    Rotate,
}

impl CorrectionKind {
    /// Resolve the per-ping correction decision. Rotation wins whenever the
    /// attitude deltas are nonzero; a pure sensordepth change takes the
    /// cheaper vertical path.
    pub fn resolve(attitude_changed: bool, sensordepth_changed: bool) -> CorrectionKind {
        if attitude_changed {
            CorrectionKind::Rotate
        } else if sensordepth_changed {
            CorrectionKind::VerticalOnly
        } else {
            CorrectionKind::None
        }
    }
}

/// Rotate one sounding by roll and pitch deltas in the roll-pitch frame.
///
/// The sounding is converted to spherical coordinates (range, alpha, beta),
/// the deltas are added, and the position is rebuilt. `depth` here is
/// relative to the sensor (vertical offsets already stripped).
pub fn rotate_beam(
    acrosstrack: f64,
    alongtrack: f64,
    depth: f64,
    delta_roll: f64,
    delta_pitch: f64,
) -> (f64, f64, f64) {
    let range = (depth * depth + acrosstrack * acrosstrack + alongtrack * alongtrack).sqrt();

    let (mut alpha, mut beta) = if range.abs() < RANGE_EPSILON {
        (0.0, 0.5 * std::f64::consts::PI)
    } else {
        let alpha = (alongtrack / range).clamp(-1.0, 1.0).asin();
        let beta = (acrosstrack / range / alpha.cos()).clamp(-1.0, 1.0).acos();
        (alpha, beta)
    };
    if depth < 0.0 {
        beta = 2.0 * std::f64::consts::PI - beta;
    }

    beta += DTR * delta_roll;
    alpha += DTR * delta_pitch;

    (
        range * alpha.cos() * beta.cos(),
        range * alpha.sin(),
        range * alpha.cos() * beta.sin(),
    )
}

/// Re-derive bathymetry after attitude replacement: strip the old vertical
/// offset (heave + draft), rotate every valid beam by the attitude deltas,
/// then restore the new vertical offset.
///
/// Array length and beam flags never change; null beams are skipped.
pub fn correct_attitude(
    beams: &mut [Beam],
    delta_roll: f64,
    delta_pitch: f64,
    old_vertical_offset: f64,
    new_vertical_offset: f64,
) {
    for beam in beams.iter_mut() {
        if beam.flag.is_null() {
            continue;
        }
        let depth = beam.depth - old_vertical_offset;
        let (acrosstrack, alongtrack, depth) = rotate_beam(
            beam.acrosstrack,
            beam.alongtrack,
            depth,
            delta_roll,
            delta_pitch,
        );
        beam.acrosstrack = acrosstrack;
        beam.alongtrack = alongtrack;
        beam.depth = depth + new_vertical_offset;
    }
}

/// Shift every valid beam's depth by a draft change; used when the vertical
/// reference moved but attitude did not.
pub fn correct_vertical(beams: &mut [Beam], delta_draft: f64) {
    for beam in beams.iter_mut() {
        if beam.flag.is_null() {
            continue;
        }
        beam.depth += delta_draft;
    }
}

/// Translate the navigation position and sensor depth by a fixed
/// vehicle-frame lever arm rotated into geographic frame by the heading.
///
/// Returns the corrected (navlon, navlat, sensordepth).
#[allow(clippy::too_many_arguments)]
pub fn apply_lever_arm(
    navlon: f64,
    navlat: f64,
    sensordepth: f64,
    heading: f64,
    lever: &LeverArm,
    mtodeglon: f64,
    mtodeglat: f64,
) -> (f64, f64, f64) {
    let headingr = DTR * heading;
    // vehicle frame: x starboard, y forward; geographic: east, north
    let east = lever.x * headingr.cos() + lever.y * headingr.sin();
    let north = -lever.x * headingr.sin() + lever.y * headingr.cos();

    (
        navlon + mtodeglon * east,
        navlat + mtodeglat * north,
        sensordepth - lever.z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BeamFlag;

    fn beam(acrosstrack: f64, alongtrack: f64, depth: f64) -> Beam {
        Beam {
            flag: BeamFlag::Good,
            depth,
            acrosstrack,
            alongtrack,
        }
    }

    #[test]
    fn test_rotation_identity() {
        let mut beams = vec![
            beam(-120.0, 5.0, 80.0),
            beam(0.0, 0.0, 100.0),
            beam(33.0, -2.0, 95.0),
        ];
        let original = beams.clone();
        correct_attitude(&mut beams, 0.0, 0.0, 12.0, 12.0);
        for (b, o) in beams.iter().zip(original.iter()) {
            assert!((b.depth - o.depth).abs() < 1e-9);
            assert!((b.acrosstrack - o.acrosstrack).abs() < 1e-9);
            assert!((b.alongtrack - o.alongtrack).abs() < 1e-9);
        }
    }

    #[test]
    fn test_vertical_only_shift() {
        let mut beams = vec![beam(-30.0, 1.0, 100.0)];
        correct_vertical(&mut beams, 2.0);
        assert!((beams[0].depth - 102.0).abs() < 1e-12);
        assert!((beams[0].acrosstrack + 30.0).abs() < 1e-12);
        assert!((beams[0].alongtrack - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_null_beams_untouched() {
        let mut beams = vec![Beam::null(), beam(10.0, 0.0, 50.0)];
        correct_attitude(&mut beams, 3.0, -1.0, 0.0, 0.0);
        assert!(beams[0].depth.abs() < 1e-12);
        assert!(beams[0].acrosstrack.abs() < 1e-12);
        correct_vertical(&mut beams, 5.0);
        assert!(beams[0].depth.abs() < 1e-12);
    }

    #[test]
    fn test_pitch_rotation_three_beam_ping() {
        // +5 degree pitch delta on a 3-beam ping at 50 m depth: the
        // acrosstrack positions stay mirrored while all beams swing the
        // same distance forward; literal values from the spherical formulas
        let mut beams = vec![beam(-10.0, 0.0, 50.0), beam(0.0, 0.0, 50.0), beam(10.0, 0.0, 50.0)];
        correct_attitude(&mut beams, 0.0, 5.0, 0.0, 0.0);

        assert!((beams[0].acrosstrack - (-9.961946980917459)).abs() < 1e-6);
        assert!((beams[0].alongtrack - 4.444088329919818).abs() < 1e-6);
        assert!((beams[0].depth - 49.80973490458728).abs() < 1e-6);

        assert!(beams[1].acrosstrack.abs() < 1e-6);
        assert!((beams[1].alongtrack - 4.357787137382909).abs() < 1e-6);
        assert!((beams[1].depth - 49.80973490458728).abs() < 1e-6);

        assert!((beams[2].acrosstrack - 9.961946980917453).abs() < 1e-6);
        assert!((beams[2].alongtrack - 4.444088329919818).abs() < 1e-6);
        assert!((beams[2].depth - 49.80973490458728).abs() < 1e-6);

        // mirror symmetry across nadir is preserved
        assert!((beams[0].acrosstrack + beams[2].acrosstrack).abs() < 1e-6);
    }

    #[test]
    fn test_roll_rotation_moves_swath_sideways() {
        // a positive roll delta rotates the swath toward port-up: the nadir
        // beam gains starboard acrosstrack
        let mut beams = vec![beam(0.0, 0.0, 50.0)];
        correct_attitude(&mut beams, 5.0, 0.0, 0.0, 0.0);
        assert!((beams[0].acrosstrack - (-50.0 * (DTR * 5.0).sin())).abs() < 1e-9);
        assert!((beams[0].depth - 50.0 * (DTR * 5.0).cos()).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_zero_range() {
        let (x, l, d) = rotate_beam(0.0, 0.0, 0.0, 10.0, 10.0);
        assert!(x.is_finite() && l.is_finite() && d.is_finite());
        assert!(x.abs() < 1e-6 && l.abs() < 1e-6 && d.abs() < 1e-6);
    }

    #[test]
    fn test_vertical_offset_exchange() {
        // old offset stripped, new offset restored
        let mut beams = vec![beam(0.0, 0.0, 112.0)];
        correct_attitude(&mut beams, 0.0, 0.0, 12.0, 15.0);
        assert!((beams[0].depth - 115.0).abs() < 1e-9);
    }

    #[test]
    fn test_lever_arm_translation() {
        let lever = LeverArm {
            x: 2.0,
            y: 10.0,
            z: 1.5,
        };
        // heading 90: forward is east, starboard is south
        let (lon, lat, sd) = apply_lever_arm(0.0, 0.0, 5.0, 90.0, &lever, 1e-5, 1e-5);
        assert!((lon - 10.0e-5).abs() < 1e-12);
        assert!((lat - (-2.0e-5)).abs() < 1e-12);
        assert!((sd - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_correction_kind_resolution() {
        assert_eq!(CorrectionKind::resolve(false, false), CorrectionKind::None);
        assert_eq!(
            CorrectionKind::resolve(false, true),
            CorrectionKind::VerticalOnly
        );
        assert_eq!(CorrectionKind::resolve(true, false), CorrectionKind::Rotate);
        assert_eq!(CorrectionKind::resolve(true, true), CorrectionKind::Rotate);
    }
}
