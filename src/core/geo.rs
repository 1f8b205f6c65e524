//! Angle-frame and coordinate-scale primitives shared by the layout
//! and correction engines.

/// Degrees to radians
pub const DTR: f64 = std::f64::consts::PI / 180.0;
/// Radians to degrees
pub const RTD: f64 = 180.0 / std::f64::consts::PI;

/// Convert a beam direction from the roll/pitch frame to takeoff-angle
/// coordinates.
///
/// `alpha` is the fore-aft (pitch) rotation and `beta` the athwartships
/// angle measured up from starboard horizontal, both in degrees; beta = 90°
/// points straight down. Returns `(theta, phi)` in degrees where theta is
/// the polar angle from vertical and phi the azimuth from starboard.
pub fn rollpitch_to_takeoff(alpha: f64, beta: f64) -> (f64, f64) {
    let alphar = DTR * alpha;
    let betar = DTR * beta;

    let theta = RTD * (alphar.cos() * betar.sin()).clamp(-1.0, 1.0).acos();

    // azimuth undefined at vertical
    let phi = if (DTR * theta).sin().abs() < 1e-5 {
        0.0
    } else {
        RTD * alphar.sin().atan2(alphar.cos() * betar.cos())
    };

    (theta, phi)
}

/// Meters-to-degrees scale factors at a latitude.
///
/// Cosine-series expansion of the WGS-84 meridian and parallel arc lengths;
/// returns `(mtodeglon, mtodeglat)`.
pub fn coor_scale(latitude: f64) -> (f64, f64) {
    let radlat = DTR * latitude;
    let mtodeglon =
        1.0 / (111412.84 * radlat.cos() - 93.5 * (3.0 * radlat).cos() + 0.118 * (5.0 * radlat).cos())
            .abs();
    let mtodeglat = 1.0
        / (111132.92 - 559.82 * (2.0 * radlat).cos() + 1.175 * (4.0 * radlat).cos()
            - 0.0023 * (6.0 * radlat).cos())
        .abs();
    (mtodeglon, mtodeglat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_takeoff_nadir() {
        let (theta, phi) = rollpitch_to_takeoff(0.0, 90.0);
        assert!(theta.abs() < 1e-9);
        assert!(phi.abs() < 1e-9);
    }

    #[test]
    fn test_takeoff_sides() {
        // beta = 90 - angle: starboard angles map to phi = 0, port to phi = 180
        let (theta, phi) = rollpitch_to_takeoff(0.0, 60.0);
        assert_relative_eq!(theta, 30.0, epsilon = 1e-9);
        assert!(phi.abs() < 1e-9);

        let (theta, phi) = rollpitch_to_takeoff(0.0, 120.0);
        assert_relative_eq!(theta, 30.0, epsilon = 1e-9);
        assert_relative_eq!(phi, 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_takeoff_unit_vector_consistency() {
        // (theta, phi) must reproduce the roll/pitch frame unit vector
        let (alpha, beta) = (5.0, 60.0);
        let (theta, phi) = rollpitch_to_takeoff(alpha, beta);
        let vx = (DTR * theta).sin() * (DTR * phi).cos();
        let vy = (DTR * theta).sin() * (DTR * phi).sin();
        let vz = (DTR * theta).cos();
        assert!((vx - (DTR * alpha).cos() * (DTR * beta).cos()).abs() < 1e-12);
        assert!((vy - (DTR * alpha).sin()).abs() < 1e-12);
        assert!((vz - (DTR * alpha).cos() * (DTR * beta).sin()).abs() < 1e-12);
    }

    #[test]
    fn test_coor_scale_equator() {
        let (mtodeglon, mtodeglat) = coor_scale(0.0);
        // a degree of longitude at the equator is about 111.32 km
        assert!((1.0 / mtodeglon - 111_319.0).abs() < 100.0);
        assert!((1.0 / mtodeglat - 110_574.0).abs() < 100.0);
    }
}
