use crate::core::geo::{coor_scale, rollpitch_to_takeoff, DTR};
use crate::io::grid::TopoGrid;

/// Default beam fan: 171 nominal angles spanning ±85°
pub const DEFAULT_NUM_ANGLES: usize = 171;
pub const DEFAULT_ANGLE_MAX: f64 = 85.0;

/// Grid intersection convergence tolerance in meters
const TOPO_TOLERANCE: f64 = 0.1;
/// Hard cap on grid intersection iterations
const MAX_ITERATIONS: usize = 25;

/// One angular sample of the bottom layout: where a beam at the nominal
/// take-off angle meets the seafloor model.
#[derive(Debug, Clone, Copy)]
pub struct AngleTableEntry {
    /// Nominal take-off angle in degrees, negative to port
    pub angle: f64,
    /// Across-track offset in meters
    pub acrosstrack: f64,
    /// Along-track offset in meters
    pub alongtrack: f64,
    /// Vertical drop to the modeled seafloor in meters
    pub altitude: f64,
    /// Slant range in meters
    pub range: f64,
    /// False when the grid intersection search left the grid or hit the
    /// iteration cap; the entry then holds the last attempted estimate
    pub converged: bool,
}

/// Beam take-off angle to seafloor position lookup table.
///
/// Entries are ordered by nominal angle; ranges are monotonic away from
/// nadir for a flat bottom but may not be for a 3-D grid, which consumers
/// must tolerate.
#[derive(Debug, Clone)]
pub struct AngleTable {
    pub entries: Vec<AngleTableEntry>,
}

impl AngleTable {
    /// Lay a fan of beams onto a flat seafloor at the given altitude.
    pub fn flat_bottom(
        angle_min: f64,
        angle_max: f64,
        nangle: usize,
        altitude: f64,
        pitch: f64,
    ) -> AngleTable {
        let dangle = (angle_max - angle_min) / (nangle - 1) as f64;
        let alpha = pitch;
        let zz = altitude;

        let mut entries = Vec::with_capacity(nangle);
        for i in 0..nangle {
            let angle = angle_min + dangle * i as f64;
            let beta = 90.0 - angle;
            let (theta, phi) = rollpitch_to_takeoff(alpha, beta);

            // range required to reach the bottom at this takeoff angle
            let rr = zz / (DTR * theta).cos();
            let xx = rr * (DTR * theta).sin();
            entries.push(AngleTableEntry {
                angle,
                acrosstrack: xx * (DTR * phi).cos(),
                alongtrack: xx * (DTR * phi).sin(),
                altitude: zz,
                range: rr,
                converged: true,
            });
        }

        AngleTable { entries }
    }

    /// Lay a fan of beams onto gridded topography by intersecting each
    /// beam's line of sight with the grid surface.
    ///
    /// Entries whose search walks off the grid are retained with their last
    /// range estimate and marked unconverged rather than failing the table.
    pub fn grid_bottom(
        angle_min: f64,
        angle_max: f64,
        nangle: usize,
        navlon: f64,
        navlat: f64,
        heading: f64,
        altitude: f64,
        sensordepth: f64,
        pitch: f64,
        grid: &TopoGrid,
    ) -> AngleTable {
        let (mtodeglon, mtodeglat) = coor_scale(navlat);
        let dangle = (angle_max - angle_min) / (nangle - 1) as f64;
        let alpha = pitch;

        let mut entries = Vec::with_capacity(nangle);
        for i in 0..nangle {
            let angle = angle_min + dangle * i as f64;
            let beta = 90.0 - angle;
            let (theta, phi) = rollpitch_to_takeoff(alpha, beta);

            // unit line-of-sight vector relative to the vehicle
            let vz = (DTR * theta).cos();
            let vx = (DTR * theta).sin() * (DTR * phi).cos();
            let vy = (DTR * theta).sin() * (DTR * phi).sin();

            // rotate by vehicle heading into geographic east/north
            let vx_geo = vx * (DTR * heading).cos() + vy * (DTR * heading).sin();
            let vy_geo = -vx * (DTR * heading).sin() + vy * (DTR * heading).cos();

            let (rr, converged) = intersect_grid(
                navlon, navlat, altitude, sensordepth, mtodeglon, mtodeglat, vx_geo, vy_geo, vz,
                grid,
            );

            let zz = rr * (DTR * theta).cos();
            let xx = rr * (DTR * theta).sin();
            entries.push(AngleTableEntry {
                angle,
                acrosstrack: xx * (DTR * phi).cos(),
                alongtrack: xx * (DTR * phi).sin(),
                altitude: zz,
                range: rr,
                converged,
            });
        }

        AngleTable { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry closest to nadir in range, the starting point for
    /// the binner's outward bracket walk.
    pub fn min_range_index(&self) -> usize {
        let mut kstart = 0;
        let mut rangemin = self.entries[0].range;
        for (k, entry) in self.entries.iter().enumerate().skip(1) {
            if entry.range < rangemin {
                rangemin = entry.range;
                kstart = k;
            }
        }
        kstart
    }
}

/// Find the range along a unit vector at which the line of sight meets the
/// grid surface.
///
/// Damped false-position search: the step is the topography misfit divided
/// by the vertical component of the unit vector, clamped to half the
/// remaining bracket on overshoot. Returns the range estimate and whether
/// the search converged within tolerance and bounds.
#[allow(clippy::too_many_arguments)]
pub fn intersect_grid(
    navlon: f64,
    navlat: f64,
    altitude: f64,
    sensordepth: f64,
    mtodeglon: f64,
    mtodeglat: f64,
    vx: f64,
    vy: f64,
    vz: f64,
    grid: &TopoGrid,
) -> (f64, bool) {
    let mut done = false;
    let mut converged = true;
    let mut iteration = 0;
    let mut dr = altitude / 20.0;
    let mut r = altitude / vz - dr;
    let mut rmin = 0.0_f64;
    let mut rmax = 4.0 * altitude / vz;

    while !done && iteration < MAX_ITERATIONS {
        r += dr;

        // project the range estimate along the vector
        let lontest = navlon + mtodeglon * vx * r;
        let lattest = navlat + mtodeglat * vy * r;
        let topotest = -sensordepth - vz * r;

        if !grid.contains(lontest, lattest) {
            done = true;
            converged = false;
        } else if let Some(topo) = grid.topo_at(lontest, lattest) {
            let dtopo = topotest - topo;
            if dtopo.abs() < TOPO_TOLERANCE {
                done = true;
            } else {
                // bracket the crossing point
                if dtopo < 0.0 {
                    rmax = rmax.min(r);
                } else {
                    rmin = rmin.min(r);
                }

                // step toward the crossing, staying inside the bracket
                dr = dtopo / vz;
                if r + dr >= rmax {
                    dr = 0.5 * (rmax - r);
                }
                if r + dr <= rmin {
                    dr = 0.5 * (rmin - r);
                }
            }
        }
        // all four cells empty: keep trying at the next step

        iteration += 1;
    }

    if iteration >= MAX_ITERATIONS && !done {
        converged = false;
    }

    (r, converged)
}
