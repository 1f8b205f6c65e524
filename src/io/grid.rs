use crate::types::{SonarError, SonarResult};
use gdal::Dataset;
use ndarray::Array2;
use std::path::Path;

/// Bathymetric topography grid used by the 3-D bottom layout mode.
///
/// Elevations are meters relative to the sea surface, negative down.
/// The raster is stored with shape `(nx, ny)` so that the flat offset of
/// cell `(i, j)` is `i * ny + j`, column-by-column from the west edge with
/// `j` increasing northward from `ymin`.
#[derive(Debug, Clone)]
pub struct TopoGrid {
    pub nx: usize,
    pub ny: usize,
    /// Cell size in degrees longitude
    pub dx: f64,
    /// Cell size in degrees latitude
    pub dy: f64,
    /// West edge (degrees)
    pub xmin: f64,
    /// South edge (degrees)
    pub ymin: f64,
    pub nodata: f32,
    pub data: Array2<f32>,
}

impl TopoGrid {
    /// Build a grid from already-loaded cells; `data` must have shape `(nx, ny)`.
    pub fn new(
        dx: f64,
        dy: f64,
        xmin: f64,
        ymin: f64,
        nodata: f32,
        data: Array2<f32>,
    ) -> Self {
        let (nx, ny) = data.dim();
        Self {
            nx,
            ny,
            dx,
            dy,
            xmin,
            ymin,
            nodata,
            data,
        }
    }

    /// Load a topography grid raster (GMT grd, netCDF, GeoTIFF) via GDAL.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SonarResult<Self> {
        log::info!("Loading topography grid: {}", path.as_ref().display());

        let dataset = Dataset::open(path.as_ref())?;
        let geo_transform = dataset.geo_transform()?;
        let (width, height) = dataset.raster_size();

        let rasterband = dataset.rasterband(1)?;
        let nodata = rasterband.no_data_value().unwrap_or(-32768.0) as f32;
        let band = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

        let dx = geo_transform[1];
        let pixel_height = geo_transform[5];
        let dy = pixel_height.abs();
        let xmin = geo_transform[0];
        // north-up rasters store the top row first
        let ymin = if pixel_height < 0.0 {
            geo_transform[3] + pixel_height * height as f64
        } else {
            geo_transform[3]
        };

        let mut data = Array2::from_elem((width, height), nodata);
        for i in 0..width {
            for j in 0..height {
                let row = if pixel_height < 0.0 { height - 1 - j } else { j };
                data[[i, j]] = band.data[row * width + i];
            }
        }

        log::debug!(
            "Grid loaded: {}x{} cells, x [{:.6}, {:.6}], y [{:.6}, {:.6}]",
            width,
            height,
            xmin,
            xmin + dx * width as f64,
            ymin,
            ymin + dy * height as f64
        );

        Ok(Self::new(dx, dy, xmin, ymin, nodata, data))
    }

    /// Build a constant-elevation grid, mostly useful for synthetic tests.
    pub fn constant(
        nx: usize,
        ny: usize,
        dx: f64,
        dy: f64,
        xmin: f64,
        ymin: f64,
        elevation: f32,
    ) -> Self {
        Self::new(dx, dy, xmin, ymin, -32768.0, Array2::from_elem((nx, ny), elevation))
    }

    /// Topography at a point as the average of the up-to-4 surrounding valid
    /// cells; `None` when the point falls outside the grid or every
    /// neighboring cell is no-data.
    pub fn topo_at(&self, lon: f64, lat: f64) -> Option<f64> {
        let i = ((lon - self.xmin) / self.dx).floor() as i64;
        let j = ((lat - self.ymin) / self.dy).floor() as i64;
        if i < 0 || i >= self.nx as i64 - 1 || j < 0 || j >= self.ny as i64 - 1 {
            return None;
        }
        let (i, j) = (i as usize, j as usize);

        let mut nfound = 0;
        let mut topo = 0.0;
        for ii in i..=i + 1 {
            for jj in j..=j + 1 {
                let v = self.data[[ii, jj]];
                if v != self.nodata {
                    nfound += 1;
                    topo += v as f64;
                }
            }
        }
        if nfound > 0 {
            Some(topo / nfound as f64)
        } else {
            None
        }
    }

    /// True when the point lies within the cell lattice usable by `topo_at`
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let i = ((lon - self.xmin) / self.dx).floor() as i64;
        let j = ((lat - self.ymin) / self.dy).floor() as i64;
        i >= 0 && i < self.nx as i64 - 1 && j >= 0 && j < self.ny as i64 - 1
    }

    pub fn validate(&self) -> SonarResult<()> {
        if self.nx < 2 || self.ny < 2 {
            return Err(SonarError::InvalidFormat(format!(
                "topography grid too small: {}x{}",
                self.nx, self.ny
            )));
        }
        if self.dx <= 0.0 || self.dy <= 0.0 {
            return Err(SonarError::InvalidFormat(
                "topography grid cell size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
