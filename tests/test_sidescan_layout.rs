use swathline::core::binner::BinnerParams;
use swathline::{
    Beam, BeamFlag, BottomMode, BottomPick, LayoutConfig, MemoryPingStore, Ping, Record,
    SidescanTrace, TopoGrid, TraceSamples, SIDESCAN_NULL,
};

fn trace(samples: Vec<f64>, interval_ns: f64) -> SidescanTrace {
    SidescanTrace {
        samples: TraceSamples::Magnitude(samples),
        sample_interval: interval_ns,
        weighting_factor: 0,
    }
}

fn sidescan_ping(time_d: f64, altitude: f64) -> Ping {
    // 2000 samples of 10 µs at 1500 m/s is 15 km of two-way range
    let n = 2000;
    Ping {
        time_d,
        navlon: 0.0,
        navlat: 0.0,
        speed: 3.0,
        heading: 0.0,
        sensordepth: 5.0,
        roll: 0.0,
        pitch: 0.0,
        heave: 0.0,
        altitude,
        beams: vec![Beam {
            flag: BeamFlag::Good,
            depth: altitude + 5.0,
            acrosstrack: 0.0,
            alongtrack: 0.0,
        }],
        ss_port: Some(trace(vec![100.0; n], 10_000.0)),
        ss_stbd: Some(trace(vec![200.0; n], 10_000.0)),
        ss: Vec::new(),
        ss_acrosstrack: Vec::new(),
        ss_alongtrack: Vec::new(),
    }
}

#[test]
fn test_flat_bottom_layout_end_to_end() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut source = MemoryPingStore::new(vec![
        Record::Survey(sidescan_ping(100.0, 50.0)),
        Record::Comment("line start".to_string()),
        Record::Survey(sidescan_ping(101.0, 50.0)),
    ]);
    let mut sink = MemoryPingStore::default();

    let config = LayoutConfig {
        binner: BinnerParams {
            pixel_count: 801,
            interp_bins: 2,
            swath_width: None,
        },
        ..Default::default()
    };

    let counts = swathline::run_layout(&mut source, &mut sink, &config, None).unwrap();
    assert_eq!(counts.written, 2);
    assert_eq!(counts.survey, 2);
    assert_eq!(counts.comment, 1);

    let out = &sink.written[0];
    assert_eq!(out.ss.len(), 801);
    assert_eq!(out.ss_acrosstrack.len(), 801);

    // bin centers are symmetric about nadir
    let center = 801 / 2;
    assert!(out.ss_acrosstrack[center].abs() < 1e-9);
    assert!((out.ss_acrosstrack[0] + out.ss_acrosstrack[800]).abs() < 1e-9);

    // port energy lands to port, starboard to starboard
    let port_populated: Vec<f64> = out.ss[..center]
        .iter()
        .copied()
        .filter(|v| *v != SIDESCAN_NULL)
        .collect();
    let stbd_populated: Vec<f64> = out.ss[center + 1..]
        .iter()
        .copied()
        .filter(|v| *v != SIDESCAN_NULL)
        .collect();
    assert!(!port_populated.is_empty());
    assert!(!stbd_populated.is_empty());
    for v in &port_populated {
        assert!((v - 100.0).abs() < 1e-9);
    }
    for v in &stbd_populated {
        assert!((v - 200.0).abs() < 1e-9);
    }
}

#[test]
fn test_grid_bottom_layout_matches_flat_on_constant_grid() {
    // a constant-elevation grid must reproduce the flat-bottom layout
    let altitude = 50.0;
    let sensordepth = 5.0;
    let grid = TopoGrid::constant(
        401,
        401,
        0.0005,
        0.0005,
        -0.10025,
        -0.10025,
        -(altitude + sensordepth) as f32,
    );

    let run = |config: LayoutConfig, grid: Option<&TopoGrid>| {
        let mut source =
            MemoryPingStore::new(vec![Record::Survey(sidescan_ping(100.0, altitude))]);
        let mut sink = MemoryPingStore::default();
        swathline::run_layout(&mut source, &mut sink, &config, grid).unwrap();
        sink.written.remove(0)
    };

    let flat = run(LayoutConfig::default(), None);
    let gridded = run(
        LayoutConfig {
            bottom: BottomMode::Grid,
            pick: BottomPick::Grid,
            ..Default::default()
        },
        Some(&grid),
    );

    assert!((gridded.altitude - altitude).abs() < 1e-6);
    assert_eq!(flat.ss.len(), gridded.ss.len());

    let mut compared = 0;
    for (f, g) in flat.ss.iter().zip(gridded.ss.iter()) {
        if *f != SIDESCAN_NULL && *g != SIDESCAN_NULL {
            assert!((f - g).abs() < 1e-6);
            compared += 1;
        }
    }
    assert!(compared > 0, "no overlapping populated bins");
}

#[test]
fn test_arrival_pick_altitude() {
    // the first strong return is at sample 100: 10 µs samples at 1500 m/s
    // put the picked altitude at 0.5 * 1500 * 0.5e-9 * (2 * 100 * 10000)
    let n = 2000;
    let mut port_samples = vec![1.0; n];
    let mut stbd_samples = vec![1.0; n];
    for i in 100..n {
        port_samples[i] = 80.0;
        stbd_samples[i] = 80.0;
    }

    let mut ping = sidescan_ping(100.0, 999.0);
    ping.ss_port = Some(trace(port_samples, 10_000.0));
    ping.ss_stbd = Some(trace(stbd_samples, 10_000.0));

    let mut source = MemoryPingStore::new(vec![Record::Survey(ping)]);
    let mut sink = MemoryPingStore::default();
    let config = LayoutConfig {
        pick: BottomPick::Arrival { threshold: 0.4 },
        ..Default::default()
    };
    swathline::run_layout(&mut source, &mut sink, &config, None).unwrap();

    let expected = 0.5 * 1500.0 * 0.5e-9 * (200.0 * 10_000.0);
    assert!((sink.written[0].altitude - expected).abs() < 1e-9);
}

#[test]
fn test_survey_without_traces_is_skipped() {
    let mut bare = sidescan_ping(100.0, 50.0);
    bare.ss_port = None;

    let mut source = MemoryPingStore::new(vec![
        Record::Survey(bare),
        Record::Survey(sidescan_ping(101.0, 50.0)),
    ]);
    let mut sink = MemoryPingStore::default();
    let counts =
        swathline::run_layout(&mut source, &mut sink, &LayoutConfig::default(), None).unwrap();

    assert_eq!(counts.written, 1);
    assert_eq!(counts.skipped, 1);
    assert_eq!(sink.written.len(), 1);
}

#[test]
fn test_grid_mode_without_grid_fails() {
    let mut source = MemoryPingStore::new(vec![Record::Survey(sidescan_ping(100.0, 50.0))]);
    let mut sink = MemoryPingStore::default();
    let config = LayoutConfig {
        bottom: BottomMode::Grid,
        ..Default::default()
    };
    assert!(swathline::run_layout(&mut source, &mut sink, &config, None).is_err());
}

/// Writes a small north-up GeoTIFF through GDAL and reads it back,
/// verifying the storage convention survives the round trip.
#[test]
fn test_grid_from_file_round_trip() {
    use gdal::DriverManager;

    let (nx, ny) = (4usize, 3usize);
    let (dx, dy) = (0.01, 0.01);
    let (xmin, ymin) = (-122.0, 36.0);

    let temp_dir = tempfile::TempDir::new().expect("failed to create temp directory");
    let grid_path = temp_dir.path().join("topo_test.tif");

    {
        let driver = DriverManager::get_driver_by_name("GTiff").expect("no GTiff driver");
        let mut dataset = driver
            .create_with_band_type::<f32, _>(&grid_path, nx as isize, ny as isize, 1)
            .expect("failed to create dataset");
        // north-up: top row first, negative pixel height
        dataset
            .set_geo_transform(&[xmin, dx, 0.0, ymin + dy * ny as f64, 0.0, -dy])
            .expect("failed to set geotransform");

        let mut flat = vec![0.0f32; nx * ny];
        for row in 0..ny {
            let j = ny - 1 - row;
            for i in 0..nx {
                flat[row * nx + i] = -(10.0 * i as f32 + j as f32);
            }
        }
        let buffer = gdal::raster::Buffer::new((nx, ny), flat);
        let mut band = dataset.rasterband(1).expect("no band");
        band.write((0, 0), (nx, ny), &buffer).expect("write failed");
        band.set_no_data_value(Some(-32768.0)).expect("nodata failed");
    }

    let grid = TopoGrid::from_file(&grid_path).expect("failed to read grid");
    grid.validate().expect("grid failed validation");

    assert_eq!((grid.nx, grid.ny), (nx, ny));
    assert!((grid.dx - dx).abs() < 1e-12);
    assert!((grid.dy - dy).abs() < 1e-12);
    assert!((grid.xmin - xmin).abs() < 1e-9);
    assert!((grid.ymin - ymin).abs() < 1e-9);

    // cell (i, j) carries -(10 i + j), j counted up from the south edge
    for i in 0..nx {
        for j in 0..ny {
            let expected = -(10.0 * i as f32 + j as f32);
            assert!(
                (grid.data[[i, j]] - expected).abs() < 1e-6,
                "cell ({}, {}): {} vs {}",
                i,
                j,
                grid.data[[i, j]],
                expected
            );
        }
    }
}
