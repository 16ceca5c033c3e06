use crate::{
    prelude::*,
    tests::toolkit::{epochs, midnight, scratch_dir, sv, write_sp3},
};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

const RAMP_PER_DAY: f64 = 1.0E-9;
const NOISE: f64 = 10.0E-12;
const INTERVAL: f64 = 300.0;

fn standard_deviation(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/*
 * Two consecutive daily files, 26h long each (overlapping by 2 hours),
 * linear ramp + white phase noise
 */
#[test]
fn two_consecutive_days() {
    let dir = scratch_dir();
    let g01 = sv("G01");
    let origin = midnight(2024, 12, 15);

    let mut rng = StdRng::seed_from_u64(0x0123_4567);
    let normal = Normal::new(0.0, NOISE).unwrap();
    let noise = (0..2 * 313)
        .map(|_| normal.sample(&mut rng))
        .collect::<Vec<_>>();

    let offset = |t: Epoch, i: usize| {
        let days = (t - origin).to_seconds() / 86400.0;
        12.5E-6 + RAMP_PER_DAY * days + noise[i]
    };

    let day0 = epochs(origin, midnight(2024, 12, 16) + Duration::from_hours(2.0), INTERVAL);
    let day1 = epochs(
        midnight(2024, 12, 16),
        midnight(2024, 12, 17) + Duration::from_hours(2.0),
        INTERVAL,
    );
    assert_eq!(day0.len(), 313);
    assert_eq!(day1.len(), 313);

    let f0 = write_sp3(&dir, "Ref23450.sp3", g01, &day0, |t| {
        let i = day0.iter().position(|e| *e == t).unwrap();
        offset(t, i)
    });
    let f1 = write_sp3(&dir, "Ref23451.sp3", g01, &day1, |t| {
        let i = day1.iter().position(|e| *e == t).unwrap();
        offset(t, 313 + i)
    });

    // order of appearance does not matter
    let processor = Processor::new(Config::default()).unwrap();
    let request = Request::new(vec![f1.clone(), f0.clone()], vec![g01]);
    let report = processor.run(&request).unwrap();

    assert_eq!(report.files, vec![f0, f1]);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    let clock = report.get(&g01).unwrap();

    // second file only contributes epochs past the end of the first one
    assert_eq!(clock.len(), 313 + 288);
    assert!(clock.times.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(clock.times.first(), Some(&origin));
    assert_eq!(
        clock.times.last(),
        Some(&(midnight(2024, 12, 17) + Duration::from_hours(2.0)))
    );
    assert_eq!(clock.sampling_interval, Some(Duration::from_seconds(INTERVAL)));

    // all series share the time axis
    assert_eq!(clock.offsets.len(), clock.len());
    assert_eq!(clock.filtered.len(), clock.len());
    assert_eq!(clock.detrended.len(), clock.len());
    assert_eq!(clock.dedrifted.len(), clock.len());

    // ramp is captured by the trend
    let slope = clock.linear.as_ref().unwrap().slope();
    let expected = RAMP_PER_DAY / 86400.0;
    assert!((slope - expected).abs() / expected < 0.01, "slope={:e}", slope);

    let amplitude = RAMP_PER_DAY * (601.0 - 1.0) * INTERVAL / 86400.0;
    let std = standard_deviation(&clock.dedrifted);
    assert!(std < amplitude / 10.0, "std={:e}", std);
    assert!(std < 2.0 * NOISE);

    // typical white phase noise shape
    let adev = clock.allan(processor.config()).unwrap();
    assert!(!adev.is_empty());
    assert_eq!(adev.taus[0], INTERVAL);
    let daily = adev.one_day().unwrap();
    assert!(daily < adev.deviations[0]);

    let summary = clock.stability_summary(processor.config()).unwrap();
    assert_eq!(summary.samples, 601);
    assert_eq!(summary.adev_1d, Some(daily));
    assert!(summary.adev_1h.is_some());
    assert!((summary.frequency_offset.unwrap() - slope).abs() < 1.0E-20);

    // one hour look-back at 5' sampling
    let freq = clock.frequency().unwrap();
    assert_eq!(freq.lookback, 12);
    assert_eq!(freq.len(), 601 - 12);
    let mean = freq.values.iter().sum::<f64>() / freq.len() as f64;
    assert!((mean - expected).abs() / expected < 0.2, "mean={:e}", mean);

    // 601 samples: one 512 sample segment at input resolution
    let spectrum = clock.psd(processor.config()).unwrap();
    assert_eq!(spectrum.octaves.len(), 1);
    assert_eq!(spectrum.octaves[0].segments, 1);

    assert_eq!(
        clock.day_boundaries(),
        vec![midnight(2024, 12, 16), midnight(2024, 12, 17)]
    );

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn decade_grid_and_options() {
    let dir = scratch_dir();
    let g01 = sv("G01");
    let e05 = sv("E05");
    let origin = midnight(2024, 12, 15);

    let mut rng = StdRng::seed_from_u64(42);
    let normal = Normal::new(0.0, NOISE).unwrap();

    let day0 = epochs(origin, midnight(2024, 12, 16), 30.0);
    let noise = (0..day0.len())
        .map(|_| normal.sample(&mut rng))
        .collect::<Vec<_>>();

    let path = write_sp3(&dir, "Ref23450.sp3", g01, &day0, |t| {
        let i = day0.iter().position(|e| *e == t).unwrap();
        -3.0E-4 + noise[i]
    });

    let cfg = Config::default()
        .with_tau_grid(TauGrid::Decade)
        .with_overlapping(false)
        .with_drift_removal(false);
    let processor = Processor::new(cfg).unwrap();
    let request = Request::new(vec![path], vec![g01, e05]);
    let report = processor.run(&request).unwrap();

    assert_eq!(report.satellites.len(), 2);
    assert!(report.get(&e05).unwrap().is_empty());
    assert!(report.warnings.contains(&Warning::NoData(e05)));

    let clock = report.get(&g01).unwrap();
    assert_eq!(clock.len(), 2881);

    let adev = clock.allan(processor.config()).unwrap();
    assert!(!adev.overlapping);
    // taus are rounded down to multiples of 30s, sub sampling ones are dropped
    assert_eq!(&adev.taus[..5], &[30.0, 60.0, 90.0, 180.0, 300.0]);
    assert!(adev.one_hour().is_some());
    assert!(adev.one_day().is_none());
    assert!(adev.taus.windows(2).all(|w| w[0] < w[1]));

    let _ = std::fs::remove_dir_all(dir);
}
