/*!
# DIBS: Elevation Gain/Loss (§4.2.3)

A small statistic computed over a (possibly gappy) elevation stream,
independent of the interpolation done in [`crate::geo::interpolate_elevation`]
before compression. Specified because it is directly tested (scenario S3).
*/

/// # Default Segment Threshold (Meters).
pub const DEFAULT_SEGMENT_THRESHOLD_M: f64 = 5.0;



#[derive(Debug, Clone, Copy, PartialEq)]
/// # Elevation Change Summary.
pub struct ElevationChange {
	/// # Total Ascent (Meters).
	pub gain: f64,

	/// # Total Descent (Meters).
	pub loss: f64,

	/// # Maximum Valid Elevation (Meters).
	pub max: f64,

	/// # Minimum Valid Elevation (Meters).
	pub min: f64,
}

/// # Calculate Elevation Change.
///
/// Walk the valid (non-`None`) entries of `elevation`, accumulating
/// contiguous monotone-up/-down runs; a run's total only counts toward
/// `gain`/`loss` once it reaches `threshold`. Gaps (`None` entries) are
/// skipped rather than breaking a run.
#[must_use]
pub fn calculate_elevation_change(elevation: &[Option<f64>], threshold: f64) -> ElevationChange {
	let valid: Vec<f64> = elevation.iter().filter_map(|v| *v).collect();

	if valid.len() < 2 {
		let extrema = valid.first().copied().unwrap_or(0.0);
		return ElevationChange { gain: 0.0, loss: 0.0, max: extrema, min: extrema };
	}

	let max = valid.iter().copied().fold(f64::MIN, f64::max);
	let min = valid.iter().copied().fold(f64::MAX, f64::min);

	let mut gain = 0.0_f64;
	let mut loss = 0.0_f64;
	let mut run_total = 0.0_f64;
	let mut run_dir = 0_i8;
	let mut prev = valid[0];

	for &v in &valid[1..] {
		let delta = v - prev;
		prev = v;
		if delta == 0.0 { continue; }

		let dir: i8 = if delta > 0.0 { 1 } else { -1 };

		if run_dir == 0 || dir == run_dir {
			run_total += delta.abs();
			run_dir = dir;
		}
		else {
			close_run(run_dir, run_total, threshold, &mut gain, &mut loss);
			run_total = delta.abs();
			run_dir = dir;
		}
	}

	close_run(run_dir, run_total, threshold, &mut gain, &mut loss);

	ElevationChange { gain, loss, max, min }
}

/// # Close Run.
///
/// Fold a finished run's total into `gain` or `loss` if it cleared
/// `threshold`.
fn close_run(run_dir: i8, run_total: f64, threshold: f64, gain: &mut f64, loss: &mut f64) {
	if run_total < threshold { return; }
	if run_dir > 0 { *gain += run_total; }
	else if run_dir < 0 { *loss += run_total; }
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_empty_array() {
		let out = calculate_elevation_change(&[], DEFAULT_SEGMENT_THRESHOLD_M);
		assert_eq!(out, ElevationChange { gain: 0.0, loss: 0.0, max: 0.0, min: 0.0 });
	}

	#[test]
	fn t_single_valid_entry() {
		let out = calculate_elevation_change(&[None, Some(42.0), None], DEFAULT_SEGMENT_THRESHOLD_M);
		assert_eq!(out, ElevationChange { gain: 0.0, loss: 0.0, max: 42.0, min: 42.0 });
	}

	#[test]
	fn t_below_threshold_run_not_counted() {
		let raw: Vec<Option<f64>> = vec![Some(100.0), Some(101.0), Some(102.0)];
		let out = calculate_elevation_change(&raw, 5.0);
		assert_eq!(out.gain, 0.0);
		assert_eq!(out.loss, 0.0);
	}

	#[test]
	fn t_s3_monotonic_profile() {
		let mut profile = vec![100.5, 100.7, 101.2, 102.1, 103.5, 105.2, 106.8];
		while profile.len() < 50 {
			let last = *profile.last().unwrap();
			profile.push(last + 0.3);
		}
		let raw: Vec<Option<f64>> = profile.iter().copied().map(Some).collect();

		let out = calculate_elevation_change(&raw, 5.0);
		let expected_total = profile.last().unwrap() - profile.first().unwrap();

		assert!((out.gain - expected_total).abs() < 1e-9, "gain {} vs expected {expected_total}", out.gain);
		assert_eq!(out.loss, 0.0);
		assert_eq!(out.max, *profile.last().unwrap());
		assert_eq!(out.min, *profile.first().unwrap());
	}

	#[test]
	fn t_gap_does_not_break_run() {
		let raw: Vec<Option<f64>> = vec![Some(100.0), None, None, Some(108.0), Some(112.0)];
		let out = calculate_elevation_change(&raw, 5.0);
		assert!((out.gain - 12.0).abs() < 1e-9);
		assert_eq!(out.loss, 0.0);
	}

	#[test]
	fn t_up_then_down_splits_runs() {
		let raw: Vec<Option<f64>> = vec![Some(100.0), Some(108.0), Some(115.0), Some(106.0), Some(98.0)];
		let out = calculate_elevation_change(&raw, 5.0);
		assert!((out.gain - 15.0).abs() < 1e-9);
		assert!((out.loss - 17.0).abs() < 1e-9);
	}
}
