/*!
# DIBS: Sample Builder (C5)

Turns ordered raw GPS samples into the four parallel `float64` streams
described in spec §3: `time_s`, `distance_m`, `speed_mps`, and (once
enriched) `elevation_m`. Every function here is a pure transformation over
slices — no controller object accumulates state across calls, per the
"mutable controller classes holding recording state" re-architecture note.
*/

/// # Earth Radius (Meters).
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// # Speed Derivative Window.
///
/// Up to this many trailing samples (including the current one) feed the
/// sliding-window speed estimate.
const SPEED_WINDOW: usize = 5;

/// # Minimum Span for a Speed Estimate (Seconds).
const SPEED_MIN_SPAN_S: f64 = 2.0;

/// # Minimum Travel for a Speed Estimate (Meters).
const SPEED_MIN_TRAVEL_M: f64 = 1.0;

/// # Stationary Clamp Threshold (Meters / Second).
const SPEED_STATIONARY_MPS: f64 = 0.2;



#[derive(Debug, Clone, Copy, PartialEq)]
/// # Raw GPS Sample.
pub struct GpsSample {
	/// # Latitude (Degrees).
	pub lat: f64,

	/// # Longitude (Degrees).
	pub lon: f64,

	/// # Timestamp (Milliseconds, Epoch).
	pub timestamp_ms: i64,

	/// # Reported Accuracy (Meters), If Known.
	pub accuracy: Option<f64>,

	/// # Reported Altitude (Meters), If Known.
	///
	/// Distinct from the enriched `elevation_m` stream, which may instead
	/// come from a [`crate::ingest::RouteEnricher`].
	pub altitude: Option<f64>,

	/// # Device-Reported Instantaneous Speed (Meters / Second), If Known.
	pub speed: Option<f64>,
}



/// # Haversine Distance (Meters).
///
/// Great-circle distance between two lat/lon points in degrees.
#[must_use]
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
	let (lat1, lon1, lat2, lon2) = (
		lat1.to_radians(),
		lon1.to_radians(),
		lat2.to_radians(),
		lon2.to_radians(),
	);

	let dlat = lat2 - lat1;
	let dlon = lon2 - lon1;

	let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
	let c = 2.0 * a.sqrt().asin();

	EARTH_RADIUS_M * c
}

/// # Build Base Streams.
///
/// Derive `(time_s, distance_m, speed_mps)` from ordered raw samples, per
/// spec §4.2.1. `samples` must have at least one element; the pipeline
/// (§4.2.4) is responsible for rejecting fewer than two before this is
/// called.
#[must_use]
pub fn build_base_streams(samples: &[GpsSample]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
	let n = samples.len();
	let mut time_s = vec![0.0_f64; n];
	let mut distance_m = vec![0.0_f64; n];

	if n == 0 { return (time_s, distance_m, Vec::new()); }

	let t0 = samples[0].timestamp_ms;
	for (i, s) in samples.iter().enumerate() {
		time_s[i] = (s.timestamp_ms - t0) as f64 / 1000.0;
	}

	for i in 1..n {
		let step = haversine(samples[i - 1].lat, samples[i - 1].lon, samples[i].lat, samples[i].lon);
		distance_m[i] = distance_m[i - 1] + step;
	}

	let speed_mps = build_speed_stream(&time_s, &distance_m);

	(time_s, distance_m, speed_mps)
}

/// # Build Speed Stream.
///
/// Sliding-window derivative over already-built `time_s`/`distance_m`.
fn build_speed_stream(time_s: &[f64], distance_m: &[f64]) -> Vec<f64> {
	let n = time_s.len();
	let mut out = vec![0.0_f64; n];

	for i in 0..n {
		if i < 2 { continue; }

		let window_start = i.saturating_sub(SPEED_WINDOW - 1);
		let span = time_s[i] - time_s[window_start];
		let travel = distance_m[i] - distance_m[window_start];

		let mut v = if span >= SPEED_MIN_SPAN_S && travel >= SPEED_MIN_TRAVEL_M {
			travel / span
		}
		else { 0.0 };

		if v < SPEED_STATIONARY_MPS { v = 0.0; }

		out[i] = v;
	}

	out
}

/// # Interpolate Elevation.
///
/// Fill `None` gaps in a raw elevation stream by linear interpolation
/// between the nearest valid neighbours; leading/trailing gaps take the
/// nearest single valid value. Returns `None` if every entry is `None`
/// (no enrichment data at all — the caller should omit the channel).
#[must_use]
pub fn interpolate_elevation(raw: &[Option<f64>]) -> Option<Vec<f64>> {
	if raw.iter().all(Option::is_none) { return None; }

	let n = raw.len();
	let mut out = vec![0.0_f64; n];
	let mut i = 0;

	while i < n {
		if let Some(v) = raw[i] {
			out[i] = v;
			i += 1;
			continue;
		}

		let prev = if i == 0 { None } else { Some(i - 1) };
		let mut j = i;
		while j < n && raw[j].is_none() { j += 1; }
		let next = if j < n { Some(j) } else { None };

		match (prev, next) {
			(Some(p), Some(nx)) => {
				let v0 = raw[p].expect("prev index is always valid.");
				let v1 = raw[nx].expect("next index is always valid.");
				let span = (nx - p) as f64;
				for k in i..j {
					let t = (k - p) as f64 / span;
					out[k] = v0 + (v1 - v0) * t;
				}
			},
			(None, Some(nx)) => {
				let v1 = raw[nx].expect("next index is always valid.");
				for slot in out.iter_mut().take(j).skip(i) { *slot = v1; }
			},
			(Some(p), None) => {
				let v0 = raw[p].expect("prev index is always valid.");
				for slot in out.iter_mut().take(j).skip(i) { *slot = v0; }
			},
			(None, None) => unreachable!("all-None case is handled above."),
		}

		i = j;
	}

	Some(out)
}



#[cfg(test)]
mod test {
	use super::*;

	fn sample(lat: f64, lon: f64, ts: i64) -> GpsSample {
		GpsSample { lat, lon, timestamp_ms: ts, accuracy: None, altitude: None, speed: None }
	}

	#[test]
	fn t_haversine_zero_distance() {
		assert!((haversine(40.0, -73.0, 40.0, -73.0)).abs() < 1e-9);
	}

	#[test]
	fn t_haversine_known_distance() {
		// Roughly one degree of latitude is ~111.19 km.
		let d = haversine(0.0, 0.0, 1.0, 0.0);
		assert!((d - 111_195.0).abs() < 500.0, "got {d}");
	}

	#[test]
	fn t_time_s_starts_at_zero_and_nondecreasing() {
		let samples = vec![sample(0.0, 0.0, 1_000), sample(0.0, 0.001, 3_000), sample(0.0, 0.002, 6_000)];
		let (time_s, _d, _s) = build_base_streams(&samples);
		assert_eq!(time_s[0], 0.0);
		assert!(time_s.windows(2).all(|w| w[1] >= w[0]));
	}

	#[test]
	fn t_distance_m_nondecreasing_and_starts_at_zero() {
		let samples = vec![sample(0.0, 0.0, 0), sample(0.001, 0.0, 1_000), sample(0.002, 0.0, 2_000)];
		let (_t, distance_m, _s) = build_base_streams(&samples);
		assert_eq!(distance_m[0], 0.0);
		assert!(distance_m.windows(2).all(|w| w[1] >= w[0]));
	}

	#[test]
	fn t_speed_zero_for_first_two() {
		let samples = vec![sample(0.0, 0.0, 0), sample(0.01, 0.0, 1_000), sample(0.02, 0.0, 2_000)];
		let (_t, _d, speed) = build_base_streams(&samples);
		assert_eq!(speed[0], 0.0);
		assert_eq!(speed[1], 0.0);
	}

	#[test]
	fn t_speed_clamped_when_stationary() {
		// Tiny jitter over a long time span should clamp to 0.
		let samples = vec![
			sample(0.0, 0.0, 0),
			sample(0.0, 0.0, 1_000),
			sample(0.000001, 0.0, 2_000),
			sample(0.0, 0.0, 3_000),
			sample(0.0, 0.0, 4_000),
		];
		let (_t, _d, speed) = build_base_streams(&samples);
		assert_eq!(*speed.last().unwrap(), 0.0);
	}

	#[test]
	fn t_elevation_interpolation_all_none() {
		assert_eq!(interpolate_elevation(&[None, None, None]), None);
	}

	#[test]
	fn t_elevation_interpolation_fills_gap() {
		let raw = vec![Some(100.0), None, None, Some(106.0)];
		let out = interpolate_elevation(&raw).unwrap();
		assert_eq!(out[0], 100.0);
		assert_eq!(out[3], 106.0);
		assert!((out[1] - 102.0).abs() < 1e-9);
		assert!((out[2] - 104.0).abs() < 1e-9);
	}

	#[test]
	fn t_elevation_interpolation_edges() {
		let raw = vec![None, Some(50.0), Some(60.0), None];
		let out = interpolate_elevation(&raw).unwrap();
		assert_eq!(out[0], 50.0);
		assert_eq!(out[3], 60.0);
	}
}
