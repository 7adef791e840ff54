/*!
# DIBS: Downsampler (C6)

Distance-indexed thinning to a target point count, per spec §4.2.2. The
default target for LOD `medium` is [`DEFAULT_TARGET_MEDIUM`]; other LODs
are reserved (see [`crate::pipeline::StreamLod`]).
*/

/// # Default Downsample Target (LOD `medium`).
pub const DEFAULT_TARGET_MEDIUM: usize = 1024;

/// # Downsample Indices.
///
/// Walk `distance_m` and return the sorted, deduplicated indices to keep
/// so that retained samples cross successive multiples of
/// `distance_m[last] / (target - 1)`. The first and last index are always
/// retained. If `distance_m.len() <= target`, every index is retained.
#[must_use]
pub fn downsample_indices(distance_m: &[f64], target: usize) -> Vec<usize> {
	let n = distance_m.len();
	if n == 0 { return Vec::new(); }
	if n <= target || target <= 1 { return (0..n).collect(); }

	let total = distance_m[n - 1];
	let step = total / (target as f64 - 1.0);

	let mut retained = Vec::with_capacity(target);
	retained.push(0);

	if step <= 0.0 {
		// Degenerate case: every sample sits at the same cumulative
		// distance (e.g. stationary recording). Fall back to an even
		// index stride so the result still respects the target bound.
		let stride = ((n as f64) / (target as f64)).ceil().max(1.0) as usize;
		let mut i = stride;
		while i < n - 1 && retained.len() < target - 1 {
			retained.push(i);
			i += stride;
		}
	}
	else {
		let mut next_mark = step;
		let mut cursor = 1;
		while cursor < n - 1 && retained.len() < target - 1 {
			if distance_m[cursor] >= next_mark {
				retained.push(cursor);
				next_mark += step;
			}
			cursor += 1;
		}
	}

	if *retained.last().expect("retained always has at least one element.") != n - 1 {
		retained.push(n - 1);
	}

	retained
}

/// # Slice By Indices.
///
/// Apply a retained-index set to one channel, keeping all channels
/// aligned when called with the same `indices` slice.
#[must_use]
pub fn slice_by_indices(values: &[f64], indices: &[usize]) -> Vec<f64> {
	indices.iter().map(|&i| values[i]).collect()
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_passthrough_when_short() {
		let d: Vec<f64> = (0..10).map(|i| i as f64).collect();
		let idx = downsample_indices(&d, 1024);
		assert_eq!(idx, (0..10).collect::<Vec<_>>());
	}

	#[test]
	fn t_downsample_bound_and_endpoints() {
		let d: Vec<f64> = (0..10_000).map(|i| i as f64).collect();
		let idx = downsample_indices(&d, 1024);
		assert!(idx.len() <= 1024, "retained {} exceeds target", idx.len());
		assert_eq!(*idx.first().unwrap(), 0);
		assert_eq!(*idx.last().unwrap(), 9_999);
		assert!(idx.windows(2).all(|w| w[1] > w[0]), "indices must be strictly increasing");
	}

	#[test]
	fn t_s6_downsample_scenario() {
		let d: Vec<f64> = (0..10_000).map(|i| i as f64).collect();
		let idx = downsample_indices(&d, 1024);
		assert!(idx.len() >= 1000 && idx.len() <= 1024, "got {}", idx.len());
		assert!(idx.contains(&0));
		assert!(idx.contains(&9_999));
	}

	#[test]
	fn t_monotonicity_preserved_after_slice() {
		let distance_m: Vec<f64> = (0..5_000).map(|i| i as f64 * 2.0).collect();
		let time_s: Vec<f64> = (0..5_000).map(|i| i as f64).collect();
		let idx = downsample_indices(&distance_m, 500);

		let d2 = slice_by_indices(&distance_m, &idx);
		let t2 = slice_by_indices(&time_s, &idx);

		assert!(d2.windows(2).all(|w| w[1] >= w[0]));
		assert!(t2.windows(2).all(|w| w[1] >= w[0]));
	}

	#[test]
	fn t_degenerate_stationary() {
		let d = vec![0.0_f64; 3000];
		let idx = downsample_indices(&d, 1024);
		assert!(idx.len() <= 1024);
		assert_eq!(*idx.first().unwrap(), 0);
		assert_eq!(*idx.last().unwrap(), 2_999);
	}
}
