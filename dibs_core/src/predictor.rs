/*!
# DIBS: Predictor Kernels (C2)

Delta-1 and Delta-2 forward transforms and their inverses, operating on
quantized `i64` arrays (quantized values are `i32`-range by contract, but
the forward differences of a Δ² seed pair can briefly overflow `i32`
headroom, so the kernels themselves stay in `i64`; callers are responsible
for verifying the final residuals fit their declared `bit_width`).
*/



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Predictor.
///
/// Which forward/inverse transform a block used. The on-wire encoding is
/// `1` for [`Predictor::Delta1`] and `2` for [`Predictor::Delta2`], per the
/// block header layout.
pub(crate) enum Predictor {
	/// # First-order delta.
	Delta1,

	/// # Second-order delta.
	Delta2,
}

impl Predictor {
	/// # Seed Count.
	///
	/// How many leading quantized values are stored verbatim (as seeds)
	/// rather than as residuals.
	pub(crate) const fn seed_count(self) -> usize {
		match self {
			Self::Delta1 => 1,
			Self::Delta2 => 2,
		}
	}

	/// # Wire Tag.
	pub(crate) const fn tag(self) -> u32 {
		match self {
			Self::Delta1 => 1,
			Self::Delta2 => 2,
		}
	}

	/// # From Wire Tag.
	pub(crate) const fn from_tag(tag: u32) -> Option<Self> {
		match tag {
			1 => Some(Self::Delta1),
			2 => Some(Self::Delta2),
			_ => None,
		}
	}
}



/// # Delta-1 Forward.
///
/// `q` must have at least one element. Returns `(seed, residuals)` where
/// `residuals[i] = q[i+1] - q[i]`.
pub(crate) fn delta1_forward(q: &[i64]) -> (i64, Vec<i64>) {
	let seed = q[0];
	let residuals = q.windows(2).map(|w| w[1] - w[0]).collect();
	(seed, residuals)
}

/// # Delta-1 Inverse.
///
/// Reconstruct the quantized array from a seed and its residuals.
pub(crate) fn delta1_inverse(seed: i64, residuals: &[i64]) -> Vec<i64> {
	let mut out = Vec::with_capacity(residuals.len() + 1);
	out.push(seed);
	for &r in residuals {
		let prev = *out.last().expect("delta1_inverse: output unexpectedly empty.");
		out.push(prev + r);
	}
	out
}

/// # Delta-2 Forward.
///
/// `q` must have at least two elements. Returns `(seed0, seed1, residuals)`
/// where `residuals[i] = q[i+2] - (2*q[i+1] - q[i])`.
pub(crate) fn delta2_forward(q: &[i64]) -> (i64, i64, Vec<i64>) {
	let seed0 = q[0];
	let seed1 = q[1];
	let residuals = q.windows(3)
		.map(|w| w[2] - (2 * w[1] - w[0]))
		.collect();
	(seed0, seed1, residuals)
}

/// # Delta-2 Inverse.
pub(crate) fn delta2_inverse(seed0: i64, seed1: i64, residuals: &[i64]) -> Vec<i64> {
	let mut out = Vec::with_capacity(residuals.len() + 2);
	out.push(seed0);
	out.push(seed1);
	for &r in residuals {
		let len = out.len();
		let predicted = 2 * out[len - 1] - out[len - 2];
		out.push(predicted + r);
	}
	out
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_delta1_roundtrip() {
		let q: Vec<i64> = vec![10, 12, 11, 50, 50, 50, -100, -95];
		let (seed, res) = delta1_forward(&q);
		let back = delta1_inverse(seed, &res);
		assert_eq!(back, q);
	}

	#[test]
	fn t_delta1_single() {
		let q: Vec<i64> = vec![7];
		let (seed, res) = delta1_forward(&q);
		assert!(res.is_empty());
		assert_eq!(delta1_inverse(seed, &res), q);
	}

	#[test]
	fn t_delta2_roundtrip() {
		let q: Vec<i64> = (0..20).map(|i| i * 10).collect();
		let (s0, s1, res) = delta2_forward(&q);
		let back = delta2_inverse(s0, s1, &res);
		assert_eq!(back, q);
	}

	#[test]
	fn t_delta2_constant_has_zero_residuals() {
		let q: Vec<i64> = vec![42; 10];
		let (_s0, _s1, res) = delta2_forward(&q);
		assert!(res.iter().all(|&r| r == 0));
	}

	#[test]
	fn t_delta2_linear_ramp_has_zero_residuals() {
		let q: Vec<i64> = (0..50).map(|i| i * 7).collect();
		let (_s0, _s1, res) = delta2_forward(&q);
		assert!(res.iter().all(|&r| r == 0), "Linear ramps should collapse to zero under Delta-2.");
	}

	#[test]
	fn t_predictor_tags() {
		assert_eq!(Predictor::Delta1.tag(), 1);
		assert_eq!(Predictor::Delta2.tag(), 2);
		assert_eq!(Predictor::from_tag(1), Some(Predictor::Delta1));
		assert_eq!(Predictor::from_tag(2), Some(Predictor::Delta2));
		assert_eq!(Predictor::from_tag(3), None);
	}
}
