/*!
# DIBS: Polyline Codec (§9 bonus utility)

Precision-6 Google polyline encoding, used to hand a route's shape to a
[`crate::ingest::RouteEnricher`] and to interpret the response. Unrelated
to the DIBS segment codec proper; it shares this crate only because both
are small, pure byte/char-level transforms.
*/

use crate::error::CodecError;

/// # Polyline Precision.
const PRECISION: f64 = 1_000_000.0;

/// # Encode Polyline.
///
/// `points` is `(lat, lon)` pairs in order.
#[must_use]
pub fn encode_polyline(points: &[(f64, f64)]) -> String {
	let mut out = String::with_capacity(points.len() * 4);
	let mut prev_lat = 0_i64;
	let mut prev_lon = 0_i64;

	for &(lat, lon) in points {
		let lat_e6 = (lat * PRECISION).round() as i64;
		let lon_e6 = (lon * PRECISION).round() as i64;

		encode_value(lat_e6 - prev_lat, &mut out);
		encode_value(lon_e6 - prev_lon, &mut out);

		prev_lat = lat_e6;
		prev_lon = lon_e6;
	}

	out
}

/// # Encode One Signed Value.
fn encode_value(value: i64, out: &mut String) {
	let mut v = value << 1;
	if value < 0 { v = !v; }

	while v >= 0x20 {
		let chunk = ((v & 0x1f) | 0x20) as u8 + 63;
		out.push(char::from(chunk));
		v >>= 5;
	}
	out.push(char::from(v as u8 + 63));
}

/// # Decode Polyline.
///
/// ## Errors
/// Returns [`CodecError::Truncated`] if the string ends mid-value or
/// contains a byte outside the expected ASCII range.
pub fn decode_polyline(s: &str) -> Result<Vec<(f64, f64)>, CodecError> {
	let bytes = s.as_bytes();
	let mut idx = 0_usize;
	let mut lat = 0_i64;
	let mut lon = 0_i64;
	let mut points = Vec::new();

	while idx < bytes.len() {
		lat += decode_value(bytes, &mut idx)?;
		lon += decode_value(bytes, &mut idx)?;
		points.push((lat as f64 / PRECISION, lon as f64 / PRECISION));
	}

	Ok(points)
}

/// # Decode One Signed Value.
fn decode_value(bytes: &[u8], idx: &mut usize) -> Result<i64, CodecError> {
	let mut result = 0_i64;
	let mut shift = 0_u32;

	loop {
		let b = *bytes.get(*idx).ok_or(CodecError::Truncated)?;
		*idx += 1;

		let byte = b.checked_sub(63).ok_or(CodecError::Truncated)?;
		result |= i64::from(byte & 0x1f) << shift;
		shift += 5;

		if byte & 0x20 == 0 { break; }
	}

	Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_roundtrip_law() {
		let points = vec![
			(38.5, -120.2),
			(40.7, -120.95),
			(43.252, -126.453),
			(0.0, 0.0),
			(-33.8688, 151.2093),
		];

		let encoded = encode_polyline(&points);
		let decoded = decode_polyline(&encoded).expect("decode failed");

		assert_eq!(decoded.len(), points.len());
		for ((a_lat, a_lon), (b_lat, b_lon)) in points.iter().zip(decoded.iter()) {
			assert!((a_lat - b_lat).abs() < 1e-6, "{a_lat} vs {b_lat}");
			assert!((a_lon - b_lon).abs() < 1e-6, "{a_lon} vs {b_lon}");
		}
	}

	#[test]
	fn t_empty() {
		assert_eq!(encode_polyline(&[]), "");
		assert_eq!(decode_polyline("").unwrap(), Vec::<(f64, f64)>::new());
	}

	#[test]
	fn t_single_point_nonempty() {
		let encoded = encode_polyline(&[(38.5, -120.2)]);
		assert!(!encoded.is_empty());
	}

	#[test]
	fn t_truncated_input_errors() {
		// Any byte but the last in a polyline value has its continuation
		// bit (0x20) set, so dropping the final byte always leaves the
		// reader expecting more input than is left.
		let encoded = encode_polyline(&[(38.5, -120.2)]);
		let truncated = &encoded[..encoded.len() - 1];
		assert!(decode_polyline(truncated).is_err());
	}
}
