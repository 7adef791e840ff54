/*!
# DIBS: Segment Codec (C4)

The public entry point: `compress`/`decompress` a single float64 channel
into/from the 32-byte-header-plus-blocks wire format described in spec
§4.1.2–§4.1.3. Everything below this module (`block`, `predictor`, `bits`)
is implementation detail; callers only ever see [`CodecOptions`],
[`compress`], and [`decompress`].
*/

use crate::{
	block::{decode_block, encode_block},
	error::CodecError,
};

/// # Segment Magic.
const MAGIC: [u8; 4] = *b"DIBS";

/// # Segment Version.
const VERSION: u32 = 1;

/// # `from_fixed_point` Flag Bit.
///
/// The only flag bit defined in v1. Always written as `1`; a hypothetical
/// v2 carrying float segments directly would clear it, so decode does not
/// assert its value, only preserves it in spirit by never branching on it.
const FLAG_FROM_FIXED_POINT: u32 = 1;

/// # Segment Header Size (Bytes).
const HEADER_LEN: usize = 32;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Codec Options.
///
/// Construct with [`CodecOptions::new`] to get range validation, or use
/// [`CodecOptions::default`] for `(decimal_places=2, block_log2=8,
/// enable_crc=true)`.
pub struct CodecOptions {
	decimal_places: u8,
	block_log2: u8,
	enable_crc: bool,
}

impl Default for CodecOptions {
	fn default() -> Self {
		Self { decimal_places: 2, block_log2: 8, enable_crc: true }
	}
}

impl CodecOptions {
	/// # New.
	///
	/// ## Errors
	/// Returns [`CodecError::InvalidOptions`] if `decimal_places` is not in
	/// `0..=6` or `block_log2` is not in `2..=16`.
	pub fn new(decimal_places: u8, block_log2: u8, enable_crc: bool) -> Result<Self, CodecError> {
		if decimal_places > 6 || !(2..=16).contains(&block_log2) {
			return Err(CodecError::InvalidOptions);
		}

		Ok(Self { decimal_places, block_log2, enable_crc })
	}

	#[must_use]
	/// # Decimal Places.
	pub const fn decimal_places(&self) -> u8 { self.decimal_places }

	#[must_use]
	/// # Block Log2.
	pub const fn block_log2(&self) -> u8 { self.block_log2 }

	#[must_use]
	/// # CRC Enabled?
	pub const fn enable_crc(&self) -> bool { self.enable_crc }

	/// # Scale Denominator.
	fn scale_den(&self) -> i64 { 10_i64.pow(u32::from(self.decimal_places)) }
}



/// # Quantize.
///
/// `round(x * scale_den)` as a signed 32-bit int, or
/// `Err(CodecError::Overflow)` carrying `(idx, x)` if it doesn't fit.
fn quantize(idx: usize, x: f64, scale_den: i64) -> Result<i32, CodecError> {
	let scaled = (x * scale_den as f64).round();
	if scaled < f64::from(i32::MIN) || scaled > f64::from(i32::MAX) {
		return Err(CodecError::Overflow(idx, x));
	}
	Ok(scaled as i32)
}

/// # Compress.
///
/// Quantize `data` at `opts.decimal_places`, partition it into
/// `1 << opts.block_log2`-sample blocks, and wrap the result in a 32-byte
/// segment header.
///
/// ## Errors
/// Returns [`CodecError::EmptyInput`] if `data` is empty, or
/// [`CodecError::Overflow`] if any quantized sample escapes `i32` range, or
/// if a Δ¹/Δ² residual derived from otherwise in-range samples does (every
/// viable predictor for the block would overflow).
pub fn compress(data: &[f64], opts: &CodecOptions) -> Result<Vec<u8>, CodecError> {
	if data.is_empty() { return Err(CodecError::EmptyInput); }

	let scale_den = opts.scale_den();
	let q: Vec<i64> = data.iter()
		.enumerate()
		.map(|(i, &x)| quantize(i, x, scale_den).map(i64::from))
		.collect::<Result<_, _>>()?;

	let block_size = 1_usize << opts.block_log2;
	let mut body = Vec::with_capacity(data.len() * 2);
	for (block_idx, chunk) in q.chunks(block_size).enumerate() {
		let offset = block_idx * block_size;
		let bytes = encode_block(chunk)
			.map_err(|local_idx| CodecError::Overflow(offset + local_idx, data[offset + local_idx]))?;
		body.extend_from_slice(&bytes);
	}

	let crc = if opts.enable_crc { crc32c::crc32c(&body) } else { 0 };

	let mut out = Vec::with_capacity(HEADER_LEN + body.len());
	out.extend_from_slice(&MAGIC);
	out.extend_from_slice(&VERSION.to_le_bytes());
	out.extend_from_slice(&FLAG_FROM_FIXED_POINT.to_le_bytes());
	out.extend_from_slice(&u32::from(opts.block_log2).to_le_bytes());
	out.extend_from_slice(&(data.len() as u32).to_le_bytes());
	out.extend_from_slice(&1_i32.to_le_bytes());
	out.extend_from_slice(&(scale_den as i32).to_le_bytes());
	out.extend_from_slice(&crc.to_le_bytes());
	out.extend_from_slice(&body);

	Ok(out)
}

/// # Decompress.
///
/// Inverse of [`compress`].
///
/// ## Errors
/// Returns [`CodecError::Truncated`] if `buf` is shorter than its declared
/// geometry, [`CodecError::BadMagic`] if the magic bytes don't read
/// `"DIBS"`, [`CodecError::UnsupportedVersion`] if the version isn't `1`,
/// or [`CodecError::CRCMismatch`] if a non-zero stored CRC doesn't match
/// the recomputed one.
pub fn decompress(buf: &[u8]) -> Result<Vec<f64>, CodecError> {
	if buf.len() < HEADER_LEN { return Err(CodecError::Truncated); }

	let magic: [u8; 4] = buf[0..4].try_into().map_err(|_| CodecError::Bug("segment header"))?;
	if magic != MAGIC { return Err(CodecError::BadMagic); }

	let version = u32::from_le_bytes(buf[4..8].try_into().map_err(|_| CodecError::Bug("segment header"))?);
	if version != VERSION { return Err(CodecError::UnsupportedVersion(version)); }

	// Flags (buf[8..12]) are read-and-ignored: v1 never branches on them.
	let block_log2 = u32::from_le_bytes(buf[12..16].try_into().map_err(|_| CodecError::Bug("segment header"))?);
	if block_log2 >= 32 { return Err(CodecError::Truncated); }

	let n_samples = u32::from_le_bytes(buf[16..20].try_into().map_err(|_| CodecError::Bug("segment header"))?) as usize;
	let scale_den = i32::from_le_bytes(buf[24..28].try_into().map_err(|_| CodecError::Bug("segment header"))?);
	let stored_crc = u32::from_le_bytes(buf[28..32].try_into().map_err(|_| CodecError::Bug("segment header"))?);

	let body = &buf[HEADER_LEN..];

	if stored_crc != 0 {
		let computed = crc32c::crc32c(body);
		if computed != stored_crc { return Err(CodecError::CRCMismatch); }
	}

	if n_samples == 0 { return Ok(Vec::new()); }

	let mut q = Vec::with_capacity(n_samples);
	let mut offset = 0_usize;
	while q.len() < n_samples {
		let (block_q, consumed) = decode_block(&body[offset..])?;
		q.extend(block_q);
		offset += consumed;
	}

	if q.len() != n_samples { return Err(CodecError::Truncated); }

	let scale_den_f = f64::from(scale_den);
	Ok(q.into_iter().map(|v| v as f64 / scale_den_f).collect())
}
