/*!
# DIBS: Block Codec (C3)

Per-block predictor selection, the 16-byte block header, and residual
packing/unpacking. A block covers up to `1 << block_log2` contiguous
quantized samples; the segment codec ([`crate::codec`]) is responsible for
partitioning a full channel into blocks and concatenating their bytes.
*/

use crate::{
	bits::{
		BitReader,
		BitWriter,
		bit_width,
		zigzag_decode,
		zigzag_encode,
	},
	error::CodecError,
	predictor::{
		Predictor,
		delta1_forward,
		delta1_inverse,
		delta2_forward,
		delta2_inverse,
	},
};

/// # Block Tag.
///
/// Constant sentinel written at the start of every block header.
const BLOCK_TAG: u32 = 0x4242_4242;

/// # Block Header Size (Bytes).
const HEADER_LEN: usize = 16;



/// # Max Post-ZigZag Bit Width.
///
/// Residuals are formalized as 32-bit signed integers on the wire; the
/// caller must have already verified every residual fits `i32` (see
/// [`first_overflow_local_index`]) before calling this, so the conversion
/// here cannot silently wrap.
fn max_bit_width(residuals: &[i64]) -> u8 {
	let max_zz = residuals.iter()
		.map(|&r| zigzag_encode(i32::try_from(r).expect("residual overflow must be checked before max_bit_width.")))
		.max()
		.unwrap_or(0);
	bit_width(max_zz)
}

/// # First Overflowing Residual, As a Local Sample Index.
///
/// A quantized *sample* fits `i32` by construction (the quantizer already
/// rejects anything that doesn't), but a Δ¹/Δ² *residual* is a difference
/// of two or three such samples and can briefly escape `i32` range even
/// though every sample involved is in range. Returns the local index into
/// the block's `q` array of the sample that produced the first such
/// residual, so the caller can map it back to a global sample index.
fn first_overflow_local_index(residuals: &[i64], seed_count: usize) -> Option<usize> {
	residuals.iter()
		.position(|&r| r < i64::from(i32::MIN) || r > i64::from(i32::MAX))
		.map(|i| i + seed_count)
}

/// # Choose Predictor.
///
/// Pick Δ¹ or Δ² for a block of quantized samples, per spec §4.1.4: blocks
/// shorter than three samples are always Δ¹ (Δ² needs two seeds and at
/// least one residual to be worthwhile); otherwise pick whichever yields
/// the smaller post-ZigZag bit-width, ties favoring Δ¹.
///
/// ## Errors
/// Returns the local index (into `q`) of the first sample whose residual
/// escapes `i32` range, if every viable predictor for this block overflows.
fn choose_predictor(q: &[i64]) -> Result<(Predictor, Vec<i64>, Vec<i64>), usize> {
	if q.len() < 3 {
		let (seed, residuals) = delta1_forward(q);
		if let Some(idx) = first_overflow_local_index(&residuals, Predictor::Delta1.seed_count()) {
			return Err(idx);
		}
		return Ok((Predictor::Delta1, vec![seed], residuals));
	}

	let (seed1, res1) = delta1_forward(q);
	let (seed0_2, seed1_2, res2) = delta2_forward(q);

	let overflow1 = first_overflow_local_index(&res1, Predictor::Delta1.seed_count());
	let overflow2 = first_overflow_local_index(&res2, Predictor::Delta2.seed_count());

	match (overflow1, overflow2) {
		(None, None) => {
			let bw1 = max_bit_width(&res1);
			let bw2 = max_bit_width(&res2);

			if bw2 < bw1 { Ok((Predictor::Delta2, vec![seed0_2, seed1_2], res2)) }
			else { Ok((Predictor::Delta1, vec![seed1], res1)) }
		},
		(None, Some(_)) => Ok((Predictor::Delta1, vec![seed1], res1)),
		(Some(_), None) => Ok((Predictor::Delta2, vec![seed0_2, seed1_2], res2)),
		// Both predictors overflow for this block; report Δ¹'s offending
		// index, matching its tie-break priority elsewhere.
		(Some(idx1), Some(_)) => Err(idx1),
	}
}



/// # Encode Block.
///
/// `q` must be non-empty. Returns the full block (header + seeds +
/// packed residuals).
///
/// ## Errors
/// Returns the local index (into `q`) of the first sample whose Δ¹/Δ²
/// residual escapes `i32` range; the caller is responsible for mapping
/// that back to a global sample index and surfacing
/// [`CodecError::Overflow`][crate::error::CodecError::Overflow].
pub(crate) fn encode_block(q: &[i64]) -> Result<Vec<u8>, usize> {
	let (predictor, seeds, residuals) = choose_predictor(q)?;

	let zz: Vec<u32> = residuals.iter()
		.map(|&r| zigzag_encode(i32::try_from(r).expect("residual overflow must be checked before encoding.")))
		.collect();
	let bw = bit_width(zz.iter().copied().max().unwrap_or(0));

	let mut out = Vec::with_capacity(HEADER_LEN + 4 * seeds.len() + residuals.len());
	out.extend_from_slice(&BLOCK_TAG.to_le_bytes());
	out.extend_from_slice(&predictor.tag().to_le_bytes());
	out.extend_from_slice(&u32::from(bw).to_le_bytes());
	out.extend_from_slice(&(q.len() as u32).to_le_bytes());

	for &s in &seeds { out.extend_from_slice(&(s as i32).to_le_bytes()); }

	let mut writer = BitWriter::with_capacity((zz.len() * usize::from(bw) + 7) / 8);
	for &v in &zz { writer.write_bits(v, bw); }
	out.extend_from_slice(&writer.finish());

	Ok(out)
}

/// # Decode Block.
///
/// Decode a single block starting at `buf[0]`, returning the reconstructed
/// quantized samples and the number of bytes consumed (so the caller can
/// advance to the next block).
pub(crate) fn decode_block(buf: &[u8]) -> Result<(Vec<i64>, usize), CodecError> {
	if buf.len() < HEADER_LEN { return Err(CodecError::Truncated); }

	let tag = u32::from_le_bytes(buf[0..4].try_into().map_err(|_| CodecError::Bug("block header"))?);
	if tag != BLOCK_TAG { return Err(CodecError::Truncated); }

	let predictor_tag = u32::from_le_bytes(buf[4..8].try_into().map_err(|_| CodecError::Bug("block header"))?);
	let predictor = Predictor::from_tag(predictor_tag).ok_or(CodecError::Truncated)?;

	let bit_width_raw = u32::from_le_bytes(buf[8..12].try_into().map_err(|_| CodecError::Bug("block header"))?);
	let bw = u8::try_from(bit_width_raw).map_err(|_| CodecError::Truncated)?;
	if bw > 32 { return Err(CodecError::Truncated); }

	let n_samples_block = u32::from_le_bytes(buf[12..16].try_into().map_err(|_| CodecError::Bug("block header"))?) as usize;

	let seed_count = predictor.seed_count();
	if n_samples_block < seed_count { return Err(CodecError::Truncated); }

	let seeds_end = HEADER_LEN + 4 * seed_count;
	if buf.len() < seeds_end { return Err(CodecError::Truncated); }

	let mut seeds = [0_i64; 2];
	for i in 0..seed_count {
		let start = HEADER_LEN + 4 * i;
		let raw = i32::from_le_bytes(buf[start..start + 4].try_into().map_err(|_| CodecError::Bug("block seed"))?);
		seeds[i] = i64::from(raw);
	}

	let n_residuals = n_samples_block - seed_count;
	let residual_bytes = (n_residuals * usize::from(bw) + 7) / 8;
	let total_len = seeds_end + residual_bytes;
	if buf.len() < total_len { return Err(CodecError::Truncated); }

	let mut reader = BitReader::new(&buf[seeds_end..total_len]);
	let mut residuals = Vec::with_capacity(n_residuals);
	for _ in 0..n_residuals {
		let zz = reader.read_bits(bw).ok_or(CodecError::Truncated)?;
		residuals.push(i64::from(zigzag_decode(zz)));
	}

	let q = match predictor {
		Predictor::Delta1 => delta1_inverse(seeds[0], &residuals),
		Predictor::Delta2 => delta2_inverse(seeds[0], seeds[1], &residuals),
	};

	Ok((q, total_len))
}
