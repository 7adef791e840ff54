/*!
# DIBS: Errors
*/

use std::{
	error::Error,
	fmt,
};

#[cfg(feature = "bin")]
use fyi_msg::Msg;



#[derive(Debug, Clone, Copy, PartialEq)]
/// # Codec Errors.
///
/// These are the failure modes of the DIBS segment codec itself (C1–C4).
/// Nothing in here ever touches the filesystem or network; it is purely a
/// function of the bytes/floats handed to it.
pub enum CodecError {
	/// # Zero-length input.
	EmptyInput,

	/// # `decimal_places`/`block_log2` out of range.
	InvalidOptions,

	/// # A quantized value, or a Δ¹/Δ² residual derived from in-range
	/// quantized values, escaped the `i32` range.
	///
	/// Carries the offending sample index and the original (unquantized)
	/// value for diagnostics. A residual can overflow even when every
	/// individual quantized sample fits `i32`, since it is a difference of
	/// two or three such samples; this is treated identically to a direct
	/// quantization overflow rather than silently wrapped.
	Overflow(usize, f64),

	/// # Buffer shorter than the geometry it claims to describe.
	Truncated,

	/// # The four-byte magic didn't read `"DIBS"`.
	BadMagic,

	/// # The segment declares a version this codec doesn't understand.
	UnsupportedVersion(u32),

	/// # The stored CRC-32C didn't match the recomputed one.
	CRCMismatch,

	/// # Internal invariant violation.
	Bug(&'static str),
}

impl Error for CodecError {}

impl fmt::Display for CodecError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::EmptyInput => f.write_str("Input array is empty."),
			Self::InvalidOptions => f.write_str("decimal_places or block_log2 is out of range."),
			Self::Overflow(idx, v) => write!(f, "Quantized value at index {idx} ({v}) does not fit in a signed 32-bit integer."),
			Self::Truncated => f.write_str("Buffer is shorter than its declared geometry."),
			Self::BadMagic => f.write_str("Segment magic bytes do not read \"DIBS\"."),
			Self::UnsupportedVersion(v) => write!(f, "Unsupported segment version ({v})."),
			Self::CRCMismatch => f.write_str("CRC-32C mismatch; segment body is corrupt."),
			Self::Bug(s) => write!(f, "Bug: {s}."),
		}
	}
}



#[derive(Debug, Clone, PartialEq)]
/// # Pipeline Errors.
///
/// Failure modes of the activity stream pipeline (C5–C7) and the ingest
/// boundary (§6). A successful-but-duplicate ingest is modeled separately
/// as `crate::ingest::IngestOutcome::Replayed`, not as an error, per the
/// idempotency contract.
pub enum PipelineError {
	/// # Fewer than two raw GPS samples were submitted.
	TooFewSamples,

	/// # Missing field, non-monotone timestamps, bad activity type, etc.
	InvalidInput(&'static str),

	/// # The `RouteEnricher` could not be reached.
	///
	/// Non-fatal: the caller should persist the record without elevation
	/// and re-enrich later.
	EnrichmentUnavailable,

	/// # A channel failed to compress.
	Codec(CodecError),

	/// # A stage of the pipeline failed.
	///
	/// Carries the stage name at which processing stopped, matching the
	/// `ProcessingError(stage)` activity state.
	ProcessingError(&'static str),

	/// # Internal invariant violation.
	Bug(&'static str),
}

impl Error for PipelineError {}

impl From<CodecError> for PipelineError {
	#[inline]
	fn from(err: CodecError) -> Self { Self::Codec(err) }
}

impl fmt::Display for PipelineError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::TooFewSamples => f.write_str("At least two GPS samples are required."),
			Self::InvalidInput(s) => write!(f, "Invalid input: {s}."),
			Self::EnrichmentUnavailable => f.write_str("Elevation enrichment service is unavailable."),
			Self::Codec(e) => write!(f, "{e}"),
			Self::ProcessingError(stage) => write!(f, "Processing failed at stage {stage}."),
			Self::Bug(s) => write!(f, "Bug: {s}."),
		}
	}
}



#[cfg(feature = "bin")]
#[derive(Debug, Clone, PartialEq)]
/// # CLI-Only Errors.
///
/// These only matter to the `dibs` binary; library consumers never see
/// them.
pub enum CliError {
	/// # Invalid CLI arg.
	CliArg(String),

	/// # CLI parsing failure.
	CliParse(&'static str),

	/// # I/O failure reading/writing a file.
	Io(String),

	/// # A codec error surfaced through the CLI.
	Codec(CodecError),

	/// # Print help (not an error).
	PrintHelp,

	/// # Print version (not an error).
	PrintVersion,
}

#[cfg(feature = "bin")]
impl Error for CliError {}

#[cfg(feature = "bin")]
impl From<CodecError> for CliError {
	#[inline]
	fn from(err: CodecError) -> Self { Self::Codec(err) }
}

#[cfg(feature = "bin")]
impl From<CliError> for Msg {
	#[inline]
	fn from(src: CliError) -> Self { Self::error(src.to_string()) }
}

#[cfg(feature = "bin")]
impl fmt::Display for CliError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::CliArg(s) => write!(f, "Invalid CLI option: {s}"),
			Self::CliParse(s) => write!(f, "Unable to parse {s}."),
			Self::Io(s) => write!(f, "I/O error: {s}."),
			Self::Codec(e) => write!(f, "{e}"),
			Self::PrintHelp => f.write_str("(help)"),
			Self::PrintVersion => f.write_str(concat!("DIBS v", env!("CARGO_PKG_VERSION"))),
		}
	}
}
