/*!
# DIBS: Library

Delta Integer Bit Streaming — a lossy, fixed-point, predictor-based codec
for monotonic or quasi-smooth float64 time-series — plus the activity
stream pipeline built on top of it.

The codec proper ([`bits`], [`predictor`], [`block`], [`codec`]) is pure
and allocation-light; everything above it ([`geo`], [`downsample`],
[`elevation`], [`pipeline`], [`ingest`], [`persistence`]) turns raw GPS
samples into the downsampled, DIBS-compressed [`pipeline::StreamRecord`]
a fitness-tracking backend would persist.
*/

#![deny(
	clippy::allow_attributes_without_reason,
	clippy::correctness,
	unreachable_pub,
	unsafe_code,
)]

#![warn(
	clippy::complexity,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::style,

	clippy::allow_attributes,
	clippy::clone_on_ref_ptr,
	clippy::create_dir,
	clippy::filetype_is_file,
	clippy::format_push_string,
	clippy::get_unwrap,
	clippy::impl_trait_in_params,
	clippy::lossy_float_literal,
	clippy::missing_assert_message,
	clippy::missing_docs_in_private_items,
	clippy::needless_raw_strings,
	clippy::panic_in_result_fn,
	clippy::pub_without_shorthand,
	clippy::rest_pat_in_fully_bound_structs,
	clippy::semicolon_inside_block,
	clippy::str_to_string,
	clippy::string_to_string,
	clippy::todo,
	clippy::undocumented_unsafe_blocks,
	clippy::unneeded_field_pattern,
	clippy::unseparated_literal_suffix,
	clippy::unwrap_in_result,

	macro_use_extern_crate,
	missing_copy_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![expect(clippy::redundant_pub_crate, reason = "Unresolvable.")]

mod abort;
mod bits;
mod block;
mod codec;
mod downsample;
mod elevation;
mod error;
mod geo;
mod ingest;
mod persistence;
mod pipeline;
mod polyline;
mod predictor;

pub use abort::KillSwitch;
pub use codec::{compress, decompress, CodecOptions};
pub use downsample::{downsample_indices, slice_by_indices, DEFAULT_TARGET_MEDIUM};
pub use elevation::{calculate_elevation_change, ElevationChange, DEFAULT_SEGMENT_THRESHOLD_M};
pub use error::{CodecError, PipelineError};
pub use geo::{build_base_streams, haversine, interpolate_elevation, GpsSample};
pub use ingest::{
	ingest,
	ActivityStore,
	EnrichmentError,
	IngestOutcome,
	IngestRequest,
	IngestSample,
	RouteEnricher,
};
pub use persistence::{load_stream_record, persist_stream_record};
pub use pipeline::{
	run_pipeline,
	ActivityId,
	ActivityType,
	CodecMeta,
	DecodedStreams,
	IndexBy,
	PipelineStage,
	StreamLod,
	StreamRecord,
};
pub use polyline::{decode_polyline, encode_polyline};

#[cfg(feature = "bin")]
pub use error::CliError;
