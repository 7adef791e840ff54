/*!
# DIBS: Stream Pipeline (C7)

Glues the sample builder (C5), downsampler (C6), and segment codec (C4)
together: `[raw GPS samples] → C5 → C6 → (per channel) C4 → stream
record`. Modeled as an explicit [`PipelineStage`] state machine rather
than a bag of booleans, per SPEC_FULL §4.2.
*/

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utc2k::Utc2k;

use crate::{
	abort::KillSwitch,
	codec::{compress, decompress, CodecOptions},
	downsample::{downsample_indices, slice_by_indices, DEFAULT_TARGET_MEDIUM},
	error::PipelineError,
	geo::{build_base_streams, interpolate_elevation, GpsSample},
};

/// # Activity Identifier.
pub type ActivityId = String;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Pipeline Stage.
///
/// A failure at any stage is recorded as
/// `PipelineStage::ProcessingError(stage)`, carrying the name of the stage
/// that failed, per spec §4.2.4.
pub enum PipelineStage {
	/// # Activity Received, Not Yet Validated.
	Received,

	/// # Input Validated (Enough Samples, Monotone Timestamps, Known Type).
	Validated,

	/// # Base Streams Built (time/distance/speed/elevation).
	StreamsBuilt,

	/// # Streams Downsampled to the Target Point Count.
	Downsampled,

	/// # Every Channel Compressed With DIBS.
	Compressed,

	/// # Stream Record Persisted.
	Persisted,

	/// # Processing Stopped at the Named Stage.
	ProcessingError(&'static str),
}



#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// # Activity Type.
///
/// Only the current spelling is accepted; the legacy `run`/`ride` pair
/// from an older schema generation is rejected at ingest (see
/// [`crate::ingest::ingest`]), per spec §9's open question.
pub enum ActivityType {
	/// # Running.
	Running,

	/// # Road Cycling.
	RoadBiking,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// # Level of Detail.
///
/// `Full` has no defined storage path yet; the pipeline only ever
/// produces `Medium` today (spec §9 — treated as reserved).
pub enum StreamLod {
	/// # Heavily Downsampled (Default).
	Medium,

	/// # Reserved.
	Low,

	/// # Reserved.
	Full,
}

impl ActivityType {
	/// # Parse Strictly.
	///
	/// Accepts only `"running"`/`"road_biking"`. The source system this
	/// was distilled from also had a legacy `"run"`/`"ride"` pair; those
	/// are rejected here rather than silently mapped, per spec §9.
	///
	/// ## Errors
	/// Returns [`PipelineError::InvalidInput`] for anything else,
	/// including the legacy spelling.
	pub fn from_str_strict(s: &str) -> Result<Self, PipelineError> {
		match s {
			"running" => Ok(Self::Running),
			"road_biking" => Ok(Self::RoadBiking),
			_ => Err(PipelineError::InvalidInput("unrecognized or legacy activity_type")),
		}
	}
}

impl StreamLod {
	#[must_use]
	/// # Default Downsample Target.
	pub const fn target_points(self) -> usize {
		match self {
			Self::Medium => DEFAULT_TARGET_MEDIUM,
			// Reserved LODs; not produced by `run_pipeline` today.
			Self::Low => 256,
			Self::Full => usize::MAX,
		}
	}
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// # Downsample Index Axis.
pub enum IndexBy {
	/// # Drive Thinning by Cumulative Distance.
	Distance,

	/// # Drive Thinning by Elapsed Time.
	Time,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
/// # Codec Metadata.
///
/// Stored verbatim in [`StreamRecord::codec`], per spec §3.
pub struct CodecMeta {
	/// # Codec Name.
	pub name: String,

	/// # Codec Version.
	pub version: u32,

	/// # Decimal Places Used for Quantization.
	pub decimal_places: u8,

	/// # Byte Order.
	pub endianness: String,
}

impl CodecMeta {
	fn from_opts(opts: &CodecOptions) -> Self {
		Self {
			name: "dibs".to_owned(),
			version: 1,
			decimal_places: opts.decimal_places(),
			endianness: "le".to_owned(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// # Stream Record.
///
/// One per `(activity_id, lod, index_by)`, per spec §3. Records are
/// created once and never mutated in place; `updated_at` is reserved for
/// future reprocessing that bumps a `processing_ver` and overwrites
/// atomically.
pub struct StreamRecord {
	/// # Activity Identifier.
	pub activity_id: ActivityId,

	/// # Level of Detail.
	pub lod: StreamLod,

	/// # Downsample Index Axis.
	pub index_by: IndexBy,

	/// # Retained Point Count.
	pub num_points: usize,

	/// # Point Count Before Downsampling.
	pub original_num_points: usize,

	/// # Compressed `time_s` Channel.
	pub time_s_bytes: Vec<u8>,

	/// # Compressed `distance_m` Channel.
	pub distance_m_bytes: Vec<u8>,

	/// # Compressed `speed_mps` Channel.
	pub speed_mps_bytes: Vec<u8>,

	/// # Compressed `elevation_m` Channel, If Enrichment Was Available.
	pub elevation_m_bytes: Option<Vec<u8>>,

	/// # Codec Metadata.
	pub codec: CodecMeta,

	/// # Creation Timestamp.
	pub created_at: Utc2k,

	/// # Last-Updated Timestamp.
	pub updated_at: Utc2k,
}

impl StreamRecord {
	/// # Decode All Present Channels.
	///
	/// Mirrors the read path of spec §2: `stream record → (per channel)
	/// C4⁻¹ → parallel float64 arrays`.
	///
	/// ## Errors
	/// Returns a [`PipelineError::Codec`] if any channel fails to decode.
	pub fn decode_channels(&self) -> Result<DecodedStreams, PipelineError> {
		let time_s = decompress(&self.time_s_bytes)?;
		let distance_m = decompress(&self.distance_m_bytes)?;
		let speed_mps = decompress(&self.speed_mps_bytes)?;
		let elevation_m = self.elevation_m_bytes.as_deref()
			.map(decompress)
			.transpose()?;

		Ok(DecodedStreams { time_s, distance_m, speed_mps, elevation_m })
	}
}

#[derive(Debug, Clone)]
/// # Decoded Streams.
///
/// The read-path counterpart of the four channels in [`StreamRecord`].
pub struct DecodedStreams {
	/// # Elapsed Seconds.
	pub time_s: Vec<f64>,

	/// # Cumulative Distance (Meters).
	pub distance_m: Vec<f64>,

	/// # Instantaneous Speed (Meters / Second).
	pub speed_mps: Vec<f64>,

	/// # Elevation (Meters), If Present.
	pub elevation_m: Option<Vec<f64>>,
}



/// # Run Pipeline.
///
/// Drive one activity's raw GPS samples through `Received → Validated →
/// StreamsBuilt → Downsampled → Compressed → Persisted`
/// (`Persisted` itself is the caller's job — see
/// [`crate::persistence`] — this function returns the record to persist).
///
/// `raw_elevation`, if supplied, is the per-sample `RouteEnricher` output,
/// already aligned to `samples`; pass `None` when enrichment was
/// unavailable (§7 `EnrichmentUnavailable` is non-fatal: the record is
/// still produced, just without an elevation channel).
///
/// ## Errors
/// Returns [`PipelineError::TooFewSamples`] for fewer than two samples,
/// and [`PipelineError::ProcessingError`] (carrying the stage name) for a
/// cancellation or a compression failure partway through.
pub fn run_pipeline(
	activity_id: ActivityId,
	samples: &[GpsSample],
	raw_elevation: Option<&[Option<f64>]>,
	opts: &CodecOptions,
	kill: &KillSwitch,
) -> Result<StreamRecord, PipelineError> {
	// Received -> Validated.
	if samples.len() < 2 { return Err(PipelineError::TooFewSamples); }
	if kill.killed() { return Err(PipelineError::ProcessingError("Validated")); }

	// Validated -> StreamsBuilt.
	let (time_s, distance_m, speed_mps) = build_base_streams(samples);
	let elevation_m = raw_elevation.and_then(interpolate_elevation);
	if kill.killed() { return Err(PipelineError::ProcessingError("StreamsBuilt")); }

	// StreamsBuilt -> Downsampled.
	let target = StreamLod::Medium.target_points();
	let indices = downsample_indices(&distance_m, target);
	let original_num_points = samples.len();
	let num_points = indices.len();

	let time_s = slice_by_indices(&time_s, &indices);
	let distance_m = slice_by_indices(&distance_m, &indices);
	let speed_mps = slice_by_indices(&speed_mps, &indices);
	let elevation_m = elevation_m.map(|e| slice_by_indices(&e, &indices));
	if kill.killed() { return Err(PipelineError::ProcessingError("Downsampled")); }

	// Downsampled -> Compressed.
	let compressed = compress_channels(&time_s, &distance_m, &speed_mps, elevation_m.as_deref(), opts, kill)?;

	let now = Utc2k::now();

	Ok(StreamRecord {
		activity_id,
		lod: StreamLod::Medium,
		index_by: IndexBy::Distance,
		num_points,
		original_num_points,
		time_s_bytes: compressed.time_s,
		distance_m_bytes: compressed.distance_m,
		speed_mps_bytes: compressed.speed_mps,
		elevation_m_bytes: compressed.elevation_m,
		codec: CodecMeta::from_opts(opts),
		created_at: now,
		updated_at: now,
	})
}

/// # Compressed Channel Bytes.
struct CompressedChannels {
	/// # `time_s` Segment.
	time_s: Vec<u8>,

	/// # `distance_m` Segment.
	distance_m: Vec<u8>,

	/// # `speed_mps` Segment.
	speed_mps: Vec<u8>,

	/// # `elevation_m` Segment, If Present.
	elevation_m: Option<Vec<u8>>,
}

/// # Compress Channels.
///
/// Fans the (up to four) channels of one activity out across a worker
/// pool bounded to `min(4, runtime parallelism)`, per spec §5. The codec
/// itself has no cancellation points; [`KillSwitch`] is only consulted
/// before the fan-out begins and after it completes.
fn compress_channels(
	time_s: &[f64],
	distance_m: &[f64],
	speed_mps: &[f64],
	elevation_m: Option<&[f64]>,
	opts: &CodecOptions,
	kill: &KillSwitch,
) -> Result<CompressedChannels, PipelineError> {
	if kill.killed() { return Err(PipelineError::ProcessingError("Compressed")); }

	let mut jobs: Vec<(&'static str, &[f64])> = vec![
		("time_s", time_s),
		("distance_m", distance_m),
		("speed_mps", speed_mps),
	];
	if let Some(e) = elevation_m { jobs.push(("elevation_m", e)); }

	let n_threads = 4.min(rayon::current_num_threads().max(1));
	let pool = rayon::ThreadPoolBuilder::new()
		.num_threads(n_threads)
		.build()
		.map_err(|_| PipelineError::Bug("failed to build channel worker pool"))?;

	let results: Vec<Result<(&'static str, Vec<u8>), PipelineError>> = pool.install(|| {
		use rayon::prelude::*;
		jobs.par_iter()
			.map(|&(name, data)| {
				let bytes = compress(data, opts)?;
				Ok((name, bytes))
			})
			.collect()
	});

	if kill.killed() { return Err(PipelineError::ProcessingError("Compressed")); }

	let mut by_name: BTreeMap<&'static str, Vec<u8>> = BTreeMap::new();
	for r in results {
		let (name, bytes) = r?;
		by_name.insert(name, bytes);
	}

	Ok(CompressedChannels {
		time_s: by_name.remove("time_s").ok_or(PipelineError::Bug("missing time_s channel"))?,
		distance_m: by_name.remove("distance_m").ok_or(PipelineError::Bug("missing distance_m channel"))?,
		speed_mps: by_name.remove("speed_mps").ok_or(PipelineError::Bug("missing speed_mps channel"))?,
		elevation_m: by_name.remove("elevation_m"),
	})
}



#[cfg(test)]
mod test {
	use super::*;

	fn sample(lat: f64, lon: f64, ts: i64) -> GpsSample {
		GpsSample { lat, lon, timestamp_ms: ts, accuracy: None, altitude: None, speed: None }
	}

	fn many_samples(n: usize) -> Vec<GpsSample> {
		(0..n).map(|i| sample(40.0 + (i as f64) * 0.0001, -73.0 + (i as f64) * 0.0001, (i as i64) * 1000)).collect()
	}

	#[test]
	fn t_activity_type_rejects_legacy_spelling() {
		assert_eq!(ActivityType::from_str_strict("running"), Ok(ActivityType::Running));
		assert_eq!(ActivityType::from_str_strict("road_biking"), Ok(ActivityType::RoadBiking));
		assert!(ActivityType::from_str_strict("run").is_err());
		assert!(ActivityType::from_str_strict("ride").is_err());
	}

	#[test]
	fn t_too_few_samples() {
		let samples = vec![sample(0.0, 0.0, 0)];
		let kill = KillSwitch::default();
		let err = run_pipeline("a1".to_owned(), &samples, None, &CodecOptions::default(), &kill).unwrap_err();
		assert_eq!(err, PipelineError::TooFewSamples);
	}

	#[test]
	fn t_pipeline_without_elevation() {
		let samples = many_samples(50);
		let kill = KillSwitch::default();
		let record = run_pipeline("a2".to_owned(), &samples, None, &CodecOptions::default(), &kill).unwrap();
		assert!(record.elevation_m_bytes.is_none());
		assert_eq!(record.original_num_points, 50);
		assert!(record.num_points <= record.original_num_points);

		let decoded = record.decode_channels().unwrap();
		assert_eq!(decoded.time_s.len(), record.num_points);
		assert_eq!(decoded.distance_m.len(), record.num_points);
		assert_eq!(decoded.speed_mps.len(), record.num_points);
		assert!(decoded.elevation_m.is_none());
	}

	#[test]
	fn t_pipeline_with_elevation() {
		let samples = many_samples(20);
		let raw_elevation: Vec<Option<f64>> = (0..20).map(|i| Some(100.0 + i as f64)).collect();
		let kill = KillSwitch::default();
		let record = run_pipeline("a3".to_owned(), &samples, Some(&raw_elevation), &CodecOptions::default(), &kill).unwrap();
		assert!(record.elevation_m_bytes.is_some());

		let decoded = record.decode_channels().unwrap();
		assert_eq!(decoded.elevation_m.unwrap().len(), record.num_points);
	}

	#[test]
	fn t_pipeline_cancelled_up_front() {
		let samples = many_samples(10);
		let kill = KillSwitch::default();
		kill.inner().store(true, std::sync::atomic::Ordering::Release);
		let err = run_pipeline("a4".to_owned(), &samples, None, &CodecOptions::default(), &kill).unwrap_err();
		assert_eq!(err, PipelineError::ProcessingError("Validated"));
	}

	#[test]
	fn t_monotonicity_preserved_end_to_end() {
		let samples = many_samples(5000);
		let kill = KillSwitch::default();
		let record = run_pipeline("a5".to_owned(), &samples, None, &CodecOptions::default(), &kill).unwrap();
		let decoded = record.decode_channels().unwrap();
		assert!(decoded.distance_m.windows(2).all(|w| w[1] >= w[0]));
		assert!(decoded.time_s.windows(2).all(|w| w[1] >= w[0]));
	}
}
