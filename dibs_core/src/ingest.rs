/*!
# DIBS: Ingest Boundary (§6)

The typed entry point an HTTP layer (out of scope) is expected to wrap:
validate a raw-sample upload, replay it idempotently by
`client_activity_id`, run it through [`crate::pipeline::run_pipeline`],
and hand the result to an [`ActivityStore`] for persistence.
*/

use utc2k::Utc2k;

use crate::{
	abort::KillSwitch,
	error::PipelineError,
	geo::GpsSample,
	pipeline::{run_pipeline, ActivityId, ActivityType, StreamRecord},
	polyline::encode_polyline,
};

#[derive(Debug, Clone, Copy, PartialEq)]
/// # One Raw Sample, As Received at the Ingest Boundary.
pub struct IngestSample {
	/// # Latitude (Degrees).
	pub lat: f64,

	/// # Longitude (Degrees).
	pub lon: f64,

	/// # Timestamp (Milliseconds, Epoch).
	pub t_ms: i64,
}

#[derive(Debug, Clone)]
/// # Ingest Request.
///
/// Mirrors spec §6's ingest call input shape verbatim.
pub struct IngestRequest {
	/// # Owning User.
	pub user_id: String,

	/// # Client-Supplied Idempotency Key.
	pub client_activity_id: String,

	/// # Activity Type.
	pub activity_type: ActivityType,

	/// # Activity Title.
	pub title: String,

	/// # Activity Description.
	pub description: Option<String>,

	/// # Activity Start Time.
	pub start_time: Utc2k,

	/// # Raw Samples.
	pub samples: Vec<IngestSample>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
/// # Ingest Outcome.
///
/// A successful-but-duplicate ingest is modeled as [`Self::Replayed`],
/// not an error, per spec §7's `IdempotencyReplay` note.
pub enum IngestOutcome {
	/// # Freshly Created (HTTP 201 at the wrapping layer).
	Created(ActivityId),

	/// # Same `client_activity_id` Seen Before (HTTP 200 at the wrapping layer).
	Replayed(ActivityId),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Route Enrichment Failure.
///
/// Deliberately featureless: the enricher's own protocol, auth, and
/// retries are its concern, not the pipeline's (spec §6).
pub struct EnrichmentError;

/// # Route Enricher.
///
/// `Heights(polyline_encoded_6) → (heights, error)` from spec §6,
/// expressed idiomatically as a `Result` rather than an out-parameter.
pub trait RouteEnricher: Send + Sync {
	/// # Heights.
	///
	/// ## Errors
	/// Any failure reaching or parsing the enrichment service.
	fn heights(&self, polyline: &str) -> Result<Vec<Option<f64>>, EnrichmentError>;
}

/// # Activity Store.
///
/// Stands in for "the object store and database" of spec §5/§6: at-most-
/// once activity creation keyed by `client_activity_id`, plus persistence
/// of the finished [`StreamRecord`].
pub trait ActivityStore: Send + Sync {
	/// # Find Existing Activity by Client Key.
	fn find_by_client_activity_id(&self, user_id: &str, client_activity_id: &str) -> Option<ActivityId>;

	/// # Create a New Activity, Returning Its Server-Side ID.
	///
	/// ## Errors
	/// Any storage failure.
	fn create_activity(&self, request: &IngestRequest) -> Result<ActivityId, PipelineError>;

	/// # Persist a Finished Stream Record.
	///
	/// ## Errors
	/// Any storage failure. Called only after every channel is
	/// successfully compressed, so this is the pipeline's sole
	/// `Persisted`-stage write, per spec §5's "persistence is the last
	/// step and is atomic per record".
	fn save_stream_record(&self, record: &StreamRecord) -> Result<(), PipelineError>;
}

/// # Validate.
///
/// Missing fields, too few samples, and non-monotone timestamps are all
/// checked here, before anything touches a store.
///
/// ## Errors
/// [`PipelineError::TooFewSamples`] or [`PipelineError::InvalidInput`].
fn validate(request: &IngestRequest) -> Result<(), PipelineError> {
	if request.user_id.is_empty() { return Err(PipelineError::InvalidInput("user_id is empty")); }
	if request.client_activity_id.is_empty() { return Err(PipelineError::InvalidInput("client_activity_id is empty")); }
	if request.title.is_empty() { return Err(PipelineError::InvalidInput("title is empty")); }
	if request.samples.len() < 2 { return Err(PipelineError::TooFewSamples); }

	if request.samples.windows(2).any(|w| w[1].t_ms < w[0].t_ms) {
		return Err(PipelineError::InvalidInput("timestamps are not monotone"));
	}

	Ok(())
}

/// # Ingest.
///
/// The typed core of spec §6's ingest call. Idempotent on
/// `client_activity_id`: a replayed upload returns the original
/// [`ActivityId`] wrapped in [`IngestOutcome::Replayed`] rather than
/// re-running the pipeline.
///
/// ## Errors
/// [`PipelineError::TooFewSamples`] / [`PipelineError::InvalidInput`] on
/// bad input, or whatever [`run_pipeline`] / the store surfaces.
/// `EnrichmentUnavailable` is deliberately not returned here: a failed or
/// absent enricher just means the record persists without an elevation
/// channel (spec §7).
pub fn ingest(
	request: IngestRequest,
	enricher: Option<&dyn RouteEnricher>,
	store: &dyn ActivityStore,
	kill: &KillSwitch,
) -> Result<IngestOutcome, PipelineError> {
	if let Some(existing) = store.find_by_client_activity_id(&request.user_id, &request.client_activity_id) {
		return Ok(IngestOutcome::Replayed(existing));
	}

	validate(&request)?;

	let activity_id = store.create_activity(&request)?;

	let gps_samples: Vec<GpsSample> = request.samples.iter()
		.map(|s| GpsSample { lat: s.lat, lon: s.lon, timestamp_ms: s.t_ms, accuracy: None, altitude: None, speed: None })
		.collect();

	let raw_elevation = enricher.and_then(|e| {
		let polyline = encode_polyline(&gps_samples.iter().map(|s| (s.lat, s.lon)).collect::<Vec<_>>());
		e.heights(&polyline).ok()
	});

	let record = run_pipeline(
		activity_id.clone(),
		&gps_samples,
		raw_elevation.as_deref(),
		&crate::codec::CodecOptions::default(),
		kill,
	)?;

	store.save_stream_record(&record)?;

	Ok(IngestOutcome::Created(activity_id))
}



#[cfg(test)]
mod test {
	use std::{cell::RefCell, collections::HashMap, sync::Mutex};

	use super::*;

	struct MemStore {
		by_client_id: Mutex<HashMap<String, ActivityId>>,
		records: Mutex<RefCell<Vec<StreamRecord>>>,
		next_id: Mutex<u64>,
	}

	impl MemStore {
		fn new() -> Self {
			Self {
				by_client_id: Mutex::new(HashMap::new()),
				records: Mutex::new(RefCell::new(Vec::new())),
				next_id: Mutex::new(0),
			}
		}
	}

	impl ActivityStore for MemStore {
		fn find_by_client_activity_id(&self, user_id: &str, client_activity_id: &str) -> Option<ActivityId> {
			let key = format!("{user_id}:{client_activity_id}");
			self.by_client_id.lock().unwrap().get(&key).cloned()
		}

		fn create_activity(&self, request: &IngestRequest) -> Result<ActivityId, PipelineError> {
			let mut next = self.next_id.lock().unwrap();
			*next += 1;
			let id = format!("act-{next}");
			let key = format!("{}:{}", request.user_id, request.client_activity_id);
			self.by_client_id.lock().unwrap().insert(key, id.clone());
			Ok(id)
		}

		fn save_stream_record(&self, record: &StreamRecord) -> Result<(), PipelineError> {
			self.records.lock().unwrap().borrow_mut().push(record.clone());
			Ok(())
		}
	}

	fn samples(n: usize) -> Vec<IngestSample> {
		(0..n).map(|i| IngestSample { lat: 40.0 + i as f64 * 0.0001, lon: -73.0, t_ms: i as i64 * 1000 }).collect()
	}

	fn req(client_id: &str, n: usize) -> IngestRequest {
		IngestRequest {
			user_id: "u1".to_owned(),
			client_activity_id: client_id.to_owned(),
			activity_type: ActivityType::Running,
			title: "Morning run".to_owned(),
			description: None,
			start_time: Utc2k::now(),
			samples: samples(n),
		}
	}

	#[test]
	fn t_ingest_creates_then_replays() {
		let store = MemStore::new();
		let kill = KillSwitch::default();

		let first = ingest(req("c1", 10), None, &store, &kill).unwrap();
		let IngestOutcome::Created(id1) = first else { panic!("expected Created") };

		let second = ingest(req("c1", 10), None, &store, &kill).unwrap();
		let IngestOutcome::Replayed(id2) = second else { panic!("expected Replayed") };

		assert_eq!(id1, id2);
	}

	#[test]
	fn t_ingest_rejects_too_few_samples() {
		let store = MemStore::new();
		let kill = KillSwitch::default();
		let err = ingest(req("c2", 1), None, &store, &kill).unwrap_err();
		assert_eq!(err, PipelineError::TooFewSamples);
	}

	#[test]
	fn t_ingest_rejects_non_monotone_timestamps() {
		let store = MemStore::new();
		let kill = KillSwitch::default();
		let mut request = req("c3", 5);
		request.samples[2].t_ms = 0;
		let err = ingest(request, None, &store, &kill).unwrap_err();
		assert!(matches!(err, PipelineError::InvalidInput(_)));
	}

	struct AlwaysFailsEnricher;
	impl RouteEnricher for AlwaysFailsEnricher {
		fn heights(&self, _polyline: &str) -> Result<Vec<Option<f64>>, EnrichmentError> { Err(EnrichmentError) }
	}

	#[test]
	fn t_ingest_survives_enrichment_failure() {
		let store = MemStore::new();
		let kill = KillSwitch::default();
		let outcome = ingest(req("c4", 10), Some(&AlwaysFailsEnricher), &store, &kill).unwrap();
		assert!(matches!(outcome, IngestOutcome::Created(_)));
	}
}
