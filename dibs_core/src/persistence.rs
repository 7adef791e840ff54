/*!
# DIBS: Persistence (A2)

Atomic, idempotent file helpers standing in for "the object store and
database" of spec §5/§6. A real deployment would swap this for an actual
object store and relational table; this module exists so the crate has
something concrete and testable backing [`crate::ingest::ActivityStore`].
*/

use std::{
	path::{Path, PathBuf},
	sync::OnceLock,
};

use crate::{
	error::PipelineError,
	pipeline::{IndexBy, StreamLod, StreamRecord},
};

/// # Persistence Root Directory Name.
const STORE_BASE: &str = "_dibs";

/// # Persistence Root.
static STORE_ROOT: OnceLock<Option<PathBuf>> = OnceLock::new();

/// # Persistence Root.
///
/// Return the canonical store root (`CWD/_dibs`), creating it if it
/// doesn't already exist.
///
/// ## Errors
/// Returns [`PipelineError::Bug`] if the current directory can't be
/// determined or the root can't be created.
fn store_root() -> Result<&'static Path, PipelineError> {
	let out = STORE_ROOT.get_or_init(|| {
		let dir = std::env::current_dir().ok()?;
		if !dir.is_dir() { return None; }

		let dir = dir.join(STORE_BASE);
		if !dir.is_dir() {
			std::fs::create_dir_all(&dir).ok()?;
		}

		std::fs::canonicalize(dir).ok()
	})
		.as_deref()
		.ok_or(PipelineError::Bug("persistence root unavailable"))?;

	if out.is_dir() { Ok(out) }
	else {
		#[cfg(feature = "bin")]
		fyi_msg::Msg::warning(format!("The {STORE_BASE} store directory has vanished!")).eprint();

		std::fs::create_dir_all(out).map_err(|_| PipelineError::Bug("persistence root unavailable"))?;
		if out.is_dir() { Ok(out) }
		else { Err(PipelineError::Bug("persistence root unavailable")) }
	}
}

/// # Store Path.
///
/// Glue a relative path onto the store root.
///
/// ## Errors
/// See [`store_root`].
fn store_path<P: AsRef<Path>>(src: P) -> Result<PathBuf, PipelineError> {
	store_root().map(|root| root.join(src))
}

/// # Store Read.
///
/// Read a file from the store, if it exists. `src` must be relative to
/// the store root.
///
/// ## Errors
/// See [`store_root`]. A missing or empty file is not an error — it is
/// reported as `Ok(None)`.
fn store_read<P: AsRef<Path>>(src: P) -> Result<Option<Vec<u8>>, PipelineError> {
	let path = store_path(src)?;
	Ok(std::fs::read(path).ok().filter(|v| !v.is_empty()))
}

/// # Store Write.
///
/// Atomically write (or replace) a file in the store. `dst` must be
/// relative to the store root.
///
/// ## Errors
/// See [`store_root`], plus [`PipelineError::ProcessingError`] if the
/// underlying atomic write fails.
fn store_write<P: AsRef<Path>>(dst: P, data: &[u8]) -> Result<(), PipelineError> {
	let path = store_path(dst)?;
	write_atomic::write_file(&path, data)
		.map_err(|_| PipelineError::ProcessingError("Persisted"))
}

/// # Record File Name.
///
/// `(activity_id, lod, index_by)` is the stream record's primary key
/// (spec §3); this just turns that tuple into a stable relative path.
fn record_file_name(activity_id: &str, lod: StreamLod, index_by: IndexBy) -> String {
	let lod = match lod {
		StreamLod::Medium => "medium",
		StreamLod::Low => "low",
		StreamLod::Full => "full",
	};
	let index_by = match index_by {
		IndexBy::Distance => "distance",
		IndexBy::Time => "time",
	};
	format!("{activity_id}.{lod}.{index_by}.json")
}

/// # Persist Stream Record.
///
/// Serializes `record` to JSON and writes it atomically, keyed by its
/// `(activity_id, lod, index_by)`. This is the pipeline's `Persisted`
/// step (spec §4.2.4) — the last write, and the only one that must
/// succeed for the record to exist at all.
///
/// ## Errors
/// [`PipelineError::ProcessingError`] ("Persisted") on any I/O or
/// serialization failure.
pub fn persist_stream_record(record: &StreamRecord) -> Result<(), PipelineError> {
	let name = record_file_name(&record.activity_id, record.lod, record.index_by);
	let bytes = serde_json::to_vec(record).map_err(|_| PipelineError::ProcessingError("Persisted"))?;
	store_write(name, &bytes)
}

/// # Load Stream Record.
///
/// ## Errors
/// [`PipelineError::ProcessingError`] ("Persisted") if a record exists
/// but fails to deserialize.
pub fn load_stream_record(activity_id: &str, lod: StreamLod, index_by: IndexBy) -> Result<Option<StreamRecord>, PipelineError> {
	let name = record_file_name(activity_id, lod, index_by);
	match store_read(name)? {
		None => Ok(None),
		Some(bytes) => serde_json::from_slice(&bytes)
			.map(Some)
			.map_err(|_| PipelineError::ProcessingError("Persisted")),
	}
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::pipeline::CodecMeta;
	use utc2k::Utc2k;

	fn sample_record() -> StreamRecord {
		let now = Utc2k::now();
		StreamRecord {
			activity_id: format!("test-activity-{:?}", std::thread::current().id()),
			lod: StreamLod::Medium,
			index_by: IndexBy::Distance,
			num_points: 3,
			original_num_points: 3,
			time_s_bytes: vec![1, 2, 3],
			distance_m_bytes: vec![4, 5, 6],
			speed_mps_bytes: vec![7, 8, 9],
			elevation_m_bytes: None,
			codec: CodecMeta { name: "dibs".to_owned(), version: 1, decimal_places: 2, endianness: "le".to_owned() },
			created_at: now,
			updated_at: now,
		}
	}

	#[test]
	fn t_persist_and_load_roundtrip() {
		let record = sample_record();
		persist_stream_record(&record).expect("persist failed");

		let loaded = load_stream_record(&record.activity_id, record.lod, record.index_by)
			.expect("load failed")
			.expect("record should exist");

		assert_eq!(loaded.activity_id, record.activity_id);
		assert_eq!(loaded.num_points, record.num_points);
		assert_eq!(loaded.time_s_bytes, record.time_s_bytes);
	}

	#[test]
	fn t_load_missing_returns_none() {
		let loaded = load_stream_record("does-not-exist-xyz", StreamLod::Medium, IndexBy::Distance).unwrap();
		assert!(loaded.is_none());
	}
}
