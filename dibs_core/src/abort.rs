/*!
# DIBS: Kill Switch
*/

use std::sync::{
	Arc,
	atomic::{
		AtomicBool,
		Ordering::Acquire,
	},
};



#[derive(Debug, Clone)]
/// # Kill Switch.
///
/// A cooperative cancellation token for the activity stream pipeline. The
/// codec itself has no suspension points and never checks this; the
/// pipeline checks it only at channel boundaries (between C5/C6/C4 calls),
/// per the concurrency model's "cancellation is cooperative only at
/// channel boundaries" rule.
pub struct KillSwitch(Arc<AtomicBool>);

impl Default for KillSwitch {
	fn default() -> Self { Self(Arc::from(AtomicBool::new(false))) }
}

impl KillSwitch {
	#[must_use]
	/// # Killed?
	pub fn killed(&self) -> bool { self.0.load(Acquire) }

	#[must_use]
	/// # Inner Clone.
	///
	/// Return a cloned handle to the shared flag, e.g. to wire up a signal
	/// handler elsewhere.
	pub fn inner(&self) -> Arc<AtomicBool> { Arc::clone(&self.0) }
}
