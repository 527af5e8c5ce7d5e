//! Shared credential slot with singleflight renewal.

// self
use crate::_prelude::*;

/// Holds one credential and serializes its renewal.
///
/// Readers take a snapshot under a short read lock. Callers that find the credential stale queue
/// on the async renewal guard; once inside they compare the slot generation with the one they
/// observed, and reuse the credential installed while they waited instead of renewing again.
#[derive(Debug)]
pub(crate) struct CredentialCell<T> {
	slot: RwLock<CredentialSlot<T>>,
	renewal: AsyncMutex<()>,
}
impl<T> CredentialCell<T>
where
	T: Clone,
{
	pub(crate) fn new() -> Self {
		let slot = CredentialSlot { generation: 0, current: None };

		Self { slot: RwLock::new(slot), renewal: AsyncMutex::new(()) }
	}

	/// Returns a copy of the installed credential, if any.
	pub(crate) fn snapshot(&self) -> Option<T> {
		self.slot.read().current.clone()
	}

	/// Replaces the installed credential outright.
	pub(crate) fn install(&self, credential: T) {
		self.slot.write().replace(credential);
	}

	/// Returns the installed credential when `is_fresh` accepts it, otherwise renews it once for
	/// every caller that observed the same stale generation.
	pub(crate) async fn fresh_or_renew<E, Fresh, Renew, Fut>(
		&self,
		is_fresh: Fresh,
		renew: Renew,
	) -> Result<T, E>
	where
		Fresh: Fn(&T) -> bool,
		Renew: FnOnce() -> Fut,
		Fut: Future<Output = Result<T, E>>,
	{
		let observed = {
			let slot = self.slot.read();

			if let Some(current) = slot.current.as_ref().filter(|current| is_fresh(current)) {
				return Ok(current.clone());
			}

			slot.generation
		};
		let _renewal = self.renewal.lock().await;

		if let Some(current) = self.slot.read().renewed_since(observed) {
			return Ok(current);
		}

		let renewed = renew().await?;

		self.slot.write().replace(renewed.clone());

		Ok(renewed)
	}
}

#[derive(Debug)]
struct CredentialSlot<T> {
	generation: u64,
	current: Option<T>,
}
impl<T> CredentialSlot<T>
where
	T: Clone,
{
	fn replace(&mut self, credential: T) {
		self.generation += 1;
		self.current = Some(credential);
	}

	fn renewed_since(&self, observed: u64) -> Option<T> {
		if self.generation == observed {
			return None;
		}

		self.current.clone()
	}
}
