//! Thread-safe in-memory [`SessionStore`] for tests, demos, and short-lived processes.

// self
use crate::{
	_prelude::*,
	store::{SessionStore, StoreFuture},
};

/// Storage backend that keeps values in-process.
///
/// Clones share the same map, so a test can hand one clone to a session and inspect the other.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<HashMap<String, String>>>);
impl MemoryStore {
	/// Creates a store pre-populated with `entries`.
	pub fn with_entries<I, K, V>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let map = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

		Self(Arc::new(RwLock::new(map)))
	}

	/// Synchronous read used by tests and diagnostics.
	pub fn peek(&self, key: &str) -> Option<String> {
		self.0.read().get(key).cloned()
	}

	/// Number of stored keys.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl SessionStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(key).cloned()) })
	}

	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key.to_owned(), value);

			Ok(())
		})
	}

	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().remove(key);

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn clones_share_state() {
		let store = MemoryStore::default();
		let observer = store.clone();

		store.set("access_token", "A1".into()).await.expect("Set should succeed.");

		assert_eq!(observer.peek("access_token").as_deref(), Some("A1"));
		assert_eq!(
			observer.get("access_token").await.expect("Get should succeed.").as_deref(),
			Some("A1")
		);

		observer.remove("access_token").await.expect("Remove should succeed.");
		observer.remove("access_token").await.expect("Removing a missing key should succeed.");

		assert!(store.is_empty());
	}
}
