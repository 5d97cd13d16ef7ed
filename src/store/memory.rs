//! Thread-safe in-memory [`CredentialStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	credential::Credential,
	store::{CredentialStore, StoreError, StoreFuture, StoreKey},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, String>>>;

/// Keeps serialized credentials in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	fn decode(serialized: &str) -> Result<Credential, StoreError> {
		Credential::deserialize(serialized)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })
	}
}
impl CredentialStore for MemoryStore {
	fn save<'a>(&'a self, key: &'a StoreKey, credential: &'a Credential) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			let serialized = credential
				.serialize()
				.map_err(|e| StoreError::Serialization { message: e.to_string() })?;

			map.write().insert(key.clone(), serialized);

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<Credential>> {
		let map = self.0.clone();

		Box::pin(async move { map.read().get(key).map(|s| Self::decode(s)).transpose() })
	}

	fn remove<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<Credential>> {
		let map = self.0.clone();

		Box::pin(async move { map.write().remove(key).map(|s| Self::decode(&s)).transpose() })
	}
}
