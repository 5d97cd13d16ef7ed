//! Storage contracts and built-in store implementations for credentials.
//!
//! Stores persist credentials in their serialized string form, so anything the
//! codec round-trips can be stored and every backend shares one on-disk shape.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, credential::Credential};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for credentials.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the credential stored under `key`.
	fn save<'a>(&'a self, key: &'a StoreKey, credential: &'a Credential) -> StoreFuture<'a, ()>;

	/// Fetches the credential stored under `key`, if present.
	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<Credential>>;

	/// Removes and returns the credential stored under `key`, if present.
	fn remove<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<Credential>>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Unique key identifying a stored credential.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey {
	/// Provider instance the credential belongs to.
	pub provider_id: u32,
	/// Application-chosen subject (user id, bot name, ...).
	pub subject: String,
}
impl StoreKey {
	/// Builds a key for the provided provider instance and subject.
	pub fn new(provider_id: u32, subject: impl Into<String>) -> Self {
		Self { provider_id, subject: subject.into() }
	}

	/// Returns a stable, filesystem-safe digest of the key.
	///
	/// The fingerprint is a base64 (no padding, URL-safe) SHA-256 of the
	/// provider id and subject, so backends can index credentials without
	/// writing the subject itself to disk.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		hasher.update(self.provider_id.to_be_bytes());
		hasher.update([0]);
		hasher.update(self.subject.as_bytes());

		URL_SAFE_NO_PAD.encode(hasher.finalize())
	}
}
