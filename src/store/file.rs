//! Simple file-backed [`CredentialStore`] for lightweight deployments and bots.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	credential::Credential,
	store::{CredentialStore, StoreError, StoreFuture, StoreKey},
};

/// Persists credentials to a JSON snapshot after each mutation.
///
/// The snapshot maps key fingerprints onto serialized credentials, so subjects
/// never reach the disk in plain text. Writes go through a temporary file and an
/// atomic rename.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<HashMap<String, String>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = if path.exists() { Self::load_snapshot(&path)? } else { HashMap::new() };

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	fn load_snapshot(path: &Path) -> Result<HashMap<String, String>, StoreError> {
		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let entries: Vec<(String, String)> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(entries.into_iter().collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}
		Ok(())
	}

	fn persist_locked(&self, contents: &HashMap<String, String>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let snapshot: Vec<_> = contents.iter().collect();
		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn decode(serialized: &str) -> Result<Credential, StoreError> {
		Credential::deserialize(serialized)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })
	}
}
impl CredentialStore for FileStore {
	fn save<'a>(&'a self, key: &'a StoreKey, credential: &'a Credential) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let serialized = credential
				.serialize()
				.map_err(|e| StoreError::Serialization { message: e.to_string() })?;
			let fingerprint = key.fingerprint();
			let mut guard = self.inner.write();
			let previous = guard.insert(fingerprint.clone(), serialized);

			if let Err(e) = self.persist_locked(&guard) {
				// Roll back so memory matches what a reopened store would see.
				match previous {
					Some(value) => guard.insert(fingerprint, value),
					None => guard.remove(&fingerprint),
				};

				return Err(e);
			}

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<Credential>> {
		Box::pin(async move {
			self.inner.read().get(&key.fingerprint()).map(|s| Self::decode(s)).transpose()
		})
	}

	fn remove<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<Credential>> {
		Box::pin(async move {
			let fingerprint = key.fingerprint();
			let mut guard = self.inner.write();
			let Some(removed) = guard.remove(&fingerprint) else {
				return Ok(None);
			};

			if let Err(e) = self.persist_locked(&guard) {
				// Roll back, otherwise a reopened store resurrects the entry.
				guard.insert(fingerprint, removed);

				return Err(e);
			}

			Self::decode(&removed).map(Some)
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::credential::{CredentialPayload, ProviderFamily, ProviderTypeId, TokenStyle};

	fn temp_path() -> PathBuf {
		let unique = format!(
			"credential_broker_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn build_credential() -> Credential {
		Credential::new(
			3,
			ProviderTypeId::new(ProviderFamily::OAuth2, 1),
			CredentialPayload::OAuth2 {
				access_token: "access-token".into(),
				refresh_token: Some("refresh-token".into()),
				expires_at: None,
				token_style: TokenStyle::Bearer,
			},
		)
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let key = StoreKey::new(3, "alice");
		let credential = build_credential();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(&key, &credential))
			.expect("Failed to save fixture credential to file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.fetch(&key))
			.expect("Failed to fetch fixture credential from file store.")
			.expect("File store lost credential after reopen.");

		assert_eq!(fetched, credential);

		let raw = fs::read_to_string(&path).expect("Snapshot file should be readable.");

		assert!(!raw.contains("alice"), "subject should not reach the disk in plain text");

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn failed_snapshot_writes_keep_memory_and_disk_consistent() {
		let path = temp_path();
		let tmp_path = path.with_extension("tmp");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let key = StoreKey::new(3, "alice");
		let credential = build_credential();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(&key, &credential))
			.expect("Failed to save fixture credential to file store.");
		// Occupying the temporary path makes the next snapshot write fail.
		fs::create_dir(&tmp_path).expect("Temporary snapshot path should be free.");

		rt.block_on(store.remove(&key))
			.expect_err("Removal should fail while the snapshot cannot be written.");

		let kept = rt
			.block_on(store.fetch(&key))
			.expect("Fetch after a failed removal should succeed.")
			.expect("Entry should survive a failed removal.");

		assert_eq!(kept, credential);

		fs::remove_dir(&tmp_path).expect("Failed to unblock the temporary snapshot path.");

		rt.block_on(store.remove(&key))
			.expect("Removal should succeed once the snapshot is writable.")
			.expect("Removed entry should decode.");

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");

		assert!(
			rt.block_on(reopened.fetch(&key))
				.expect("Fetch from the reopened store should succeed.")
				.is_none(),
			"removed entry should stay gone after reopening",
		);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
