// self
use credential_broker::{
	credential::{Credential, CredentialPayload, ProviderFamily, ProviderTypeId, TokenStyle},
	store::{CredentialStore, MemoryStore, StoreKey},
};

fn oauth2_credential(access: &str) -> Credential {
	Credential::new(
		1,
		ProviderTypeId::new(ProviderFamily::OAuth2, 1),
		CredentialPayload::OAuth2 {
			access_token: access.into(),
			refresh_token: Some("refresh-1".into()),
			expires_at: None,
			token_style: TokenStyle::Bearer,
		},
	)
}

fn oauth1_credential() -> Credential {
	Credential::new(
		2,
		ProviderTypeId::new(ProviderFamily::OAuth1, 5),
		CredentialPayload::OAuth1 { token: "token".into(), token_secret: "secret".into() },
	)
}

#[tokio::test]
async fn save_and_fetch_round_trip() {
	let store = MemoryStore::default();
	let key = StoreKey::new(1, "alice");
	let credential = oauth2_credential("access-1");

	store
		.save(&key, &credential)
		.await
		.expect("Saving credential fixture into memory store should succeed.");

	let fetched = store
		.fetch(&key)
		.await
		.expect("Fetching credential from memory store should succeed.")
		.expect("Stored credential should remain present.");

	assert_eq!(fetched, credential);
}

#[tokio::test]
async fn save_replaces_existing_credentials() {
	let store = MemoryStore::default();
	let key = StoreKey::new(1, "alice");

	store
		.save(&key, &oauth2_credential("access-old"))
		.await
		.expect("First save should succeed.");
	store
		.save(&key, &oauth2_credential("access-new"))
		.await
		.expect("Second save should succeed.");

	let fetched = store
		.fetch(&key)
		.await
		.expect("Fetch after replacement should succeed.")
		.expect("Replaced credential should remain present.");

	assert_eq!(fetched.access_token(), Some("access-new"));
}

#[tokio::test]
async fn keys_partition_by_provider_and_subject() {
	let store = MemoryStore::default();

	store
		.save(&StoreKey::new(1, "alice"), &oauth2_credential("access-1"))
		.await
		.expect("Saving the OAuth 2.0 fixture should succeed.");
	store
		.save(&StoreKey::new(2, "alice"), &oauth1_credential())
		.await
		.expect("Saving the OAuth 1.0a fixture should succeed.");

	let missing = store
		.fetch(&StoreKey::new(1, "bob"))
		.await
		.expect("Fetching an absent subject should succeed.");

	assert!(missing.is_none());

	let oauth1 = store
		.fetch(&StoreKey::new(2, "alice"))
		.await
		.expect("Fetching the OAuth 1.0a fixture should succeed.")
		.expect("OAuth 1.0a fixture should remain present.");

	assert_eq!(oauth1.family(), ProviderFamily::OAuth1);
}

#[tokio::test]
async fn remove_returns_the_stored_credential() {
	let store = MemoryStore::default();
	let key = StoreKey::new(1, "alice");
	let credential = oauth2_credential("access-1");

	store.save(&key, &credential).await.expect("Save should succeed.");

	let removed = store
		.remove(&key)
		.await
		.expect("Removal should succeed.")
		.expect("Removal should return the stored credential.");

	assert_eq!(removed, credential);
	assert!(store.fetch(&key).await.expect("Fetch after removal should succeed.").is_none());
	assert!(store.remove(&key).await.expect("Second removal should succeed.").is_none());
}
