//! Provider descriptor data structures and configuration lookup contracts.
//!
//! A descriptor captures the static, application-owned half of a provider
//! integration (consumer keys, realm, token endpoint) while the [`Credential`]
//! carries the per-user half. Descriptors are looked up by provider instance id
//! at dispatch time.
//!
//! [`Credential`]: crate::credential::Credential

// self
use crate::{_prelude::*, credential::ProviderTypeId};

/// Errors produced by [`ProviderDescriptorBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// OAuth 1.0a descriptors must carry a consumer key.
	#[error("OAuth 1.0a descriptors require a consumer key.")]
	MissingConsumerKey,
	/// OAuth 1.0a descriptors must carry a consumer secret.
	#[error("OAuth 1.0a descriptors require a consumer secret.")]
	MissingConsumerSecret,
}

/// Immutable static configuration for one provider instance.
///
/// Multiple instances of the same provider family can coexist under distinct ids
/// (e.g., two OAuth 2.0 apps registered with the same upstream service).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Provider instance identifier matched against [`Credential::id`].
	///
	/// [`Credential::id`]: crate::credential::Credential::id
	pub id: u32,
	/// Provider family + subtype tag.
	pub provider: ProviderTypeId,
	/// Application (consumer) key registered with the provider.
	pub consumer_key: Option<String>,
	/// Application (consumer) secret registered with the provider.
	pub consumer_secret: Option<String>,
	/// Scopes requested during authorization; informational at dispatch time.
	pub scope: Vec<String>,
	/// OAuth 1.0a protection realm; when set, protocol parameters travel in an
	/// `Authorization` header instead of the query/body.
	pub realm: Option<String>,
	/// Token endpoint used for OAuth 2.0 credential refreshes.
	pub token_endpoint: Option<Url>,
	/// Marks OAuth 2.0 instances accessed across origins, where custom headers
	/// cannot be attached; forces parameter-style token passing.
	pub cross_domain: bool,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided instance id and type tag.
	pub fn builder(id: u32, provider: ProviderTypeId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id, provider)
	}
}

/// Builder for [`ProviderDescriptor`].
#[derive(Clone, Debug)]
pub struct ProviderDescriptorBuilder {
	id: u32,
	provider: ProviderTypeId,
	consumer_key: Option<String>,
	consumer_secret: Option<String>,
	scope: Vec<String>,
	realm: Option<String>,
	token_endpoint: Option<Url>,
	cross_domain: bool,
}
impl ProviderDescriptorBuilder {
	fn new(id: u32, provider: ProviderTypeId) -> Self {
		Self {
			id,
			provider,
			consumer_key: None,
			consumer_secret: None,
			scope: Vec::new(),
			realm: None,
			token_endpoint: None,
			cross_domain: false,
		}
	}

	/// Sets the consumer key.
	pub fn consumer_key(mut self, key: impl Into<String>) -> Self {
		self.consumer_key = Some(key.into());

		self
	}

	/// Sets the consumer secret.
	pub fn consumer_secret(mut self, secret: impl Into<String>) -> Self {
		self.consumer_secret = Some(secret.into());

		self
	}

	/// Replaces the requested scope list.
	pub fn scope(mut self, scope: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.scope = scope.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the OAuth 1.0a protection realm.
	pub fn realm(mut self, realm: impl Into<String>) -> Self {
		self.realm = Some(realm.into());

		self
	}

	/// Sets the token endpoint used for refreshes.
	pub fn token_endpoint(mut self, endpoint: Url) -> Self {
		self.token_endpoint = Some(endpoint);

		self
	}

	/// Marks the instance as cross-domain capable.
	pub fn cross_domain(mut self, cross_domain: bool) -> Self {
		self.cross_domain = cross_domain;

		self
	}

	/// Consumes the builder and validates family-specific requirements.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		if self.provider.family == crate::credential::ProviderFamily::OAuth1 {
			if self.consumer_key.as_deref().is_none_or(str::is_empty) {
				return Err(ProviderDescriptorError::MissingConsumerKey);
			}
			if self.consumer_secret.as_deref().is_none_or(str::is_empty) {
				return Err(ProviderDescriptorError::MissingConsumerSecret);
			}
		}

		Ok(ProviderDescriptor {
			id: self.id,
			provider: self.provider,
			consumer_key: self.consumer_key,
			consumer_secret: self.consumer_secret,
			scope: self.scope,
			realm: self.realm,
			token_endpoint: self.token_endpoint,
			cross_domain: self.cross_domain,
		})
	}
}

/// Configuration lookup contract mapping provider instance ids onto descriptors.
///
/// Implementations are expected to be cheap; the dispatcher performs one lookup
/// per `access` call.
pub trait DescriptorSource: Send + Sync {
	/// Returns the descriptor configured for the provided instance id, if any.
	fn descriptor(&self, id: u32) -> Option<ProviderDescriptor>;
}

/// In-memory [`DescriptorSource`] backed by a plain map.
#[derive(Clone, Debug, Default)]
pub struct MapDescriptorSource(HashMap<u32, ProviderDescriptor>);
impl MapDescriptorSource {
	/// Builds a source from an iterator of descriptors, keyed by their ids.
	pub fn new(descriptors: impl IntoIterator<Item = ProviderDescriptor>) -> Self {
		Self(descriptors.into_iter().map(|descriptor| (descriptor.id, descriptor)).collect())
	}

	/// Inserts or replaces a descriptor.
	pub fn insert(&mut self, descriptor: ProviderDescriptor) {
		self.0.insert(descriptor.id, descriptor);
	}
}
impl DescriptorSource for MapDescriptorSource {
	fn descriptor(&self, id: u32) -> Option<ProviderDescriptor> {
		self.0.get(&id).cloned()
	}
}
