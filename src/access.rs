//! Credential-mediated access to protected resources.
//!
//! The [`Dispatcher`] is the crate's main entry point: it resolves a credential,
//! looks up the matching provider descriptor, renders `{dotted.path}` template
//! placeholders, hands the request to the family's protocol handler, and
//! executes the prepared result on the configured transport.

pub mod template;

pub use template::*;

// self
use crate::{
	_prelude::*,
	credential::Credential,
	error::ConfigError,
	http::{AccessHttpClient, ResponseMetadata, ResponseMetadataSlot},
	obs::{self, OpKind, OpOutcome, OpSpan},
	provider::{DescriptorSource, ProviderRegistry},
	refresh::{CompletedRotation, RefreshMetrics},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Dispatcher specialized for the crate's default reqwest transport.
pub type ReqwestDispatcher = Dispatcher<ReqwestHttpClient>;

/// HTTP methods supported by the dispatcher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	/// `GET`.
	#[default]
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `DELETE`.
	Delete,
	/// `HEAD`.
	Head,
	/// `PATCH`.
	Patch,
}
impl HttpMethod {
	/// Returns the canonical uppercase method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Delete => "DELETE",
			HttpMethod::Head => "HEAD",
			HttpMethod::Patch => "PATCH",
		}
	}

	/// Whether parameters travel in the form body instead of the query string.
	pub const fn carries_params_in_body(self) -> bool {
		matches!(self, HttpMethod::Post | HttpMethod::Put)
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Normalized request handed to protocol handlers: query-less URL plus separate
/// parameter, header, and framing-parameter sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessRequest {
	/// Base URL with an empty query string.
	pub url: Url,
	/// HTTP method.
	pub method: HttpMethod,
	/// Query parameters (URL query merged with caller parameters).
	pub params: Vec<(String, String)>,
	/// Request headers.
	pub headers: Vec<(String, String)>,
	/// Transport-framing parameters (e.g. JSONP callbacks) that are appended to
	/// the request but excluded from request signing.
	pub framing_params: Vec<(String, String)>,
}

/// Per-call options for [`Dispatcher::access`].
#[derive(Clone, Debug, Default)]
pub struct AccessOptions {
	/// HTTP method; defaults to `GET`.
	pub method: HttpMethod,
	/// Caller parameters, merged over the URL's query string last-write-wins.
	pub params: Vec<(String, String)>,
	/// Extra request headers.
	pub headers: Vec<(String, String)>,
	/// Substitution context for `{dotted.path}` placeholders in the URL and
	/// parameter values.
	pub substitute: Option<serde_json::Value>,
	/// Framing parameters appended after signing.
	pub framing_params: Vec<(String, String)>,
}
impl AccessOptions {
	/// Creates empty options (`GET`, no parameters).
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the HTTP method.
	pub fn method(mut self, method: HttpMethod) -> Self {
		self.method = method;

		self
	}

	/// Appends a single parameter.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.push((key.into(), value.into()));

		self
	}

	/// Appends multiple parameters.
	pub fn params(
		mut self,
		params: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
	) -> Self {
		self.params.extend(params.into_iter().map(|(key, value)| (key.into(), value.into())));

		self
	}

	/// Appends a request header.
	pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((key.into(), value.into()));

		self
	}

	/// Sets the substitution context for template placeholders.
	pub fn substitute(mut self, context: serde_json::Value) -> Self {
		self.substitute = Some(context);

		self
	}

	/// Appends a framing parameter, excluded from signing.
	pub fn framing_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.framing_params.push((key.into(), value.into()));

		self
	}
}

/// Credential argument accepted by [`Dispatcher::access`]: either a live record
/// or its serialized string form.
#[derive(Clone, Debug)]
pub enum CredentialInput {
	/// A deserialized credential record.
	Record(Credential),
	/// A serialized credential produced by [`Credential::serialize`].
	Serialized(String),
}
impl CredentialInput {
	fn resolve(self) -> Result<Credential> {
		match self {
			Self::Record(credential) => Ok(credential),
			Self::Serialized(serialized) => Ok(Credential::deserialize(&serialized)?),
		}
	}
}
impl From<Credential> for CredentialInput {
	fn from(credential: Credential) -> Self {
		Self::Record(credential)
	}
}
impl From<&Credential> for CredentialInput {
	fn from(credential: &Credential) -> Self {
		Self::Record(credential.clone())
	}
}
impl From<String> for CredentialInput {
	fn from(serialized: String) -> Self {
		Self::Serialized(serialized)
	}
}
impl From<&str> for CredentialInput {
	fn from(serialized: &str) -> Self {
		Self::Serialized(serialized.to_owned())
	}
}

/// Response returned by [`Dispatcher::access`].
#[derive(Clone, Debug)]
pub struct AccessResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: Vec<(String, String)>,
	/// Raw response body.
	pub body: Vec<u8>,
	/// Transport metadata captured for the request, if the client recorded any.
	pub metadata: Option<ResponseMetadata>,
}
impl AccessResponse {
	/// Whether the status code is in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Interprets the body as UTF-8, lossily.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Deserializes the body as JSON.
	pub fn json<T>(&self) -> Result<T, serde_json::Error>
	where
		T: for<'de> Deserialize<'de>,
	{
		serde_json::from_slice(&self.body)
	}
}

/// Coordinates credential-mediated access against configured providers.
///
/// The dispatcher owns the HTTP client, descriptor source, and handler registry
/// so individual calls can focus on per-request inputs. It is cheap to clone and
/// safe to share across tasks.
#[derive(Clone)]
pub struct Dispatcher<C>
where
	C: ?Sized + AccessHttpClient,
{
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
	/// Descriptor source consulted once per call.
	pub descriptors: Arc<dyn DescriptorSource>,
	/// Family-to-handler registry.
	pub registry: ProviderRegistry,
	/// Shared metrics recorder for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	pub(crate) refresh_guards: Arc<Mutex<HashMap<u32, Arc<AsyncMutex<()>>>>>,
	pub(crate) refresh_rotations: Arc<Mutex<HashMap<u32, CompletedRotation>>>,
}
impl<C> Dispatcher<C>
where
	C: ?Sized + AccessHttpClient,
{
	/// Creates a dispatcher that reuses the caller-provided transport.
	pub fn with_http_client(
		descriptors: Arc<dyn DescriptorSource>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			descriptors,
			registry: ProviderRegistry::new(),
			refresh_metrics: Default::default(),
			refresh_guards: Default::default(),
			refresh_rotations: Default::default(),
		}
	}

	/// Replaces the handler registry.
	pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
		self.registry = registry;

		self
	}

	/// Accesses a protected resource on behalf of a credential.
	///
	/// `credential` accepts both live [`Credential`] records and their serialized
	/// string form. The URL and every parameter value may carry `{dotted.path}`
	/// placeholders rendered from [`AccessOptions::substitute`]; the URL's own
	/// query string is merged with [`AccessOptions::params`] last-write-wins
	/// before the protocol handler attaches proof-of-authorization.
	pub async fn access(
		&self,
		credential: impl Into<CredentialInput>,
		url: &str,
		options: AccessOptions,
	) -> Result<AccessResponse> {
		const KIND: OpKind = OpKind::Access;

		let span = OpSpan::new(KIND, "access");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let credential = credential.into();
		let result = span
			.instrument(async move {
				let credential = credential.resolve()?;
				let descriptor = self
					.descriptors
					.descriptor(credential.id)
					.ok_or(ConfigError::UnknownProvider { id: credential.id })?;
				let request = assemble_request(url, &options)?;
				let prepared = self
					.registry
					.resolve(credential.family())
					.prepare(&request, &credential, &descriptor)?;
				let slot = ResponseMetadataSlot::default();
				let response = self.http_client.execute(prepared, slot.clone()).await?;

				Ok(AccessResponse {
					status: response.status,
					headers: response.headers,
					body: response.body,
					metadata: slot.take(),
				})
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl Dispatcher<ReqwestHttpClient> {
	/// Creates a dispatcher backed by a default reqwest transport.
	pub fn new(descriptors: Arc<dyn DescriptorSource>) -> Self {
		Self::with_http_client(descriptors, ReqwestHttpClient::default())
	}
}
impl<C> Debug for Dispatcher<C>
where
	C: ?Sized + AccessHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher").field("registry", &self.registry).finish_non_exhaustive()
	}
}

/// Renders template placeholders, splits the URL's query string off, and merges
/// caller parameters over it last-write-wins.
fn assemble_request(url: &str, options: &AccessOptions) -> Result<AccessRequest> {
	let rendered = match &options.substitute {
		Some(context) => template::substitute(url, context)?,
		None => url.to_owned(),
	};
	let mut parsed =
		Url::parse(&rendered).map_err(|source| ConfigError::InvalidUrl { source })?;
	let mut params: Vec<(String, String)> =
		parsed.query_pairs().map(|(key, value)| (key.into_owned(), value.into_owned())).collect();

	parsed.set_query(None);

	for (key, value) in &options.params {
		let value = match &options.substitute {
			Some(context) => template::substitute(value, context)?,
			None => value.clone(),
		};

		merge_param(&mut params, key, value);
	}

	Ok(AccessRequest {
		url: parsed,
		method: options.method,
		params,
		headers: options.headers.clone(),
		framing_params: options.framing_params.clone(),
	})
}

fn merge_param(params: &mut Vec<(String, String)>, key: &str, value: String) {
	if let Some(slot) = params.iter_mut().find(|(k, _)| k == key) {
		slot.1 = value;
	} else {
		params.push((key.to_owned(), value));
	}
}
