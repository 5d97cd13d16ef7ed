//! Canonical error taxonomy shared by the codec, handlers, dispatcher, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Codec, handler, and template errors are local and deterministic; they indicate
/// caller misuse or data corruption and are surfaced immediately. Transport errors
/// pass through unretried; retry policy belongs to the application.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Malformed serialized credential.
	#[error(transparent)]
	Decode(#[from] crate::credential::DecodeError),
	/// Structurally valid credential that is semantically incomplete for the operation.
	#[error(transparent)]
	InvalidCredential(#[from] crate::handler::InvalidCredentialError),
	/// Unresolvable template substitution path.
	#[error(transparent)]
	Template(#[from] crate::access::TemplateResolutionError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token-refresh round-trip failure.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}

/// Configuration and validation failures raised by the dispatcher.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No descriptor is configured for the credential's provider instance.
	#[error("No provider descriptor is configured for id {id}.")]
	UnknownProvider {
		/// Provider instance identifier.
		id: u32,
	},
	/// Target resource URL cannot be parsed.
	#[error("Access URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Descriptor lacks the consumer key required by the operation.
	#[error("Provider {id} descriptor is missing a consumer key.")]
	MissingConsumerKey {
		/// Provider instance identifier.
		id: u32,
	},
	/// Descriptor lacks the consumer secret required by the operation.
	#[error("Provider {id} descriptor is missing a consumer secret.")]
	MissingConsumerSecret {
		/// Provider instance identifier.
		id: u32,
	},
	/// Descriptor lacks a token endpoint, so the credential cannot be refreshed.
	#[error("Provider {id} descriptor is missing a token endpoint.")]
	MissingTokenEndpoint {
		/// Provider instance identifier.
		id: u32,
	},
}

/// Failures raised while exchanging a refresh token for a new payload.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint returned status {status}: {body_preview}.")]
	Endpoint {
		/// HTTP status code returned by the endpoint.
		status: u16,
		/// Truncated response body for diagnostics.
		body_preview: String,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Token endpoint omitted the replacement access token.
	#[error("Token endpoint response is missing an access token.")]
	MissingAccessToken,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while dispatching the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while dispatching the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
