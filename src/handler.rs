//! Protocol handlers that attach proof-of-authorization to outbound requests.
//!
//! One handler exists per provider family. Handlers are pure transforms: they
//! never mutate the input request or credential, and they produce a
//! [`PreparedRequest`] ready for transport.

pub mod base;
pub mod oauth1;
pub mod oauth2;

pub use base::BaseHandler;
pub use oauth1::Oauth1Handler;
pub use oauth2::Oauth2Handler;

// self
use crate::{
	_prelude::*,
	access::{AccessRequest, HttpMethod},
	credential::Credential,
	provider::ProviderDescriptor,
};

/// Errors raised when a structurally valid credential is semantically incomplete
/// for the requested operation.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum InvalidCredentialError {
	/// The credential carries no access token.
	#[error("Credential is missing an access token.")]
	MissingAccessToken,
	/// The OAuth 1.0a credential carries no token secret.
	#[error("Credential is missing a token secret.")]
	MissingTokenSecret,
	/// The OAuth 2.0 credential carries no refresh token.
	#[error("Credential is missing a refresh token.")]
	MissingRefreshToken,
	/// The credential payload belongs to a different provider family.
	#[error("Credential payload does not match the {family} family.")]
	FamilyMismatch {
		/// Family label the handler expected.
		family: &'static str,
	},
}

/// Protocol-specific request augmentation contract.
pub trait ProtocolHandler: Send + Sync {
	/// Attaches proof-of-authorization from `credential` to `request`.
	///
	/// The descriptor supplies the application-owned half of the provider
	/// configuration (consumer pair, realm, cross-domain flag). Implementations
	/// must not mutate either input.
	fn prepare(
		&self,
		request: &AccessRequest,
		credential: &Credential,
		descriptor: &ProviderDescriptor,
	) -> Result<PreparedRequest>;
}

/// Finalized request ready for transport: query-less base URL, method, query and
/// body parameter sets, and headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedRequest {
	/// Base URL with an empty query string; query parameters live in `params`.
	pub url: Url,
	/// HTTP method.
	pub method: HttpMethod,
	/// Parameters sent in the query string.
	pub params: Vec<(String, String)>,
	/// Parameters sent as an `application/x-www-form-urlencoded` body.
	pub body_params: Vec<(String, String)>,
	/// Request headers.
	pub headers: Vec<(String, String)>,
}
impl PreparedRequest {
	/// Returns the URL with `params` appended as the query string.
	pub fn final_url(&self) -> Url {
		let mut url = self.url.clone();

		if !self.params.is_empty() {
			let mut pairs = url.query_pairs_mut();

			for (key, value) in &self.params {
				pairs.append_pair(key, value);
			}
		}

		url
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn final_url_appends_query_parameters() {
		let prepared = PreparedRequest {
			url: Url::parse("https://api.example/items").expect("Fixture URL should parse."),
			method: HttpMethod::Get,
			params: vec![("q".into(), "a b".into()), ("page".into(), "2".into())],
			body_params: Vec::new(),
			headers: Vec::new(),
		};

		assert_eq!(prepared.final_url().as_str(), "https://api.example/items?q=a+b&page=2");
	}

	#[test]
	fn final_url_leaves_bare_urls_untouched() {
		let prepared = PreparedRequest {
			url: Url::parse("https://api.example/items").expect("Fixture URL should parse."),
			method: HttpMethod::Post,
			params: Vec::new(),
			body_params: vec![("k".into(), "v".into())],
			headers: Vec::new(),
		};

		assert_eq!(prepared.final_url().as_str(), "https://api.example/items");
	}
}
