//! OAuth 1.0a request signer (HMAC-SHA1, RFC 5849).

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use rand::{Rng, distr::Alphanumeric};
use sha1::Sha1;
// self
use crate::{
	_prelude::*,
	access::AccessRequest,
	credential::{Credential, CredentialPayload, codec},
	error::ConfigError,
	handler::{InvalidCredentialError, PreparedRequest, ProtocolHandler},
	provider::ProviderDescriptor,
};

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// Signs requests with the two-secret OAuth 1.0a scheme.
///
/// The signature base string covers the caller's parameters and the protocol
/// parameters; framing parameters are excluded from signing and appended only to
/// the transport parameter set. When the descriptor carries a realm, every
/// `oauth_*` parameter travels in an `Authorization: OAuth` header instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct Oauth1Handler;
impl ProtocolHandler for Oauth1Handler {
	fn prepare(
		&self,
		request: &AccessRequest,
		credential: &Credential,
		descriptor: &ProviderDescriptor,
	) -> Result<PreparedRequest> {
		prepare_with_material(request, credential, descriptor, SignatureMaterial::generate())
	}
}

/// Per-request signing inputs, split out so signatures are reproducible in tests.
struct SignatureMaterial {
	nonce: String,
	timestamp: i64,
}
impl SignatureMaterial {
	fn generate() -> Self {
		Self {
			nonce: rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect(),
			timestamp: OffsetDateTime::now_utc().unix_timestamp(),
		}
	}
}

fn prepare_with_material(
	request: &AccessRequest,
	credential: &Credential,
	descriptor: &ProviderDescriptor,
	material: SignatureMaterial,
) -> Result<PreparedRequest> {
	let CredentialPayload::OAuth1 { token, token_secret } = &credential.payload else {
		return Err(InvalidCredentialError::FamilyMismatch { family: "oauth1" }.into());
	};

	if token.is_empty() {
		return Err(InvalidCredentialError::MissingAccessToken.into());
	}
	if token_secret.is_empty() {
		return Err(InvalidCredentialError::MissingTokenSecret.into());
	}

	let consumer_key = descriptor
		.consumer_key
		.as_deref()
		.filter(|key| !key.is_empty())
		.ok_or(ConfigError::MissingConsumerKey { id: descriptor.id })?;
	let consumer_secret = descriptor
		.consumer_secret
		.as_deref()
		.filter(|secret| !secret.is_empty())
		.ok_or(ConfigError::MissingConsumerSecret { id: descriptor.id })?;
	let mut oauth_params = vec![
		("oauth_consumer_key".to_owned(), consumer_key.to_owned()),
		("oauth_token".to_owned(), token.clone()),
		("oauth_signature_method".to_owned(), SIGNATURE_METHOD.to_owned()),
		("oauth_timestamp".to_owned(), material.timestamp.to_string()),
		("oauth_nonce".to_owned(), material.nonce),
		("oauth_version".to_owned(), OAUTH_VERSION.to_owned()),
	];
	// Framing parameters are transport-only and never enter the base string.
	let mut signed_params = request.params.clone();

	signed_params.extend(oauth_params.iter().cloned());

	let base_string = signature_base_string(request.method.as_str(), &request.url, &signed_params);
	let signature = sign(&base_string, consumer_secret, token_secret);

	oauth_params.push(("oauth_signature".to_owned(), signature));

	let mut params = request.params.clone();
	let mut headers = request.headers.clone();

	if let Some(realm) = &descriptor.realm {
		headers.push(("Authorization".to_owned(), authorization_header(realm, &oauth_params)));
	} else {
		params.extend(oauth_params);
	}

	params.extend(request.framing_params.iter().cloned());

	let (params, body_params) = if request.method.carries_params_in_body() {
		(Vec::new(), params)
	} else {
		(params, Vec::new())
	};

	Ok(PreparedRequest {
		url: request.url.clone(),
		method: request.method,
		params,
		body_params,
		headers,
	})
}

/// Builds the RFC 5849 §3.4.1 signature base string: method, base URL, and the
/// percent-encoded parameter pairs sorted by encoded key then value.
fn signature_base_string(method: &str, url: &Url, params: &[(String, String)]) -> String {
	let mut encoded: Vec<(String, String)> = params
		.iter()
		.map(|(key, value)| (codec::escape(key), codec::escape(value)))
		.collect();

	encoded.sort();

	let normalized = encoded
		.iter()
		.map(|(key, value)| format!("{key}={value}"))
		.collect::<Vec<_>>()
		.join("&");

	format!("{method}&{}&{}", codec::escape(url.as_str()), codec::escape(&normalized))
}

fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> String {
	let key = format!("{}&{}", codec::escape(consumer_secret), codec::escape(token_secret));
	// HMAC accepts keys of any length, so construction cannot fail.
	let mut mac = <Hmac<Sha1> as Mac>::new_from_slice(key.as_bytes())
		.expect("HMAC-SHA1 should accept keys of any length.");

	mac.update(base_string.as_bytes());

	STANDARD.encode(mac.finalize().into_bytes())
}

fn authorization_header(realm: &str, oauth_params: &[(String, String)]) -> String {
	let mut fields = vec![format!("realm=\"{}\"", codec::escape(realm))];

	fields.extend(
		oauth_params
			.iter()
			.map(|(key, value)| format!("{key}=\"{}\"", codec::escape(value))),
	);

	format!("OAuth {}", fields.join(", "))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		access::HttpMethod,
		credential::{ProviderFamily, ProviderTypeId},
	};

	fn credential() -> Credential {
		Credential::new(
			3,
			ProviderTypeId::new(ProviderFamily::OAuth1, 5),
			CredentialPayload::OAuth1 { token: "user-token".into(), token_secret: "shh".into() },
		)
	}

	fn descriptor(realm: Option<&str>) -> ProviderDescriptor {
		let mut builder =
			ProviderDescriptor::builder(3, ProviderTypeId::new(ProviderFamily::OAuth1, 5))
				.consumer_key("app-key")
				.consumer_secret("app-secret");

		if let Some(realm) = realm {
			builder = builder.realm(realm);
		}

		builder.build().expect("OAuth 1.0a descriptor fixture should build.")
	}

	fn request(framing_params: Vec<(String, String)>) -> AccessRequest {
		AccessRequest {
			url: Url::parse("https://api.example/photos").expect("Fixture URL should parse."),
			method: HttpMethod::Get,
			params: vec![("size".into(), "large".into())],
			headers: Vec::new(),
			framing_params,
		}
	}

	fn material() -> SignatureMaterial {
		SignatureMaterial { nonce: "fixed-nonce".into(), timestamp: 1_700_000_000 }
	}

	fn signature_of(prepared: &PreparedRequest) -> String {
		prepared
			.params
			.iter()
			.find(|(key, _)| key == "oauth_signature")
			.map(|(_, value)| value.clone())
			.expect("Signed request should carry an oauth_signature parameter.")
	}

	#[test]
	fn base_string_sorts_and_escapes_parameters() {
		let url = Url::parse("https://api.example/r").expect("Fixture URL should parse.");
		let params =
			vec![("b".to_owned(), "2".to_owned()), ("a".to_owned(), "1 x".to_owned())];

		assert_eq!(
			signature_base_string("GET", &url, &params),
			"GET&https%3A%2F%2Fapi.example%2Fr&a%3D1%2520x%26b%3D2",
		);
	}

	#[test]
	fn framing_params_do_not_affect_the_signature() {
		let plain = prepare_with_material(&request(Vec::new()), &credential(), &descriptor(None), material())
			.expect("Signing should succeed.");
		let framed = prepare_with_material(
			&request(vec![("callback".into(), "jsonp_7".into())]),
			&credential(),
			&descriptor(None),
			material(),
		)
		.expect("Signing should succeed.");

		assert_eq!(signature_of(&plain), signature_of(&framed));
		assert!(framed.params.contains(&("callback".to_owned(), "jsonp_7".to_owned())));
	}

	#[test]
	fn signature_covers_caller_parameters() {
		let plain = prepare_with_material(&request(Vec::new()), &credential(), &descriptor(None), material())
			.expect("Signing should succeed.");
		let mut altered_request = request(Vec::new());

		altered_request.params[0].1 = "small".into();

		let altered =
			prepare_with_material(&altered_request, &credential(), &descriptor(None), material())
				.expect("Signing should succeed.");

		assert_ne!(signature_of(&plain), signature_of(&altered));
	}

	#[test]
	fn realm_moves_protocol_parameters_into_the_header() {
		let prepared = prepare_with_material(
			&request(Vec::new()),
			&credential(),
			&descriptor(Some("https://api.example/")),
			material(),
		)
		.expect("Signing should succeed.");

		assert!(prepared.params.iter().all(|(key, _)| !key.starts_with("oauth_")));

		let (_, authorization) = prepared
			.headers
			.iter()
			.find(|(key, _)| key == "Authorization")
			.expect("Realm-scoped request should carry an Authorization header.");

		assert!(authorization.starts_with("OAuth realm=\""));
		assert!(authorization.contains("oauth_signature=\""));
		assert!(authorization.contains("oauth_nonce=\"fixed-nonce\""));
	}

	#[test]
	fn post_requests_move_parameters_into_the_body() {
		let mut request = request(Vec::new());

		request.method = HttpMethod::Post;

		let prepared =
			prepare_with_material(&request, &credential(), &descriptor(None), material())
				.expect("Signing should succeed.");

		assert!(prepared.params.is_empty());
		assert!(prepared.body_params.iter().any(|(key, _)| key == "oauth_signature"));
	}

	#[test]
	fn incomplete_credentials_are_rejected() {
		let mut credential = credential();

		if let CredentialPayload::OAuth1 { token_secret, .. } = &mut credential.payload {
			token_secret.clear();
		}

		let err =
			prepare_with_material(&request(Vec::new()), &credential, &descriptor(None), material())
				.expect_err("Missing token secret should be rejected.");

		assert!(matches!(
			err,
			Error::InvalidCredential(InvalidCredentialError::MissingTokenSecret),
		));
	}

	#[test]
	fn missing_consumer_pair_is_a_configuration_error() {
		let mut descriptor = descriptor(None);

		descriptor.consumer_secret = None;

		let err =
			prepare_with_material(&request(Vec::new()), &credential(), &descriptor, material())
				.expect_err("Missing consumer secret should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::MissingConsumerSecret { id: 3 })));
	}
}
