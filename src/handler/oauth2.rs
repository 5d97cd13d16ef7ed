//! OAuth 2.0 bearer-token handler.

// self
use crate::{
	_prelude::*,
	access::AccessRequest,
	credential::{Credential, CredentialPayload, TokenStyle},
	handler::{InvalidCredentialError, PreparedRequest, ProtocolHandler},
	provider::ProviderDescriptor,
};

/// Query/body parameter carrying the access token in parameter style.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Attaches an OAuth 2.0 access token to the request.
///
/// Bearer-style tokens travel in an `Authorization: Bearer` header unless the
/// descriptor is marked cross-domain, in which case custom headers cannot be
/// attached and the token falls back to the `access_token` parameter. For
/// `POST`/`PUT` requests every parameter moves into the form body.
#[derive(Clone, Copy, Debug, Default)]
pub struct Oauth2Handler;
impl ProtocolHandler for Oauth2Handler {
	fn prepare(
		&self,
		request: &AccessRequest,
		credential: &Credential,
		descriptor: &ProviderDescriptor,
	) -> Result<PreparedRequest> {
		let CredentialPayload::OAuth2 { access_token, token_style, .. } = &credential.payload
		else {
			return Err(InvalidCredentialError::FamilyMismatch { family: "oauth2" }.into());
		};

		if access_token.is_empty() {
			return Err(InvalidCredentialError::MissingAccessToken.into());
		}

		let mut params = request.params.clone();
		let mut headers = request.headers.clone();

		params.extend(request.framing_params.iter().cloned());

		// Cross-domain instances cannot attach custom headers, so the token is
		// demoted to parameter style regardless of what the provider issued.
		if *token_style == TokenStyle::Bearer && !descriptor.cross_domain {
			headers.push(("Authorization".into(), format!("Bearer {access_token}")));
		} else {
			merge_param(&mut params, ACCESS_TOKEN_PARAM, access_token);
		}

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
}

/// Replaces `key` in place if present, appending it otherwise. Keeps the caller
/// from smuggling a stale token through the parameter set.
fn merge_param(params: &mut Vec<(String, String)>, key: &str, value: &str) {
	if let Some(slot) = params.iter_mut().find(|(k, _)| k == key) {
		slot.1 = value.to_owned();
	} else {
		params.push((key.to_owned(), value.to_owned()));
	}
}
