//! Inert handler for families that need no request augmentation.

// self
use crate::{
	_prelude::*,
	access::AccessRequest,
	credential::Credential,
	handler::{PreparedRequest, ProtocolHandler},
	provider::ProviderDescriptor,
};

/// Identity transform: forwards the request untouched apart from appending the
/// caller's framing parameters.
///
/// Identity-assertion credentials carry no secret usable at the HTTP layer, and
/// unrecognized families cannot be augmented safely, so both resolve here.
#[derive(Clone, Copy, Debug, Default)]
pub struct BaseHandler;
impl ProtocolHandler for BaseHandler {
	fn prepare(
		&self,
		request: &AccessRequest,
		_credential: &Credential,
		_descriptor: &ProviderDescriptor,
	) -> Result<PreparedRequest> {
		let mut params = request.params.clone();

		params.extend(request.framing_params.iter().cloned());

		Ok(PreparedRequest {
			url: request.url.clone(),
			method: request.method,
			params,
			body_params: Vec::new(),
			headers: request.headers.clone(),
		})
	}
}
