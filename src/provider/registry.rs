//! Dispatch table mapping provider families onto protocol handlers.

// self
use crate::{
	_prelude::*,
	credential::ProviderFamily,
	handler::{BaseHandler, Oauth1Handler, Oauth2Handler, ProtocolHandler},
};

/// Resolves the protocol handler capable of using a credential of a given family.
///
/// Resolution never fails: unrecognized families degrade to the inert
/// [`BaseHandler`], since identity-assertion providers (and any future family the
/// application has not taught this crate about) need no request augmentation.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
	overrides: HashMap<u16, Arc<dyn ProtocolHandler>>,
}
impl ProviderRegistry {
	/// Creates a registry with the built-in handler table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Installs a custom handler for a family, shadowing the built-in table.
	pub fn with_handler(
		mut self,
		family: ProviderFamily,
		handler: Arc<dyn ProtocolHandler>,
	) -> Self {
		self.overrides.insert(family.discriminant(), handler);

		self
	}

	/// Resolves the handler for a provider family.
	pub fn resolve(&self, family: ProviderFamily) -> &dyn ProtocolHandler {
		if let Some(handler) = self.overrides.get(&family.discriminant()) {
			return handler.as_ref();
		}

		match family {
			ProviderFamily::OAuth1 => &Oauth1Handler,
			ProviderFamily::OAuth2 => &Oauth2Handler,
			ProviderFamily::Assertion | ProviderFamily::Other(_) => &BaseHandler,
		}
	}
}
impl Debug for ProviderRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderRegistry")
			.field("overrides", &self.overrides.keys().collect::<Vec<_>>())
			.finish()
	}
}
