//! Provider-typed credential records and lifecycle helpers.

pub mod codec;

pub use codec::{DecodeError, EncodeError, decode, encode};

// self
use crate::_prelude::*;

/// Broad protocol family of a provider, carried as the first half of the
/// `{family}-{subtype}` type tag in the serialized form.
///
/// Discriminants are part of the wire format and must stay stable: OAuth1 = 1,
/// OAuth2 = 2, identity-assertion = 3. Unrecognized discriminants are preserved
/// verbatim so the registry can degrade them to the inert handler instead of
/// failing a decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum ProviderFamily {
	/// OAuth 1.0a providers; requests are HMAC-SHA1 signed.
	OAuth1,
	/// OAuth 2.0 providers; the access token travels as a bearer header or parameter.
	OAuth2,
	/// Identity-assertion providers; resource requests need no augmentation.
	Assertion,
	/// Family discriminant this crate does not recognize.
	Other(u16),
}
impl ProviderFamily {
	/// Returns the wire discriminant for this family.
	pub const fn discriminant(self) -> u16 {
		match self {
			Self::OAuth1 => 1,
			Self::OAuth2 => 2,
			Self::Assertion => 3,
			Self::Other(value) => value,
		}
	}

	/// Returns a stable label suitable for error messages and span fields.
	pub const fn label(self) -> &'static str {
		match self {
			Self::OAuth1 => "oauth1",
			Self::OAuth2 => "oauth2",
			Self::Assertion => "assertion",
			Self::Other(_) => "other",
		}
	}
}
impl From<u16> for ProviderFamily {
	fn from(value: u16) -> Self {
		match value {
			1 => Self::OAuth1,
			2 => Self::OAuth2,
			3 => Self::Assertion,
			other => Self::Other(other),
		}
	}
}
impl From<ProviderFamily> for u16 {
	fn from(family: ProviderFamily) -> Self {
		family.discriminant()
	}
}
impl Display for ProviderFamily {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.label())
	}
}

/// Composite provider type tag: protocol family plus the specific provider subtype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderTypeId {
	/// Protocol family discriminant.
	pub family: ProviderFamily,
	/// Specific provider within the family.
	pub subtype: u16,
}
impl ProviderTypeId {
	/// Creates a new type tag.
	pub const fn new(family: ProviderFamily, subtype: u16) -> Self {
		Self { family, subtype }
	}
}
impl Display for ProviderTypeId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}-{}", self.family.discriminant(), self.subtype)
	}
}
impl FromStr for ProviderTypeId {
	type Err = DecodeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		codec::parse_type_tag(s)
	}
}

/// How an OAuth 2.0 access token travels on resource requests.
///
/// Serialized as its index (0 = parameter, 1 = bearer), matching the original
/// provider convention of indexing into an ordered token-type table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStyle {
	/// Token is appended as an `access_token` request parameter.
	#[default]
	Parameter,
	/// Token is attached as an `Authorization: Bearer` header.
	Bearer,
}
impl TokenStyle {
	/// Returns the wire index for this style.
	pub const fn index(self) -> u8 {
		match self {
			Self::Parameter => 0,
			Self::Bearer => 1,
		}
	}

	/// Resolves a wire index back into a style.
	pub const fn from_index(index: u8) -> Option<Self> {
		match index {
			0 => Some(Self::Parameter),
			1 => Some(Self::Bearer),
			_ => None,
		}
	}

	/// Maps a token endpoint's `token_type` field onto a style.
	pub fn from_token_type(token_type: &str) -> Self {
		if token_type.eq_ignore_ascii_case("bearer") { Self::Bearer } else { Self::Parameter }
	}
}

/// Family-specific payload fields, in their fixed wire order.
///
/// Field count and meaning are fixed per family; the codec refuses payloads whose
/// field count does not match. Payload fields must not contain newlines, since the
/// wire format reserves them as the field delimiter.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialPayload {
	/// OAuth 1.0a token pair: `[token, token_secret]`.
	OAuth1 {
		/// Access token issued by the provider.
		token: String,
		/// Token secret used as half of the signing key.
		token_secret: String,
	},
	/// OAuth 2.0 token set: `[access_token, refresh_token, expires_at, token_style]`.
	OAuth2 {
		/// Access token issued by the provider.
		access_token: String,
		/// Refresh token, when the provider granted offline access.
		refresh_token: Option<String>,
		/// Absolute expiry as a Unix timestamp in seconds.
		expires_at: Option<i64>,
		/// Transport style for the access token.
		token_style: TokenStyle,
	},
	/// Opaque ordered fields for identity-assertion and unrecognized families.
	Opaque(Vec<String>),
}
impl Debug for CredentialPayload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::OAuth1 { .. } => f
				.debug_struct("OAuth1")
				.field("token", &"<redacted>")
				.field("token_secret", &"<redacted>")
				.finish(),
			Self::OAuth2 { refresh_token, expires_at, token_style, .. } => f
				.debug_struct("OAuth2")
				.field("access_token", &"<redacted>")
				.field("refresh_token", &refresh_token.as_ref().map(|_| "<redacted>"))
				.field("expires_at", expires_at)
				.field("token_style", token_style)
				.finish(),
			Self::Opaque(fields) => f.debug_tuple("Opaque").field(&fields.len()).finish(),
		}
	}
}

/// Immutable record proving a user's authorization with a configured provider
/// instance.
///
/// Created at the end of a successful authorization handshake and never mutated
/// afterwards; an OAuth 2.0 refresh produces a replacement record instead of
/// updating this one in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Numeric identifier of the configured provider instance.
	pub id: u32,
	/// Provider family + subtype tag.
	pub provider: ProviderTypeId,
	/// Family-specific payload fields.
	pub payload: CredentialPayload,
}
impl Credential {
	/// Creates a new credential record.
	///
	/// An empty-string OAuth 2.0 refresh token is normalized to `None`; the two
	/// forms are indistinguishable on the wire.
	pub fn new(id: u32, provider: ProviderTypeId, mut payload: CredentialPayload) -> Self {
		if let CredentialPayload::OAuth2 { refresh_token, .. } = &mut payload {
			*refresh_token = refresh_token.take().filter(|token| !token.is_empty());
		}

		Self { id, provider, payload }
	}

	/// Returns the protocol family of the issuing provider.
	pub const fn family(&self) -> ProviderFamily {
		self.provider.family
	}

	/// Encodes the record into its compact, URL-safe string form.
	///
	/// Fails with [`EncodeError`] if a payload field contains the newline field
	/// delimiter.
	pub fn serialize(&self) -> Result<String, EncodeError> {
		codec::encode(self)
	}

	/// Decodes a record from its compact string form.
	pub fn deserialize(serialized: &str) -> Result<Self, DecodeError> {
		codec::decode(serialized)
	}

	/// Returns the access token used on resource requests, if the family carries one.
	pub fn access_token(&self) -> Option<&str> {
		match &self.payload {
			CredentialPayload::OAuth1 { token, .. } => Some(token),
			CredentialPayload::OAuth2 { access_token, .. } => Some(access_token),
			CredentialPayload::Opaque(_) => None,
		}
	}

	/// Returns the absolute expiry instant recorded in the payload, if any.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		match &self.payload {
			CredentialPayload::OAuth2 { expires_at: Some(timestamp), .. } =>
				OffsetDateTime::from_unix_timestamp(*timestamp).ok(),
			_ => None,
		}
	}

	/// Checks expiry against the provided instant; records without an expiry never expire.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|expiry| instant >= expiry)
	}

	/// Checks expiry against the current UTC instant.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the record carries a refresh token and can be replaced
	/// via a token-endpoint round-trip.
	pub fn can_refresh(&self) -> bool {
		matches!(
			&self.payload,
			CredentialPayload::OAuth2 { refresh_token: Some(secret), .. } if !secret.is_empty()
		)
	}
}
