//! Compact, URL-safe wire codec for [`Credential`] records.
//!
//! The format is a newline-joined field list that is percent-encoded as a whole:
//! line 0 is the decimal provider instance `id`, line 1 the `{family}-{subtype}`
//! type tag, and lines 2+ the payload fields in the fixed order of the family.
//! Optional payload fields serialize as empty lines so positions stay stable,
//! and [`encode`] refuses payload fields containing the delimiter itself.
//! The format must not change between releases; serialized credentials cross
//! application boundaries.

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
// self
use crate::{
	_prelude::*,
	credential::{Credential, CredentialPayload, ProviderFamily, ProviderTypeId, TokenStyle},
};

/// Percent-encode set leaving only RFC 3986 unreserved characters untouched.
pub(crate) const URL_SAFE: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Error produced when a payload field contains the newline field delimiter.
///
/// Such a field cannot be framed without corrupting its neighbors, so [`encode`]
/// rejects the credential instead of producing a string [`decode`] would
/// misinterpret.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Credential payload fields must not contain newline characters.")]
pub struct EncodeError;

/// Errors produced while decoding a serialized credential.
///
/// Decoding never coerces invalid data into a usable [`Credential`]; every failure
/// names the offending field.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DecodeError {
	/// The percent-decoded bytes are not valid UTF-8.
	#[error("Serialized credential is not valid percent-encoded UTF-8.")]
	Encoding,
	/// A required leading field line is absent.
	#[error("Serialized credential is missing the `{field}` field.")]
	MissingField {
		/// Name of the absent field.
		field: &'static str,
	},
	/// A numeric field failed to parse.
	#[error("Field `{field}` is not a valid integer: `{value}`.")]
	InvalidInteger {
		/// Name of the malformed field.
		field: &'static str,
		/// Raw value encountered.
		value: String,
	},
	/// The type tag is not of the `{family}-{subtype}` form.
	#[error("Provider type tag `{value}` is not of the form `family-subtype`.")]
	InvalidTypeTag {
		/// Raw tag encountered.
		value: String,
	},
	/// The payload field count does not match the family's schema.
	#[error("Expected {expected} payload fields for the {family} family, found {found}.")]
	PayloadFieldCount {
		/// Family label whose schema was violated.
		family: &'static str,
		/// Field count required by the schema.
		expected: usize,
		/// Field count actually present.
		found: usize,
	},
	/// The OAuth 2.0 token-style index is outside the known table.
	#[error("Token style index `{value}` is out of range.")]
	TokenStyleIndex {
		/// Raw index encountered.
		value: String,
	},
}

/// Encodes a credential into its compact, URL-safe string form.
///
/// Pure function; [`decode`] inverts it exactly for every credential it accepts.
/// Payload fields containing the newline delimiter are rejected with
/// [`EncodeError`].
pub fn encode(credential: &Credential) -> Result<String, EncodeError> {
	let mut lines = Vec::with_capacity(6);

	lines.push(credential.id.to_string());
	lines.push(credential.provider.to_string());

	match &credential.payload {
		CredentialPayload::OAuth1 { token, token_secret } => {
			lines.push(token.clone());
			lines.push(token_secret.clone());
		},
		CredentialPayload::OAuth2 { access_token, refresh_token, expires_at, token_style } => {
			lines.push(access_token.clone());
			lines.push(refresh_token.clone().unwrap_or_default());
			lines.push(expires_at.map(|timestamp| timestamp.to_string()).unwrap_or_default());
			lines.push(token_style.index().to_string());
		},
		CredentialPayload::Opaque(fields) => lines.extend(fields.iter().cloned()),
	}

	if lines.iter().any(|line| line.contains('\n')) {
		return Err(EncodeError);
	}

	Ok(utf8_percent_encode(&lines.join("\n"), URL_SAFE).to_string())
}

/// Decodes a credential from its compact string form.
pub fn decode(serialized: &str) -> Result<Credential, DecodeError> {
	let decoded =
		percent_decode_str(serialized).decode_utf8().map_err(|_| DecodeError::Encoding)?;
	let mut lines = decoded.split('\n');
	let id = parse_integer("id", lines.next().ok_or(DecodeError::MissingField { field: "id" })?)?;
	let provider =
		parse_type_tag(lines.next().ok_or(DecodeError::MissingField { field: "provider type" })?)?;
	let fields: Vec<&str> = lines.collect();
	let payload = decode_payload(provider.family, &fields)?;

	Ok(Credential { id, provider, payload })
}

/// Parses a `{family}-{subtype}` type tag.
pub(crate) fn parse_type_tag(tag: &str) -> Result<ProviderTypeId, DecodeError> {
	let (family, subtype) =
		tag.split_once('-').ok_or_else(|| DecodeError::InvalidTypeTag { value: tag.to_owned() })?;
	let family: u16 = parse_integer("provider family", family)?;
	let subtype = parse_integer("provider subtype", subtype)?;

	Ok(ProviderTypeId::new(ProviderFamily::from(family), subtype))
}

fn decode_payload(
	family: ProviderFamily,
	fields: &[&str],
) -> Result<CredentialPayload, DecodeError> {
	match family {
		ProviderFamily::OAuth1 => {
			let [token, token_secret] = expect_fields::<2>(family, fields)?;

			Ok(CredentialPayload::OAuth1 {
				token: token.to_owned(),
				token_secret: token_secret.to_owned(),
			})
		},
		ProviderFamily::OAuth2 => {
			let [access_token, refresh_token, expires_at, style_index] =
				expect_fields::<4>(family, fields)?;
			let refresh_token =
				if refresh_token.is_empty() { None } else { Some(refresh_token.to_owned()) };
			let expires_at = if expires_at.is_empty() {
				None
			} else {
				Some(parse_integer("expires_at", expires_at)?)
			};
			let index: u8 = parse_integer("token style", style_index)?;
			let token_style = TokenStyle::from_index(index)
				.ok_or_else(|| DecodeError::TokenStyleIndex { value: style_index.to_owned() })?;

			Ok(CredentialPayload::OAuth2 {
				access_token: access_token.to_owned(),
				refresh_token,
				expires_at,
				token_style,
			})
		},
		ProviderFamily::Assertion | ProviderFamily::Other(_) =>
			Ok(CredentialPayload::Opaque(fields.iter().map(|field| (*field).to_owned()).collect())),
	}
}

fn expect_fields<'a, const N: usize>(
	family: ProviderFamily,
	fields: &[&'a str],
) -> Result<[&'a str; N], DecodeError> {
	<[&str; N]>::try_from(fields).map_err(|_| DecodeError::PayloadFieldCount {
		family: family.label(),
		expected: N,
		found: fields.len(),
	})
}

fn parse_integer<T>(field: &'static str, value: &str) -> Result<T, DecodeError>
where
	T: FromStr,
{
	value.parse().map_err(|_| DecodeError::InvalidInteger { field, value: value.to_owned() })
}

/// Percent-encodes a single value with the codec's URL-safe set.
pub(crate) fn escape(value: &str) -> String {
	utf8_percent_encode(value, URL_SAFE).to_string()
}
