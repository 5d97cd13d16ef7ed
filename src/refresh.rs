//! OAuth 2.0 credential refresh with singleflight guards and metrics.
//!
//! [`Dispatcher::refresh`] exchanges a credential's refresh token for a fresh
//! access token at the descriptor's token endpoint. Refreshes are
//! copy-on-refresh: the input credential is never mutated, and the returned
//! record carries the rotated secrets. A per-provider-instance guard serializes
//! concurrent refreshes, and a completed rotation is cached under the guard so
//! waiters that queued behind it receive the rotated record without a second
//! token-endpoint round-trip.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	access::{Dispatcher, HttpMethod},
	credential::{Credential, CredentialPayload, TokenStyle},
	error::{ConfigError, RefreshError},
	handler::{InvalidCredentialError, PreparedRequest},
	http::{AccessHttpClient, ResponseMetadataSlot},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

const BODY_PREVIEW_LEN: usize = 256;

/// Rotation produced by a finished refresh, keyed by the refresh token it spent.
///
/// Waiters that queued behind the singleflight guard with the same spent token
/// receive the cached record instead of repeating the round-trip. The record is
/// never served back to a caller that already holds its access token, so a
/// deliberate re-refresh (after a revocation, say) still reaches the endpoint.
#[derive(Clone, Debug)]
pub(crate) struct CompletedRotation {
	spent_refresh_token: String,
	credential: Credential,
}

/// Shape of a token endpoint response. Every field is optional on the wire;
/// validation happens after parsing so errors can name the JSON path.
#[derive(Debug, Deserialize)]
struct TokenEndpointPayload {
	#[serde(default)]
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	expires_in: Option<i64>,
	#[serde(default)]
	token_type: Option<String>,
}

impl<C> Dispatcher<C>
where
	C: ?Sized + AccessHttpClient,
{
	/// Exchanges `credential`'s refresh token for a fresh OAuth 2.0 credential.
	///
	/// Returns a new record; the input is left untouched so callers can fall
	/// back to it if persisting the replacement fails. When the endpoint omits a
	/// rotated refresh token, the previous one is carried forward. Concurrent
	/// refreshes of the same record collapse to a single token-endpoint
	/// round-trip whose result every waiter shares.
	pub async fn refresh(&self, credential: &Credential) -> Result<Credential> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "refresh");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span.instrument(self.refresh_inner(credential)).await;

		match &result {
			Ok(_) => {
				self.refresh_metrics.record_success();
				obs::record_op_outcome(KIND, OpOutcome::Success);
			},
			Err(_) => {
				self.refresh_metrics.record_failure();
				obs::record_op_outcome(KIND, OpOutcome::Failure);
			},
		}

		result
	}

	async fn refresh_inner(&self, credential: &Credential) -> Result<Credential> {
		let CredentialPayload::OAuth2 { access_token, refresh_token, token_style, .. } =
			&credential.payload
		else {
			return Err(InvalidCredentialError::FamilyMismatch { family: "oauth2" }.into());
		};
		let refresh_token = refresh_token
			.as_deref()
			.filter(|token| !token.is_empty())
			.ok_or(InvalidCredentialError::MissingRefreshToken)?;
		let descriptor = self
			.descriptors
			.descriptor(credential.id)
			.ok_or(ConfigError::UnknownProvider { id: credential.id })?;
		let endpoint = descriptor
			.token_endpoint
			.clone()
			.ok_or(ConfigError::MissingTokenEndpoint { id: credential.id })?;
		let guard = self.refresh_guard(credential.id);
		let _singleflight = guard.lock().await;

		// A refresh that finished while this caller waited already spent the token.
		if let Some(rotated) = self.completed_rotation(credential.id, refresh_token, access_token) {
			return Ok(rotated);
		}

		let mut body_params = vec![
			("grant_type".to_owned(), "refresh_token".to_owned()),
			("refresh_token".to_owned(), refresh_token.to_owned()),
		];

		if let Some(key) = &descriptor.consumer_key {
			body_params.push(("client_id".to_owned(), key.clone()));
		}
		if let Some(secret) = &descriptor.consumer_secret {
			body_params.push(("client_secret".to_owned(), secret.clone()));
		}

		let request = PreparedRequest {
			url: endpoint,
			method: HttpMethod::Post,
			params: Vec::new(),
			body_params,
			headers: vec![("Accept".to_owned(), "application/json".to_owned())],
		};
		let slot = ResponseMetadataSlot::default();
		let response = self.http_client.execute(request, slot).await?;
		let status = response.status;

		if !response.is_success() {
			return Err(RefreshError::Endpoint {
				status,
				body_preview: preview(&response.text()),
			}
			.into());
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
		let payload: TokenEndpointPayload = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| RefreshError::ResponseParse { source, status })?;

		if payload.access_token.is_empty() {
			return Err(RefreshError::MissingAccessToken.into());
		}

		let expires_at = payload
			.expires_in
			.map(|secs| (OffsetDateTime::now_utc() + Duration::seconds(secs)).unix_timestamp());
		let token_style = payload
			.token_type
			.as_deref()
			.map(TokenStyle::from_token_type)
			.unwrap_or(*token_style);
		let spent_refresh_token = refresh_token;
		// Endpoints that do not rotate refresh tokens omit the field; keep the old one.
		let refresh_token = payload
			.refresh_token
			.filter(|token| !token.is_empty())
			.or_else(|| Some(spent_refresh_token.to_owned()));

		let rotated = Credential::new(
			credential.id,
			credential.provider,
			CredentialPayload::OAuth2 {
				access_token: payload.access_token,
				refresh_token,
				expires_at,
				token_style,
			},
		);

		self.record_rotation(credential.id, spent_refresh_token, &rotated);

		Ok(rotated)
	}

	/// Returns (and creates on demand) the singleflight guard for a provider instance.
	fn refresh_guard(&self, id: u32) -> Arc<AsyncMutex<()>> {
		let mut guards = self.refresh_guards.lock();

		guards.entry(id).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	/// Looks up a cached rotation that already spent `refresh_token`.
	///
	/// Misses when the caller already holds the rotated access token or the
	/// cached record has expired since it was produced.
	fn completed_rotation(
		&self,
		id: u32,
		refresh_token: &str,
		stale_access_token: &str,
	) -> Option<Credential> {
		let rotations = self.refresh_rotations.lock();

		rotations
			.get(&id)
			.filter(|rotation| {
				rotation.spent_refresh_token == refresh_token
					&& rotation.credential.access_token() != Some(stale_access_token)
					&& !rotation.credential.is_expired()
			})
			.map(|rotation| rotation.credential.clone())
	}

	fn record_rotation(&self, id: u32, spent_refresh_token: &str, credential: &Credential) {
		self.refresh_rotations.lock().insert(id, CompletedRotation {
			spent_refresh_token: spent_refresh_token.to_owned(),
			credential: credential.clone(),
		});
	}
}

fn preview(body: &str) -> String {
	if body.len() <= BODY_PREVIEW_LEN {
		return body.to_owned();
	}

	let mut end = BODY_PREVIEW_LEN;

	while !body.is_char_boundary(end) {
		end -= 1;
	}

	body[..end].to_owned()
}
