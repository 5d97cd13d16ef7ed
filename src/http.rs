//! Transport primitives for provider-mediated access.
//!
//! The module exposes [`AccessHttpClient`] alongside [`ResponseMetadata`] and
//! [`ResponseMetadataSlot`] so downstream crates can integrate custom HTTP
//! clients without losing the dispatcher's instrumentation hooks.
//! Implementations call [`ResponseMetadataSlot::take`] before dispatching a
//! request and [`ResponseMetadataSlot::store`] once an HTTP status or retry hint
//! is known.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError, handler::PreparedRequest};

/// Boxed response future returned by [`AccessHttpClient::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing prepared requests.
///
/// The trait is the crate's only dependency on an HTTP stack. Callers provide an
/// implementation (typically behind `Arc<T>` where `T: AccessHttpClient`) and the
/// dispatcher hands each call a fresh [`ResponseMetadataSlot`]. Implementations
/// must be `Send + Sync + 'static` so a dispatcher can be shared across tasks,
/// and their futures must be `Send` for the lifetime of the in-flight request.
pub trait AccessHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes a prepared request, recording outcomes in `slot`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the HTTP request
	///   so stale information never leaks across retries.
	/// - Once an HTTP response provides a status or retry hint, save it with
	///   [`ResponseMetadataSlot::store`].
	fn execute(&self, request: PreparedRequest, slot: ResponseMetadataSlot)
	-> TransportFuture<'_>;
}

/// Raw transport-level response: status, headers, and body bytes.
#[derive(Clone, Debug, Default)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers as UTF-8 pairs; non-UTF-8 header values are dropped.
	pub headers: Vec<(String, String)>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Whether the status code is in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Interprets the body as UTF-8, lossily.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
///
/// Additional metadata fields may be added in future releases, so downstream code
/// should construct values using field names instead of struct update syntax.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the upstream, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
///
/// The dispatcher creates a fresh slot for each request and reads the captured
/// metadata immediately after the transport resolves. Transport implementations
/// borrow the slot just long enough to call [`store`](ResponseMetadataSlot::store)
/// and must keep ownership with the dispatcher.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl AccessHttpClient for ReqwestHttpClient {
	fn execute(
		&self,
		request: PreparedRequest,
		slot: ResponseMetadataSlot,
	) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			slot.take();

			let method = match request.method {
				crate::access::HttpMethod::Get => reqwest::Method::GET,
				crate::access::HttpMethod::Post => reqwest::Method::POST,
				crate::access::HttpMethod::Put => reqwest::Method::PUT,
				crate::access::HttpMethod::Delete => reqwest::Method::DELETE,
				crate::access::HttpMethod::Head => reqwest::Method::HEAD,
				crate::access::HttpMethod::Patch => reqwest::Method::PATCH,
			};
			let mut builder = client.request(method, request.final_url());

			for (key, value) in &request.headers {
				builder = builder.header(key.as_str(), value.as_str());
			}
			if !request.body_params.is_empty() {
				builder = builder.form(&request.body_params);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());

			slot.store(ResponseMetadata { status: Some(status), retry_after });

			let headers = response
				.headers()
				.iter()
				.filter_map(|(key, value)| {
					value.to_str().ok().map(|value| (key.to_string(), value.to_owned()))
				})
				.collect();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(TransportResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn metadata_slot_take_consumes_the_value() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(429), retry_after: None });

		let meta = slot.take().expect("Stored metadata should be readable.");

		assert_eq!(meta.status, Some(429));
		assert!(slot.take().is_none());
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn retry_after_parses_seconds_and_rejects_stale_dates() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, "17".parse().expect("Header value should parse."));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(17)));

		headers.insert(
			RETRY_AFTER,
			"Wed, 21 Oct 2015 07:28:00 GMT".parse().expect("Header value should parse."),
		);

		assert_eq!(parse_retry_after(&headers), None);
	}

	#[test]
	fn transport_response_classifies_status_ranges() {
		let ok = TransportResponse { status: 204, headers: Vec::new(), body: Vec::new() };
		let err = TransportResponse { status: 503, headers: Vec::new(), body: b"busy".to_vec() };

		assert!(ok.is_success());
		assert!(!err.is_success());
		assert_eq!(err.text(), "busy");
	}
}
