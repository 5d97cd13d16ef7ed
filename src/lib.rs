//! Provider-typed credential lifecycle and mediated resource access: compact credential
//! codec, OAuth 1.0a/2.0 request preparation, and transport-aware dispatch in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod access;
pub mod credential;
pub mod error;
pub mod handler;
pub mod http;
pub mod obs;
pub mod provider;
pub mod refresh;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		access::Dispatcher,
		http::ReqwestHttpClient,
		provider::{MapDescriptorSource, ProviderDescriptor},
	};

	/// Dispatcher type alias used by reqwest-backed integration tests.
	pub type ReqwestTestDispatcher = Dispatcher<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`Dispatcher`] backed by an in-memory descriptor source and the reqwest
	/// transport used across integration tests.
	pub fn build_reqwest_test_dispatcher(
		descriptors: impl IntoIterator<Item = ProviderDescriptor>,
	) -> ReqwestTestDispatcher {
		let source = Arc::new(MapDescriptorSource::new(descriptors));

		Dispatcher::with_http_client(source, test_reqwest_http_client())
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
