#![cfg(all(feature = "reqwest", feature = "test"))]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use credential_broker::{
	_preludet::*,
	access::{AccessOptions, HttpMethod},
	credential::{Credential, CredentialPayload, ProviderFamily, ProviderTypeId, TokenStyle},
	error::ConfigError,
	provider::ProviderDescriptor,
};

const ACCESS_TOKEN: &str = "access-token-it";

fn oauth2_provider() -> ProviderTypeId {
	ProviderTypeId::new(ProviderFamily::OAuth2, 1)
}

fn oauth2_descriptor(id: u32, cross_domain: bool) -> ProviderDescriptor {
	ProviderDescriptor::builder(id, oauth2_provider())
		.cross_domain(cross_domain)
		.build()
		.expect("OAuth 2.0 descriptor fixture should build.")
}

fn oauth2_credential(id: u32, token_style: TokenStyle) -> Credential {
	Credential::new(
		id,
		oauth2_provider(),
		CredentialPayload::OAuth2 {
			access_token: ACCESS_TOKEN.into(),
			refresh_token: None,
			expires_at: None,
			token_style,
		},
	)
}

#[tokio::test]
async fn bearer_credentials_authorize_via_header() {
	let server = MockServer::start_async().await;
	let dispatcher = build_reqwest_test_dispatcher([oauth2_descriptor(1, false)]);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/me")
				.header("authorization", format!("Bearer {ACCESS_TOKEN}"))
				.query_param("fields", "name");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"name\":\"alice\"}");
		})
		.await;
	let response = dispatcher
		.access(
			oauth2_credential(1, TokenStyle::Bearer),
			&server.url("/me"),
			AccessOptions::new().param("fields", "name"),
		)
		.await
		.expect("Bearer-authorized access should succeed.");

	mock.assert_async().await;

	assert!(response.is_success());
	assert_eq!(response.text(), "{\"name\":\"alice\"}");
	assert_eq!(
		response.metadata.as_ref().and_then(|meta| meta.status),
		Some(200),
		"transport should capture response metadata",
	);
}

#[tokio::test]
async fn parameter_style_credentials_authorize_via_query() {
	let server = MockServer::start_async().await;
	let dispatcher = build_reqwest_test_dispatcher([oauth2_descriptor(2, false)]);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/feed").query_param("access_token", ACCESS_TOKEN);
			then.status(200).body("[]");
		})
		.await;
	let response = dispatcher
		.access(oauth2_credential(2, TokenStyle::Parameter), &server.url("/feed"), AccessOptions::new())
		.await
		.expect("Parameter-authorized access should succeed.");

	mock.assert_async().await;

	assert!(response.is_success());
}

#[tokio::test]
async fn cross_domain_descriptors_demote_bearer_tokens() {
	let server = MockServer::start_async().await;
	let dispatcher = build_reqwest_test_dispatcher([oauth2_descriptor(3, true)]);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/widget").query_param("access_token", ACCESS_TOKEN);
			then.status(200).body("ok");
		})
		.await;

	dispatcher
		.access(oauth2_credential(3, TokenStyle::Bearer), &server.url("/widget"), AccessOptions::new())
		.await
		.expect("Cross-domain access should succeed.");

	mock.assert_async().await;
}

#[tokio::test]
async fn post_requests_carry_parameters_in_the_form_body() {
	let server = MockServer::start_async().await;
	let dispatcher = build_reqwest_test_dispatcher([oauth2_descriptor(4, false)]);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/statuses")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("status", "hello world")
				.form_urlencoded_tuple("access_token", ACCESS_TOKEN);
			then.status(201).body("{\"id\":1}");
		})
		.await;
	let response = dispatcher
		.access(
			oauth2_credential(4, TokenStyle::Parameter),
			&server.url("/statuses"),
			AccessOptions::new().method(HttpMethod::Post).param("status", "hello world"),
		)
		.await
		.expect("POST access should succeed.");

	mock.assert_async().await;

	assert_eq!(response.status, 201);
}

#[tokio::test]
async fn post_requests_move_the_url_query_into_the_form_body() {
	let server = MockServer::start_async().await;
	let dispatcher = build_reqwest_test_dispatcher([oauth2_descriptor(8, false)]);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/notes")
				.query_param_missing("note")
				.query_param_missing("access_token")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("note", "draft")
				.form_urlencoded_tuple("access_token", ACCESS_TOKEN);
			then.status(201).body("{}");
		})
		.await;

	dispatcher
		.access(
			oauth2_credential(8, TokenStyle::Parameter),
			&format!("{}/notes?note=draft", server.base_url()),
			AccessOptions::new().method(HttpMethod::Post),
		)
		.await
		.expect("POST with query-string parameters should succeed.");

	mock.assert_async().await;
}

#[tokio::test]
async fn serialized_credentials_are_accepted_directly() {
	let server = MockServer::start_async().await;
	let dispatcher = build_reqwest_test_dispatcher([oauth2_descriptor(5, false)]);
	let serialized = oauth2_credential(5, TokenStyle::Bearer)
		.serialize()
		.expect("Credential fixture should serialize.");
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", format!("Bearer {ACCESS_TOKEN}"));
			then.status(200).body("{}");
		})
		.await;

	dispatcher
		.access(serialized.as_str(), &server.url("/me"), AccessOptions::new())
		.await
		.expect("Serialized credential should dispatch without explicit decoding.");

	mock.assert_async().await;
}

#[tokio::test]
async fn placeholders_resolve_before_dispatch() {
	let server = MockServer::start_async().await;
	let dispatcher = build_reqwest_test_dispatcher([oauth2_descriptor(6, false)]);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/users/42/albums").query_param("owner", "alice");
			then.status(200).body("[]");
		})
		.await;

	dispatcher
		.access(
			oauth2_credential(6, TokenStyle::Bearer),
			&format!("{}/users/{{user.id}}/albums", server.base_url()),
			AccessOptions::new()
				.param("owner", "{user.name}")
				.substitute(json!({ "user": { "id": 42, "name": "alice" } })),
		)
		.await
		.expect("Templated access should succeed.");

	mock.assert_async().await;
}

#[tokio::test]
async fn unknown_provider_instances_are_rejected_before_transport() {
	let dispatcher = build_reqwest_test_dispatcher([oauth2_descriptor(7, false)]);
	let err = dispatcher
		.access(
			oauth2_credential(99, TokenStyle::Bearer),
			"https://api.example/me",
			AccessOptions::new(),
		)
		.await
		.expect_err("Unconfigured provider instance should be rejected.");

	assert!(matches!(err, Error::Config(ConfigError::UnknownProvider { id: 99 })));
}
