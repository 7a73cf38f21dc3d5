// std
use std::{env, fs, path::PathBuf, process};
// crates.io
use httpmock::prelude::*;
use time::OffsetDateTime;
use url::Url;
// self
use smartapi_login::{
	api::{ApiError, HttpSessionClient},
	credential::Credentials,
	error::Error,
	pipeline,
	store::TokenStore,
	token::TokenSecret,
	totp::TotpSecret,
};

const API_KEY: &str = "test-api-key";
const RFC6238_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";
const LOGIN_PATH: &str = "/rest/auth/angelbroking/user/v1/loginByPassword";
const TOKENS_PATH: &str = "/rest/auth/angelbroking/jwt/v1/generateTokens";
const PROFILE_PATH: &str = "/rest/secure/angelbroking/user/v1/getProfile";

fn temp_store(label: &str) -> TokenStore {
	let unique = format!(
		"smartapi_login_it_{label}_{}_{}.json",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	);
	let path: PathBuf = env::temp_dir().join(unique);

	TokenStore::new(path)
}

fn credentials() -> Credentials {
	Credentials {
		api_key: API_KEY.into(),
		user_id: "A123456".into(),
		pin: TokenSecret::new("4321"),
		totp_secret: TotpSecret::new(RFC6238_SECRET),
	}
}

fn client_for(server: &MockServer) -> HttpSessionClient {
	let endpoint =
		Url::parse(&server.base_url()).expect("Mock server URL should parse successfully.");

	HttpSessionClient::new(endpoint, API_KEY).expect("HTTP session client should build successfully.")
}

fn login_success_body() -> &'static str {
	r#"{"status":true,"message":"SUCCESS","errorcode":"","data":{"jwtToken":"jwt-login","refreshToken":"refresh-login","feedToken":"feed-login"}}"#
}

fn tokens_success_body() -> &'static str {
	r#"{"status":true,"message":"SUCCESS","errorcode":"","data":{"jwtToken":"jwt-minted","refreshToken":"refresh-minted","feedToken":"feed-minted"}}"#
}

#[test]
fn full_login_persists_the_documented_bundle() {
	let server = MockServer::start();
	let start = OffsetDateTime::now_utc();
	let login_mock = server.mock(|when, then| {
		when.method(POST)
			.path(LOGIN_PATH)
			.header("X-PrivateKey", API_KEY)
			.header("X-UserType", "USER")
			.json_body_includes(r#"{"clientcode":"A123456","password":"4321"}"#);
		then.status(200).header("content-type", "application/json").body(login_success_body());
	});
	let tokens_mock = server.mock(|when, then| {
		when.method(POST)
			.path(TOKENS_PATH)
			.header("Authorization", "Bearer jwt-login")
			.json_body_includes(r#"{"refreshToken":"refresh-login"}"#);
		then.status(200).header("content-type", "application/json").body(tokens_success_body());
	});
	let profile_mock = server.mock(|when, then| {
		when.method(GET).path(PROFILE_PATH).header("Authorization", "Bearer jwt-minted");
		then.status(200)
			.header("content-type", "application/json")
			.body(r#"{"status":true,"message":"SUCCESS","errorcode":"","data":{"name":"Demo Trader"}}"#);
	});
	let client = client_for(&server);
	let store = temp_store("success");
	let report = pipeline::run(&credentials(), &client, &store)
		.expect("Pipeline should succeed against a healthy mock server.");

	login_mock.assert();
	tokens_mock.assert();
	profile_mock.assert();

	assert_eq!(report.profile_name.as_deref(), Some("Demo Trader"));
	assert_eq!(report.bundle.jwt_token.expose(), "jwt-minted");
	assert_eq!(report.bundle.refresh_token.expose(), "refresh-minted");
	// The feed token is the one issued at login, not the minted placeholder.
	assert_eq!(report.bundle.feed_token.expose(), "feed-login");

	let raw = fs::read(store.path()).expect("Persisted token file should be readable.");
	let value: serde_json::Value =
		serde_json::from_slice(&raw).expect("Persisted token file should be valid JSON.");
	let object = value.as_object().expect("Persisted token file should be a JSON object.");
	let mut keys: Vec<_> = object.keys().map(String::as_str).collect();

	keys.sort_unstable();

	assert_eq!(
		keys,
		["api_key", "client_code", "feed_token", "jwt_token", "refresh_token", "timestamp"],
	);
	assert_eq!(object["client_code"], serde_json::json!("A123456"));
	assert_eq!(object["api_key"], serde_json::json!(API_KEY));

	let timestamp = object["timestamp"]
		.as_i64()
		.expect("Persisted timestamp should be a Unix timestamp.");

	assert!(
		timestamp >= start.unix_timestamp(),
		"Persisted timestamp must be newer than process start.",
	);

	fs::remove_file(store.path()).expect("Temporary token file should be removable.");
}

#[test]
fn rejected_session_creation_writes_no_token_file() {
	let server = MockServer::start();
	let login_mock = server.mock(|when, then| {
		when.method(POST).path(LOGIN_PATH);
		then.status(200)
			.header("content-type", "application/json")
			.body(r#"{"status":false,"message":"Invalid totp","errorcode":"AB1050","data":null}"#);
	});
	let client = client_for(&server);
	let store = temp_store("rejected_session");
	let err = pipeline::run(&credentials(), &client, &store)
		.expect_err("Pipeline must fail when session creation is rejected.");

	login_mock.assert();

	match err {
		Error::Api(ApiError::Rejected { operation, message }) => {
			assert_eq!(operation, "Session creation");
			assert_eq!(message, "Invalid totp");
		},
		other => panic!("Expected a rejected session creation, got {other:?}"),
	}

	assert!(!store.path().exists(), "No token file may exist after a failed login.");
}

#[test]
fn rejected_token_minting_writes_no_token_file() {
	let server = MockServer::start();
	let _login_mock = server.mock(|when, then| {
		when.method(POST).path(LOGIN_PATH);
		then.status(200).header("content-type", "application/json").body(login_success_body());
	});
	let tokens_mock = server.mock(|when, then| {
		when.method(POST).path(TOKENS_PATH);
		then.status(200)
			.header("content-type", "application/json")
			.body(r#"{"status":false,"message":"Token request rejected","errorcode":"AB1010","data":null}"#);
	});
	let client = client_for(&server);
	let store = temp_store("rejected_mint");
	let err = pipeline::run(&credentials(), &client, &store)
		.expect_err("Pipeline must fail when token minting is rejected.");

	tokens_mock.assert();

	assert!(matches!(err, Error::Api(ApiError::Rejected { operation: "Token minting", .. })));
	assert!(!store.path().exists(), "No token file may exist after a failed login.");
}

#[test]
fn malformed_token_response_writes_no_token_file() {
	let server = MockServer::start();
	let _login_mock = server.mock(|when, then| {
		when.method(POST).path(LOGIN_PATH);
		then.status(200).header("content-type", "application/json").body(login_success_body());
	});
	let _tokens_mock = server.mock(|when, then| {
		when.method(POST).path(TOKENS_PATH);
		then.status(502).header("content-type", "text/html").body("<html>Bad Gateway</html>");
	});
	let client = client_for(&server);
	let store = temp_store("malformed_mint");
	let err = pipeline::run(&credentials(), &client, &store)
		.expect_err("Pipeline must fail when the token endpoint returns garbage.");

	assert!(matches!(
		err,
		Error::Api(ApiError::MalformedResponse { operation: "Token minting", .. }),
	));
	assert!(!store.path().exists(), "No token file may exist after a failed login.");
}

#[test]
fn profile_failure_keeps_the_run_successful() {
	let server = MockServer::start();
	let _login_mock = server.mock(|when, then| {
		when.method(POST).path(LOGIN_PATH);
		then.status(200).header("content-type", "application/json").body(login_success_body());
	});
	let _tokens_mock = server.mock(|when, then| {
		when.method(POST).path(TOKENS_PATH);
		then.status(200).header("content-type", "application/json").body(tokens_success_body());
	});
	let profile_mock = server.mock(|when, then| {
		when.method(GET).path(PROFILE_PATH);
		then.status(200)
			.header("content-type", "application/json")
			.body(r#"{"status":false,"message":"Profile unavailable","errorcode":"AB2001","data":null}"#);
	});
	let client = client_for(&server);
	let store = temp_store("profile_failure");
	let report = pipeline::run(&credentials(), &client, &store)
		.expect("Profile verification failure must not fail the pipeline.");

	profile_mock.assert();

	assert_eq!(report.profile_name, None);
	assert!(store.path().exists(), "Bundle must already be persisted before verification.");

	fs::remove_file(store.path()).expect("Temporary token file should be removable.");
}
