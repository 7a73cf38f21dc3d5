//! SmartAPI session and token endpoints behind an injectable client boundary.
//!
//! [`SessionClient`] is the pipeline's only dependency on the remote broker, so tests
//! can substitute a fake collaborator while [`HttpSessionClient`] owns the real wire
//! protocol: the `{status, message, errorcode, data}` envelope, the SmartAPI header
//! set, and the session state (JWT + feed token) issued at login.

// crates.io
use reqwest::{
	blocking::{Client as BlockingClient, RequestBuilder},
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::TransportError, token::TokenSecret};

/// Production SmartAPI base URL.
pub const DEFAULT_ENDPOINT: &str = "https://apiconnect.angelbroking.com";

const LOGIN_PATH: &str = "/rest/auth/angelbroking/user/v1/loginByPassword";
const TOKENS_PATH: &str = "/rest/auth/angelbroking/jwt/v1/generateTokens";
const PROFILE_PATH: &str = "/rest/secure/angelbroking/user/v1/getProfile";

/// Errors reported by the remote SmartAPI boundary.
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// Endpoint answered with `status: false` and a failure message.
	#[error("{operation} was rejected by the API: {message}.")]
	Rejected {
		/// Operation label (session creation, token minting, ...).
		operation: &'static str,
		/// Failure message returned by the endpoint.
		message: String,
	},
	/// Endpoint answered with a body that is not a valid envelope.
	#[error("{operation} returned a malformed response.")]
	MalformedResponse {
		/// Operation label.
		operation: &'static str,
		/// Structured parsing failure pointing at the broken field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Endpoint reported success but omitted the payload.
	#[error("{operation} returned no payload despite reporting success.")]
	MissingData {
		/// Operation label.
		operation: &'static str,
	},
	/// A session-scoped call was made before a session was established.
	#[error("{operation} requires an established session.")]
	NoSession {
		/// Operation label.
		operation: &'static str,
	},
}

/// Session payload returned by the login endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionData {
	/// Signed access token for the fresh session.
	#[serde(rename = "jwtToken")]
	pub jwt_token: TokenSecret,
	/// Renewable token consumed by the token-minting call.
	#[serde(rename = "refreshToken")]
	pub refresh_token: TokenSecret,
	/// Market-data streaming token issued alongside the session.
	#[serde(rename = "feedToken")]
	pub feed_token: TokenSecret,
}

/// Token pair returned by the minting endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenPair {
	/// Freshly signed access token.
	#[serde(rename = "jwtToken")]
	pub jwt_token: TokenSecret,
	/// Rotated refresh token.
	#[serde(rename = "refreshToken")]
	pub refresh_token: TokenSecret,
}

/// Profile payload returned by the verification endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Profile {
	/// Display name attached to the trading account.
	#[serde(default)]
	pub name: Option<String>,
}

/// Remote collaborator boundary for the login pipeline.
///
/// The four operations mirror the broker SDK surface the pipeline sequences: create a
/// session, mint tokens from its refresh token, read the feed token of the
/// established session, and fetch the profile as a health check.
pub trait SessionClient {
	/// Creates a session from the client code, MPIN, and current one-time password.
	fn create_session(&self, user_id: &str, pin: &str, totp: &str) -> Result<SessionData>;

	/// Mints a fresh JWT/refresh pair from the session's refresh token.
	fn mint_tokens(&self, refresh_token: &str) -> Result<TokenPair>;

	/// Returns the market-data feed token of the established session.
	fn feed_token(&self) -> Result<TokenSecret>;

	/// Fetches the account profile attached to the session.
	fn fetch_profile(&self, refresh_token: &str) -> Result<Profile>;
}

/// Uniform response envelope wrapping every SmartAPI payload.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
	status: bool,
	#[serde(default)]
	message: String,
	#[serde(default = "Option::default")]
	data: Option<T>,
}

#[derive(Clone)]
struct SessionState {
	jwt_token: TokenSecret,
	feed_token: TokenSecret,
}

/// Blocking reqwest implementation of [`SessionClient`].
pub struct HttpSessionClient {
	http: BlockingClient,
	endpoint: Url,
	api_key: String,
	session: RwLock<Option<SessionState>>,
}
impl HttpSessionClient {
	/// Creates a client for the provided base URL and API key.
	pub fn new(endpoint: Url, api_key: impl Into<String>) -> Result<Self> {
		let http = BlockingClient::builder().build()?;

		Ok(Self { http, endpoint, api_key: api_key.into(), session: RwLock::new(None) })
	}

	fn url(&self, path: &str) -> Result<Url> {
		self.endpoint.join(path).map_err(|e| Error::from(TransportError::network(e)))
	}

	fn headers(&self, jwt: Option<&str>) -> Result<HeaderMap> {
		let mut headers = HeaderMap::new();

		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
		headers.insert("X-UserType", HeaderValue::from_static("USER"));
		headers.insert("X-SourceID", HeaderValue::from_static("WEB"));
		headers.insert("X-ClientLocalIP", HeaderValue::from_static("127.0.0.1"));
		headers.insert("X-ClientPublicIP", HeaderValue::from_static("127.0.0.1"));
		headers.insert("X-MACAddress", HeaderValue::from_static("00:00:00:00:00:00"));
		headers.insert(
			"X-PrivateKey",
			HeaderValue::from_str(&self.api_key).map_err(TransportError::network)?,
		);

		if let Some(jwt) = jwt {
			headers.insert(
				AUTHORIZATION,
				HeaderValue::from_str(&format!("Bearer {jwt}"))
					.map_err(TransportError::network)?,
			);
		}

		Ok(headers)
	}

	fn session_jwt(&self, operation: &'static str) -> Result<TokenSecret> {
		self.session
			.read()
			.as_ref()
			.map(|state| state.jwt_token.clone())
			.ok_or_else(|| ApiError::NoSession { operation }.into())
	}

	/// Sends the request and decodes the `{status, message, data}` envelope.
	///
	/// `status: false` maps to [`ApiError::Rejected`]; a body that is not a valid
	/// envelope maps to [`ApiError::MalformedResponse`] with the offending path.
	fn execute<T>(&self, request: RequestBuilder, operation: &'static str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let bytes = request.send()?.bytes()?;
		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);
		let envelope: Envelope<T> = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|e| ApiError::MalformedResponse { operation, source: e })?;

		if !envelope.status {
			return Err(ApiError::Rejected { operation, message: envelope.message }.into());
		}

		envelope.data.ok_or_else(|| ApiError::MissingData { operation }.into())
	}
}
impl SessionClient for HttpSessionClient {
	fn create_session(&self, user_id: &str, pin: &str, totp: &str) -> Result<SessionData> {
		const OPERATION: &str = "Session creation";

		let body = serde_json::json!({ "clientcode": user_id, "password": pin, "totp": totp });
		let request = self.http.post(self.url(LOGIN_PATH)?).headers(self.headers(None)?).json(&body);
		let session: SessionData = self.execute(request, OPERATION)?;

		*self.session.write() = Some(SessionState {
			jwt_token: session.jwt_token.clone(),
			feed_token: session.feed_token.clone(),
		});

		Ok(session)
	}

	fn mint_tokens(&self, refresh_token: &str) -> Result<TokenPair> {
		const OPERATION: &str = "Token minting";

		let jwt = self.session_jwt(OPERATION)?;
		let body = serde_json::json!({ "refreshToken": refresh_token });
		let request = self
			.http
			.post(self.url(TOKENS_PATH)?)
			.headers(self.headers(Some(jwt.expose()))?)
			.json(&body);
		let pair: TokenPair = self.execute(request, OPERATION)?;

		// Later calls must authenticate with the freshly minted JWT.
		if let Some(state) = self.session.write().as_mut() {
			state.jwt_token = pair.jwt_token.clone();
		}

		Ok(pair)
	}

	fn feed_token(&self) -> Result<TokenSecret> {
		// The feed token is issued at login; the SDK serves it from session state.
		self.session
			.read()
			.as_ref()
			.map(|state| state.feed_token.clone())
			.ok_or_else(|| ApiError::NoSession { operation: "Feed-token retrieval" }.into())
	}

	fn fetch_profile(&self, _refresh_token: &str) -> Result<Profile> {
		const OPERATION: &str = "Profile verification";

		// The endpoint authenticates with the session JWT, not the refresh token.
		let jwt = self.session_jwt(OPERATION)?;
		let request =
			self.http.get(self.url(PROFILE_PATH)?).headers(self.headers(Some(jwt.expose()))?);

		self.execute(request, OPERATION)
	}
}
impl Debug for HttpSessionClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpSessionClient")
			.field("endpoint", &self.endpoint.as_str())
			.field("session_established", &self.session.read().is_some())
			.finish()
	}
}
