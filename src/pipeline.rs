//! Sequential login pipeline: TOTP, session, tokens, feed token, persist, verify.

// self
use crate::{
	_prelude::*,
	api::SessionClient,
	credential::Credentials,
	store::TokenStore,
	token::TokenBundle,
	totp,
};

/// Outcome of a successful login run.
#[derive(Clone, Debug)]
pub struct LoginReport {
	/// Bundle persisted to the token store.
	pub bundle: TokenBundle,
	/// Display name from the best-effort profile check, when it succeeded.
	pub profile_name: Option<String>,
}

/// Runs the full login sequence and persists the resulting bundle.
///
/// Each step consumes the previous step's output and any failure before persistence
/// aborts the run; the bundle is all-or-nothing, never written partially. Profile
/// verification happens after the bundle is on disk and only downgrades to a warning
/// when it fails.
pub fn run(
	credentials: &Credentials,
	client: &dyn SessionClient,
	store: &TokenStore,
) -> Result<LoginReport> {
	let code = totp::current_code(&credentials.totp_secret)?;

	tracing::info!("one-time password generated");

	let session = client.create_session(&credentials.user_id, credentials.pin.expose(), &code)?;

	tracing::info!("session created");

	let tokens = client.mint_tokens(session.refresh_token.expose())?;

	tracing::info!("jwt and refresh tokens minted");

	let feed_token = client.feed_token()?;
	let bundle = TokenBundle {
		client_code: credentials.user_id.clone(),
		api_key: credentials.api_key.clone(),
		jwt_token: tokens.jwt_token.clone(),
		refresh_token: tokens.refresh_token.clone(),
		feed_token,
		timestamp: OffsetDateTime::now_utc(),
	};

	store.save(&bundle)?;

	tracing::info!(path = %store.path().display(), "token bundle persisted");

	let profile_name = verify_profile(client, tokens.refresh_token.expose());

	Ok(LoginReport { bundle, profile_name })
}

/// Best-effort session check; failures are logged and swallowed.
fn verify_profile(client: &dyn SessionClient, refresh_token: &str) -> Option<String> {
	match client.fetch_profile(refresh_token) {
		Ok(profile) => profile.name,
		Err(e) => {
			tracing::warn!("profile verification failed but login already succeeded: {e}");

			None
		},
	}
}
