//! RFC 6238 one-time-password generation from the broker's shared secret.

// crates.io
use totp_rs::{Algorithm, Secret, TOTP};
// self
use crate::_prelude::*;

/// Number of digits in a SmartAPI one-time password.
const DIGITS: usize = 6;
/// TOTP time step in seconds.
const STEP: u64 = 30;

/// Errors raised while producing a one-time password.
#[derive(Debug, ThisError)]
pub enum TotpError {
	/// Shared secret is not valid base32 or is too short.
	#[error("TOTP secret is invalid: {message}.")]
	InvalidSecret {
		/// Reason reported by the TOTP engine.
		message: String,
	},
	/// System clock is unusable (before the Unix epoch).
	#[error("System clock is unusable for TOTP generation.")]
	Clock(#[from] std::time::SystemTimeError),
}

/// Base32-encoded TOTP shared secret, redacted in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpSecret(String);
impl TotpSecret {
	/// Wraps a new base32-encoded shared secret.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for TotpSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TotpSecret").field(&"<redacted>").finish()
	}
}
impl Display for TotpSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Computes the one-time password for the provided Unix timestamp.
pub fn code_at(secret: &TotpSecret, unix_time: u64) -> Result<String, TotpError> {
	Ok(generator(secret)?.generate(unix_time))
}

/// Computes the one-time password for the current wall-clock time.
pub fn current_code(secret: &TotpSecret) -> Result<String, TotpError> {
	generator(secret)?.generate_current().map_err(TotpError::from)
}

fn generator(secret: &TotpSecret) -> Result<TOTP, TotpError> {
	let bytes = Secret::Encoded(secret.expose().to_owned())
		.to_bytes()
		.map_err(|e| TotpError::InvalidSecret { message: format!("{e:?}") })?;

	TOTP::new(Algorithm::SHA1, DIGITS, 1, STEP, bytes)
		.map_err(|e| TotpError::InvalidSecret { message: format!("{e:?}") })
}
