//! Credential resolution: a saved file when present, else a built-in fallback with an
//! opt-in one-time persist.

// std
use std::{
	fs,
	io::{self, Write},
};
// self
use crate::{_prelude::*, token::TokenSecret, totp::TotpSecret};

/// Errors raised while resolving or persisting credentials.
#[derive(Debug, ThisError)]
pub enum CredentialError {
	/// Credential file exists but could not be read.
	#[error("Failed to read credential file {path}.")]
	Read {
		/// Offending file path.
		path: String,
		/// Underlying filesystem failure.
		#[source]
		source: io::Error,
	},
	/// Credential file contents are not a valid credential record.
	#[error("Failed to parse credential file {path}.")]
	Parse {
		/// Offending file path.
		path: String,
		/// Structured parsing failure pointing at the broken field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Credential file could not be written after the user opted in.
	#[error("Failed to write credential file {path}.")]
	Write {
		/// Offending file path.
		path: String,
		/// Underlying filesystem or serialization failure.
		#[source]
		source: io::Error,
	},
}

/// Yes/no confirmation source for the one-time credential persist offer.
///
/// The binary answers through stdin; tests supply a fixed answer so resolution stays
/// deterministic without a terminal.
pub trait ConfirmationPrompt {
	/// Asks the provided question, returning `true` to proceed.
	fn confirm(&self, question: &str) -> bool;
}

/// Prompt backed by stdin; only answers starting with `y`/`Y` confirm.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdinPrompt;
impl ConfirmationPrompt for StdinPrompt {
	fn confirm(&self, question: &str) -> bool {
		print!("{question} [y/N] ");

		if io::stdout().flush().is_err() {
			return false;
		}

		let mut answer = String::new();

		if io::stdin().read_line(&mut answer).is_err() {
			return false;
		}

		answer.trim().eq_ignore_ascii_case("y")
	}
}

/// Login credentials resolved once per run; immutable afterwards.
///
/// The on-disk form is plain JSON with the secrets unencrypted, so the file must stay
/// private to the account owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// SmartAPI application key.
	pub api_key: String,
	/// Trading account identifier (client code).
	pub user_id: String,
	/// Login MPIN; redacted in logs.
	pub pin: TokenSecret,
	/// Base32-encoded TOTP shared secret; redacted in logs.
	// Legacy key accepted from files written by earlier versions of this tool.
	#[serde(alias = "totp_code")]
	pub totp_secret: TotpSecret,
}
impl Credentials {
	/// Built-in placeholder record used when no credential file exists yet.
	pub fn fallback() -> Self {
		Self {
			api_key: "YOUR_API_KEY".into(),
			user_id: "YOUR_CLIENT_CODE".into(),
			pin: TokenSecret::new("0000"),
			totp_secret: TotpSecret::new("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ"),
		}
	}

	/// Resolves credentials from `path` when present, else the built-in fallback.
	///
	/// A saved file is loaded verbatim and never triggers the persist offer. When the
	/// file is missing the fallback is used and `prompt` decides whether it is written
	/// out for future runs; declining leaves the filesystem untouched.
	pub fn resolve(path: &Path, prompt: &dyn ConfirmationPrompt) -> Result<Self, CredentialError> {
		if path.exists() {
			let loaded = Self::load(path)?;

			tracing::info!(path = %path.display(), "using saved credentials");

			return Ok(loaded);
		}

		tracing::info!("no credential file found, using built-in credentials");

		let fallback = Self::fallback();

		if prompt.confirm("Save credentials to file for future runs?") {
			fallback.save(path)?;

			tracing::info!(path = %path.display(), "credentials saved");
		}

		Ok(fallback)
	}

	/// Loads a credential record from disk with structured parse diagnostics.
	pub fn load(path: &Path) -> Result<Self, CredentialError> {
		let bytes = fs::read(path)
			.map_err(|e| CredentialError::Read { path: path.display().to_string(), source: e })?;
		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|e| CredentialError::Parse { path: path.display().to_string(), source: e })
	}

	/// Writes the record as pretty JSON, creating parent directories as needed.
	pub fn save(&self, path: &Path) -> Result<(), CredentialError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| CredentialError::Write {
				path: path.display().to_string(),
				source: e,
			})?;
		}

		let serialized = serde_json::to_vec_pretty(self).map_err(|e| CredentialError::Write {
			path: path.display().to_string(),
			source: io::Error::other(e),
		})?;

		fs::write(path, serialized)
			.map_err(|e| CredentialError::Write { path: path.display().to_string(), source: e })
	}
}
