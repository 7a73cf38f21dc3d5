//! Error types shared across the login pipeline, API boundary, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by the login pipeline.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential file could not be read, parsed, or written.
	#[error(transparent)]
	Credential(#[from] crate::credential::CredentialError),
	/// One-time-password generation failed.
	#[error(transparent)]
	Totp(#[from] crate::totp::TotpError),
	/// The remote API rejected a call or returned an unusable payload.
	#[error(transparent)]
	Api(#[from] crate::api::ApiError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token-bundle persistence failed.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}
impl From<reqwest::Error> for Error {
	fn from(e: reqwest::Error) -> Self {
		Self::Transport(e.into())
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the SmartAPI endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the SmartAPI endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for TransportError {
	fn from(e: reqwest::Error) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "disk full".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Store(_)));
		assert!(error.to_string().contains("disk full"));

		let source = StdError::source(&error)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
