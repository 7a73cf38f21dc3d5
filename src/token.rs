//! Redacting secret wrapper and the persisted token bundle.

// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Complete set of issued tokens plus capture metadata.
///
/// Built once per run after all three remote calls succeed, then persisted via
/// [`TokenStore`](crate::store::TokenStore) and never mutated again.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
	/// Trading account identifier the session belongs to.
	pub client_code: String,
	/// API key the session was created with.
	pub api_key: String,
	/// Signed access token; callers must avoid logging it.
	pub jwt_token: TokenSecret,
	/// Long-lived token used to renew the session.
	pub refresh_token: TokenSecret,
	/// Token scoped to market-data streaming.
	pub feed_token: TokenSecret,
	/// Instant the bundle was captured, stored as a Unix timestamp.
	#[serde(with = "time::serde::timestamp")]
	pub timestamp: OffsetDateTime,
}
impl Debug for TokenBundle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenBundle")
			.field("client_code", &self.client_code)
			.field("api_key", &self.api_key)
			.field("jwt_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("feed_token", &"<redacted>")
			.field("timestamp", &self.timestamp)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn build_bundle() -> TokenBundle {
		TokenBundle {
			client_code: "A123456".into(),
			api_key: "demo-key".into(),
			jwt_token: TokenSecret::new("jwt"),
			refresh_token: TokenSecret::new("refresh"),
			feed_token: TokenSecret::new("feed"),
			timestamp: OffsetDateTime::from_unix_timestamp(1_700_000_000)
				.expect("Fixture timestamp should be valid."),
		}
	}

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn bundle_debug_redacts_every_token() {
		let rendered = format!("{:?}", build_bundle());

		assert!(rendered.contains("A123456"));
		assert!(!rendered.contains("jwt\""));
		assert!(!rendered.contains("refresh\""));
		assert!(!rendered.contains("feed\""));
	}

	#[test]
	fn bundle_serializes_with_documented_fields() {
		let value = serde_json::to_value(build_bundle())
			.expect("Token bundle should serialize to JSON.");
		let object = value.as_object().expect("Serialized bundle should be a JSON object.");
		let mut keys: Vec<_> = object.keys().map(String::as_str).collect();

		keys.sort_unstable();

		assert_eq!(
			keys,
			["api_key", "client_code", "feed_token", "jwt_token", "refresh_token", "timestamp"],
		);
		assert_eq!(object["timestamp"], serde_json::json!(1_700_000_000));
	}
}
