//! TOTP-based login utility for the AngelOne SmartAPI—resolves credentials, walks the
//! session/token/feed-token sequence, and persists the issued bundle for downstream
//! trading tools.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod credential;
pub mod error;
pub mod pipeline;
pub mod store;
pub mod token;
pub mod totp;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		path::{Path, PathBuf},
	};

	pub use parking_lot::RwLock;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

use {clap as _, tracing_subscriber as _};
#[cfg(test)] use httpmock as _;
