//! File-backed persistence for the issued token bundle.

// std
use std::{
	fs::{self, File},
	io::Write,
};
// self
use crate::{_prelude::*, token::TokenBundle};

/// Error type produced by [`TokenStore`] operations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// Serialization failure while encoding or decoding the bundle.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Filesystem-level failure.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Persists the token bundle to a JSON file, replacing prior contents on each run.
#[derive(Clone, Debug)]
pub struct TokenStore {
	path: PathBuf,
}
impl TokenStore {
	/// Creates a store rooted at the provided path.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Returns the path the bundle is written to.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Persists the bundle, creating parent directories as needed.
	///
	/// The write goes through a temp file plus rename so a crash never leaves a
	/// half-written bundle behind.
	pub fn save(&self, bundle: &TokenBundle) -> Result<(), StoreError> {
		self.ensure_parent_exists()?;

		let serialized =
			serde_json::to_vec_pretty(bundle).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize token bundle: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| {
			// Nothing references the temp file once the rename has failed.
			let _removed = fs::remove_file(&tmp_path);

			StoreError::Backend {
				message: format!("Failed to replace {}: {e}", self.path.display()),
			}
		})
	}

	/// Loads the previously persisted bundle, if the file exists.
	pub fn load(&self) -> Result<Option<TokenBundle>, StoreError> {
		if !self.path.exists() {
			return Ok(None);
		}

		let bytes = fs::read(&self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", self.path.display()),
		})?;

		serde_json::from_slice(&bytes).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", self.path.display()),
		})
	}

	fn ensure_parent_exists(&self) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}
}
