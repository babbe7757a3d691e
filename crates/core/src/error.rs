use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProfileError>;

/// Errors raised by workspace management.
///
/// Lock-artifact cleanup failures are not errors: they are collected
/// in a [`crate::locks::ReconcileReport`] and never abort a run.
#[derive(Debug, Error)]
pub enum ProfileError {
	#[error("invalid workspace name {name:?}: {reason}")]
	InvalidName { name: String, reason: String },

	#[error("workspace already exists: {name}")]
	AlreadyExists { name: String, path: PathBuf },

	#[error("workspace not found: {name}")]
	NotFound { name: String },

	#[error("workspace root is unusable: {path}")]
	InvalidRoot {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("could not find a Chrome/Chromium executable")]
	BrowserNotFound,

	#[error("browser failed to start: {0}")]
	DriverStartup(String),

	#[error("configuration error: {0}")]
	Config(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl ProfileError {
	pub(crate) fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::InvalidName {
			name: name.into(),
			reason: reason.into(),
		}
	}

	/// Whether the operator can fix this by retrying with different input.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::InvalidName { .. } | Self::AlreadyExists { .. } | Self::NotFound { .. })
	}
}
