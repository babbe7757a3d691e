use pw_profile::ProfileError;
use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Profile(#[from] ProfileError),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

/// Operator guidance printed after a browser startup failure.
pub const DRIVER_STARTUP_GUIDANCE: &[&str] = &[
	"Close every running Chrome window that may be using this workspace, then retry.",
	"The workspace may be damaged; try launching with a freshly created workspace.",
	"Check that the installed browser version matches the automation driver you use.",
];

impl CliError {
	/// Guidance lines for the operator, if this error has any.
	pub fn guidance(&self) -> &'static [&'static str] {
		match self {
			CliError::Profile(ProfileError::DriverStartup(_)) => DRIVER_STARTUP_GUIDANCE,
			CliError::Profile(ProfileError::BrowserNotFound) => {
				&["Install Chrome/Chromium or point `browser` in the config (or PWP_BROWSER) at the executable."]
			}
			_ => &[],
		}
	}

	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::Profile(err) => match err {
				ProfileError::InvalidName { name, .. } => (ErrorCode::InvalidName, Some(serde_json::json!({ "name": name }))),
				ProfileError::AlreadyExists { name, path } => (ErrorCode::AlreadyExists, Some(serde_json::json!({ "name": name, "path": path }))),
				ProfileError::NotFound { name } => (ErrorCode::NotFound, Some(serde_json::json!({ "name": name }))),
				ProfileError::InvalidRoot { path, .. } => (ErrorCode::InvalidRoot, Some(serde_json::json!({ "path": path }))),
				ProfileError::BrowserNotFound => (ErrorCode::BrowserNotFound, None),
				ProfileError::DriverStartup(_) => (ErrorCode::DriverStartupFailed, Some(serde_json::json!({ "guidance": DRIVER_STARTUP_GUIDANCE }))),
				ProfileError::Config(_) => (ErrorCode::ConfigError, None),
				ProfileError::Io(_) => (ErrorCode::IoError, None),
				ProfileError::Json(_) => (ErrorCode::InternalError, None),
			},
			CliError::Io(_) => (ErrorCode::IoError, None),
			CliError::Json(_) => (ErrorCode::InternalError, None),
		};

		CommandError {
			code,
			message: self.to_string(),
			details,
		}
	}
}
