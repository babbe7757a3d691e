//! Structured output envelope for machine consumption.
//!
//! With `--format json` every command prints one envelope on stdout:
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "ok": true,
//!   "command": "launch",
//!   "data": { ... },
//!   "timings": { "durationMs": 1734 }
//! }
//! ```
//!
//! On failure `data` is replaced by `error: { code, message, details }`.
//! Human-readable status lines go to stderr in that mode so stdout stays
//! parseable.


use std::path::PathBuf;
use std::time::{Duration, Instant};

use pw_profile::locks::ReconcileReport;
use pw_profile::sanitize::SanitizeReport;
use serde::Serialize;

/// Current schema version for command output.
pub const SCHEMA_VERSION: u32 = 1;

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Human-readable status lines
	#[default]
	Text,
	/// JSON result envelope
	Json,
}

/// The result envelope returned by all commands.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub schema_version: u32,

	pub ok: bool,

	/// Command name (e.g., "launch", "create", "clean")
	pub command: String,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub timings: Option<Timings>,

	/// Non-fatal problems (unremovable lock artifacts, failed cache purges).
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub diagnostics: Vec<Diagnostic>,
}

/// Error information for failed commands
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Standardized error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Alias empty or containing a forbidden character
	InvalidName,
	/// Workspace creation collided with an existing one
	AlreadyExists,
	/// Named workspace does not exist
	NotFound,
	/// Workspace root missing or not writable
	InvalidRoot,
	/// No Chrome/Chromium executable found
	BrowserNotFound,
	/// Browser process failed to start
	DriverStartupFailed,
	/// Config file unreadable or malformed
	ConfigError,
	/// File I/O error
	IoError,
	/// Unknown/internal error
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ErrorCode::InvalidName => write!(f, "INVALID_NAME"),
			ErrorCode::AlreadyExists => write!(f, "ALREADY_EXISTS"),
			ErrorCode::NotFound => write!(f, "NOT_FOUND"),
			ErrorCode::InvalidRoot => write!(f, "INVALID_ROOT"),
			ErrorCode::BrowserNotFound => write!(f, "BROWSER_NOT_FOUND"),
			ErrorCode::DriverStartupFailed => write!(f, "DRIVER_STARTUP_FAILED"),
			ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
			ErrorCode::IoError => write!(f, "IO_ERROR"),
			ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
		}
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	pub duration_ms: u64,
}

impl From<Duration> for Timings {
	fn from(duration: Duration) -> Self {
		Timings {
			duration_ms: duration.as_millis() as u64,
		}
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
	pub level: DiagnosticLevel,
	pub message: String,
	/// Component that produced it ("locks", "sanitize")
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
	Info,
	Warning,
}

/// Builder for [`CommandResult`]; timing starts at construction.
pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
	diagnostics: Vec<Diagnostic>,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			start_time: Instant::now(),
			diagnostics: Vec::new(),
		}
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	/// Sets a fully formed error, keeping its details.
	pub fn command_error(mut self, error: CommandError) -> Self {
		self.error = Some(error);
		self
	}

	pub fn diagnostic_with_source(mut self, level: DiagnosticLevel, message: impl Into<String>, source: impl Into<String>) -> Self {
		self.diagnostics.push(Diagnostic {
			level,
			message: message.into(),
			source: Some(source.into()),
		});
		self
	}

	/// Adds a note for a live lock owner and a warning for every lock
	/// artifact left on disk.
	pub fn reconcile_diagnostics(mut self, report: &ReconcileReport) -> Self {
		if let Some(owner) = &report.live_owner {
			self = self.diagnostic_with_source(
				DiagnosticLevel::Info,
				format!("workspace in use by process {} on {}", owner.pid, owner.host),
				"locks",
			);
		}
		for artifact in &report.unresolved {
			self = self.diagnostic_with_source(DiagnosticLevel::Warning, format!("{}: {}", artifact.name, artifact.reason), "locks");
		}
		self
	}

	/// Adds a warning for every entry the sanitizer could not remove.
	pub fn sanitize_diagnostics(mut self, report: &SanitizeReport) -> Self {
		for failure in &report.failed {
			self = self.diagnostic_with_source(
				DiagnosticLevel::Warning,
				format!("{}: {}", failure.path.display(), failure.reason),
				"sanitize",
			);
		}
		self
	}

	pub fn build(self) -> CommandResult<T> {
		let ok = self.error.is_none() && self.data.is_some();
		CommandResult {
			schema_version: SCHEMA_VERSION,
			ok,
			command: self.command,
			data: self.data,
			error: self.error,
			timings: Some(Timings::from(self.start_time.elapsed())),
			diagnostics: self.diagnostics,
		}
	}
}

/// Prints a result envelope. Text mode has already printed status lines, so
/// only JSON writes anything here.
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => {}
	}
}

/// Print an error to stderr in human-readable format
pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
}

/// `launch` payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchData {
	pub workspace: String,
	pub user_data_dir: PathBuf,
	pub executable: PathBuf,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pid: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub devtools_endpoint: Option<String>,
	pub args: Vec<String>,
	pub reconcile: ReconcileReport,
	pub sanitize: SanitizeReport,
}

/// Payload for a selection the operator backed out of.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledData {
	pub cancelled: bool,
	pub reason: String,
}

impl CancelledData {
	pub fn new(reason: impl Into<String>) -> Self {
		Self {
			cancelled: true,
			reason: reason.into(),
		}
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceEntry {
	pub index: usize,
	pub name: String,
	pub path: PathBuf,
	pub last_used: bool,
	/// Any `Singleton*` artifact present.
	pub locked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListData {
	pub root: PathBuf,
	pub workspaces: Vec<WorkspaceEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateData {
	pub workspace: String,
	pub path: PathBuf,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub login: Option<LaunchData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanData {
	pub workspace: String,
	pub report: SanitizeReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockData {
	pub workspace: String,
	pub report: ReconcileReport,
}
