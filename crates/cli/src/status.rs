//! Human-readable status lines.
//!
//! Text mode writes to stdout; JSON mode moves them to stderr so the
//! envelope on stdout stays parseable.

use std::fmt::Display;

use colored::Colorize;
use pw_profile::locks::ReconcileReport;
use pw_profile::sanitize::SanitizeReport;

use crate::output::OutputFormat;

#[derive(Debug, Clone, Copy)]
pub struct Reporter {
	to_stderr: bool,
}

impl Reporter {
	pub fn new(format: OutputFormat) -> Self {
		Self {
			to_stderr: format == OutputFormat::Json,
		}
	}

	/// Reporter that always writes to stderr.
	pub fn stderr() -> Self {
		Self { to_stderr: true }
	}

	fn emit(&self, line: String) {
		if self.to_stderr {
			eprintln!("{line}");
		} else {
			println!("{line}");
		}
	}

	pub fn info(&self, message: impl Display) {
		self.emit(format!("{} {message}", "·".dimmed()));
	}

	pub fn success(&self, message: impl Display) {
		self.emit(format!("{} {message}", "✓".green().bold()));
	}

	pub fn warn(&self, message: impl Display) {
		self.emit(format!("{} {message}", "!".yellow().bold()));
	}

	pub fn reconcile(&self, report: &ReconcileReport) {
		for (tone, line) in reconcile_lines(report) {
			match tone {
				Tone::Info => self.info(line),
				Tone::Warn => self.warn(line),
			}
		}
	}

	pub fn sanitize(&self, report: &SanitizeReport) {
		if report.removed.is_empty() {
			self.info("No cached state to purge.");
		} else {
			let mut names: Vec<&str> = Vec::new();
			for removed in &report.removed {
				if !names.contains(&removed.name) {
					names.push(removed.name);
				}
			}
			self.info(format!("Purged: {}", names.join(", ")));
		}
		for failure in &report.failed {
			self.warn(format!("Could not remove {}: {}", failure.path.display(), failure.reason));
		}
	}

	pub fn guidance(&self, lines: &[&str]) {
		for line in lines {
			self.emit(format!("  {} {line}", "→".cyan()));
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
	Info,
	Warn,
}

/// One line per removed batch, plus one per artifact left on disk.
fn reconcile_lines(report: &ReconcileReport) -> Vec<(Tone, String)> {
	let mut lines = Vec::new();
	if let Some(owner) = &report.live_owner {
		lines.push((
			Tone::Warn,
			format!("Workspace is in use by process {} on {}; lock files left in place.", owner.pid, owner.host),
		));
	}
	if !report.removed.is_empty() {
		lines.push((Tone::Info, format!("Removed stale lock files: {}", report.removed.join(", "))));
	}
	for artifact in &report.unresolved {
		lines.push((Tone::Warn, format!("Could not remove {}: {}", artifact.name, artifact.reason)));
	}
	lines
}
