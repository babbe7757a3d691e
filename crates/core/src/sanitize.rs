//! Selective purge of profile state.
//!
//! Cache invalidation and identity preservation are independent: the default
//! mode only ever touches [`SubtreeClass::Transient`] entries.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::layout::{self, StateSubtree, SubtreeClass};
use crate::store::Workspace;

/// What a sanitize pass may delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizeMode {
	/// Drop caches, keep cookies, logins and history.
	#[default]
	PreserveSession,
	/// Drop caches and every persistent entry for a clean identity.
	FullReset,
}

/// One removed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedSubtree {
	pub name: &'static str,
	pub class: SubtreeClass,
	pub path: PathBuf,
}

/// One entry that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtreeFailure {
	pub name: &'static str,
	pub class: SubtreeClass,
	pub path: PathBuf,
	pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeReport {
	pub mode: SanitizeMode,
	pub removed: Vec<RemovedSubtree>,
	pub failed: Vec<SubtreeFailure>,
}

impl SanitizeReport {
	pub fn is_clean(&self) -> bool {
		self.failed.is_empty()
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StateSanitizer;

impl StateSanitizer {
	pub fn new() -> Self {
		Self
	}

	/// Purges state from every profile directory of `workspace`.
	///
	/// Missing entries are skipped silently. Individual removal failures are
	/// recorded in the report rather than returned; only failing to enumerate
	/// the profile directories is an error.
	pub fn sanitize(&self, workspace: &Workspace, mode: SanitizeMode) -> Result<SanitizeReport> {
		let profiles = workspace.profile_dirs()?;
		let mut report = SanitizeReport {
			mode,
			..Default::default()
		};

		for profile in &profiles {
			for subtree in layout::subtrees(SubtreeClass::Transient) {
				purge(subtree, profile, &mut report);
			}
		}

		if mode == SanitizeMode::FullReset {
			// persistent entries go in one uninterrupted batch after the caches
			for profile in &profiles {
				for subtree in layout::subtrees(SubtreeClass::Persistent) {
					purge(subtree, profile, &mut report);
				}
			}
		}

		debug!(
			target = "pwp.sanitize",
			workspace = %workspace.name(),
			?mode,
			removed = report.removed.len(),
			failed = report.failed.len(),
			"sanitize finished"
		);
		Ok(report)
	}
}

fn purge(subtree: &'static StateSubtree, profile: &Path, report: &mut SanitizeReport) {
	let path = subtree.path_in(profile);
	match remove_entry(&path) {
		Ok(true) => {
			info!(target = "pwp.sanitize", entry = subtree.name, path = %path.display(), "removed");
			report.removed.push(RemovedSubtree {
				name: subtree.name,
				class: subtree.class,
				path,
			});
		}
		Ok(false) => {}
		Err(err) => {
			warn!(target = "pwp.sanitize", entry = subtree.name, path = %path.display(), error = %err, "removal failed");
			report.failed.push(SubtreeFailure {
				name: subtree.name,
				class: subtree.class,
				path,
				reason: err.to_string(),
			});
		}
	}
}

/// Removes a file, symlink or directory tree. Returns `false` when absent.
fn remove_entry(path: &Path) -> std::io::Result<bool> {
	let meta = match fs::symlink_metadata(path) {
		Ok(meta) => meta,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
		Err(err) => return Err(err),
	};
	let result = if meta.is_dir() { fs::remove_dir_all(path) } else { fs::remove_file(path) };
	match result {
		Ok(()) => Ok(true),
		Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
		Err(err) => Err(err),
	}
}
