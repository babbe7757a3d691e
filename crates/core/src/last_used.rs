//! Record of the most recently selected workspace.
//!
//! Lets an operator confirm the previous choice with an empty answer.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::naming::WorkspaceName;

/// File name of the record, stored directly under the workspace root.
pub const LAST_USED_FILE: &str = ".last-workspace.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastUsed {
	pub name: WorkspaceName,
	/// Unix epoch seconds of the selection.
	pub selected_at: u64,
}

pub fn path(root: &Path) -> PathBuf {
	root.join(LAST_USED_FILE)
}

/// Loads the record. A missing or unreadable file yields `None`.
pub fn load(root: &Path) -> Option<LastUsed> {
	let path = path(root);
	let content = fs::read_to_string(&path).ok()?;
	match serde_json::from_str(&content) {
		Ok(record) => Some(record),
		Err(err) => {
			debug!(target = "pwp.store", path = %path.display(), error = %err, "ignoring unreadable last-used record");
			None
		}
	}
}

pub fn record(root: &Path, name: &WorkspaceName) -> Result<()> {
	let record = LastUsed {
		name: name.clone(),
		selected_at: now_ts(),
	};
	fs::write(path(root), serde_json::to_string_pretty(&record)?)?;
	Ok(())
}

/// Current Unix timestamp in seconds.
pub fn now_ts() -> u64 {
	std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs()
}
