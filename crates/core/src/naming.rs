//! Workspace naming policy.
//!
//! Aliases typed by an operator become canonical workspace names by trimming
//! and prefixing them with `<namespace>_`. The same character rules apply to
//! names read back from disk.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};

/// Characters that may not appear in a workspace name.
pub const FORBIDDEN_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Canonical, validated workspace name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkspaceName(String);

impl WorkspaceName {
	/// Validates `raw` as-is, without namespace prefixing.
	pub fn new(raw: &str) -> Result<Self> {
		let trimmed = raw.trim();
		validate(trimmed)?;
		Ok(Self(trimmed.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for WorkspaceName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for WorkspaceName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl TryFrom<String> for WorkspaceName {
	type Error = ProfileError;

	fn try_from(value: String) -> Result<Self> {
		Self::new(&value)
	}
}

impl From<WorkspaceName> for String {
	fn from(name: WorkspaceName) -> Self {
		name.0
	}
}

/// Normalizes an operator alias into a canonical workspace name.
///
/// Idempotent: an alias already carrying `<namespace>_` is returned trimmed but
/// otherwise unchanged.
pub fn normalize(alias: &str, namespace: &str) -> Result<WorkspaceName> {
	let namespace = namespace.trim();
	validate(namespace).map_err(|_| ProfileError::invalid_name(namespace, "namespace is empty or contains a forbidden character"))?;

	let alias = alias.trim();
	validate(alias)?;

	let prefix = prefix(namespace);
	if alias.starts_with(&prefix) {
		Ok(WorkspaceName(alias.to_string()))
	} else {
		Ok(WorkspaceName(format!("{prefix}{alias}")))
	}
}

fn prefix(namespace: &str) -> String {
	format!("{namespace}_")
}

fn validate(name: &str) -> Result<()> {
	if name.is_empty() {
		return Err(ProfileError::invalid_name(name, "name is empty"));
	}
	if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
		return Err(ProfileError::invalid_name(
			name,
			format!("character {c:?} is not allowed (forbidden: \\ / : * ? \" < > |)"),
		));
	}
	if name.chars().any(char::is_control) {
		return Err(ProfileError::invalid_name(name, "control characters are not allowed"));
	}
	if name == "." || name == ".." {
		return Err(ProfileError::invalid_name(name, "reserved path component"));
	}
	Ok(())
}
