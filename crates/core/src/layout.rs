//! On-disk layout of a Chrome user-data directory.
//!
//! ```text
//! <workspace>/
//!   Default/ | Profile N/      profile directories
//!     Cache/ Code Cache/ GPUCache/                      transient
//!     Cookies Login Data History Visited Links Web Data  persistent
//!   SingletonLock SingletonSocket SingletonCookie        lock artifacts
//! ```

use std::path::{Path, PathBuf};

/// Name of the profile directory every workspace starts with.
pub const DEFAULT_PROFILE_DIR: &str = "Default";

/// Prefix of additional numbered profile directories (`Profile 1`, ...).
pub const NUMBERED_PROFILE_PREFIX: &str = "Profile";

/// Sentinel files Chrome uses to detect another process on the same user-data dir.
pub const LOCK_ARTIFACTS: &[&str] = &["SingletonLock", "SingletonSocket", "SingletonCookie"];

/// Whether a state subtree may be deleted without losing the session identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtreeClass {
	/// Cache data, rebuilt by the browser on demand.
	Transient,
	/// Credentials and history that keep a login alive.
	Persistent,
}

/// A named entry inside a profile directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSubtree {
	pub name: &'static str,
	pub class: SubtreeClass,
}

impl StateSubtree {
	const fn transient(name: &'static str) -> Self {
		Self {
			name,
			class: SubtreeClass::Transient,
		}
	}

	const fn persistent(name: &'static str) -> Self {
		Self {
			name,
			class: SubtreeClass::Persistent,
		}
	}

	pub fn path_in(&self, profile_dir: &Path) -> PathBuf {
		profile_dir.join(self.name)
	}
}

/// Every subtree the sanitizer knows about, transient entries first.
pub const STATE_SUBTREES: &[StateSubtree] = &[
	StateSubtree::transient("Cache"),
	StateSubtree::transient("Code Cache"),
	StateSubtree::transient("GPUCache"),
	StateSubtree::persistent("Cookies"),
	StateSubtree::persistent("Login Data"),
	StateSubtree::persistent("History"),
	StateSubtree::persistent("Visited Links"),
	StateSubtree::persistent("Web Data"),
	StateSubtree::persistent("Network"),
];

pub fn subtrees(class: SubtreeClass) -> impl Iterator<Item = &'static StateSubtree> {
	STATE_SUBTREES.iter().filter(move |s| s.class == class)
}

/// Returns `true` for directory names Chrome uses as profile directories.
pub fn is_profile_dir_name(name: &str) -> bool {
	name == DEFAULT_PROFILE_DIR || name.starts_with(NUMBERED_PROFILE_PREFIX)
}
