//! Workspace enumeration and creation under a single root directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ProfileError, Result};
use crate::layout::{self, DEFAULT_PROFILE_DIR};
use crate::naming::WorkspaceName;

/// A named user-data directory owned by one automation identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
	name: WorkspaceName,
	root: PathBuf,
}

impl Workspace {
	pub fn name(&self) -> &WorkspaceName {
		&self.name
	}

	/// The user-data directory handed to the browser.
	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn default_profile_dir(&self) -> PathBuf {
		self.root.join(DEFAULT_PROFILE_DIR)
	}

	/// Profile directories (`Default`, `Profile N`) currently present, sorted.
	pub fn profile_dirs(&self) -> Result<Vec<PathBuf>> {
		let mut dirs = Vec::new();
		for entry in fs::read_dir(&self.root)? {
			let entry = entry?;
			if !entry.file_type()?.is_dir() {
				continue;
			}
			if entry.file_name().to_str().is_some_and(layout::is_profile_dir_name) {
				dirs.push(entry.path());
			}
		}
		dirs.sort();
		Ok(dirs)
	}
}

/// Owns the directory that holds every workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceStore {
	root: PathBuf,
}

impl WorkspaceStore {
	/// Opens the store at `root`, creating the directory when missing.
	pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
		let root = root.into();
		if let Err(source) = fs::create_dir_all(&root) {
			return Err(ProfileError::InvalidRoot { path: root, source });
		}
		if !root.is_dir() {
			return Err(ProfileError::InvalidRoot {
				source: std::io::Error::new(ErrorKind::NotADirectory, "workspace root is not a directory"),
				path: root,
			});
		}
		Ok(Self { root })
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Path of the workspace called `name`. Performs no I/O.
	pub fn root_of(&self, name: &WorkspaceName) -> PathBuf {
		self.root.join(name.as_str())
	}

	pub fn exists(&self, name: &WorkspaceName) -> bool {
		self.root_of(name).is_dir()
	}

	/// Lists workspaces sorted by name.
	///
	/// A directory counts only when it holds a `Default` or `Profile*`
	/// directory, so a half-created workspace never shows up.
	pub fn list(&self) -> Result<Vec<WorkspaceName>> {
		let entries = fs::read_dir(&self.root).map_err(|source| ProfileError::InvalidRoot {
			path: self.root.clone(),
			source,
		})?;

		let mut names = Vec::new();
		for entry in entries {
			let entry = entry?;
			if !entry.file_type()?.is_dir() {
				continue;
			}
			let Some(raw) = entry.file_name().to_str().map(str::to_owned) else {
				debug!(target = "pwp.store", path = %entry.path().display(), "skipping non-UTF-8 directory");
				continue;
			};
			if raw.starts_with('.') {
				continue;
			}
			let Ok(name) = WorkspaceName::new(&raw) else {
				debug!(target = "pwp.store", name = %raw, "skipping directory with invalid workspace name");
				continue;
			};
			if has_profile_dir(&entry.path()) {
				names.push(name);
			}
		}
		names.sort();
		Ok(names)
	}

	/// Creates a workspace with an empty `Default` profile directory.
	///
	/// Fails with [`ProfileError::AlreadyExists`] when anything already occupies
	/// the target path; the filesystem is left untouched in that case.
	pub fn create(&self, name: &WorkspaceName) -> Result<Workspace> {
		let root = self.root_of(name);
		match fs::create_dir(&root) {
			Ok(()) => {}
			Err(err) if err.kind() == ErrorKind::AlreadyExists => {
				return Err(ProfileError::AlreadyExists {
					name: name.to_string(),
					path: root,
				});
			}
			Err(err) => return Err(ProfileError::Io(err)),
		}

		if let Err(err) = fs::create_dir(root.join(DEFAULT_PROFILE_DIR)) {
			let _ = fs::remove_dir_all(&root);
			return Err(ProfileError::Io(err));
		}

		info!(target = "pwp.store", name = %name, path = %root.display(), "workspace created");
		Ok(Workspace { name: name.clone(), root })
	}

	/// Opens an existing workspace, restoring its `Default` directory if absent.
	pub fn get(&self, name: &WorkspaceName) -> Result<Workspace> {
		let root = self.root_of(name);
		if !root.is_dir() {
			return Err(ProfileError::NotFound { name: name.to_string() });
		}
		let default_dir = root.join(DEFAULT_PROFILE_DIR);
		if !default_dir.is_dir() {
			fs::create_dir_all(&default_dir)?;
			debug!(target = "pwp.store", name = %name, "restored missing Default profile directory");
		}
		Ok(Workspace { name: name.clone(), root })
	}
}

fn has_profile_dir(path: &Path) -> bool {
	let Ok(entries) = fs::read_dir(path) else {
		return false;
	};
	entries.flatten().any(|entry| {
		entry.file_type().is_ok_and(|t| t.is_dir()) && entry.file_name().to_str().is_some_and(layout::is_profile_dir_name)
	})
}
