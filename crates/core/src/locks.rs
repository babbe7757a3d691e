//! Stale lock-artifact cleanup.
//!
//! Chrome refuses to reuse a user-data directory while `Singleton*` files
//! exist. After a crash they are left behind with no process holding them, so
//! they are removed before every launch. Removal is best-effort: each failure
//! is recorded and the remaining artifacts are still processed.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::{debug, info, warn};

use crate::layout::LOCK_ARTIFACTS;
use crate::store::Workspace;

/// A lock artifact that could not be cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleArtifact {
	pub name: String,
	pub path: PathBuf,
	pub reason: String,
}

/// Process recorded in `SingletonLock` (`<hostname>-<pid>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockOwner {
	pub host: String,
	pub pid: u32,
}

/// Per-artifact outcome of a reconcile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
	/// Artifacts that were present and removed.
	pub removed: Vec<String>,
	/// Artifacts that remain on disk.
	pub unresolved: Vec<StaleArtifact>,
	/// Set when the lock belongs to a process that is still running.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub live_owner: Option<LockOwner>,
}

impl ReconcileReport {
	pub fn is_clean(&self) -> bool {
		self.unresolved.is_empty()
	}
}

/// Clears stale `Singleton*` artifacts from a workspace root.
#[derive(Debug, Clone, Copy)]
pub struct LockReconciler {
	respect_live_owner: bool,
}

impl Default for LockReconciler {
	fn default() -> Self {
		Self::new()
	}
}

impl LockReconciler {
	/// Reconciler that leaves artifacts alone when their owner is still running.
	pub fn new() -> Self {
		Self { respect_live_owner: true }
	}

	/// Reconciler that removes artifacts even when a live owner is detected.
	pub fn force() -> Self {
		Self { respect_live_owner: false }
	}

	/// The running process holding `workspace`, if any. Read-only.
	pub fn live_owner(&self, workspace: &Workspace) -> Option<LockOwner> {
		live_owner(workspace.root())
	}

	pub fn reconcile(&self, workspace: &Workspace) -> ReconcileReport {
		self.reconcile_dir(workspace.root())
	}

	fn reconcile_dir(&self, root: &Path) -> ReconcileReport {
		let mut report = ReconcileReport::default();

		if self.respect_live_owner {
			if let Some(owner) = live_owner(root) {
				warn!(target = "pwp.locks", host = %owner.host, pid = owner.pid, "workspace lock held by a running process");
				for name in LOCK_ARTIFACTS {
					let path = root.join(name);
					if fs::symlink_metadata(&path).is_ok() {
						report.unresolved.push(StaleArtifact {
							name: (*name).to_string(),
							reason: format!("held by live process {}", owner.pid),
							path,
						});
					}
				}
				report.live_owner = Some(owner);
				return report;
			}
		}

		for name in LOCK_ARTIFACTS {
			let path = root.join(name);
			// symlink_metadata: Chrome's artifacts are often dangling symlinks.
			match fs::symlink_metadata(&path) {
				Ok(_) => {}
				Err(err) if err.kind() == ErrorKind::NotFound => continue,
				Err(err) => {
					warn!(target = "pwp.locks", artifact = name, error = %err, "cannot inspect lock artifact");
					report.unresolved.push(StaleArtifact {
						name: (*name).to_string(),
						path,
						reason: err.to_string(),
					});
					continue;
				}
			}

			match fs::remove_file(&path) {
				Ok(()) => {
					info!(target = "pwp.locks", artifact = name, "removed stale lock artifact");
					report.removed.push((*name).to_string());
				}
				Err(err) if err.kind() == ErrorKind::NotFound => {
					debug!(target = "pwp.locks", artifact = name, "artifact vanished before removal");
				}
				Err(err) => {
					warn!(target = "pwp.locks", artifact = name, error = %err, "failed to remove lock artifact");
					report.unresolved.push(StaleArtifact {
						name: (*name).to_string(),
						path,
						reason: err.to_string(),
					});
				}
			}
		}

		report
	}
}

/// Reads the `SingletonLock` target and returns its owner when that process
/// runs on this host.
fn live_owner(root: &Path) -> Option<LockOwner> {
	let target = fs::read_link(root.join("SingletonLock")).ok()?;
	let owner = parse_lock_target(target.to_str()?)?;
	let this_host = System::host_name()?;
	if owner.host != this_host {
		debug!(target = "pwp.locks", host = %owner.host, "lock written by another host; treating as stale");
		return None;
	}
	pid_is_alive(owner.pid).then_some(owner)
}

fn parse_lock_target(target: &str) -> Option<LockOwner> {
	let (host, pid) = target.rsplit_once('-')?;
	if host.is_empty() {
		return None;
	}
	Some(LockOwner {
		host: host.to_string(),
		pid: pid.parse().ok()?,
	})
}

pub(crate) fn pid_is_alive(pid: u32) -> bool {
	let pid = Pid::from_u32(pid);
	let mut sys = System::new();
	sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
	sys.process(pid).is_some()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_lock_target_splits_on_last_dash() {
		let owner = parse_lock_target("my-host-name-4242").unwrap();
		assert_eq!(owner.host, "my-host-name");
		assert_eq!(owner.pid, 4242);
	}

	#[test]
	fn parse_lock_target_rejects_garbage() {
		assert!(parse_lock_target("nodash").is_none());
		assert!(parse_lock_target("-12").is_none());
		assert!(parse_lock_target("host-abc").is_none());
	}

	#[test]
	fn missing_root_reports_nothing() {
		let report = LockReconciler::new().reconcile_dir(Path::new("/definitely/not/here"));
		assert!(report.removed.is_empty());
		assert!(report.is_clean());
	}

	#[cfg(unix)]
	#[test]
	fn live_owner_blocks_removal() {
		let Some(host) = System::host_name() else {
			return;
		};
		let tmp = tempfile::TempDir::new().unwrap();
		let lock = tmp.path().join("SingletonLock");
		std::os::unix::fs::symlink(format!("{host}-{}", std::process::id()), &lock).unwrap();

		let report = LockReconciler::new().reconcile_dir(tmp.path());
		assert_eq!(report.live_owner.as_ref().map(|o| o.pid), Some(std::process::id()));
		assert_eq!(report.unresolved.len(), 1);
		assert!(fs::symlink_metadata(&lock).is_ok());

		let forced = LockReconciler::force().reconcile_dir(tmp.path());
		assert_eq!(forced.removed, vec!["SingletonLock".to_string()]);
		assert!(fs::symlink_metadata(&lock).is_err());
	}

	#[cfg(unix)]
	#[test]
	fn live_owner_is_read_only() {
		let Some(host) = System::host_name() else {
			return;
		};
		let tmp = tempfile::TempDir::new().unwrap();
		let store = crate::store::WorkspaceStore::open(tmp.path()).unwrap();
		let ws = store.create(&crate::naming::WorkspaceName::new("naver_busy").unwrap()).unwrap();
		let lock = ws.root().join("SingletonLock");
		assert!(LockReconciler::new().live_owner(&ws).is_none());

		std::os::unix::fs::symlink(format!("{host}-{}", std::process::id()), &lock).unwrap();
		let owner = LockReconciler::new().live_owner(&ws).unwrap();
		assert_eq!(owner.pid, std::process::id());
		assert!(fs::symlink_metadata(&lock).is_ok());
	}

	#[cfg(unix)]
	#[test]
	fn dangling_symlink_is_removed() {
		let tmp = tempfile::TempDir::new().unwrap();
		let lock = tmp.path().join("SingletonLock");
		std::os::unix::fs::symlink("some-other-host-1", &lock).unwrap();

		let report = LockReconciler::new().reconcile_dir(tmp.path());
		assert_eq!(report.removed, vec!["SingletonLock".to_string()]);
		assert!(report.live_owner.is_none());
		assert!(fs::symlink_metadata(&lock).is_err());
	}
}
