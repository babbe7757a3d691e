//! Workspace lifecycle properties: naming, uniqueness, lock tolerance, cache
//! separation, menu selection and the full select-to-launch flow.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use pw_profile::launcher::BoxFut;
use pw_profile::layout::{LOCK_ARTIFACTS, STATE_SUBTREES, SubtreeClass};
use pw_profile::{
	BrowserDriver, LaunchConfig, LaunchHandle, LaunchOptions, LockReconciler, PreparedWorkspace, ProfileError, SandboxPolicy, SanitizeMode,
	ScriptedPrompt, Selection, SessionLauncher, StateSanitizer, Workspace, WorkspaceName, WorkspaceStore, normalize,
};
use tempfile::TempDir;

#[derive(Default)]
struct RecordingDriver {
	configs: RefCell<Vec<LaunchConfig>>,
}

impl BrowserDriver for RecordingDriver {
	fn start<'a>(&'a self, config: &'a LaunchConfig) -> BoxFut<'a, pw_profile::Result<LaunchHandle>> {
		Box::pin(async move {
			self.configs.borrow_mut().push(config.clone());
			Ok(LaunchHandle::new(PathBuf::from("fake-chrome"), config.clone(), None))
		})
	}
}

#[derive(Default)]
struct FailingDriver {
	calls: Cell<usize>,
}

impl BrowserDriver for FailingDriver {
	fn start<'a>(&'a self, _config: &'a LaunchConfig) -> BoxFut<'a, pw_profile::Result<LaunchHandle>> {
		Box::pin(async move {
			self.calls.set(self.calls.get() + 1);
			Err(ProfileError::DriverStartup("session not created: profile in use".into()))
		})
	}
}

fn name(raw: &str) -> WorkspaceName {
	WorkspaceName::new(raw).unwrap()
}

/// Fills a profile directory with every catalogued entry.
fn populate(profile: &Path) {
	for subtree in STATE_SUBTREES {
		let path = profile.join(subtree.name);
		match subtree.class {
			SubtreeClass::Transient => {
				fs::create_dir_all(path.join("index-dir")).unwrap();
				fs::write(path.join("index-dir").join("the-real-index"), b"cache bytes").unwrap();
			}
			SubtreeClass::Persistent if subtree.name == "Network" => {
				fs::create_dir_all(&path).unwrap();
				fs::write(path.join("Cookies"), b"network cookies").unwrap();
			}
			SubtreeClass::Persistent => {
				fs::write(&path, format!("{} sqlite", subtree.name)).unwrap();
			}
		}
	}
}

/// Snapshot of every file under `dir`, keyed by relative path.
fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
	fn walk(base: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
		for entry in fs::read_dir(dir).unwrap() {
			let path = entry.unwrap().path();
			if path.is_dir() {
				walk(base, &path, out);
			} else {
				out.insert(path.strip_prefix(base).unwrap().to_path_buf(), fs::read(&path).unwrap());
			}
		}
	}
	let mut out = BTreeMap::new();
	walk(dir, dir, &mut out);
	out
}

fn persistent_snapshot(profile: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
	snapshot(profile)
		.into_iter()
		.filter(|(rel, _)| {
			let first = rel.components().next().unwrap().as_os_str().to_string_lossy().to_string();
			STATE_SUBTREES.iter().any(|s| s.name == first && s.class == SubtreeClass::Persistent)
		})
		.collect()
}

fn new_workspace(tmp: &TempDir, raw: &str) -> (WorkspaceStore, Workspace) {
	let store = WorkspaceStore::open(tmp.path()).unwrap();
	let ws = store.create(&name(raw)).unwrap();
	(store, ws)
}

#[test]
fn normalize_twice_equals_normalize_once() {
	for ns in ["naver", "shop", "a"] {
		for alias in ["x", "test", "naver_x", "shop_shop", " pad ", "한글", "with space"] {
			let once = normalize(alias, ns).unwrap();
			assert_eq!(normalize(once.as_str(), ns).unwrap(), once, "alias {alias:?} ns {ns:?}");
		}
	}
}

#[test]
fn duplicate_create_fails_without_touching_disk() {
	let tmp = TempDir::new().unwrap();
	let (store, ws) = new_workspace(&tmp, "naver_dup");
	populate(&ws.default_profile_dir());
	let before = snapshot(tmp.path());

	let err = store.create(&name("naver_dup")).unwrap_err();
	assert!(matches!(err, ProfileError::AlreadyExists { .. }));
	assert_eq!(snapshot(tmp.path()), before);
}

#[test]
fn reconcile_removes_all_stale_artifacts() {
	let tmp = TempDir::new().unwrap();
	let (_, ws) = new_workspace(&tmp, "naver_locked");
	for artifact in LOCK_ARTIFACTS {
		fs::write(ws.root().join(artifact), b"").unwrap();
	}

	let report = LockReconciler::new().reconcile(&ws);
	assert_eq!(report.removed.len(), 3);
	assert!(report.unresolved.is_empty());
	for artifact in LOCK_ARTIFACTS {
		assert!(fs::symlink_metadata(ws.root().join(artifact)).is_err());
	}
}

#[test]
fn reconcile_continues_past_an_undeletable_artifact() {
	let tmp = TempDir::new().unwrap();
	let (_, ws) = new_workspace(&tmp, "naver_held");
	fs::write(ws.root().join("SingletonLock"), b"").unwrap();
	fs::write(ws.root().join("SingletonCookie"), b"").unwrap();
	// a non-empty directory cannot be unlinked as a file, standing in for a held handle
	let held = ws.root().join("SingletonSocket");
	fs::create_dir_all(held.join("inner")).unwrap();

	let report = LockReconciler::new().reconcile(&ws);
	assert_eq!(report.removed, vec!["SingletonLock".to_string(), "SingletonCookie".to_string()]);
	assert_eq!(report.unresolved.len(), 1);
	assert_eq!(report.unresolved[0].name, "SingletonSocket");
	assert!(!report.unresolved[0].reason.is_empty());
	assert!(held.exists());
}

#[test]
fn reconcile_without_artifacts_reports_nothing() {
	let tmp = TempDir::new().unwrap();
	let (_, ws) = new_workspace(&tmp, "naver_clean");
	let report = LockReconciler::new().reconcile(&ws);
	assert!(report.removed.is_empty());
	assert!(report.unresolved.is_empty());
}

#[test]
fn preserve_session_keeps_persistent_bytes_and_drops_caches() {
	let tmp = TempDir::new().unwrap();
	let (_, ws) = new_workspace(&tmp, "naver_session");
	let numbered = ws.root().join("Profile 1");
	fs::create_dir_all(&numbered).unwrap();
	let profiles = [ws.default_profile_dir(), numbered];
	for profile in &profiles {
		populate(profile);
	}
	let before: Vec<_> = profiles.iter().map(|p| persistent_snapshot(p)).collect();

	let report = StateSanitizer::new().sanitize(&ws, SanitizeMode::PreserveSession).unwrap();

	assert!(report.is_clean());
	assert!(report.removed.iter().all(|r| r.class == SubtreeClass::Transient));
	assert_eq!(report.removed.len(), 6);
	for (profile, before) in profiles.iter().zip(before) {
		assert_eq!(persistent_snapshot(profile), before);
		for subtree in STATE_SUBTREES.iter().filter(|s| s.class == SubtreeClass::Transient) {
			assert!(!profile.join(subtree.name).exists(), "{} survived", subtree.name);
		}
	}
}

#[test]
fn preserve_session_is_repeatable() {
	let tmp = TempDir::new().unwrap();
	let (_, ws) = new_workspace(&tmp, "naver_twice");
	populate(&ws.default_profile_dir());
	let sanitizer = StateSanitizer::new();

	sanitizer.sanitize(&ws, SanitizeMode::PreserveSession).unwrap();
	let second = sanitizer.sanitize(&ws, SanitizeMode::PreserveSession).unwrap();
	assert!(second.removed.is_empty());
	assert!(second.is_clean());
}

#[test]
fn full_reset_removes_persistent_entries_too() {
	let tmp = TempDir::new().unwrap();
	let (store, ws) = new_workspace(&tmp, "naver_reset");
	populate(&ws.default_profile_dir());
	fs::write(ws.default_profile_dir().join("Preferences"), b"{}").unwrap();

	let report = StateSanitizer::new().sanitize(&ws, SanitizeMode::FullReset).unwrap();

	assert_eq!(report.removed.len(), STATE_SUBTREES.len());
	let remaining = snapshot(&ws.default_profile_dir());
	assert_eq!(remaining.keys().collect::<Vec<_>>(), vec![Path::new("Preferences")]);
	assert_eq!(store.list().unwrap(), vec![name("naver_reset")]);
}

#[test]
fn menu_picks_second_workspace() {
	let tmp = TempDir::new().unwrap();
	let store = WorkspaceStore::open(tmp.path()).unwrap();
	store.create(&name("naver_a")).unwrap();
	store.create(&name("naver_b")).unwrap();

	let selector = pw_profile::WorkspaceSelector::new(&store, "naver");
	let selection = selector.select(&mut ScriptedPrompt::new(["2"]), None).unwrap();
	assert_eq!(selection, Selection::Existing(name("naver_b")));
}

#[test]
fn menu_create_option_normalizes_alias() {
	let tmp = TempDir::new().unwrap();
	let store = WorkspaceStore::open(tmp.path()).unwrap();
	store.create(&name("naver_a")).unwrap();
	store.create(&name("naver_b")).unwrap();

	let selector = pw_profile::WorkspaceSelector::new(&store, "naver");
	let selection = selector.select(&mut ScriptedPrompt::new(["3", "c"]), None).unwrap();
	assert_eq!(selection, Selection::Created(name("naver_c")));
	assert!(store.exists(&name("naver_c")));
}

#[test]
fn menu_rejects_non_numeric_input_without_mutation() {
	let tmp = TempDir::new().unwrap();
	let store = WorkspaceStore::open(tmp.path()).unwrap();
	store.create(&name("naver_a")).unwrap();
	store.create(&name("naver_b")).unwrap();
	let workspaces_before = store.list().unwrap();

	let selector = pw_profile::WorkspaceSelector::new(&store, "naver");
	let mut prompt = ScriptedPrompt::new(["x"]);
	let selection = selector.select(&mut prompt, None).unwrap();

	// "x" is rejected, the menu asks again, and closed input then cancels
	assert_eq!(selection, Selection::Cancelled);
	assert_eq!(prompt.questions(), 2);
	assert!(prompt.transcript.iter().any(|l| l.starts_with("Invalid choice")));
	assert_eq!(store.list().unwrap(), workspaces_before);
}

#[tokio::test]
async fn empty_root_to_launch() {
	let tmp = TempDir::new().unwrap();
	let store = WorkspaceStore::open(tmp.path()).unwrap();

	let selector = pw_profile::WorkspaceSelector::new(&store, "naver");
	let selection = selector.select(&mut ScriptedPrompt::new(["y", "test"]), None).unwrap();
	assert_eq!(selection, Selection::Created(name("naver_test")));

	let ws = store.get(&name("naver_test")).unwrap();
	assert!(ws.default_profile_dir().is_dir());
	for subtree in STATE_SUBTREES.iter().filter(|s| s.class == SubtreeClass::Transient) {
		assert!(!ws.default_profile_dir().join(subtree.name).exists());
	}

	let prepared = PreparedWorkspace::prepare(ws, &LockReconciler::new(), &StateSanitizer::new(), SanitizeMode::PreserveSession).unwrap();
	assert!(prepared.reconcile_report().removed.is_empty());
	assert!(prepared.reconcile_report().unresolved.is_empty());
	assert!(prepared.sanitize_report().removed.is_empty());

	let options = LaunchOptions {
		sandbox: SandboxPolicy::Enabled,
		..Default::default()
	};
	let launcher = SessionLauncher::new(RecordingDriver::default(), options);
	let handle = launcher.launch(&prepared).await.unwrap();

	assert_eq!(handle.config.user_data_dir(), tmp.path().join("naver_test"));
	assert_eq!(handle.config.workspace(), &name("naver_test"));
	assert!(handle.config.has_flag("--disable-blink-features=AutomationControlled"));
	assert!(handle.config.has_flag("--start-maximized"));
}

#[tokio::test]
async fn driver_failure_is_surfaced_once() {
	let tmp = TempDir::new().unwrap();
	let (_, ws) = new_workspace(&tmp, "naver_fail");
	let prepared = PreparedWorkspace::prepare(ws, &LockReconciler::new(), &StateSanitizer::new(), SanitizeMode::PreserveSession).unwrap();

	let launcher = SessionLauncher::new(FailingDriver::default(), LaunchOptions::default());
	let err = launcher.launch(&prepared).await.unwrap_err();

	assert!(matches!(err, ProfileError::DriverStartup(_)));
	assert_eq!(launcher_calls(&launcher), 1);
}

#[tokio::test]
async fn launch_refuses_deleted_workspace() {
	let tmp = TempDir::new().unwrap();
	let (_, ws) = new_workspace(&tmp, "naver_gone");
	let prepared = PreparedWorkspace::prepare(ws.clone(), &LockReconciler::new(), &StateSanitizer::new(), SanitizeMode::PreserveSession).unwrap();
	fs::remove_dir_all(ws.root()).unwrap();

	let driver = RecordingDriver::default();
	let launcher = SessionLauncher::new(driver, LaunchOptions::default());
	let err = launcher.launch(&prepared).await.unwrap_err();
	assert!(matches!(err, ProfileError::NotFound { .. }));
}

fn launcher_calls(launcher: &SessionLauncher<FailingDriver>) -> usize {
	launcher.driver().calls.get()
}
