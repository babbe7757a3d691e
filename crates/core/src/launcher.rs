//! Launch configuration and browser hand-off.
//!
//! A workspace reaches the browser only as a [`PreparedWorkspace`], which can
//! only be built by running lock reconciliation and sanitization first.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::{ProfileError, Result};
use crate::locks::{LockReconciler, ReconcileReport};
use crate::naming::WorkspaceName;
use crate::sanitize::{SanitizeMode, SanitizeReport, StateSanitizer};
use crate::store::Workspace;

/// Boxing alias: stable async in trait without `async_trait`.
pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// How long a freshly spawned browser must stay up to count as started.
const STARTUP_GRACE: Duration = Duration::from_millis(1500);
const STARTUP_POLL: Duration = Duration::from_millis(100);
const DEVTOOLS_ATTEMPTS: usize = 15;

/// Whether Chrome's sandbox stays enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxPolicy {
	/// Disable only when running as root on Linux or inside a container.
	#[default]
	Auto,
	Enabled,
	Disabled,
}

impl SandboxPolicy {
	pub fn sandbox_disabled(self) -> bool {
		match self {
			SandboxPolicy::Enabled => false,
			SandboxPolicy::Disabled => true,
			SandboxPolicy::Auto => host_requires_no_sandbox(),
		}
	}
}

impl std::str::FromStr for SandboxPolicy {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"auto" => Ok(SandboxPolicy::Auto),
			"enabled" => Ok(SandboxPolicy::Enabled),
			"disabled" => Ok(SandboxPolicy::Disabled),
			_ => Err(format!("unknown sandbox policy: {s}")),
		}
	}
}

#[cfg(target_os = "linux")]
fn host_requires_no_sandbox() -> bool {
	use std::os::unix::fs::MetadataExt;

	let is_root = std::fs::metadata("/proc/self").is_ok_and(|m| m.uid() == 0);
	let in_container = Path::new("/.dockerenv").exists() || Path::new("/run/.containerenv").exists();
	is_root || in_container
}

#[cfg(not(target_os = "linux"))]
fn host_requires_no_sandbox() -> bool {
	false
}

/// Operator-tunable launch settings.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
	/// Explicit browser executable; discovered when `None`.
	pub browser: Option<PathBuf>,
	/// Page opened after startup.
	pub start_url: Option<String>,
	pub headless: bool,
	pub sandbox: SandboxPolicy,
	/// Exposes DevTools so an automation engine can attach.
	pub remote_debugging_port: Option<u16>,
	/// Appended after the fixed flags.
	pub extra_args: Vec<String>,
}

/// A workspace whose stale locks and caches have been dealt with.
#[derive(Debug)]
pub struct PreparedWorkspace {
	workspace: Workspace,
	reconcile: ReconcileReport,
	sanitize: SanitizeReport,
}

impl PreparedWorkspace {
	/// Reconciles lock artifacts, then sanitizes, in that order.
	pub fn prepare(workspace: Workspace, reconciler: &LockReconciler, sanitizer: &StateSanitizer, mode: SanitizeMode) -> Result<Self> {
		let reconcile = reconciler.reconcile(&workspace);
		let sanitize = sanitizer.sanitize(&workspace, mode)?;
		Ok(Self {
			workspace,
			reconcile,
			sanitize,
		})
	}

	pub fn workspace(&self) -> &Workspace {
		&self.workspace
	}

	pub fn reconcile_report(&self) -> &ReconcileReport {
		&self.reconcile
	}

	pub fn sanitize_report(&self) -> &SanitizeReport {
		&self.sanitize
	}
}

/// Immutable description of one browser launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
	workspace: WorkspaceName,
	user_data_dir: PathBuf,
	browser: Option<PathBuf>,
	args: Vec<String>,
	remote_debugging_port: Option<u16>,
}

impl LaunchConfig {
	/// Builds the flag set for `workspace`.
	pub fn new(workspace: &Workspace, options: &LaunchOptions) -> Self {
		let mut args = vec![
			format!("--user-data-dir={}", workspace.root().display()),
			"--disable-blink-features=AutomationControlled".to_string(),
			"--disable-dev-shm-usage".to_string(),
			"--disable-gpu".to_string(),
			"--no-first-run".to_string(),
			"--no-default-browser-check".to_string(),
			"--disable-logging".to_string(),
			"--log-level=3".to_string(),
		];

		if options.headless {
			args.push("--headless=new".to_string());
			args.push("--window-size=1920,1080".to_string());
		} else {
			args.push("--start-maximized".to_string());
		}

		if options.sandbox.sandbox_disabled() {
			args.push("--no-sandbox".to_string());
		}

		if let Some(port) = options.remote_debugging_port {
			args.push(format!("--remote-debugging-port={port}"));
		}

		args.extend(options.extra_args.iter().cloned());

		if let Some(url) = &options.start_url {
			args.push(url.clone());
		}

		Self {
			workspace: workspace.name().clone(),
			user_data_dir: workspace.root().to_path_buf(),
			browser: options.browser.clone(),
			args,
			remote_debugging_port: options.remote_debugging_port,
		}
	}

	pub fn workspace(&self) -> &WorkspaceName {
		&self.workspace
	}

	pub fn user_data_dir(&self) -> &Path {
		&self.user_data_dir
	}

	pub fn browser(&self) -> Option<&Path> {
		self.browser.as_deref()
	}

	pub fn args(&self) -> &[String] {
		&self.args
	}

	pub fn remote_debugging_port(&self) -> Option<u16> {
		self.remote_debugging_port
	}

	pub fn has_flag(&self, flag: &str) -> bool {
		self.args.iter().any(|a| a == flag)
	}
}

/// A started browser.
#[derive(Debug)]
pub struct LaunchHandle {
	pub pid: Option<u32>,
	pub executable: PathBuf,
	pub devtools_endpoint: Option<String>,
	pub config: LaunchConfig,
	child: Option<Child>,
}

impl LaunchHandle {
	pub fn new(executable: PathBuf, config: LaunchConfig, child: Option<Child>) -> Self {
		Self {
			pid: child.as_ref().and_then(Child::id),
			executable,
			devtools_endpoint: None,
			config,
			child,
		}
	}

	/// Waits for the browser to exit. Returns immediately when there is no
	/// child process attached.
	pub async fn wait(&mut self) -> Result<Option<std::process::ExitStatus>> {
		match self.child.as_mut() {
			Some(child) => Ok(Some(child.wait().await?)),
			None => Ok(None),
		}
	}
}

/// Starts a browser process for a launch configuration.
pub trait BrowserDriver {
	fn start<'a>(&'a self, config: &'a LaunchConfig) -> BoxFut<'a, Result<LaunchHandle>>;
}

/// Binds prepared workspaces to a driver.
pub struct SessionLauncher<D> {
	driver: D,
	options: LaunchOptions,
}

impl<D: BrowserDriver> SessionLauncher<D> {
	pub fn new(driver: D, options: LaunchOptions) -> Self {
		Self { driver, options }
	}

	pub fn driver(&self) -> &D {
		&self.driver
	}

	pub fn options(&self) -> &LaunchOptions {
		&self.options
	}

	pub fn configure(&self, prepared: &PreparedWorkspace) -> LaunchConfig {
		LaunchConfig::new(prepared.workspace(), &self.options)
	}

	/// Hands the workspace to the driver. Startup failures are returned as-is;
	/// nothing is retried.
	pub async fn launch(&self, prepared: &PreparedWorkspace) -> Result<LaunchHandle> {
		let workspace = prepared.workspace();
		if !workspace.root().is_dir() {
			return Err(ProfileError::NotFound {
				name: workspace.name().to_string(),
			});
		}

		let config = self.configure(prepared);
		debug!(target = "pwp.launch", workspace = %workspace.name(), args = ?config.args(), "launching browser");

		match self.driver.start(&config).await {
			Ok(handle) => {
				info!(target = "pwp.launch", workspace = %workspace.name(), pid = ?handle.pid, "browser started");
				Ok(handle)
			}
			Err(err) => {
				warn!(target = "pwp.launch", workspace = %workspace.name(), error = %err, "browser startup failed");
				Err(err)
			}
		}
	}
}

/// `/json/version` response subset from Chrome DevTools Protocol.
#[derive(Debug, Deserialize)]
pub struct DevtoolsVersion {
	#[serde(rename = "webSocketDebuggerUrl")]
	pub web_socket_debugger_url: String,
	#[serde(rename = "Browser")]
	pub browser: Option<String>,
}

/// Spawns a local Chrome/Chromium executable.
#[derive(Debug, Clone, Default)]
pub struct ChromeDriver;

impl ChromeDriver {
	pub fn new() -> Self {
		Self
	}

	async fn start_inner(&self, config: &LaunchConfig) -> Result<LaunchHandle> {
		let executable = match config.browser() {
			Some(explicit) => resolve_explicit_browser(explicit)?,
			None => find_chrome_executable().ok_or(ProfileError::BrowserNotFound)?,
		};

		let mut cmd = Command::new(&executable);
		cmd.args(config.args()).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

		#[cfg(unix)]
		cmd.process_group(0);

		let mut child = cmd
			.spawn()
			.map_err(|e| ProfileError::DriverStartup(format!("failed to spawn {}: {e}", executable.display())))?;

		let mut waited = Duration::ZERO;
		while waited < STARTUP_GRACE {
			tokio::time::sleep(STARTUP_POLL).await;
			waited += STARTUP_POLL;
			if let Some(status) = child.try_wait()? {
				return Err(ProfileError::DriverStartup(format!(
					"browser exited during startup ({status}); another browser process may already hold this workspace"
				)));
			}
		}

		let devtools_endpoint = match config.remote_debugging_port() {
			Some(port) => match wait_for_devtools(port).await {
				Ok(info) => {
					debug!(target = "pwp.launch", browser = ?info.browser, "devtools endpoint ready");
					Some(info.web_socket_debugger_url)
				}
				Err(err) => {
					// the browser would keep holding the workspace lock
					if let Err(kill_err) = child.kill().await {
						warn!(target = "pwp.launch", pid = ?child.id(), error = %kill_err, "failed to stop browser after DevTools timeout");
					}
					return Err(err);
				}
			},
			None => None,
		};

		let mut handle = LaunchHandle::new(executable, config.clone(), Some(child));
		handle.devtools_endpoint = devtools_endpoint;
		Ok(handle)
	}
}

impl BrowserDriver for ChromeDriver {
	fn start<'a>(&'a self, config: &'a LaunchConfig) -> BoxFut<'a, Result<LaunchHandle>> {
		Box::pin(self.start_inner(config))
	}
}

fn resolve_explicit_browser(path: &Path) -> Result<PathBuf> {
	if path.components().count() == 1 {
		return which::which(path).map_err(|_| ProfileError::BrowserNotFound);
	}
	if path.is_file() {
		Ok(path.to_path_buf())
	} else {
		Err(ProfileError::BrowserNotFound)
	}
}

/// Finds an installed Chrome/Chromium executable.
pub fn find_chrome_executable() -> Option<PathBuf> {
	let candidates: Vec<String> = if cfg!(target_os = "macos") {
		[
			"/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
			"/Applications/Chromium.app/Contents/MacOS/Chromium",
			"/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
		]
		.into_iter()
		.map(str::to_string)
		.collect()
	} else if cfg!(target_os = "windows") {
		windows_browser_candidates()
	} else {
		[
			"google-chrome-stable",
			"google-chrome",
			"chromium-browser",
			"chromium",
			"brave-browser",
			"/usr/bin/google-chrome-stable",
			"/usr/bin/google-chrome",
			"/usr/bin/chromium-browser",
			"/usr/bin/chromium",
			"/snap/bin/chromium",
		]
		.into_iter()
		.map(str::to_string)
		.collect()
	};

	for candidate in candidates {
		if candidate.starts_with('/') || candidate.contains('\\') || candidate.contains(':') {
			let path = PathBuf::from(&candidate);
			if path.exists() {
				return Some(path);
			}
		} else if let Ok(path) = which::which(&candidate) {
			return Some(path);
		}
	}

	None
}

fn windows_browser_candidates() -> Vec<String> {
	let mut roots = Vec::new();
	for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
		if let Ok(value) = std::env::var(key) {
			roots.push(PathBuf::from(value));
		}
	}
	if roots.is_empty() {
		roots.push(PathBuf::from(r"C:\Program Files"));
		roots.push(PathBuf::from(r"C:\Program Files (x86)"));
	}

	let suffixes: &[&[&str]] = &[
		&["Google", "Chrome", "Application", "chrome.exe"],
		&["Chromium", "Application", "chrome.exe"],
		&["BraveSoftware", "Brave-Browser", "Application", "brave.exe"],
	];

	let mut candidates = Vec::new();
	for root in roots {
		for suffix in suffixes {
			let mut path = root.clone();
			for component in *suffix {
				path.push(component);
			}
			candidates.push(path.to_string_lossy().to_string());
		}
	}
	candidates.extend(["chrome.exe".to_string(), "chromium.exe".to_string()]);
	candidates
}

/// Resolves DevTools version metadata from `/json/version` on `port`.
pub async fn fetch_devtools_version(port: u16) -> Result<DevtoolsVersion> {
	let client = reqwest::Client::builder()
		.timeout(Duration::from_millis(400))
		.build()
		.map_err(|e| ProfileError::DriverStartup(format!("failed to create HTTP client: {e}")))?;

	let url = format!("http://127.0.0.1:{port}/json/version");
	let response = client
		.get(&url)
		.send()
		.await
		.map_err(|e| ProfileError::DriverStartup(format!("DevTools endpoint not reachable on port {port}: {e}")))?;
	if !response.status().is_success() {
		return Err(ProfileError::DriverStartup(format!("unexpected status {} from {url}", response.status())));
	}
	response
		.json()
		.await
		.map_err(|e| ProfileError::DriverStartup(format!("failed to parse DevTools response: {e}")))
}

async fn wait_for_devtools(port: u16) -> Result<DevtoolsVersion> {
	let mut last_error = String::from("endpoint not reachable");
	for _ in 0..DEVTOOLS_ATTEMPTS {
		match fetch_devtools_version(port).await {
			Ok(info) => return Ok(info),
			Err(ProfileError::DriverStartup(reason)) => last_error = reason,
			Err(err) => last_error = err.to_string(),
		}
		tokio::time::sleep(Duration::from_millis(200)).await;
	}
	Err(ProfileError::DriverStartup(format!(
		"browser started but DevTools did not answer on port {port}: {last_error}"
	)))
}
