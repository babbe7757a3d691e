//! Layered configuration: defaults, then the JSON config file, then
//! environment variables. CLI flags are applied last by the caller.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProfileError, Result};
use crate::launcher::{LaunchOptions, SandboxPolicy};

pub const DEFAULT_NAMESPACE: &str = "naver";
pub const DEFAULT_START_URL: &str = "https://www.naver.com/";
pub const DEFAULT_LOGIN_URL: &str = "https://nid.naver.com/nidlogin.login";

pub const ENV_ROOT: &str = "PWP_ROOT";
pub const ENV_NAMESPACE: &str = "PWP_NAMESPACE";
pub const ENV_BROWSER: &str = "PWP_BROWSER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileConfig {
	/// Directory holding every workspace; see [`default_root`].
	pub root: Option<PathBuf>,
	/// Prefix applied to new workspace names.
	pub namespace: String,
	pub browser: Option<PathBuf>,
	pub start_url: String,
	pub login_url: String,
	pub headless: bool,
	pub sandbox: SandboxPolicy,
	pub remote_debugging_port: Option<u16>,
	pub extra_args: Vec<String>,
}

impl Default for ProfileConfig {
	fn default() -> Self {
		Self {
			root: None,
			namespace: DEFAULT_NAMESPACE.to_string(),
			browser: None,
			start_url: DEFAULT_START_URL.to_string(),
			login_url: DEFAULT_LOGIN_URL.to_string(),
			headless: false,
			sandbox: SandboxPolicy::Auto,
			remote_debugging_port: None,
			extra_args: Vec::new(),
		}
	}
}

impl ProfileConfig {
	/// Loads the config file and applies environment overrides.
	///
	/// An explicit `path` must exist; the default location may be absent.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let mut config = match path {
			Some(path) => Self::from_file(path)?.ok_or_else(|| ProfileError::Config(format!("config file not found: {}", path.display())))?,
			None => match default_config_path() {
				Some(path) => Self::from_file(&path)?.unwrap_or_default(),
				None => Self::default(),
			},
		};
		config.apply_env(|key| std::env::var(key).ok());
		Ok(config)
	}

	fn from_file(path: &Path) -> Result<Option<Self>> {
		let content = match fs::read_to_string(path) {
			Ok(content) => content,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
			Err(err) => return Err(ProfileError::Io(err)),
		};
		let config = serde_json::from_str(&content).map_err(|e| ProfileError::Config(format!("{}: {e}", path.display())))?;
		debug!(target = "pwp.config", path = %path.display(), "loaded config file");
		Ok(Some(config))
	}

	/// Applies `PWP_*` overrides read through `get`.
	pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
		if let Some(root) = get(ENV_ROOT).filter(|v| !v.is_empty()) {
			self.root = Some(PathBuf::from(root));
		}
		if let Some(namespace) = get(ENV_NAMESPACE).filter(|v| !v.is_empty()) {
			self.namespace = namespace;
		}
		if let Some(browser) = get(ENV_BROWSER).filter(|v| !v.is_empty()) {
			self.browser = Some(PathBuf::from(browser));
		}
	}

	/// Effective workspace root.
	pub fn root(&self) -> PathBuf {
		self.root.clone().unwrap_or_else(default_root)
	}

	/// Launch options opening `start_url`.
	pub fn launch_options(&self, start_url: &str) -> LaunchOptions {
		LaunchOptions {
			browser: self.browser.clone(),
			start_url: Some(start_url.to_string()).filter(|u| !u.is_empty()),
			headless: self.headless,
			sandbox: self.sandbox,
			remote_debugging_port: self.remote_debugging_port,
			extra_args: self.extra_args.clone(),
		}
	}
}

/// `$XDG_CONFIG_HOME/pw-profile/config.json`, else the platform config dir.
pub fn default_config_path() -> Option<PathBuf> {
	let base = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from).or_else(dirs::config_dir)?;
	Some(base.join("pw-profile").join("config.json"))
}

/// `<data dir>/pw-profile/user_data`.
pub fn default_root() -> PathBuf {
	dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("pw-profile").join("user_data")
}
