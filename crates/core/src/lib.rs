//! Isolated, reusable browser-profile workspaces.
//!
//! A workspace is a Chrome user-data directory kept under a single root so an
//! automation run can resume an authenticated session. The flow for every run
//! is: [`selector`] picks or creates a workspace, [`locks`] clears stale
//! `Singleton*` artifacts, [`sanitize`] drops caches, and [`launcher`] hands
//! the directory to the browser.

pub mod config;
pub mod error;
pub mod last_used;
pub mod launcher;
pub mod layout;
pub mod locks;
pub mod naming;
pub mod sanitize;
pub mod selector;
pub mod store;

pub use config::ProfileConfig;
pub use error::{ProfileError, Result};
pub use launcher::{BrowserDriver, ChromeDriver, LaunchConfig, LaunchHandle, LaunchOptions, PreparedWorkspace, SandboxPolicy, SessionLauncher};
pub use locks::{LockReconciler, ReconcileReport, StaleArtifact};
pub use naming::{WorkspaceName, normalize};
pub use sanitize::{SanitizeMode, SanitizeReport, StateSanitizer};
pub use selector::{InputError, Prompt, ScriptedPrompt, Selection, TerminalPrompt, WorkspaceSelector};
pub use store::{Workspace, WorkspaceStore};
