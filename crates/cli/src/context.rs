//! Command context shared by every subcommand.
//!
//! Holds the resolved configuration (file, environment, then global flags),
//! the opened workspace store, and the output format.

use std::io::{self, Write};

use pw_profile::{ProfileConfig, Prompt, Selection, TerminalPrompt, Workspace, WorkspaceName, WorkspaceSelector, WorkspaceStore, normalize};
use tracing::debug;

use crate::cli::Cli;
use crate::error::Result;
use crate::output::OutputFormat;

/// Prompt used by commands: stdin plus stdout, or stderr in JSON mode.
pub type CliPrompt = TerminalPrompt<io::StdinLock<'static>, Box<dyn Write>>;

pub struct CommandContext {
	pub config: ProfileConfig,
	pub store: WorkspaceStore,
	pub format: OutputFormat,
}

impl CommandContext {
	pub fn new(cli: &Cli) -> Result<Self> {
		let mut config = ProfileConfig::load(cli.config.as_deref())?;
		if let Some(root) = &cli.root {
			config.root = Some(root.clone());
		}
		if let Some(namespace) = &cli.namespace {
			config.namespace = namespace.clone();
		}

		let store = WorkspaceStore::open(config.root())?;
		debug!(target = "pwp.store", root = %store.root().display(), namespace = %config.namespace, "opened workspace root");

		Ok(Self {
			config,
			store,
			format: cli.format,
		})
	}

	pub fn prompt(&self) -> CliPrompt {
		let writer: Box<dyn Write> = match self.format {
			OutputFormat::Text => Box::new(io::stdout()),
			OutputFormat::Json => Box::new(io::stderr()),
		};
		TerminalPrompt::new(io::stdin().lock(), writer)
	}

	pub fn selector(&self) -> WorkspaceSelector<'_> {
		WorkspaceSelector::new(&self.store, self.config.namespace.clone())
	}

	/// Looks up a workspace by exact name, then by alias.
	pub fn resolve(&self, raw: &str) -> Result<Workspace> {
		let raw = raw.trim();
		if let Ok(name) = WorkspaceName::new(raw) {
			if self.store.exists(&name) {
				return Ok(self.store.get(&name)?);
			}
		}
		let name = normalize(raw, &self.config.namespace)?;
		Ok(self.store.get(&name)?)
	}

	/// Resolves `name` when given, otherwise asks through the selector menu.
	/// Returns `None` when the operator cancels.
	pub fn choose(&self, prompt: &mut impl Prompt, name: Option<&str>) -> Result<Option<Workspace>> {
		if let Some(name) = name {
			return self.resolve(name).map(Some);
		}
		match self.selector().select(prompt, None)? {
			Selection::Existing(name) | Selection::Created(name) => Ok(Some(self.store.get(&name)?)),
			Selection::Cancelled => Ok(None),
		}
	}
}
