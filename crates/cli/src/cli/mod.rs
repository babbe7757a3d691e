
use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand, ValueEnum};
use pw_profile::SandboxPolicy;

use crate::output::OutputFormat;

/// Root CLI for pwp.
#[derive(Parser, Debug)]
#[command(name = "pwp")]
#[command(about = "Reusable browser-profile workspaces for automation sessions")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default) or json
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Directory holding every workspace
	#[arg(long, global = true, value_name = "DIR")]
	pub root: Option<PathBuf>,

	/// Prefix applied to new workspace names
	#[arg(long, global = true, value_name = "NS")]
	pub namespace: Option<String>,

	/// Config file (default: $XDG_CONFIG_HOME/pw-profile/config.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Pick a workspace, clear stale locks and caches, and start the browser.
	Launch(LaunchArgs),
	/// List workspaces under the root.
	List,
	/// Create a workspace from an alias.
	Create(CreateArgs),
	/// Purge caches (or everything, with --full-reset) from a workspace.
	Clean(CleanArgs),
	/// Remove stale Singleton* lock artifacts from a workspace.
	Unlock(UnlockArgs),
}

impl Commands {
	/// Name used in the JSON envelope.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Launch(_) => "launch",
			Commands::List => "list",
			Commands::Create(_) => "create",
			Commands::Clean(_) => "clean",
			Commands::Unlock(_) => "unlock",
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct LaunchArgs {
	/// Workspace to use without prompting (name or alias).
	#[arg(long, value_name = "NAME")]
	pub profile: Option<String>,

	/// Run without a visible window.
	#[arg(long)]
	pub headless: bool,

	/// Also delete cookies, saved logins and history before launching.
	#[arg(long)]
	pub full_reset: bool,

	/// Skip the --full-reset confirmation.
	#[arg(long, short = 'y')]
	pub yes: bool,

	/// Page to open (default: configured start URL).
	#[arg(long, value_name = "URL")]
	pub url: Option<String>,

	/// Expose DevTools on this port for an automation engine.
	#[arg(long, value_name = "PORT")]
	pub port: Option<u16>,

	/// Browser executable (default: discovered).
	#[arg(long, value_name = "PATH")]
	pub browser: Option<PathBuf>,

	/// Chrome sandbox policy.
	#[arg(long, value_enum)]
	pub sandbox: Option<SandboxArg>,

	/// Keep running until the browser window is closed.
	#[arg(long)]
	pub wait: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
	/// Alias for the new workspace; the namespace prefix is added when missing.
	#[arg(value_name = "ALIAS")]
	pub alias: String,

	/// Open the login page in the new workspace and wait until the browser closes.
	#[arg(long)]
	pub login: bool,

	/// Browser executable used with --login (default: discovered).
	#[arg(long, value_name = "PATH")]
	pub browser: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
	/// Workspace name or alias (default: choose from the menu).
	#[arg(value_name = "NAME")]
	pub name: Option<String>,

	/// Also delete cookies, saved logins and history.
	#[arg(long)]
	pub full_reset: bool,

	/// Skip the --full-reset confirmation.
	#[arg(long, short = 'y')]
	pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct UnlockArgs {
	/// Workspace name or alias (default: choose from the menu).
	#[arg(value_name = "NAME")]
	pub name: Option<String>,

	/// Remove artifacts even when the lock names a running process.
	#[arg(long)]
	pub force: bool,
}

/// Sandbox policy (CLI wrapper for [`SandboxPolicy`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SandboxArg {
	Auto,
	Enabled,
	Disabled,
}

impl From<SandboxArg> for SandboxPolicy {
	fn from(arg: SandboxArg) -> Self {
		match arg {
			SandboxArg::Auto => SandboxPolicy::Auto,
			SandboxArg::Enabled => SandboxPolicy::Enabled,
			SandboxArg::Disabled => SandboxPolicy::Disabled,
		}
	}
}

/// Cargo-like help colours.
fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.invalid(AnsiColor::Red.on_default().bold())
		.error(AnsiColor::Red.on_default().bold())
}
