mod clean;
mod create;
mod launch;
mod list;
mod unlock;

use pw_profile::locks::LockOwner;
use pw_profile::{LaunchHandle, PreparedWorkspace, Prompt, WorkspaceName};

use crate::cli::{Cli, Commands};
use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{CancelledData, LaunchData, OutputFormat, ResultBuilder, print_result};
use crate::status::Reporter;

pub async fn dispatch(cli: Cli) -> Result<()> {
	let ctx = CommandContext::new(&cli)?;

	match cli.command {
		Commands::Launch(args) => launch::execute(&ctx, args).await,
		Commands::List => list::execute(&ctx),
		Commands::Create(args) => create::execute(&ctx, args).await,
		Commands::Clean(args) => clean::execute(&ctx, args),
		Commands::Unlock(args) => unlock::execute(&ctx, args),
	}
}

/// Asks before deleting cookies, logins and history. `yes` skips the question
/// unless a running browser still owns the workspace.
fn confirm_full_reset(prompt: &mut impl Prompt, reporter: Reporter, yes: bool, name: &WorkspaceName, owner: Option<&LockOwner>) -> Result<bool> {
	if let Some(owner) = owner {
		reporter.warn(format!("'{name}' is in use by process {} on {}.", owner.pid, owner.host));
		return Ok(prompt.confirm("Reset it anyway? The running browser will lose its session.")?);
	}
	if yes {
		return Ok(true);
	}
	Ok(prompt.confirm(&format!("Delete cookies, saved logins and history from '{name}'?"))?)
}

/// Reports a command the operator backed out of. Cancelling is not an error.
fn cancelled(command: &str, reason: &str, reporter: Reporter, format: OutputFormat) {
	reporter.info(format!("Cancelled: {reason}."));
	let result = ResultBuilder::new(command).data(CancelledData::new(reason)).build();
	print_result(&result, format);
}

fn launch_data(prepared: &PreparedWorkspace, handle: &LaunchHandle) -> LaunchData {
	LaunchData {
		workspace: prepared.workspace().name().to_string(),
		user_data_dir: handle.config.user_data_dir().to_path_buf(),
		executable: handle.executable.clone(),
		pid: handle.pid,
		devtools_endpoint: handle.devtools_endpoint.clone(),
		args: handle.config.args().to_vec(),
		reconcile: prepared.reconcile_report().clone(),
		sanitize: prepared.sanitize_report().clone(),
	}
}
