use pw_profile::LockReconciler;

use super::cancelled;
use crate::cli::UnlockArgs;
use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{ResultBuilder, UnlockData, print_result};
use crate::status::Reporter;

pub fn execute(ctx: &CommandContext, args: UnlockArgs) -> Result<()> {
	let reporter = Reporter::new(ctx.format);
	let mut prompt = ctx.prompt();

	let Some(workspace) = ctx.choose(&mut prompt, args.name.as_deref())? else {
		cancelled("unlock", "no workspace selected", reporter, ctx.format);
		return Ok(());
	};

	let reconciler = if args.force { LockReconciler::force() } else { LockReconciler::new() };
	let report = reconciler.reconcile(&workspace);

	if report.removed.is_empty() && report.unresolved.is_empty() {
		reporter.info(format!("Workspace '{}' has no lock files.", workspace.name()));
	} else {
		reporter.reconcile(&report);
		if report.is_clean() {
			reporter.success(format!("Workspace '{}' unlocked.", workspace.name()));
		}
	}

	let result = ResultBuilder::new("unlock")
		.reconcile_diagnostics(&report)
		.data(UnlockData {
			workspace: workspace.name().to_string(),
			report,
		})
		.build();
	print_result(&result, ctx.format);
	Ok(())
}
