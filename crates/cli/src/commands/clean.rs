use pw_profile::{LockReconciler, SanitizeMode, StateSanitizer};

use super::{cancelled, confirm_full_reset};
use crate::cli::CleanArgs;
use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{CleanData, ResultBuilder, print_result};
use crate::status::Reporter;

pub fn execute(ctx: &CommandContext, args: CleanArgs) -> Result<()> {
	let reporter = Reporter::new(ctx.format);
	let mut prompt = ctx.prompt();

	let Some(workspace) = ctx.choose(&mut prompt, args.name.as_deref())? else {
		cancelled("clean", "no workspace selected", reporter, ctx.format);
		return Ok(());
	};

	let mode = if args.full_reset {
		let owner = LockReconciler::new().live_owner(&workspace);
		if !confirm_full_reset(&mut prompt, reporter, args.yes, workspace.name(), owner.as_ref())? {
			cancelled("clean", "full reset declined", reporter, ctx.format);
			return Ok(());
		}
		SanitizeMode::FullReset
	} else {
		SanitizeMode::PreserveSession
	};

	let report = StateSanitizer::new().sanitize(&workspace, mode)?;
	reporter.sanitize(&report);
	if report.is_clean() {
		reporter.success(format!("Workspace '{}' cleaned.", workspace.name()));
	}

	let result = ResultBuilder::new("clean")
		.sanitize_diagnostics(&report)
		.data(CleanData {
			workspace: workspace.name().to_string(),
			report,
		})
		.build();
	print_result(&result, ctx.format);
	Ok(())
}
