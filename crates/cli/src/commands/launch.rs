use pw_profile::{
	ChromeDriver, LaunchOptions, LockReconciler, PreparedWorkspace, ProfileConfig, SanitizeMode, SessionLauncher, StateSanitizer,
};
use tracing::info;

use super::{cancelled, confirm_full_reset, launch_data};
use crate::cli::LaunchArgs;
use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{ResultBuilder, print_result};
use crate::status::Reporter;

pub async fn execute(ctx: &CommandContext, args: LaunchArgs) -> Result<()> {
	let reporter = Reporter::new(ctx.format);
	let mut prompt = ctx.prompt();

	let selection = ctx.selector().select(&mut prompt, args.profile.as_deref())?;
	let Some(name) = selection.name().cloned() else {
		cancelled("launch", "no workspace selected", reporter, ctx.format);
		return Ok(());
	};

	let workspace = ctx.store.get(&name)?;
	let reconciler = LockReconciler::new();

	let mode = if args.full_reset {
		let owner = reconciler.live_owner(&workspace);
		if !confirm_full_reset(&mut prompt, reporter, args.yes, &name, owner.as_ref())? {
			cancelled("launch", "full reset declined", reporter, ctx.format);
			return Ok(());
		}
		SanitizeMode::FullReset
	} else {
		SanitizeMode::PreserveSession
	};

	let prepared = PreparedWorkspace::prepare(workspace, &reconciler, &StateSanitizer::new(), mode)?;
	reporter.reconcile(prepared.reconcile_report());
	reporter.sanitize(prepared.sanitize_report());

	let launcher = SessionLauncher::new(ChromeDriver::new(), launch_options(&ctx.config, &args));
	let mut handle = launcher.launch(&prepared).await?;

	match handle.pid {
		Some(pid) => reporter.success(format!("Browser started with workspace '{name}' (pid {pid}).")),
		None => reporter.success(format!("Browser started with workspace '{name}'.")),
	}
	if let Some(endpoint) = &handle.devtools_endpoint {
		reporter.info(format!("DevTools endpoint: {endpoint}"));
	}

	let result = ResultBuilder::new("launch")
		.reconcile_diagnostics(prepared.reconcile_report())
		.sanitize_diagnostics(prepared.sanitize_report())
		.data(launch_data(&prepared, &handle))
		.build();
	print_result(&result, ctx.format);

	if args.wait {
		reporter.info("Close the browser window to finish.");
		let status = handle.wait().await?;
		info!(target = "pwp.launch", workspace = %name, ?status, "browser exited");
		reporter.info("Browser closed.");
	}

	Ok(())
}

/// Config values with the command's flags layered on top.
fn launch_options(config: &ProfileConfig, args: &LaunchArgs) -> LaunchOptions {
	let start_url = args.url.as_deref().unwrap_or(&config.start_url);
	let mut options = config.launch_options(start_url);
	options.headless |= args.headless;
	if let Some(port) = args.port {
		options.remote_debugging_port = Some(port);
	}
	if let Some(browser) = &args.browser {
		options.browser = Some(browser.clone());
	}
	if let Some(sandbox) = args.sandbox {
		options.sandbox = sandbox.into();
	}
	options
}
