use pw_profile::{ChromeDriver, LockReconciler, PreparedWorkspace, SanitizeMode, SessionLauncher, StateSanitizer, last_used, normalize};
use tracing::warn;

use super::launch_data;
use crate::cli::CreateArgs;
use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{CreateData, ResultBuilder, print_result};
use crate::status::Reporter;

pub async fn execute(ctx: &CommandContext, args: CreateArgs) -> Result<()> {
	let reporter = Reporter::new(ctx.format);

	let name = normalize(&args.alias, &ctx.config.namespace)?;
	let workspace = ctx.store.create(&name)?;
	reporter.success(format!("Workspace '{name}' created at {}.", workspace.root().display()));
	if let Err(err) = last_used::record(ctx.store.root(), &name) {
		warn!(target = "pwp.store", error = %err, "could not record last-used workspace");
	}

	let login = if args.login {
		let prepared = PreparedWorkspace::prepare(workspace.clone(), &LockReconciler::new(), &StateSanitizer::new(), SanitizeMode::PreserveSession)?;

		let mut options = ctx.config.launch_options(&ctx.config.login_url);
		options.headless = false;
		if let Some(browser) = &args.browser {
			options.browser = Some(browser.clone());
		}

		let launcher = SessionLauncher::new(ChromeDriver::new(), options);
		let mut handle = launcher.launch(&prepared).await?;
		reporter.info("Log in, then close the browser window to save the session.");
		handle.wait().await?;
		reporter.success(format!("Session saved in '{name}'."));
		Some(launch_data(&prepared, &handle))
	} else {
		None
	};

	let result = ResultBuilder::new("create")
		.data(CreateData {
			workspace: name.to_string(),
			path: workspace.root().to_path_buf(),
			login,
		})
		.build();
	print_result(&result, ctx.format);
	Ok(())
}
