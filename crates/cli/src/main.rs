use clap::Parser;
use pw_profile_cli::cli::Cli;
use pw_profile_cli::error::CliError;
use pw_profile_cli::output::{self, OutputFormat, ResultBuilder};
use pw_profile_cli::status::Reporter;
use pw_profile_cli::{commands, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() {
	let cli = Cli::parse();
	let format = cli.format;
	logging::init_logging(cli.verbose, format);

	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli).await {
		handle_error(err, command, format);
		std::process::exit(1);
	}
}

fn handle_error(err: CliError, command: &str, format: OutputFormat) {
	let cmd_error = err.to_command_error();

	// Always print to stderr for humans
	output::print_error_stderr(&cmd_error);
	Reporter::stderr().guidance(err.guidance());

	if format == OutputFormat::Json {
		let result: output::CommandResult<()> = ResultBuilder::new(command).command_error(cmd_error).build();
		output::print_result(&result, format);
	}
}
