use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// Installs the stderr subscriber. `RUST_LOG` overrides the verbosity count.
pub fn init_logging(verbosity: u8, format: OutputFormat) {
	let filter = match verbosity {
		// status lines already say what happened
		0 => "error",
		1 => "warn,pw_profile=info,pw_profile_cli=info",
		_ => "debug",
	};
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	// no colour codes when a machine is reading the envelope
	let ansi = format == OutputFormat::Text && std::io::stderr().is_terminal();

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_ansi(ansi)
		.with_target(true)
		.compact()
		.init();
}
