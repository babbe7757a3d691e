use std::fs;

use pw_profile::last_used;
use pw_profile::layout::LOCK_ARTIFACTS;

use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{ListData, ResultBuilder, WorkspaceEntry, print_result};
use crate::status::Reporter;

pub fn execute(ctx: &CommandContext) -> Result<()> {
	let reporter = Reporter::new(ctx.format);
	let root = ctx.store.root();
	let remembered = last_used::load(root).map(|r| r.name);

	let workspaces: Vec<WorkspaceEntry> = ctx
		.store
		.list()?
		.into_iter()
		.enumerate()
		.map(|(idx, name)| {
			let path = ctx.store.root_of(&name);
			let locked = LOCK_ARTIFACTS.iter().any(|artifact| fs::symlink_metadata(path.join(artifact)).is_ok());
			WorkspaceEntry {
				index: idx + 1,
				last_used: remembered.as_ref() == Some(&name),
				name: name.to_string(),
				path,
				locked,
			}
		})
		.collect();

	if workspaces.is_empty() {
		reporter.info(format!("No workspaces under {}.", root.display()));
	} else {
		reporter.info(format!("Workspaces under {}:", root.display()));
		for entry in &workspaces {
			let mut line = format!("{}. {}", entry.index, entry.name);
			if entry.last_used {
				line.push_str(" (last used)");
			}
			if entry.locked {
				line.push_str(" [locked]");
			}
			reporter.info(line);
		}
	}

	let result = ResultBuilder::new("list")
		.data(ListData {
			root: root.to_path_buf(),
			workspaces,
		})
		.build();
	print_result(&result, ctx.format);
	Ok(())
}
