//! Workspace selection menu.
//!
//! Choice parsing is a pure function ([`parse_choice`]); the retry loop talks
//! to the operator through the [`Prompt`] seam so it can run against a
//! terminal or a scripted answer list.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::Result;
use crate::last_used;
use crate::naming::{self, WorkspaceName};
use crate::store::WorkspaceStore;

/// Rejected menu input. Always retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
	#[error("please enter a number (no remembered workspace to fall back on)")]
	Empty,
	#[error("{0:?} is not a number")]
	NotANumber(String),
	#[error("{choice} is not on the menu (choose 1-{max})")]
	OutOfRange { choice: usize, max: usize },
}

/// A valid menu answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
	/// Zero-based index into the listed workspaces.
	Existing(usize),
	CreateNew,
}

/// Parses a 1-based menu answer for a menu of `count` workspaces followed by a
/// trailing "create new" entry. An empty answer picks `remembered`.
pub fn parse_choice(input: &str, count: usize, remembered: Option<usize>) -> std::result::Result<MenuChoice, InputError> {
	let input = input.trim();
	if input.is_empty() {
		return remembered.map(MenuChoice::Existing).ok_or(InputError::Empty);
	}
	let choice: usize = input.parse().map_err(|_| InputError::NotANumber(input.to_string()))?;
	match choice {
		n if (1..=count).contains(&n) => Ok(MenuChoice::Existing(n - 1)),
		n if n == count + 1 => Ok(MenuChoice::CreateNew),
		n => Err(InputError::OutOfRange { choice: n, max: count + 1 }),
	}
}

/// Outcome of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
	Existing(WorkspaceName),
	Created(WorkspaceName),
	/// The operator declined or closed the input.
	Cancelled,
}

impl Selection {
	pub fn name(&self) -> Option<&WorkspaceName> {
		match self {
			Selection::Existing(name) | Selection::Created(name) => Some(name),
			Selection::Cancelled => None,
		}
	}
}

/// Operator dialogue used by the selector and by destructive confirmations.
pub trait Prompt {
	/// Shows `question` and returns the answer, or `None` when input is closed.
	fn ask(&mut self, question: &str) -> io::Result<Option<String>>;

	/// Shows a status line.
	fn say(&mut self, message: &str);

	/// Asks a yes/no question; anything but `y`/`yes` is a no.
	fn confirm(&mut self, question: &str) -> io::Result<bool> {
		let answer = self.ask(&format!("{question} (y/n): "))?;
		Ok(answer.is_some_and(|a| matches!(a.trim().to_lowercase().as_str(), "y" | "yes")))
	}
}

/// [`Prompt`] over a reader/writer pair (stdin/stdout in the CLI).
pub struct TerminalPrompt<R, W> {
	reader: R,
	writer: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
	pub fn new(reader: R, writer: W) -> Self {
		Self { reader, writer }
	}
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stdout> {
	pub fn stdio() -> Self {
		Self::new(io::stdin().lock(), io::stdout())
	}
}

impl<R: BufRead, W: Write> Prompt for TerminalPrompt<R, W> {
	fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
		write!(self.writer, "{question}")?;
		self.writer.flush()?;
		let mut buf = String::new();
		if self.reader.read_line(&mut buf)? == 0 {
			return Ok(None);
		}
		Ok(Some(buf.trim_end_matches('\n').trim_end_matches('\r').to_string()))
	}

	fn say(&mut self, message: &str) {
		let _ = writeln!(self.writer, "{message}");
	}
}

/// [`Prompt`] that replays canned answers and records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
	answers: VecDeque<String>,
	pub transcript: Vec<String>,
}

impl ScriptedPrompt {
	pub fn new<I, S>(answers: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			answers: answers.into_iter().map(Into::into).collect(),
			transcript: Vec::new(),
		}
	}

	/// Number of questions asked so far.
	pub fn questions(&self) -> usize {
		self.transcript.iter().filter(|line| line.starts_with("? ")).count()
	}
}

impl Prompt for ScriptedPrompt {
	fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
		self.transcript.push(format!("? {question}"));
		Ok(self.answers.pop_front())
	}

	fn say(&mut self, message: &str) {
		self.transcript.push(message.to_string());
	}
}

/// Resolves exactly one existing workspace, creating one on request.
pub struct WorkspaceSelector<'a> {
	store: &'a WorkspaceStore,
	namespace: String,
}

impl<'a> WorkspaceSelector<'a> {
	pub fn new(store: &'a WorkspaceStore, namespace: impl Into<String>) -> Self {
		Self {
			store,
			namespace: namespace.into(),
		}
	}

	/// Runs the selection dialogue.
	///
	/// `preselect` names a workspace to use without asking; when it is not
	/// listed the menu is shown instead.
	pub fn select(&self, prompt: &mut impl Prompt, preselect: Option<&str>) -> Result<Selection> {
		let workspaces = self.store.list()?;

		if let Some(wanted) = preselect {
			if let Some(name) = self.find_listed(&workspaces, wanted) {
				prompt.say(&format!("Using workspace '{name}'."));
				return Ok(self.finish(Selection::Existing(name)));
			}
			prompt.say(&format!("Workspace '{}' not found; choose from the list.", wanted.trim()));
		}

		if workspaces.is_empty() {
			prompt.say("No workspaces available.");
			if !prompt.confirm("Create a new workspace?")? {
				return Ok(Selection::Cancelled);
			}
			let selection = self.create_interactive(prompt)?;
			return Ok(self.finish(selection));
		}

		let remembered_name = last_used::load(self.store.root()).map(|r| r.name);
		let remembered = remembered_name.as_ref().and_then(|n| workspaces.iter().position(|w| w == n));

		prompt.say("Available workspaces:");
		for (idx, name) in workspaces.iter().enumerate() {
			let marker = if Some(idx) == remembered { " (last used)" } else { "" };
			prompt.say(&format!("{}. {name}{marker}", idx + 1));
		}
		prompt.say(&format!("{}. Create a new workspace", workspaces.len() + 1));

		let question = if remembered.is_some() {
			"Select a workspace number (empty = last used): "
		} else {
			"Select a workspace number: "
		};

		loop {
			let Some(answer) = prompt.ask(question)? else {
				return Ok(Selection::Cancelled);
			};
			match parse_choice(&answer, workspaces.len(), remembered) {
				Ok(MenuChoice::Existing(idx)) => {
					let name = workspaces[idx].clone();
					prompt.say(&format!("Selected workspace: {name}"));
					return Ok(self.finish(Selection::Existing(name)));
				}
				Ok(MenuChoice::CreateNew) => {
					let selection = self.create_interactive(prompt)?;
					return Ok(self.finish(selection));
				}
				Err(err) => {
					debug!(target = "pwp.selector", input = %answer, error = %err, "rejected menu input");
					prompt.say(&format!("Invalid choice: {err}"));
				}
			}
		}
	}

	/// Asks for aliases until one creates a workspace or the operator gives up.
	fn create_interactive(&self, prompt: &mut impl Prompt) -> Result<Selection> {
		loop {
			let Some(alias) = prompt.ask("New workspace alias: ")? else {
				return Ok(Selection::Cancelled);
			};
			let name = match naming::normalize(&alias, &self.namespace) {
				Ok(name) => name,
				Err(err) => {
					prompt.say(&err.to_string());
					continue;
				}
			};
			match self.store.create(&name) {
				Ok(_) => {
					prompt.say(&format!("Workspace '{name}' created."));
					return Ok(Selection::Created(name));
				}
				Err(err) if err.is_retryable() => {
					prompt.say(&err.to_string());
				}
				Err(err) => {
					prompt.say(&format!("Could not create workspace: {err}"));
					if !prompt.confirm("Try again?")? {
						return Err(err);
					}
				}
			}
		}
	}

	fn find_listed(&self, workspaces: &[WorkspaceName], wanted: &str) -> Option<WorkspaceName> {
		let wanted = wanted.trim();
		if let Some(name) = workspaces.iter().find(|w| w.as_str() == wanted) {
			return Some(name.clone());
		}
		let normalized = naming::normalize(wanted, &self.namespace).ok()?;
		workspaces.iter().find(|w| **w == normalized).cloned()
	}

	fn finish(&self, selection: Selection) -> Selection {
		if let Some(name) = selection.name() {
			if let Err(err) = last_used::record(self.store.root(), name) {
				warn!(target = "pwp.selector", error = %err, "could not record last-used workspace");
			}
		}
		selection
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn parse_choice_maps_menu_positions() {
		assert_eq!(parse_choice("1", 2, None), Ok(MenuChoice::Existing(0)));
		assert_eq!(parse_choice(" 2 ", 2, None), Ok(MenuChoice::Existing(1)));
		assert_eq!(parse_choice("3", 2, None), Ok(MenuChoice::CreateNew));
	}

	#[test]
	fn parse_choice_rejects_bad_input() {
		assert_eq!(parse_choice("x", 2, None), Err(InputError::NotANumber("x".into())));
		assert_eq!(parse_choice("0", 2, None), Err(InputError::OutOfRange { choice: 0, max: 3 }));
		assert_eq!(parse_choice("4", 2, None), Err(InputError::OutOfRange { choice: 4, max: 3 }));
		assert_eq!(parse_choice("-1", 2, None), Err(InputError::NotANumber("-1".into())));
		assert_eq!(parse_choice("", 2, None), Err(InputError::Empty));
	}

	#[test]
	fn parse_choice_empty_uses_remembered() {
		assert_eq!(parse_choice("", 2, Some(1)), Ok(MenuChoice::Existing(1)));
	}

	#[test]
	fn terminal_prompt_reads_lines_and_detects_eof() {
		let input = b"2\r\n".as_slice();
		let mut out = Vec::new();
		let mut prompt = TerminalPrompt::new(input, &mut out);
		assert_eq!(prompt.ask("pick: ").unwrap().as_deref(), Some("2"));
		assert_eq!(prompt.ask("again: ").unwrap(), None);
		drop(prompt);
		assert_eq!(String::from_utf8(out).unwrap(), "pick: again: ");
	}

	#[test]
	fn confirm_accepts_only_yes() {
		let mut prompt = ScriptedPrompt::new(["Y", "no", "yes"]);
		assert!(prompt.confirm("a?").unwrap());
		assert!(!prompt.confirm("b?").unwrap());
		assert!(prompt.confirm("c?").unwrap());
		assert!(!prompt.confirm("d?").unwrap());
	}

	#[test]
	fn preselect_accepts_alias_or_full_name() {
		let tmp = TempDir::new().unwrap();
		let store = WorkspaceStore::open(tmp.path()).unwrap();
		store.create(&WorkspaceName::new("naver_shop").unwrap()).unwrap();
		let selector = WorkspaceSelector::new(&store, "naver");

		let mut prompt = ScriptedPrompt::default();
		let by_alias = selector.select(&mut prompt, Some("shop")).unwrap();
		assert_eq!(by_alias, Selection::Existing(WorkspaceName::new("naver_shop").unwrap()));
		assert_eq!(prompt.questions(), 0);

		let by_name = selector.select(&mut prompt, Some("naver_shop")).unwrap();
		assert_eq!(by_name.name().unwrap().as_str(), "naver_shop");
	}

	#[test]
	fn unknown_preselect_falls_back_to_menu() {
		let tmp = TempDir::new().unwrap();
		let store = WorkspaceStore::open(tmp.path()).unwrap();
		store.create(&WorkspaceName::new("naver_a").unwrap()).unwrap();
		let selector = WorkspaceSelector::new(&store, "naver");

		let mut prompt = ScriptedPrompt::new(["1"]);
		let selection = selector.select(&mut prompt, Some("ghost")).unwrap();
		assert_eq!(selection.name().unwrap().as_str(), "naver_a");
		assert!(prompt.transcript.iter().any(|l| l.contains("'ghost' not found")));
	}

	#[test]
	fn closed_input_cancels() {
		let tmp = TempDir::new().unwrap();
		let store = WorkspaceStore::open(tmp.path()).unwrap();
		store.create(&WorkspaceName::new("naver_a").unwrap()).unwrap();
		let selector = WorkspaceSelector::new(&store, "naver");

		let mut prompt = ScriptedPrompt::default();
		assert_eq!(selector.select(&mut prompt, None).unwrap(), Selection::Cancelled);
	}

	#[test]
	fn empty_root_decline_cancels_without_creating() {
		let tmp = TempDir::new().unwrap();
		let store = WorkspaceStore::open(tmp.path()).unwrap();
		let selector = WorkspaceSelector::new(&store, "naver");

		let mut prompt = ScriptedPrompt::new(["n"]);
		assert_eq!(selector.select(&mut prompt, None).unwrap(), Selection::Cancelled);
		assert!(store.list().unwrap().is_empty());
	}

	#[test]
	fn invalid_alias_reprompts() {
		let tmp = TempDir::new().unwrap();
		let store = WorkspaceStore::open(tmp.path()).unwrap();
		let selector = WorkspaceSelector::new(&store, "naver");

		let mut prompt = ScriptedPrompt::new(["y", "", "bad/name", "good"]);
		let selection = selector.select(&mut prompt, None).unwrap();
		assert_eq!(selection, Selection::Created(WorkspaceName::new("naver_good").unwrap()));
		assert_eq!(store.list().unwrap().len(), 1);
	}

	#[test]
	fn duplicate_alias_reprompts() {
		let tmp = TempDir::new().unwrap();
		let store = WorkspaceStore::open(tmp.path()).unwrap();
		store.create(&WorkspaceName::new("naver_a").unwrap()).unwrap();
		let selector = WorkspaceSelector::new(&store, "naver");

		let mut prompt = ScriptedPrompt::new(["2", "a", "b"]);
		let selection = selector.select(&mut prompt, None).unwrap();
		assert_eq!(selection.name().unwrap().as_str(), "naver_b");
		assert!(prompt.transcript.iter().any(|l| l.contains("already exists")));
	}

	#[test]
	fn empty_answer_selects_last_used() {
		let tmp = TempDir::new().unwrap();
		let store = WorkspaceStore::open(tmp.path()).unwrap();
		for raw in ["naver_a", "naver_b"] {
			store.create(&WorkspaceName::new(raw).unwrap()).unwrap();
		}
		last_used::record(tmp.path(), &WorkspaceName::new("naver_b").unwrap()).unwrap();
		let selector = WorkspaceSelector::new(&store, "naver");

		let mut prompt = ScriptedPrompt::new([""]);
		let selection = selector.select(&mut prompt, None).unwrap();
		assert_eq!(selection.name().unwrap().as_str(), "naver_b");
		assert!(prompt.transcript.iter().any(|l| l == "2. naver_b (last used)"));
	}

	#[test]
	fn selection_is_remembered() {
		let tmp = TempDir::new().unwrap();
		let store = WorkspaceStore::open(tmp.path()).unwrap();
		for raw in ["naver_a", "naver_b"] {
			store.create(&WorkspaceName::new(raw).unwrap()).unwrap();
		}
		let selector = WorkspaceSelector::new(&store, "naver");
		selector.select(&mut ScriptedPrompt::new(["1"]), None).unwrap();

		assert_eq!(last_used::load(tmp.path()).unwrap().name.as_str(), "naver_a");
	}
}
