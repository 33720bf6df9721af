//! Command trait, registry, and dispatch logic.
//!
//! A line either dispatches as a single command (after alias expansion) or,
//! when it contains `|`, runs through the pipeline dispatcher with its
//! reduced per-stage semantics. Errors stop at this layer: they are turned
//! into one-line diagnostics and the caller's loop keeps going.

use std::collections::{HashMap, HashSet};

use redshell_sandbox::Sandbox;
use redshell_types::error::{Result, ShellError};

use crate::lex;
use crate::session::Session;
use crate::text_commands::{parse_n_flag, wc_counts, wc_report};

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines for the terminal.
    Text(String),
    /// Command produced no visible output.
    None,
    /// Signal to clear the screen.
    Clear,
    /// Signal to terminate the session.
    Exit,
}

/// A single executable command.
///
/// Handlers receive the raw remainder of the line (possibly empty) and the
/// ambient session; each re-derives its target paths through the resolver.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help` and `man`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "ls \[-a\] \[-l\] \[path...\]").
    fn usage(&self) -> &str;

    /// Execute the command with the given argument string and session.
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput>;
}

/// Command names dispatched by the interpreter itself because they need
/// access to the registry (metadata listings).
const INTERCEPTED: &[&str] = &["help", "man", "which"];

/// Registry of available commands with dispatch. Built once at startup and
/// immutable afterwards; all mutable state lives in the [`Session`].
pub struct Interpreter {
    commands: HashMap<String, Box<dyn Command>>,
}

impl Interpreter {
    /// Create an empty interpreter.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Create an interpreter with the full built-in command set.
    pub fn with_builtins() -> Self {
        let mut interp = Self::new();
        crate::register_builtins(&mut interp);
        interp
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    /// All dispatchable command names, sorted.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .commands
            .keys()
            .map(String::as_str)
            .chain(INTERCEPTED.iter().copied())
            .collect();
        names.sort_unstable();
        names
    }

    /// Parse and execute one input line.
    ///
    /// Records the line in the session history, routes to the pipeline
    /// dispatcher or single-command execution, and converts any error into
    /// a one-line diagnostic. This never fails: the REPL always continues.
    pub fn execute_line(&self, line: &str, session: &mut Session) -> CommandOutput {
        let line = line.trim();
        if line.is_empty() {
            return CommandOutput::None;
        }
        session.record(line);

        let outcome: std::result::Result<CommandOutput, String> = if line.contains('|') {
            self.run_pipeline(line, session).map_err(|e| e.to_string())
        } else {
            let (typed, rest) = lex::split_command(line);
            match expand_alias(typed, rest, &session.aliases) {
                Ok((name, args)) => {
                    self.execute_named(&name, &args, session)
                        .map_err(|e| match e {
                            // Already self-describing; no command prefix.
                            ShellError::UnknownCommand(_) => e.to_string(),
                            other => format!("{name}: {other}"),
                        })
                }
                Err(e) => Err(e.to_string()),
            }
        };

        match outcome {
            Ok(output) => output,
            Err(message) => CommandOutput::Text(message),
        }
    }

    /// Dispatch a resolved command name.
    fn execute_named(&self, name: &str, args: &str, session: &mut Session) -> Result<CommandOutput> {
        match name {
            "help" => Ok(CommandOutput::Text(self.help_text())),
            "man" => Ok(CommandOutput::Text(self.man_page(args.trim()))),
            "which" => self.execute_which(args.trim(), session),
            _ => match self.commands.get(name) {
                Some(cmd) => cmd.execute(args, session),
                None => Err(ShellError::UnknownCommand(name.to_string())),
            },
        }
    }

    // -- Pipelines ----------------------------------------------------------

    /// Thread a single text buffer through `cat f | stage | stage ...`.
    ///
    /// Only `cat` can open a pipeline, and later stages come from a reduced
    /// set: `grep`, `sort`, `head`, `tail`, and the terminal `wc`. Anything
    /// else halts the pipeline and discards the buffer.
    fn run_pipeline(&self, line: &str, session: &mut Session) -> Result<CommandOutput> {
        let stages: Vec<(&str, &str)> = line
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(lex::split_command)
            .collect();
        let Some(&(first_name, first_args)) = stages.first() else {
            return Ok(CommandOutput::None);
        };

        if first_name != "cat" {
            return Err(ShellError::Pipeline(format!(
                "'{first_name}' is not supported as a pipeline source"
            )));
        }
        let file = lex::split_args(first_args)
            .into_iter()
            .next()
            .ok_or_else(|| ShellError::Pipeline("cat: missing operand".to_string()))?;
        let path = session
            .resolve(&file)
            .map_err(|e| ShellError::Pipeline(format!("cat: {e}")))?;
        if !session.fs.exists(&path) {
            return Err(ShellError::Pipeline(format!(
                "cat: {file}: No such file or directory"
            )));
        }
        if session.fs.is_dir(&path) {
            return Err(ShellError::Pipeline(format!("cat: {file}: Is a directory")));
        }
        let data = session
            .fs
            .read(&path)
            .map_err(|e| ShellError::Pipeline(format!("cat: {e}")))?;
        let mut buffer = String::from_utf8_lossy(&data).into_owned();

        for &(name, args) in &stages[1..] {
            let tokens = lex::split_args(args);
            match name {
                "grep" => {
                    let pattern = tokens.first().ok_or_else(|| {
                        ShellError::Pipeline("grep: missing operand".to_string())
                    })?;
                    let kept: Vec<&str> = buffer
                        .lines()
                        .filter(|line| line.contains(pattern.as_str()))
                        .collect();
                    buffer = kept.join("\n");
                }
                "sort" => {
                    let mut lines: Vec<&str> = buffer.lines().collect();
                    lines.sort_unstable();
                    buffer = lines.join("\n");
                }
                "head" => {
                    let (n, _) = parse_n_flag(&tokens)
                        .map_err(|e| ShellError::Pipeline(format!("{name}: {e}")))?;
                    let kept: Vec<&str> = buffer.lines().take(n).collect();
                    buffer = kept.join("\n");
                }
                "tail" => {
                    let (n, _) = parse_n_flag(&tokens)
                        .map_err(|e| ShellError::Pipeline(format!("{name}: {e}")))?;
                    let lines: Vec<&str> = buffer.lines().collect();
                    let start = lines.len().saturating_sub(n);
                    buffer = lines[start..].join("\n");
                }
                // Terminal summarizing stage: prints its own output, no
                // final flush afterwards.
                "wc" => {
                    let counts = wc_counts(&buffer);
                    let flag = tokens.first().map(String::as_str);
                    return Ok(CommandOutput::Text(wc_report(counts, flag)));
                }
                other => {
                    return Err(ShellError::Pipeline(format!(
                        "'{other}' is not supported in a pipeline"
                    )));
                }
            }
        }

        if buffer.is_empty() {
            Ok(CommandOutput::None)
        } else {
            Ok(CommandOutput::Text(buffer))
        }
    }

    // -- Intercepted commands ----------------------------------------------

    /// Sorted command listing in columns.
    fn help_text(&self) -> String {
        let mut names = self.command_names();
        names.retain(|n| *n != "exit");

        let width = names.iter().map(|n| n.len()).max().unwrap_or(0) + 4;
        let columns = 4usize;
        let mut out = String::from("Available commands:\n");
        for row in names.chunks(columns) {
            for name in row {
                out.push_str(&format!("{name:<width$}"));
            }
            let trimmed = out.trim_end().len();
            out.truncate(trimmed);
            out.push('\n');
        }
        out.push_str("\nFor more information, use 'man <command>'.");
        out
    }

    /// Render a manual page from registry metadata.
    fn man_page(&self, name: &str) -> String {
        if name.is_empty() {
            return "What manual page do you want?".to_string();
        }
        let (description, usage) = if let Some(cmd) = self.commands.get(name) {
            (cmd.description().to_string(), cmd.usage().to_string())
        } else {
            match name {
                "help" => ("Show available commands".to_string(), "help".to_string()),
                "man" => ("Display command manual pages".to_string(), "man <name>".to_string()),
                "which" => ("Locate command".to_string(), "which <name>".to_string()),
                _ => return format!("No manual entry for {name}"),
            }
        };
        format!(
            "{}(1)\nNAME\n       {name} - {description}\n\nSYNOPSIS\n       {usage}\n\nDESCRIPTION\n       {description}",
            name.to_uppercase()
        )
    }

    /// `which`: registered commands live in a pretend `/usr/bin`, aliases
    /// show their expansion, anything else stays silent.
    fn execute_which(&self, args: &str, session: &Session) -> Result<CommandOutput> {
        let name = args.split_whitespace().next().ok_or_else(|| {
            ShellError::InvalidArgument("missing operand".to_string())
        })?;
        if self.commands.contains_key(name) || INTERCEPTED.contains(&name) {
            return Ok(CommandOutput::Text(format!("/usr/bin/{name}")));
        }
        if let Some(expansion) = session.aliases.get(name) {
            return Ok(CommandOutput::Text(format!("alias {name}='{expansion}'")));
        }
        Ok(CommandOutput::None)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Alias expansion
// ---------------------------------------------------------------------------

/// Expand the leading command name through the alias table.
///
/// Follows the whole chain with a visited set, so both direct
/// self-reference (`x -> x ...`) and mutual cycles (`a -> b`, `b -> a`) are
/// rejected before anything executes. Default arguments contributed by each
/// expansion end up before the user-typed arguments, innermost first.
pub fn expand_alias(
    name: &str,
    args: &str,
    aliases: &HashMap<String, String>,
) -> Result<(String, String)> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut name = name.to_string();
    let mut default_parts: Vec<String> = Vec::new();

    while let Some(expansion) = aliases.get(&name) {
        if !visited.insert(name.clone()) {
            return Err(ShellError::AliasCycle(name));
        }
        let (head, defaults) = lex::split_command(expansion);
        if !defaults.is_empty() {
            default_parts.insert(0, defaults.to_string());
        }
        name = head.to_string();
    }

    if !args.is_empty() {
        default_parts.push(args.to_string());
    }
    Ok((name, default_parts.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use redshell_sandbox::{DiskFs, MemoryFs, Sandbox, seed};

    fn session() -> Session {
        let mut fs = MemoryFs::new();
        seed::seed_memory_layout(&mut fs).unwrap();
        Session::new(Box::new(fs), "user", "ctf-linux")
    }

    fn interp() -> Interpreter {
        Interpreter::with_builtins()
    }

    fn exec(interp: &Interpreter, session: &mut Session, line: &str) -> CommandOutput {
        interp.execute_line(line, session)
    }

    fn text(output: CommandOutput) -> String {
        match output {
            CommandOutput::Text(s) => s,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn empty_line_is_none() {
        let (i, mut s) = (interp(), session());
        assert_eq!(exec(&i, &mut s, "   "), CommandOutput::None);
        assert!(s.history.is_empty());
    }

    #[test]
    fn unknown_command_diagnostic() {
        let (i, mut s) = (interp(), session());
        assert_eq!(
            text(exec(&i, &mut s, "frobnicate now")),
            "frobnicate: command not found"
        );
    }

    #[test]
    fn history_records_raw_lines() {
        let (i, mut s) = (interp(), session());
        exec(&i, &mut s, "ls");
        exec(&i, &mut s, "cat desktop/readme.txt | grep help");
        assert_eq!(s.history, ["ls", "cat desktop/readme.txt | grep help"]);
    }

    #[test]
    fn command_errors_are_prefixed_diagnostics() {
        let (i, mut s) = (interp(), session());
        assert_eq!(
            text(exec(&i, &mut s, "cat nothing.txt")),
            "cat: nothing.txt: No such file or directory"
        );
    }

    // -- alias expansion ----------------------------------------------------

    #[test]
    fn alias_expands_with_defaults_first() {
        let aliases = HashMap::from([("ll".to_string(), "ls -la".to_string())]);
        let (name, args) = expand_alias("ll", "documents", &aliases).unwrap();
        assert_eq!(name, "ls");
        assert_eq!(args, "-la documents");
    }

    #[test]
    fn alias_chain_orders_inner_defaults_first() {
        let aliases = HashMap::from([
            ("lh".to_string(), "l -h".to_string()),
            ("l".to_string(), "ls -l".to_string()),
        ]);
        let (name, args) = expand_alias("lh", "x", &aliases).unwrap();
        assert_eq!(name, "ls");
        assert_eq!(args, "-l -h x");
    }

    #[test]
    fn alias_self_reference_is_a_cycle() {
        let aliases = HashMap::from([("g".to_string(), "g -n".to_string())]);
        let err = expand_alias("g", "", &aliases).unwrap_err();
        assert!(matches!(err, ShellError::AliasCycle(_)));
    }

    #[test]
    fn alias_mutual_cycle_detected() {
        let aliases = HashMap::from([
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "a".to_string()),
        ]);
        let err = expand_alias("a", "", &aliases).unwrap_err();
        assert!(matches!(err, ShellError::AliasCycle(_)));
    }

    #[test]
    fn alias_cycle_produces_no_execution() {
        let (i, mut s) = (interp(), session());
        s.aliases.insert("mk".to_string(), "mk newdir".to_string());
        let out = text(exec(&i, &mut s, "mk"));
        assert!(out.contains("expansion loop"), "got: {out}");
        assert!(!s.fs.exists("/newdir"));
    }

    #[test]
    fn non_alias_passes_through() {
        let aliases = HashMap::new();
        let (name, args) = expand_alias("ls", "-l", &aliases).unwrap();
        assert_eq!(name, "ls");
        assert_eq!(args, "-l");
    }

    // -- pipelines ----------------------------------------------------------

    #[test]
    fn pipeline_sort_head_is_deterministic() {
        let (i, mut s) = (interp(), session());
        s.fs
            .write("/fruit.txt", b"banana\napple\ncherry\n", false)
            .unwrap();
        let out = text(exec(&i, &mut s, "cat fruit.txt | sort | head -n 2"));
        assert_eq!(out, "apple\nbanana");
    }

    #[test]
    fn pipeline_grep_filters() {
        let (i, mut s) = (interp(), session());
        let out = text(exec(&i, &mut s, "cat downloads/data.txt | grep an"));
        assert_eq!(out, "banana");
    }

    #[test]
    fn pipeline_tail_takes_last() {
        let (i, mut s) = (interp(), session());
        let out = text(exec(&i, &mut s, "cat downloads/data.txt | tail -n 2"));
        assert_eq!(out, "apple\ndate");
    }

    #[test]
    fn pipeline_head_default_is_ten() {
        let (i, mut s) = (interp(), session());
        let body: String = (1..=15).map(|n| format!("{n:02}\n")).collect();
        s.fs.write("/many.txt", body.as_bytes(), false).unwrap();
        let out = text(exec(&i, &mut s, "cat many.txt | head"));
        assert_eq!(out.lines().count(), 10);
    }

    #[test]
    fn pipeline_wc_is_terminal() {
        let (i, mut s) = (interp(), session());
        let out = text(exec(&i, &mut s, "cat downloads/data.txt | wc -l"));
        assert_eq!(out, "5");
    }

    #[test]
    fn pipeline_wc_default_counts() {
        let (i, mut s) = (interp(), session());
        s.fs.write("/two.txt", b"a b\nc\n", false).unwrap();
        let out = text(exec(&i, &mut s, "cat two.txt | wc"));
        assert_eq!(out, "2 3 6");
    }

    #[test]
    fn pipeline_requires_cat_source() {
        let (i, mut s) = (interp(), session());
        let out = text(exec(&i, &mut s, "ls | sort"));
        assert_eq!(out, "'ls' is not supported as a pipeline source");
    }

    #[test]
    fn pipeline_unsupported_stage_discards_buffer() {
        let (i, mut s) = (interp(), session());
        let out = text(exec(&i, &mut s, "cat downloads/data.txt | awk '{print}'"));
        assert_eq!(out, "'awk' is not supported in a pipeline");
    }

    #[test]
    fn pipeline_missing_file() {
        let (i, mut s) = (interp(), session());
        let out = text(exec(&i, &mut s, "cat ghost.txt | sort"));
        assert_eq!(out, "cat: ghost.txt: No such file or directory");
    }

    #[test]
    fn pipeline_invalid_count_is_diagnosed() {
        let (i, mut s) = (interp(), session());
        let out = text(exec(&i, &mut s, "cat downloads/data.txt | head -n x"));
        assert!(out.contains("invalid number of lines"), "got: {out}");
    }

    // -- intercepted commands ----------------------------------------------

    #[test]
    fn help_lists_commands() {
        let (i, mut s) = (interp(), session());
        let out = text(exec(&i, &mut s, "help"));
        for name in ["ls", "cat", "grep", "awk", "man"] {
            assert!(out.contains(name), "help should mention {name}");
        }
        assert!(out.contains("man <command>"));
    }

    #[test]
    fn man_renders_metadata() {
        let (i, mut s) = (interp(), session());
        let out = text(exec(&i, &mut s, "man ls"));
        assert!(out.starts_with("LS(1)"));
        assert!(out.contains("NAME"));
        assert!(out.contains("SYNOPSIS"));
        assert!(out.contains("ls [-a] [-l] [path...]"));
    }

    #[test]
    fn man_without_operand_asks() {
        let (i, mut s) = (interp(), session());
        assert_eq!(text(exec(&i, &mut s, "man")), "What manual page do you want?");
    }

    #[test]
    fn man_unknown_entry() {
        let (i, mut s) = (interp(), session());
        assert_eq!(text(exec(&i, &mut s, "man zzz")), "No manual entry for zzz");
    }

    #[test]
    fn which_finds_command_and_alias() {
        let (i, mut s) = (interp(), session());
        assert_eq!(text(exec(&i, &mut s, "which ls")), "/usr/bin/ls");
        assert_eq!(text(exec(&i, &mut s, "which ll")), "alias ll='ls -la'");
        assert_eq!(exec(&i, &mut s, "which nothing"), CommandOutput::None);
    }

    // -- scenarios over the disk backend ------------------------------------

    #[test]
    fn confinement_fail_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = DiskFs::new(dir.path().join("OS")).unwrap();
        seed::seed_disk_layout(&mut fs).unwrap();
        let mut s = Session::new(Box::new(fs), "user", "ctf-linux");
        let i = interp();

        let out = text(exec(&i, &mut s, "cat ../../outside.txt"));
        assert_eq!(out, "cat: ../../outside.txt: Permission denied");
        assert_eq!(s.cwd, "/");
    }

    #[test]
    fn cd_above_root_is_denied_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let fs = DiskFs::new(dir.path().join("OS")).unwrap();
        let mut s = Session::new(Box::new(fs), "user", "ctf-linux");
        let i = interp();

        let out = text(exec(&i, &mut s, "cd .."));
        assert_eq!(out, "cd: ..: Permission denied");
        assert_eq!(s.cwd, "/");
    }

    #[test]
    fn idempotent_navigation() {
        let (i, mut s) = (interp(), session());
        exec(&i, &mut s, "cd documents");
        assert_eq!(s.cwd, "/documents");
        exec(&i, &mut s, "cd ..");
        assert_eq!(s.cwd, "/");
        exec(&i, &mut s, "cd documents");
        assert_eq!(s.cwd, "/documents");
    }
}
