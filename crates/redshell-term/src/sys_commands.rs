//! Session and simulation commands: alias, history, env, clear, and the
//! process-management commands that only pretend (ps, kill, chmod, chown).

use redshell_types::error::{Result, ShellError};

use crate::interp::{Command, CommandOutput};
use crate::lex;
use crate::session::Session;

/// Register session and simulation commands.
pub fn register_sys_commands(interp: &mut crate::Interpreter) {
    interp.register(Box::new(AliasCmd));
    interp.register(Box::new(HistoryCmd));
    interp.register(Box::new(EnvCmd));
    interp.register(Box::new(ClearCmd));
    interp.register(Box::new(PsCmd));
    interp.register(Box::new(SimulatedCmd {
        name: "kill",
        description: "Terminate a process (simulated)",
        usage: "kill <pid>",
        verb: "would kill process",
    }));
    interp.register(Box::new(SimulatedCmd {
        name: "chmod",
        description: "Change file permissions (simulated)",
        usage: "chmod <mode> <file>",
        verb: "would change permissions:",
    }));
    interp.register(Box::new(SimulatedCmd {
        name: "chown",
        description: "Change file ownership (simulated)",
        usage: "chown <owner> <file>",
        verb: "would change ownership:",
    }));
    interp.register(Box::new(ExitCmd));
}

// ---------------------------------------------------------------------------
// alias
// ---------------------------------------------------------------------------

struct AliasCmd;
impl Command for AliasCmd {
    fn name(&self) -> &str {
        "alias"
    }
    fn description(&self) -> &str {
        "Create or list command aliases"
    }
    fn usage(&self) -> &str {
        "alias [name[=value]]"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let args = args.trim();
        if args.is_empty() {
            let mut entries: Vec<(&str, &str)> = session
                .aliases
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            entries.sort_unstable();
            let lines: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("alias {k}='{v}'"))
                .collect();
            return Ok(CommandOutput::Text(lines.join("\n")));
        }

        let Some((name, value)) = args.split_once('=') else {
            return match session.aliases.get(args) {
                Some(value) => Ok(CommandOutput::Text(format!("alias {args}='{value}'"))),
                None => Ok(CommandOutput::Text(format!("alias: {args}: not found"))),
            };
        };
        let name = name.trim();
        let value = lex::strip_quotes(value.trim());
        if name.is_empty() {
            return Err(ShellError::InvalidArgument("invalid syntax".to_string()));
        }
        session.aliases.insert(name.to_string(), value.to_string());
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

struct HistoryCmd;
impl Command for HistoryCmd {
    fn name(&self) -> &str {
        "history"
    }
    fn description(&self) -> &str {
        "Show command history"
    }
    fn usage(&self) -> &str {
        "history"
    }
    fn execute(&self, _args: &str, session: &mut Session) -> Result<CommandOutput> {
        if session.history.is_empty() {
            return Ok(CommandOutput::None);
        }
        let lines: Vec<String> = session
            .history
            .iter()
            .enumerate()
            .map(|(i, entry)| format!(" {:4}  {entry}", i + 1))
            .collect();
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// env
// ---------------------------------------------------------------------------

struct EnvCmd;
impl Command for EnvCmd {
    fn name(&self) -> &str {
        "env"
    }
    fn description(&self) -> &str {
        "Display environment variables"
    }
    fn usage(&self) -> &str {
        "env"
    }
    fn execute(&self, _args: &str, session: &mut Session) -> Result<CommandOutput> {
        // Simulated environment: constants except for the session state.
        let lines = [
            format!("USER={}", session.user),
            "HOME=/".to_string(),
            format!("PWD={}", session.cwd),
            "PATH=/usr/local/bin:/usr/bin:/bin".to_string(),
            "TERM=xterm-256color".to_string(),
            "SHELL=/bin/bash".to_string(),
        ];
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

struct ClearCmd;
impl Command for ClearCmd {
    fn name(&self) -> &str {
        "clear"
    }
    fn description(&self) -> &str {
        "Clear the terminal screen"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    fn execute(&self, _args: &str, _session: &mut Session) -> Result<CommandOutput> {
        Ok(CommandOutput::Clear)
    }
}

// ---------------------------------------------------------------------------
// ps
// ---------------------------------------------------------------------------

struct PsCmd;
impl Command for PsCmd {
    fn name(&self) -> &str {
        "ps"
    }
    fn description(&self) -> &str {
        "Report process status (simulated)"
    }
    fn usage(&self) -> &str {
        "ps"
    }
    fn execute(&self, _args: &str, _session: &mut Session) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(
            "  PID TTY          TIME CMD\n 1234 pts/0    00:00:01 bash\n 5678 pts/0    00:00:00 redshell"
                .to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// kill / chmod / chown
// ---------------------------------------------------------------------------

/// Commands that exist only so the vocabulary feels complete; they validate
/// an operand and report what a real shell would have done.
struct SimulatedCmd {
    name: &'static str,
    description: &'static str,
    usage: &'static str,
    verb: &'static str,
}

impl Command for SimulatedCmd {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        self.description
    }
    fn usage(&self) -> &str {
        self.usage
    }
    fn execute(&self, args: &str, _session: &mut Session) -> Result<CommandOutput> {
        let args = args.trim();
        if args.is_empty() {
            return Err(ShellError::InvalidArgument("missing operand".to_string()));
        }
        Ok(CommandOutput::Text(format!(
            "{}: simulated command - {} {args}",
            self.name, self.verb
        )))
    }
}

// ---------------------------------------------------------------------------
// exit
// ---------------------------------------------------------------------------

struct ExitCmd;
impl Command for ExitCmd {
    fn name(&self) -> &str {
        "exit"
    }
    fn description(&self) -> &str {
        "Leave the shell"
    }
    fn usage(&self) -> &str {
        "exit"
    }
    fn execute(&self, _args: &str, _session: &mut Session) -> Result<CommandOutput> {
        Ok(CommandOutput::Exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Interpreter;
    use redshell_sandbox::{MemoryFs, seed};

    fn setup() -> (Interpreter, Session) {
        let mut fs = MemoryFs::new();
        seed::seed_memory_layout(&mut fs).unwrap();
        let session = Session::new(Box::new(fs), "user", "ctf-linux");
        (Interpreter::with_builtins(), session)
    }

    fn run(interp: &Interpreter, session: &mut Session, line: &str) -> String {
        match interp.execute_line(line, session) {
            CommandOutput::Text(s) => s,
            CommandOutput::None => String::new(),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn alias_lists_stock_entries_sorted() {
        let (i, mut s) = setup();
        let out = run(&i, &mut s, "alias");
        assert_eq!(
            out,
            "alias l='ls -l'\nalias la='ls -a'\nalias ll='ls -la'"
        );
    }

    #[test]
    fn alias_defines_and_shows_one() {
        let (i, mut s) = setup();
        run(&i, &mut s, "alias flag='cat documents/.flag.txt'");
        assert_eq!(
            run(&i, &mut s, "alias flag"),
            "alias flag='cat documents/.flag.txt'"
        );
        let out = run(&i, &mut s, "flag");
        assert!(out.contains("CTF_FLAG"));
    }

    #[test]
    fn alias_unknown_shows_not_found() {
        let (i, mut s) = setup();
        assert_eq!(run(&i, &mut s, "alias nope"), "alias: nope: not found");
    }

    #[test]
    fn defined_alias_expands_on_use() {
        let (i, mut s) = setup();
        run(&i, &mut s, "alias docs='ls documents'");
        let out = run(&i, &mut s, "docs");
        assert_eq!(out, "notes.txt\ntodo.txt");
    }

    #[test]
    fn stock_ll_alias_shows_hidden_long() {
        let (i, mut s) = setup();
        run(&i, &mut s, "cd documents");
        let out = run(&i, &mut s, "ll");
        assert!(out.lines().any(|l| l.ends_with(".flag.txt")));
        assert!(out.lines().all(|l| l.starts_with("-rw-r--r--")));
    }

    #[test]
    fn history_is_numbered_and_ordered() {
        let (i, mut s) = setup();
        run(&i, &mut s, "ls");
        run(&i, &mut s, "cd documents");
        let out = run(&i, &mut s, "history");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "    1  ls");
        assert_eq!(lines[1], "    2  cd documents");
        assert_eq!(lines[2], "    3  history");
    }

    #[test]
    fn env_reflects_session() {
        let (i, mut s) = setup();
        run(&i, &mut s, "cd downloads");
        let out = run(&i, &mut s, "env");
        assert!(out.contains("USER=user"));
        assert!(out.contains("HOME=/"));
        assert!(out.contains("PWD=/downloads"));
        assert!(out.contains("SHELL=/bin/bash"));
    }

    #[test]
    fn clear_signals() {
        let (i, mut s) = setup();
        assert_eq!(i.execute_line("clear", &mut s), CommandOutput::Clear);
    }

    #[test]
    fn ps_fixed_listing() {
        let (i, mut s) = setup();
        let out = run(&i, &mut s, "ps");
        assert!(out.starts_with("  PID TTY"));
        assert!(out.contains("redshell"));
    }

    #[test]
    fn simulated_commands_report() {
        let (i, mut s) = setup();
        assert_eq!(
            run(&i, &mut s, "kill 1234"),
            "kill: simulated command - would kill process 1234"
        );
        assert_eq!(
            run(&i, &mut s, "chmod 755 flag.txt"),
            "chmod: simulated command - would change permissions: 755 flag.txt"
        );
        assert_eq!(
            run(&i, &mut s, "chown root flag.txt"),
            "chown: simulated command - would change ownership: root flag.txt"
        );
        assert_eq!(run(&i, &mut s, "kill"), "kill: missing operand");
    }

    #[test]
    fn exit_signals() {
        let (i, mut s) = setup();
        assert_eq!(i.execute_line("exit", &mut s), CommandOutput::Exit);
    }
}
