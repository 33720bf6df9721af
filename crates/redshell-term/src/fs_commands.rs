//! Filesystem commands: ls, cd, cat, mkdir, touch, find, echo.

use redshell_sandbox::{EntryKind, Sandbox, path};
use redshell_types::error::{Result, ShellError};

use crate::interp::{Command, CommandOutput};
use crate::lex;
use crate::session::Session;

/// Register filesystem commands.
pub fn register_fs_commands(interp: &mut crate::Interpreter) {
    interp.register(Box::new(LsCmd));
    interp.register(Box::new(CdCmd));
    interp.register(Box::new(CatCmd));
    interp.register(Box::new(MkdirCmd));
    interp.register(Box::new(TouchCmd));
    interp.register(Box::new(FindCmd));
    interp.register(Box::new(EchoCmd));
}

// ---------------------------------------------------------------------------
// ls
// ---------------------------------------------------------------------------

struct LsCmd;
impl Command for LsCmd {
    fn name(&self) -> &str {
        "ls"
    }
    fn description(&self) -> &str {
        "List directory contents"
    }
    fn usage(&self) -> &str {
        "ls [-a] [-l] [path...]"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let mut show_hidden = false;
        let mut long = false;
        let mut paths: Vec<String> = Vec::new();

        for token in lex::split_args(args) {
            match token.strip_prefix('-') {
                Some(flags) if !flags.is_empty() => {
                    for ch in flags.chars() {
                        match ch {
                            'a' => show_hidden = true,
                            'l' => long = true,
                            other => {
                                return Err(ShellError::InvalidArgument(format!(
                                    "invalid option -- '{other}'"
                                )));
                            }
                        }
                    }
                }
                _ => paths.push(token),
            }
        }

        let lines = match paths.as_slice() {
            [] => {
                let cwd = session.cwd.clone();
                list_target(session, &cwd, show_hidden, long)?
            }
            [single] => {
                let target = resolve_existing(session, single)?;
                list_target(session, &target, show_hidden, long)?
            }
            many => {
                // Several operands: print a header per path and keep going
                // past per-path failures.
                let mut out = Vec::new();
                for (i, arg) in many.iter().enumerate() {
                    match resolve_existing(session, arg) {
                        Ok(target) => {
                            if i > 0 {
                                out.push(String::new());
                            }
                            out.push(format!("{arg}:"));
                            match list_target(session, &target, show_hidden, long) {
                                Ok(lines) => out.extend(lines),
                                Err(e) => out.push(format!("ls: {e}")),
                            }
                        }
                        Err(e) => out.push(format!("ls: {e}")),
                    }
                }
                out
            }
        };

        if lines.is_empty() {
            Ok(CommandOutput::None)
        } else {
            Ok(CommandOutput::Text(lines.join("\n")))
        }
    }
}

/// Resolve a user path and insist it exists.
fn resolve_existing(session: &Session, arg: &str) -> Result<String> {
    let target = session.resolve(arg)?;
    if !session.fs.exists(&target) {
        return Err(ShellError::NotFound(arg.to_string()));
    }
    Ok(target)
}

fn list_target(
    session: &Session,
    target: &str,
    show_hidden: bool,
    long: bool,
) -> Result<Vec<String>> {
    if session.fs.is_file(target) {
        let size = session.fs.read(target)?.len() as u64;
        let name = path::file_name(target).to_string();
        return Ok(vec![format_entry(&name, EntryKind::File, size, long)]);
    }
    let entries = session.fs.list(target)?;
    Ok(entries
        .iter()
        .filter(|e| show_hidden || !e.name.starts_with('.'))
        .map(|e| format_entry(&e.name, e.kind, e.size, long))
        .collect())
}

/// One `ls` line. The permission string, link count, and owner columns are
/// simulated constants; only kind, size, and name carry real information.
fn format_entry(name: &str, kind: EntryKind, size: u64, long: bool) -> String {
    let display = match kind {
        EntryKind::Directory => format!("{name}/"),
        EntryKind::File => name.to_string(),
    };
    if !long {
        return display;
    }
    let perms = match kind {
        EntryKind::Directory => "drwxr-xr-x",
        EntryKind::File => "-rw-r--r--",
    };
    format!("{perms} {:>2} {:<8} {:<8} {size:>8} {display}", 1, "user", "user")
}

// ---------------------------------------------------------------------------
// cd
// ---------------------------------------------------------------------------

struct CdCmd;
impl Command for CdCmd {
    fn name(&self) -> &str {
        "cd"
    }
    fn description(&self) -> &str {
        "Change the working directory"
    }
    fn usage(&self) -> &str {
        "cd [path]"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let Some(arg) = lex::split_args(args).into_iter().next() else {
            session.cwd = path::ROOT.to_string();
            return Ok(CommandOutput::None);
        };
        let target = session.resolve(&arg)?;
        if !session.fs.exists(&target) {
            return Err(ShellError::NotFound(arg));
        }
        if !session.fs.is_dir(&target) {
            return Err(ShellError::NotADirectory(arg));
        }
        session.cwd = target;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// cat
// ---------------------------------------------------------------------------

struct CatCmd;
impl Command for CatCmd {
    fn name(&self) -> &str {
        "cat"
    }
    fn description(&self) -> &str {
        "Display file contents"
    }
    fn usage(&self) -> &str {
        "cat <file>"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let Some(arg) = lex::split_args(args).into_iter().next() else {
            return Err(ShellError::InvalidArgument("missing operand".to_string()));
        };
        let target = session.resolve(&arg)?;
        if !session.fs.exists(&target) {
            return Err(ShellError::NotFound(arg));
        }
        if session.fs.is_dir(&target) {
            return Err(ShellError::IsADirectory(arg));
        }
        let data = session.fs.read(&target)?;
        Ok(CommandOutput::Text(
            String::from_utf8_lossy(&data).into_owned(),
        ))
    }
}

// ---------------------------------------------------------------------------
// mkdir
// ---------------------------------------------------------------------------

struct MkdirCmd;
impl Command for MkdirCmd {
    fn name(&self) -> &str {
        "mkdir"
    }
    fn description(&self) -> &str {
        "Create directories"
    }
    fn usage(&self) -> &str {
        "mkdir <name...>"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let names = lex::split_args(args);
        if names.is_empty() {
            return Err(ShellError::InvalidArgument("missing operand".to_string()));
        }
        // Several operands keep going past individual failures, so
        // diagnostics are collected instead of propagated.
        let mut diags = Vec::new();
        for name in &names {
            match session.resolve(name) {
                Err(e) => diags.push(format!("mkdir: {e}")),
                Ok(target) => {
                    if session.fs.exists(&target) {
                        diags.push(format!("mkdir: {name}: File exists"));
                    } else if !session.fs.exists(path::parent(&target)) {
                        diags.push(format!("mkdir: {name}: No such file or directory"));
                    } else if let Err(e) = session.fs.mkdir(&target) {
                        diags.push(format!("mkdir: {e}"));
                    }
                }
            }
        }
        if diags.is_empty() {
            Ok(CommandOutput::None)
        } else {
            Ok(CommandOutput::Text(diags.join("\n")))
        }
    }
}

// ---------------------------------------------------------------------------
// touch
// ---------------------------------------------------------------------------

struct TouchCmd;
impl Command for TouchCmd {
    fn name(&self) -> &str {
        "touch"
    }
    fn description(&self) -> &str {
        "Create an empty file"
    }
    fn usage(&self) -> &str {
        "touch <name>"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let Some(arg) = lex::split_args(args).into_iter().next() else {
            return Err(ShellError::InvalidArgument(
                "missing file operand".to_string(),
            ));
        };
        let target = session.resolve(&arg)?;
        if session.fs.is_dir(&target) {
            return Err(ShellError::IsADirectory(arg));
        }
        if !session.fs.exists(path::parent(&target)) {
            return Err(ShellError::NotFound(arg));
        }
        session.fs.touch(&target)?;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// find
// ---------------------------------------------------------------------------

struct FindCmd;
impl Command for FindCmd {
    fn name(&self) -> &str {
        "find"
    }
    fn description(&self) -> &str {
        "Search for files and directories"
    }
    fn usage(&self) -> &str {
        "find [path] [-name pattern]"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let tokens = lex::split_args(args);
        let mut root_arg: Option<&str> = None;
        let mut pattern: Option<&str> = None;

        let mut i = 0;
        while i < tokens.len() {
            if tokens[i] == "-name" {
                i += 1;
                pattern = Some(tokens.get(i).map(String::as_str).ok_or_else(|| {
                    ShellError::InvalidArgument("missing argument to '-name'".to_string())
                })?);
            } else if !tokens[i].starts_with('-') && root_arg.is_none() {
                root_arg = Some(tokens[i].as_str());
            }
            i += 1;
        }

        let root = match root_arg {
            Some(arg) => {
                let target = session.resolve(arg)?;
                if !session.fs.exists(&target) {
                    return Err(ShellError::NotFound(arg.to_string()));
                }
                target
            }
            None => session.cwd.clone(),
        };
        if !session.fs.is_dir(&root) {
            return Ok(CommandOutput::None);
        }

        let mut results = Vec::new();
        find_recursive(session.fs.as_ref(), &root, pattern, &mut results)?;
        if results.is_empty() {
            Ok(CommandOutput::None)
        } else {
            Ok(CommandOutput::Text(results.join("\n")))
        }
    }
}

/// Depth-first walk collecting `~/`-prefixed paths for every entry whose
/// name matches the pattern (or every entry when there is none).
fn find_recursive(
    fs: &dyn Sandbox,
    dir: &str,
    pattern: Option<&str>,
    results: &mut Vec<String>,
) -> Result<()> {
    for entry in fs.list(dir)? {
        let full = path::join(dir, &entry.name);
        if pattern.is_none_or(|p| glob_match(p, &entry.name)) {
            results.push(format!("~{full}"));
        }
        if entry.kind == EntryKind::Directory {
            find_recursive(fs, &full, pattern, results)?;
        }
    }
    Ok(())
}

/// Whole-name glob matching: `*` matches any run, `?` matches one char.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    glob_match_inner(&p, &t, 0, 0, 0)
}

/// Recursion cap so a pathological pattern cannot blow the stack.
const GLOB_MAX_DEPTH: usize = 256;

fn glob_match_inner(p: &[char], t: &[char], pi: usize, ti: usize, depth: usize) -> bool {
    if depth >= GLOB_MAX_DEPTH {
        return false;
    }
    if pi == p.len() {
        return ti == t.len();
    }
    if p[pi] == '*' {
        for skip in 0..=(t.len() - ti) {
            if glob_match_inner(p, t, pi + 1, ti + skip, depth + 1) {
                return true;
            }
        }
        false
    } else if ti < t.len() && (p[pi] == '?' || p[pi] == t[ti]) {
        glob_match_inner(p, t, pi + 1, ti + 1, depth + 1)
    } else {
        false
    }
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

struct EchoCmd;
impl Command for EchoCmd {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Display a line of text"
    }
    fn usage(&self) -> &str {
        "echo <text> [> file | >> file]"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let Some(pos) = args.find('>') else {
            return Ok(CommandOutput::Text(
                lex::strip_quotes(args.trim()).to_string(),
            ));
        };

        let text = lex::strip_quotes(args[..pos].trim()).to_string();
        let mut rest = &args[pos + 1..];
        let append = rest.starts_with('>');
        if append {
            rest = &rest[1..];
        }
        let target = rest.trim();
        if target.is_empty() {
            return Err(ShellError::InvalidArgument(
                "missing redirection target".to_string(),
            ));
        }

        let resolved = session.resolve(target)?;
        if session.fs.is_dir(&resolved) {
            return Err(ShellError::IsADirectory(target.to_string()));
        }
        let mut data = text.into_bytes();
        data.push(b'\n');
        session
            .fs
            .write(&resolved, &data, append)
            .map_err(|e| match e {
                ShellError::NotFound(_) => ShellError::NotFound(target.to_string()),
                other => other,
            })?;
        Ok(CommandOutput::None)
    }
}
