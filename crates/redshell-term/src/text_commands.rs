//! Text processing commands: grep, awk, wc, sort, head, tail.

use redshell_sandbox::Sandbox;
use redshell_types::error::{Result, ShellError};

use crate::interp::{Command, CommandOutput};
use crate::lex;
use crate::session::Session;

/// Register text processing commands.
pub fn register_text_commands(interp: &mut crate::Interpreter) {
    interp.register(Box::new(GrepCmd));
    interp.register(Box::new(AwkCmd));
    interp.register(Box::new(WcCmd));
    interp.register(Box::new(SortCmd));
    interp.register(Box::new(HeadCmd));
    interp.register(Box::new(TailCmd));
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve a user path, insist it is an existing file, and read it as text.
fn read_file_text(session: &Session, arg: &str) -> Result<String> {
    let target = session.resolve(arg)?;
    if !session.fs.exists(&target) {
        return Err(ShellError::NotFound(arg.to_string()));
    }
    if session.fs.is_dir(&target) {
        return Err(ShellError::IsADirectory(arg.to_string()));
    }
    let data = session.fs.read(&target)?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Parse a `-n N` / `-nN` flag, returning the count (default 10) and the
/// first non-flag token.
pub(crate) fn parse_n_flag(tokens: &[String]) -> Result<(usize, Option<&str>)> {
    let mut n = 10usize;
    let mut file = None;
    let mut i = 0;
    while i < tokens.len() {
        let tok = tokens[i].as_str();
        if tok == "-n" {
            i += 1;
            let value = tokens.get(i).map(String::as_str).ok_or_else(|| {
                ShellError::InvalidArgument("option requires an argument -- 'n'".to_string())
            })?;
            n = parse_count(value)?;
        } else if let Some(value) = tok.strip_prefix("-n") {
            n = parse_count(value)?;
        } else if file.is_none() {
            file = Some(tok);
        }
        i += 1;
    }
    Ok((n, file))
}

fn parse_count(value: &str) -> Result<usize> {
    value.parse().map_err(|_| {
        ShellError::InvalidArgument(format!("invalid number of lines: '{value}'"))
    })
}

/// Line, word, and character counts. The line count is the number of
/// newline characters, so a 3-line file with a trailing newline reports 3.
pub(crate) fn wc_counts(text: &str) -> (usize, usize, usize) {
    let lines = text.matches('\n').count();
    let words = text.split_whitespace().count();
    let chars = text.chars().count();
    (lines, words, chars)
}

/// Render counts under a wc mode flag (`-l`, `-w`, `-c`/`-m`, or all).
pub(crate) fn wc_report(counts: (usize, usize, usize), flag: Option<&str>) -> String {
    let (lines, words, chars) = counts;
    match flag {
        Some("-l") => lines.to_string(),
        Some("-w") => words.to_string(),
        Some("-c") | Some("-m") => chars.to_string(),
        _ => format!("{lines} {words} {chars}"),
    }
}

// ---------------------------------------------------------------------------
// grep
// ---------------------------------------------------------------------------

struct GrepCmd;
impl Command for GrepCmd {
    fn name(&self) -> &str {
        "grep"
    }
    fn description(&self) -> &str {
        "Search for a pattern in a file"
    }
    fn usage(&self) -> &str {
        "grep <pattern> <file>"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let tokens = lex::split_args(args);
        let [pattern, file, ..] = tokens.as_slice() else {
            return Err(ShellError::InvalidArgument("missing operand".to_string()));
        };
        let text = read_file_text(session, file)?;
        let matches: Vec<&str> = text
            .lines()
            .filter(|line| line.contains(pattern.as_str()))
            .collect();
        if matches.is_empty() {
            Ok(CommandOutput::None)
        } else {
            Ok(CommandOutput::Text(matches.join("\n")))
        }
    }
}

// ---------------------------------------------------------------------------
// awk
// ---------------------------------------------------------------------------

/// The supported script shapes, parsed once up front and then interpreted
/// uniformly per line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AwkScript {
    /// `{print}` / `{print $0}`
    PrintLine,
    /// `{print $N}`
    PrintField(usize),
    /// `{print $A $B ...}`
    PrintFields(Vec<usize>),
    /// `/pattern/` with an optional trailing `{print}`
    Match(String),
}

fn parse_awk_script(script: &str) -> Result<AwkScript> {
    let s = script.trim();
    if let Some(body) = s.strip_prefix('{').and_then(|b| b.strip_suffix('}')) {
        let body = body.trim();
        if body == "print" || body == "print $0" {
            return Ok(AwkScript::PrintLine);
        }
        if let Some(refs) = body.strip_prefix("print ") {
            let mut fields = Vec::new();
            for tok in refs.split_whitespace() {
                let num = tok
                    .strip_prefix('$')
                    .and_then(|n| n.parse::<usize>().ok())
                    .ok_or_else(|| unsupported_script(s))?;
                fields.push(num);
            }
            return match fields.as_slice() {
                [] => Err(unsupported_script(s)),
                [one] => Ok(AwkScript::PrintField(*one)),
                _ => Ok(AwkScript::PrintFields(fields)),
            };
        }
        return Err(unsupported_script(s));
    }
    if let Some(rest) = s.strip_prefix('/')
        && let Some(end) = rest.find('/')
    {
        let tail = rest[end + 1..].trim();
        if tail.is_empty() || tail == "{print}" || tail == "{print $0}" {
            return Ok(AwkScript::Match(rest[..end].to_string()));
        }
    }
    Err(unsupported_script(s))
}

fn unsupported_script(script: &str) -> ShellError {
    ShellError::InvalidArgument(format!("unsupported script: {script}"))
}

fn split_fields<'a>(line: &'a str, sep: Option<&str>) -> Vec<&'a str> {
    match sep {
        None => line.split_whitespace().collect(),
        Some(s) => line.split(s).collect(),
    }
}

/// Apply a parsed script to one line. `None` means the line produces no
/// output (pattern miss, field out of range).
fn apply_script(script: &AwkScript, line: &str, sep: Option<&str>) -> Option<String> {
    match script {
        AwkScript::PrintLine => Some(line.to_string()),
        AwkScript::Match(pattern) => line.contains(pattern).then(|| line.to_string()),
        AwkScript::PrintField(0) => Some(line.to_string()),
        AwkScript::PrintField(n) => {
            let fields = split_fields(line, sep);
            fields.get(n - 1).map(|f| f.trim().to_string())
        }
        AwkScript::PrintFields(nums) => {
            let fields = split_fields(line, sep);
            let mut parts = Vec::new();
            for &n in nums {
                if n == 0 {
                    parts.push(line.to_string());
                } else if let Some(f) = fields.get(n - 1) {
                    parts.push(f.trim().to_string());
                }
            }
            Some(parts.join(" "))
        }
    }
}

struct AwkCmd;
impl Command for AwkCmd {
    fn name(&self) -> &str {
        "awk"
    }
    fn description(&self) -> &str {
        "Pattern scanning and field extraction"
    }
    fn usage(&self) -> &str {
        "awk [-F sep] <script> <file>"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let tokens = lex::split_args(args);
        if tokens.is_empty() {
            return Err(ShellError::InvalidArgument("missing operand".to_string()));
        }

        let mut separator: Option<String> = None;
        let mut script: Option<&str> = None;
        let mut file: Option<&str> = None;

        let mut i = 0;
        while i < tokens.len() {
            let tok = tokens[i].as_str();
            if tok == "-F" {
                i += 1;
                let value = tokens.get(i).ok_or_else(|| {
                    ShellError::InvalidArgument("option requires an argument -- 'F'".to_string())
                })?;
                separator = Some(value.clone());
            } else if let Some(value) = tok.strip_prefix("-F") {
                separator = Some(value.to_string());
            } else if script.is_none() {
                script = Some(tok);
            } else if file.is_none() {
                file = Some(tok);
            }
            i += 1;
        }

        let (Some(script), Some(file)) = (script, file) else {
            return Err(ShellError::InvalidArgument(
                "missing script or filename".to_string(),
            ));
        };
        let script = parse_awk_script(script)?;
        let text = read_file_text(session, file)?;

        let output: Vec<String> = text
            .lines()
            .filter_map(|line| apply_script(&script, line, separator.as_deref()))
            .collect();
        if output.is_empty() {
            Ok(CommandOutput::None)
        } else {
            Ok(CommandOutput::Text(output.join("\n")))
        }
    }
}

// ---------------------------------------------------------------------------
// wc
// ---------------------------------------------------------------------------

struct WcCmd;
impl Command for WcCmd {
    fn name(&self) -> &str {
        "wc"
    }
    fn description(&self) -> &str {
        "Count lines, words, and characters"
    }
    fn usage(&self) -> &str {
        "wc [-l|-w|-c|-m] <file...>"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let tokens = lex::split_args(args);
        if tokens.is_empty() {
            return Err(ShellError::InvalidArgument("missing operand".to_string()));
        }
        let mut flag: Option<&str> = None;
        let mut files: Vec<&str> = Vec::new();
        for tok in &tokens {
            match tok.as_str() {
                "-l" | "-w" | "-c" | "-m" => flag = Some(tok.as_str()),
                other => files.push(other),
            }
        }
        if files.is_empty() {
            return Err(ShellError::InvalidArgument(
                "missing file operand".to_string(),
            ));
        }
        // Several operands keep going past individual failures.
        let mut lines = Vec::new();
        for file in files {
            match read_file_text(session, file) {
                Ok(text) => {
                    lines.push(format!("{} {file}", wc_report(wc_counts(&text), flag)));
                }
                Err(e) => lines.push(format!("wc: {e}")),
            }
        }
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// sort
// ---------------------------------------------------------------------------

struct SortCmd;
impl Command for SortCmd {
    fn name(&self) -> &str {
        "sort"
    }
    fn description(&self) -> &str {
        "Sort lines of text"
    }
    fn usage(&self) -> &str {
        "sort <file>"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let Some(file) = lex::split_args(args).into_iter().next() else {
            return Err(ShellError::InvalidArgument("missing operand".to_string()));
        };
        let text = read_file_text(session, &file)?;
        let mut lines: Vec<&str> = text.lines().collect();
        lines.sort_unstable();
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// head / tail
// ---------------------------------------------------------------------------

struct HeadCmd;
impl Command for HeadCmd {
    fn name(&self) -> &str {
        "head"
    }
    fn description(&self) -> &str {
        "Output the first lines of a file"
    }
    fn usage(&self) -> &str {
        "head [-n N] <file>"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let tokens = lex::split_args(args);
        let (n, file) = parse_n_flag(&tokens)?;
        let file = file.ok_or_else(|| {
            ShellError::InvalidArgument("missing file operand".to_string())
        })?;
        let text = read_file_text(session, file)?;
        let kept: Vec<&str> = text.lines().take(n).collect();
        Ok(CommandOutput::Text(kept.join("\n")))
    }
}

struct TailCmd;
impl Command for TailCmd {
    fn name(&self) -> &str {
        "tail"
    }
    fn description(&self) -> &str {
        "Output the last lines of a file"
    }
    fn usage(&self) -> &str {
        "tail [-n N] <file>"
    }
    fn execute(&self, args: &str, session: &mut Session) -> Result<CommandOutput> {
        let tokens = lex::split_args(args);
        let (n, file) = parse_n_flag(&tokens)?;
        let file = file.ok_or_else(|| {
            ShellError::InvalidArgument("missing file operand".to_string())
        })?;
        let text = read_file_text(session, file)?;
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(n);
        Ok(CommandOutput::Text(lines[start..].join("\n")))
    }
}
