//! Mutable session state.

use std::collections::HashMap;

use redshell_sandbox::{Sandbox, path};
use redshell_types::error::Result;

/// Everything a command invocation can observe or mutate, threaded
/// explicitly into every handler call. One session per shell instance;
/// nothing global.
pub struct Session {
    /// Current working directory as a canonical path.
    pub cwd: String,
    /// The storage backend.
    pub fs: Box<dyn Sandbox>,
    /// Alias name -> expansion string.
    pub aliases: HashMap<String, String>,
    /// Raw input lines, append-only, 1-indexed for display.
    pub history: Vec<String>,
    /// User name shown in the prompt.
    pub user: String,
    /// Host name shown in the prompt.
    pub host: String,
}

impl Session {
    /// Create a session rooted at the sandbox home with the stock aliases.
    pub fn new(fs: Box<dyn Sandbox>, user: impl Into<String>, host: impl Into<String>) -> Self {
        let mut aliases = HashMap::new();
        aliases.insert("ll".to_string(), "ls -la".to_string());
        aliases.insert("la".to_string(), "ls -a".to_string());
        aliases.insert("l".to_string(), "ls -l".to_string());
        Self {
            cwd: path::ROOT.to_string(),
            fs,
            aliases,
            history: Vec::new(),
            user: user.into(),
            host: host.into(),
        }
    }

    /// Resolve a user-typed path against the current directory, under this
    /// backend's escape policy.
    pub fn resolve(&self, input: &str) -> Result<String> {
        path::resolve(input, &self.cwd, self.fs.escape_policy())
    }

    /// The prompt string, `user@host:display$ `.
    pub fn prompt(&self) -> String {
        format!(
            "{}@{}:{}$ ",
            self.user,
            self.host,
            self.fs.display_path(&self.cwd)
        )
    }

    /// Append a raw input line to the history.
    pub fn record(&mut self, line: &str) {
        self.history.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redshell_sandbox::MemoryFs;

    fn session() -> Session {
        Session::new(Box::new(MemoryFs::new()), "user", "ctf-linux")
    }

    #[test]
    fn starts_at_home() {
        let s = session();
        assert_eq!(s.cwd, "/");
        assert_eq!(s.prompt(), "user@ctf-linux:~$ ");
    }

    #[test]
    fn prompt_tracks_cwd() {
        let mut s = session();
        s.fs.mkdir("/documents").unwrap();
        s.cwd = "/documents".to_string();
        assert_eq!(s.prompt(), "user@ctf-linux:/documents$ ");
    }

    #[test]
    fn stock_aliases_present() {
        let s = session();
        assert_eq!(s.aliases.get("ll").unwrap(), "ls -la");
        assert_eq!(s.aliases.get("la").unwrap(), "ls -a");
        assert_eq!(s.aliases.get("l").unwrap(), "ls -l");
    }

    #[test]
    fn record_appends_in_order() {
        let mut s = session();
        s.record("ls");
        s.record("cat a.txt");
        s.record("ls");
        assert_eq!(s.history, ["ls", "cat a.txt", "ls"]);
    }

    #[test]
    fn resolve_uses_cwd() {
        let mut s = session();
        s.fs.mkdir("/documents").unwrap();
        s.cwd = "/documents".to_string();
        assert_eq!(s.resolve("notes.txt").unwrap(), "/documents/notes.txt");
    }
}
