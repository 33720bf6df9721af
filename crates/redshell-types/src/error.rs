//! Error types for redshell.

use std::io;

/// Errors produced by shell operations.
///
/// Display strings double as the user-facing diagnostic text: the dispatch
/// layer prefixes them with the failing command name, so a `NotFound` for
/// `notes.txt` raised inside `cat` prints as
/// `cat: notes.txt: No such file or directory`.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// The resolved path does not exist in the backend.
    #[error("{0}: No such file or directory")]
    NotFound(String),

    /// The resolved path escapes the sandbox root. Reported with the same
    /// wording regardless of whether the target exists, so nothing about
    /// the world outside the sandbox leaks.
    #[error("{0}: Permission denied")]
    PermissionDenied(String),

    /// A file operation landed on a directory.
    #[error("{0}: Is a directory")]
    IsADirectory(String),

    /// A directory operation landed on a file.
    #[error("{0}: Not a directory")]
    NotADirectory(String),

    /// Malformed flag, missing operand, or non-numeric count.
    #[error("{0}")]
    InvalidArgument(String),

    /// Alias expansion revisited a name it had already expanded.
    #[error("alias '{0}' creates an expansion loop")]
    AliasCycle(String),

    /// A pipeline stage outside the reduced command set.
    #[error("{0}")]
    Pipeline(String),

    /// The first token of the line is not a registered command.
    #[error("{0}: command not found")]
    UnknownCommand(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;
