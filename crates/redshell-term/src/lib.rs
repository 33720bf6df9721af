//! Command interpreter and terminal subsystem.
//!
//! The interpreter is a registry-based dispatch system. Commands implement
//! the `Command` trait and are registered by name. `execute_line` parses an
//! input line, expands aliases, and either dispatches a single command or
//! threads the line through the pipeline dispatcher. All mutable session
//! state (current directory, aliases, history) lives in a `Session` object
//! owned by the caller.

mod fs_commands;
mod interp;
pub mod lex;
mod session;
mod sys_commands;
mod text_commands;

/// A single executable command trait.
pub use interp::Command;
/// Output produced by a command (text, signals).
pub use interp::CommandOutput;
/// Registry and dispatcher for command lines.
pub use interp::Interpreter;
/// Mutable session state threaded into every command.
pub use session::Session;

/// Register all built-in commands into an interpreter.
pub fn register_builtins(interp: &mut Interpreter) {
    fs_commands::register_fs_commands(interp);
    text_commands::register_text_commands(interp);
    sys_commands::register_sys_commands(interp);
}
