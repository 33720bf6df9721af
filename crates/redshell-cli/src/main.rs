//! redshell interactive entry point.
//!
//! Wires a storage backend to the interpreter and runs the prompt loop.
//! Interrupting the read returns to the prompt; end-of-input and the `exit`
//! command are the only ways out.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Arg;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use redshell_sandbox::{DiskFs, MemoryFs, Sandbox, seed};
use redshell_term::{CommandOutput, Interpreter, Session};
use redshell_types::config::{BackendKind, SessionConfig};

fn build_cli() -> clap::Command {
    clap::Command::new("redshell")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sandboxed terminal simulator for CTF training")
        .arg(
            Arg::new("command")
                .short('c')
                .long("command")
                .value_name("LINE")
                .help("Execute a single line and exit")
                .num_args(1),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .value_name("KIND")
                .help("Storage backend: memory or disk"),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("DIR")
                .help("Sandbox root directory for the disk backend"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Configuration file (default: redshell.toml)"),
        )
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let matches = build_cli().get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map_or_else(|| Path::new("redshell.toml").to_path_buf(), PathBuf::from);
    let mut config = SessionConfig::load(&config_path)?;

    // Flags override file values.
    if let Some(backend) = matches.get_one::<String>("backend") {
        config.backend = backend.parse::<BackendKind>()?;
    }
    if let Some(root) = matches.get_one::<String>("root") {
        config.root = PathBuf::from(root);
    }

    let interp = Interpreter::with_builtins();
    let mut session = build_session(&config)?;

    if let Some(line) = matches.get_one::<String>("command") {
        let output = run_batch(&interp, &mut session, line);
        if !output.is_empty() {
            print_text(&output);
        }
        return Ok(());
    }

    println!("redshell - CTF terminal simulator");
    println!("Type 'help' for available commands.");
    repl(&interp, &mut session)
}

/// Construct and seed the configured backend.
fn build_session(config: &SessionConfig) -> Result<Session> {
    let fs: Box<dyn Sandbox> = match config.backend {
        BackendKind::Memory => {
            let mut fs = MemoryFs::new();
            seed::seed_memory_layout(&mut fs)?;
            Box::new(fs)
        }
        BackendKind::Disk => {
            let mut fs = DiskFs::new(config.root.clone())?;
            if fs.list("/")?.is_empty() {
                log::info!(
                    "first run: seeding sandbox under {}",
                    config.root.display()
                );
                seed::seed_disk_layout(&mut fs)?;
            }
            Box::new(fs)
        }
    };
    Ok(Session::new(fs, config.user.clone(), config.host.clone()))
}

/// Execute one line non-interactively. `exit` is a no-op here: the process
/// is about to end anyway, and sourced material must not decide that.
fn run_batch(interp: &Interpreter, session: &mut Session, line: &str) -> String {
    match interp.execute_line(line, session) {
        CommandOutput::Text(text) => text,
        CommandOutput::Exit => "exit: ignored in batch execution.".to_string(),
        CommandOutput::Clear | CommandOutput::None => String::new(),
    }
}

fn repl(interp: &Interpreter, session: &mut Session) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline(&session.prompt()) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                match interp.execute_line(&line, session) {
                    CommandOutput::Text(text) => print_text(&text),
                    CommandOutput::Clear => print!("\x1b[2J\x1b[H"),
                    CommandOutput::Exit => {
                        println!("Exiting terminal.");
                        break;
                    }
                    CommandOutput::None => {}
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Use 'exit' to quit.");
            }
            Err(ReadlineError::Eof) => {
                println!("Exiting terminal.");
                break;
            }
            Err(err) => {
                eprintln!("error: {err}");
                break;
            }
        }
    }
    Ok(())
}

/// Print command output with exactly one trailing newline.
fn print_text(text: &str) {
    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
}
