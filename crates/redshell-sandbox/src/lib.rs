//! Sandboxed storage for redshell.
//!
//! All command handlers speak one capability trait, [`Sandbox`], keyed by
//! canonical virtual paths (absolute, `/`-separated, no `.`/`..` segments).
//! Two implementations conform: [`MemoryFs`] keeps the whole tree in a
//! `BTreeMap`, [`DiskFs`] maps virtual paths onto a real directory. The
//! [`path`] module turns user-typed paths into canonical ones and enforces
//! the one invariant that matters here: nothing resolves outside the root.

mod disk;
mod memory;
pub mod path;
pub mod seed;

pub use disk::DiskFs;
pub use memory::MemoryFs;
pub use path::{RootEscape, resolve};

use redshell_types::error::Result;

/// Entry classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A single directory entry.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
}

/// Capability set shared by both storage backends.
///
/// Paths are canonical virtual paths produced by [`path::resolve`]; the
/// backends never see `.`/`..` or the sandbox-root alias.
pub trait Sandbox {
    /// How the resolver treats `..` at the sandbox root for this backend.
    fn escape_policy(&self) -> RootEscape;

    /// Whether the path names an existing entry.
    fn exists(&self, path: &str) -> bool;

    /// Classify an existing entry.
    fn kind(&self, path: &str) -> Result<EntryKind>;

    /// List a directory's entries, sorted by name.
    fn list(&self, path: &str) -> Result<Vec<Entry>>;

    /// Read a file's contents.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Write a file, truncating or appending. The parent directory must
    /// already exist.
    fn write(&mut self, path: &str, data: &[u8], append: bool) -> Result<()>;

    /// Create a directory, including missing parents.
    fn mkdir(&mut self, path: &str) -> Result<()>;

    /// Create an empty file if the path is free; existing files are left
    /// untouched.
    fn touch(&mut self, path: &str) -> Result<()>;

    /// Render a canonical path for the prompt (`~`, `~/rel` or `/abs`).
    fn display_path(&self, cwd: &str) -> String;

    fn is_dir(&self, path: &str) -> bool {
        matches!(self.kind(path), Ok(EntryKind::Directory))
    }

    fn is_file(&self, path: &str) -> bool {
        matches!(self.kind(path), Ok(EntryKind::File))
    }
}
