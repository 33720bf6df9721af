//! Disk storage backend.
//!
//! Canonical virtual paths map onto `root.join(relative)`; everything else
//! delegates to `std::fs`. The resolver's `Deny` escape policy is what
//! keeps operations inside `root` -- by the time a path reaches this
//! backend it contains no `.`/`..` segments, so the join cannot climb out.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use redshell_types::error::{Result, ShellError};

use crate::path::{RootEscape, normalize};
use crate::{Entry, EntryKind, Sandbox};

/// A sandbox rooted at a real directory.
#[derive(Debug)]
pub struct DiskFs {
    root: PathBuf,
}

impl DiskFs {
    /// Open a sandbox at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.exists() && !root.is_dir() {
            return Err(ShellError::Config(format!(
                "sandbox root {} exists but is not a directory",
                root.display()
            )));
        }
        fs::create_dir_all(&root)?;
        log::debug!("disk sandbox rooted at {}", root.display());
        Ok(Self { root })
    }

    /// The real directory backing the sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn real(&self, path: &str) -> PathBuf {
        let path = normalize(path);
        self.root.join(path.trim_start_matches('/'))
    }
}

fn map_io(err: io::Error, target: &str) -> ShellError {
    match err.kind() {
        io::ErrorKind::NotFound => ShellError::NotFound(target.to_string()),
        io::ErrorKind::PermissionDenied => ShellError::PermissionDenied(target.to_string()),
        _ => ShellError::Io(err),
    }
}

impl Sandbox for DiskFs {
    fn escape_policy(&self) -> RootEscape {
        RootEscape::Deny
    }

    fn exists(&self, path: &str) -> bool {
        self.real(path).exists()
    }

    fn kind(&self, path: &str) -> Result<EntryKind> {
        let meta = fs::metadata(self.real(path)).map_err(|e| map_io(e, path))?;
        if meta.is_dir() {
            Ok(EntryKind::Directory)
        } else {
            Ok(EntryKind::File)
        }
    }

    fn list(&self, path: &str) -> Result<Vec<Entry>> {
        let real = self.real(path);
        let meta = fs::metadata(&real).map_err(|e| map_io(e, path))?;
        if !meta.is_dir() {
            return Err(ShellError::NotADirectory(path.to_string()));
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&real).map_err(|e| map_io(e, path))? {
            let entry = entry.map_err(|e| map_io(e, path))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let meta = entry.metadata().map_err(|e| map_io(e, path))?;
            entries.push(Entry {
                kind: if meta.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
                size: meta.len(),
                name,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        if self.is_dir(path) {
            return Err(ShellError::IsADirectory(path.to_string()));
        }
        fs::read(self.real(path)).map_err(|e| map_io(e, path))
    }

    fn write(&mut self, path: &str, data: &[u8], append: bool) -> Result<()> {
        let real = self.real(path);
        if real.is_dir() {
            return Err(ShellError::IsADirectory(path.to_string()));
        }
        if append {
            use std::io::Write;
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&real)
                .map_err(|e| map_io(e, path))?;
            file.write_all(data).map_err(|e| map_io(e, path))?;
            Ok(())
        } else {
            fs::write(&real, data).map_err(|e| map_io(e, path))
        }
    }

    fn mkdir(&mut self, path: &str) -> Result<()> {
        let real = self.real(path);
        if real.is_file() {
            return Err(ShellError::NotADirectory(path.to_string()));
        }
        fs::create_dir_all(&real).map_err(|e| map_io(e, path))
    }

    fn touch(&mut self, path: &str) -> Result<()> {
        let real = self.real(path);
        if real.is_dir() {
            return Err(ShellError::IsADirectory(path.to_string()));
        }
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&real)
            .map_err(|e| map_io(e, path))?;
        Ok(())
    }

    fn display_path(&self, cwd: &str) -> String {
        if cwd == "/" {
            "~".to_string()
        } else {
            format!("~{cwd}")
        }
    }
}
