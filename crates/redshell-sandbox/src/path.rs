//! Canonical path resolution and sandbox confinement.
//!
//! User-typed paths come in three shapes: absolute (`/os/etc`, `/challenge`),
//! relative (`../notes`, `docs/a.txt`), and home-relative (`~`, `~/docs`).
//! All of them resolve to a canonical virtual path rooted at the sandbox
//! root `/`. The resolver is purely lexical; existence checks belong to the
//! backend.

use std::borrow::Cow;

use redshell_types::error::{Result, ShellError};

/// The sandbox root as a canonical path.
pub const ROOT: &str = "/";

/// Case-insensitive alias prefix that maps onto the sandbox root, kept for
/// users typing `/OS/...` the way the training material shows it.
const ROOT_ALIAS: &str = "/os";

/// What happens when `..` tries to pop above the sandbox root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootEscape {
    /// Escaping is a confinement violation. The disk backend uses this:
    /// above `/` lies the host filesystem, and once a resolution has walked
    /// out it stays out (re-entry is not modeled; it fails closed).
    Deny,
    /// `..` at the root is a no-op, the way the in-memory tree behaves:
    /// there is nothing above the root node to walk into.
    Clamp,
}

/// Resolve a user-typed path against the current directory.
///
/// Returns the canonical path, or `PermissionDenied` when the resolution
/// escapes the sandbox root under [`RootEscape::Deny`]. Empty input
/// resolves to `cwd` unchanged.
pub fn resolve(input: &str, cwd: &str, policy: RootEscape) -> Result<String> {
    if input.is_empty() {
        return Ok(cwd.to_string());
    }

    let (mut stack, rest): (Vec<&str>, &str) = if input == "~" {
        (Vec::new(), "")
    } else if let Some(rest) = input.strip_prefix("~/") {
        (Vec::new(), rest)
    } else if input.starts_with('/') {
        match strip_root_alias(input) {
            Some(rest) => (Vec::new(), rest),
            None => (Vec::new(), &input[1..]),
        }
    } else {
        (segments(cwd).collect(), input)
    };

    for seg in rest.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if stack.pop().is_none() && policy == RootEscape::Deny {
                    log::debug!("confinement violation: '{input}' escapes the sandbox root");
                    return Err(ShellError::PermissionDenied(input.to_string()));
                }
            }
            other => stack.push(other),
        }
    }

    if stack.is_empty() {
        Ok(ROOT.to_string())
    } else {
        Ok(format!("/{}", stack.join("/")))
    }
}

/// Strip the `/os` alias prefix, case-insensitively. Returns the remainder
/// (without its leading slash) or `None` when the input is not aliased.
fn strip_root_alias(input: &str) -> Option<&str> {
    if input.len() < ROOT_ALIAS.len() {
        return None;
    }
    let (head, rest) = input.split_at(ROOT_ALIAS.len());
    if !head.eq_ignore_ascii_case(ROOT_ALIAS) {
        return None;
    }
    match rest.strip_prefix('/') {
        Some(tail) => Some(tail),
        None if rest.is_empty() => Some(""),
        None => None,
    }
}

/// Iterate the segments of a canonical path.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Return the parent of a normalized path.
pub fn parent(path: &str) -> &str {
    if path == ROOT {
        return ROOT;
    }
    match path.rfind('/') {
        Some(0) => ROOT,
        Some(i) => &path[..i],
        None => ROOT,
    }
}

/// Return the last segment of a canonical path (`""` for the root).
pub fn file_name(path: &str) -> &str {
    segments(path).last().unwrap_or("")
}

/// Join a canonical directory path with a child name.
pub fn join(dir: &str, name: &str) -> String {
    if dir == ROOT {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Check whether a path is already in normal form (starts with `/`, no
/// `//`, no trailing `/` unless root).
fn is_normalized(path: &str) -> bool {
    if !path.starts_with('/') {
        return false;
    }
    if path.len() > 1 && path.ends_with('/') {
        return false;
    }
    !path.contains("//")
}

/// Normalize a path: ensure leading `/`, collapse `//`, strip trailing `/`
/// (except for root). Returns the input unchanged (zero-alloc) when already
/// in normal form. Does not interpret `.`/`..`; that is [`resolve`]'s job.
pub fn normalize(path: &str) -> Cow<'_, str> {
    if is_normalized(path) {
        return Cow::Borrowed(path);
    }
    let path_str = if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    };
    let mut result = String::with_capacity(path_str.len());
    let mut prev_slash = false;
    for ch in path_str.chars() {
        if ch == '/' {
            if !prev_slash {
                result.push(ch);
            }
            prev_slash = true;
        } else {
            result.push(ch);
            prev_slash = false;
        }
    }
    if result.len() > 1 && result.ends_with('/') {
        result.pop();
    }
    Cow::Owned(result)
}
