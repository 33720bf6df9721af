//! In-memory storage backend.
//!
//! The entire tree lives in a `BTreeMap<String, Node>` keyed by normalized
//! absolute paths, so listings come out sorted for free. Nothing is ever
//! deleted: the shell vocabulary has no `rm`.

use std::collections::BTreeMap;

use redshell_types::error::{Result, ShellError};

use crate::path::{self, RootEscape, normalize};
use crate::{Entry, EntryKind, Sandbox};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

/// A fully in-memory sandbox tree.
#[derive(Debug)]
pub struct MemoryFs {
    nodes: BTreeMap<String, Node>,
}

impl MemoryFs {
    /// Create a new tree holding only the root directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        Self { nodes }
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox for MemoryFs {
    fn escape_policy(&self) -> RootEscape {
        RootEscape::Clamp
    }

    fn exists(&self, path: &str) -> bool {
        let path = normalize(path);
        self.nodes.contains_key(path.as_ref())
    }

    fn kind(&self, path: &str) -> Result<EntryKind> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::File(_)) => Ok(EntryKind::File),
            Some(Node::Dir) => Ok(EntryKind::Directory),
            None => Err(ShellError::NotFound(path.into_owned())),
        }
    }

    fn list(&self, path: &str) -> Result<Vec<Entry>> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => {
                return Err(ShellError::NotADirectory(path.into_owned()));
            }
            None => {
                return Err(ShellError::NotFound(path.into_owned()));
            }
        }

        let prefix = if path.as_ref() == "/" {
            "/".to_string()
        } else {
            format!("{path}/")
        };

        // BTreeMap iteration is sorted by key; sorting by full path equals
        // sorting by name when the keys share a prefix.
        let mut entries = Vec::new();
        for (key, node) in self.nodes.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                break;
            }
            // Direct child only: non-empty name with no `/` after the prefix.
            let rest = &key[prefix.len()..];
            if !rest.is_empty() && !rest.contains('/') {
                entries.push(Entry {
                    name: rest.to_string(),
                    kind: match node {
                        Node::Dir => EntryKind::Directory,
                        Node::File(_) => EntryKind::File,
                    },
                    size: match node {
                        Node::File(data) => data.len() as u64,
                        Node::Dir => 0,
                    },
                });
            }
        }
        Ok(entries)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(Node::Dir) => Err(ShellError::IsADirectory(path.into_owned())),
            None => Err(ShellError::NotFound(path.into_owned())),
        }
    }

    fn write(&mut self, path: &str, data: &[u8], append: bool) -> Result<()> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::Dir) => {
                return Err(ShellError::IsADirectory(path.into_owned()));
            }
            Some(Node::File(_)) | None => {}
        }
        let parent = path::parent(&path);
        match self.nodes.get(parent) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => {
                return Err(ShellError::NotADirectory(parent.to_string()));
            }
            None => {
                return Err(ShellError::NotFound(parent.to_string()));
            }
        }
        if append {
            if let Some(Node::File(existing)) = self.nodes.get_mut(path.as_ref()) {
                existing.extend_from_slice(data);
                return Ok(());
            }
        }
        self.nodes
            .insert(path.into_owned(), Node::File(data.to_vec()));
        Ok(())
    }

    fn mkdir(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::Dir) => return Ok(()),
            Some(Node::File(_)) => {
                return Err(ShellError::NotADirectory(path.into_owned()));
            }
            None => {}
        }
        // Create missing parents first.
        let parent = path::parent(&path).to_string();
        if parent != path.as_ref() && !self.nodes.contains_key(&parent) {
            self.mkdir(&parent)?;
        }
        self.nodes.insert(path.into_owned(), Node::Dir);
        Ok(())
    }

    fn touch(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::Dir) => Err(ShellError::IsADirectory(path.into_owned())),
            Some(Node::File(_)) => Ok(()),
            None => self.write(&path, &[], false),
        }
    }

    fn display_path(&self, cwd: &str) -> String {
        if cwd == "/" {
            "~".to_string()
        } else {
            cwd.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_exists() {
        let fs = MemoryFs::new();
        assert!(fs.exists("/"));
        assert!(fs.is_dir("/"));
    }

    #[test]
    fn mkdir_and_list() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/home").unwrap();
        fs.mkdir("/home/user").unwrap();
        let entries = fs.list("/").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "home");
        assert_eq!(entries[0].kind, EntryKind::Directory);
    }

    #[test]
    fn write_and_read() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/tmp").unwrap();
        fs.write("/tmp/test.txt", b"hello world", false).unwrap();
        assert_eq!(fs.read("/tmp/test.txt").unwrap(), b"hello world");
    }

    #[test]
    fn overwrite_replaces() {
        let mut fs = MemoryFs::new();
        fs.write("/file", b"old", false).unwrap();
        fs.write("/file", b"new content", false).unwrap();
        assert_eq!(fs.read("/file").unwrap(), b"new content");
    }

    #[test]
    fn append_concatenates() {
        let mut fs = MemoryFs::new();
        fs.write("/log", b"one\n", false).unwrap();
        fs.write("/log", b"two\n", true).unwrap();
        assert_eq!(fs.read("/log").unwrap(), b"one\ntwo\n");
    }

    #[test]
    fn append_to_missing_creates() {
        let mut fs = MemoryFs::new();
        fs.write("/fresh", b"data", true).unwrap();
        assert_eq!(fs.read("/fresh").unwrap(), b"data");
    }

    #[test]
    fn write_without_parent_fails() {
        let mut fs = MemoryFs::new();
        let err = fs.write("/no/such/dir/file", b"x", false).unwrap_err();
        assert!(matches!(err, ShellError::NotFound(_)));
    }

    #[test]
    fn write_under_file_parent_fails() {
        let mut fs = MemoryFs::new();
        fs.write("/blob", b"x", false).unwrap();
        let err = fs.write("/blob/child", b"y", false).unwrap_err();
        assert!(matches!(err, ShellError::NotADirectory(_)));
    }

    #[test]
    fn write_to_dir_fails() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/dir").unwrap();
        let err = fs.write("/dir", b"data", false).unwrap_err();
        assert!(matches!(err, ShellError::IsADirectory(_)));
    }

    #[test]
    fn read_nonexistent_fails() {
        let fs = MemoryFs::new();
        assert!(matches!(fs.read("/nope"), Err(ShellError::NotFound(_))));
    }

    #[test]
    fn read_dir_fails() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/dir").unwrap();
        assert!(matches!(fs.read("/dir"), Err(ShellError::IsADirectory(_))));
    }

    #[test]
    fn list_on_file_fails() {
        let mut fs = MemoryFs::new();
        fs.write("/file", b"data", false).unwrap();
        assert!(matches!(fs.list("/file"), Err(ShellError::NotADirectory(_))));
    }

    #[test]
    fn list_missing_fails() {
        let fs = MemoryFs::new();
        assert!(matches!(fs.list("/ghost"), Err(ShellError::NotFound(_))));
    }

    #[test]
    fn mkdir_creates_parents() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/a/b/c").unwrap();
        assert!(fs.is_dir("/a"));
        assert!(fs.is_dir("/a/b"));
        assert!(fs.is_dir("/a/b/c"));
    }

    #[test]
    fn mkdir_existing_dir_is_ok() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/dir").unwrap();
        fs.mkdir("/dir").unwrap();
        assert!(fs.exists("/dir"));
    }

    #[test]
    fn mkdir_over_file_fails() {
        let mut fs = MemoryFs::new();
        fs.write("/taken", b"x", false).unwrap();
        assert!(fs.mkdir("/taken").is_err());
    }

    #[test]
    fn touch_creates_empty_file() {
        let mut fs = MemoryFs::new();
        fs.touch("/new.txt").unwrap();
        assert_eq!(fs.read("/new.txt").unwrap(), b"");
    }

    #[test]
    fn touch_existing_file_keeps_contents() {
        let mut fs = MemoryFs::new();
        fs.write("/keep.txt", b"payload", false).unwrap();
        fs.touch("/keep.txt").unwrap();
        assert_eq!(fs.read("/keep.txt").unwrap(), b"payload");
    }

    #[test]
    fn touch_directory_fails() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/dir").unwrap();
        assert!(matches!(fs.touch("/dir"), Err(ShellError::IsADirectory(_))));
    }

    #[test]
    fn list_only_direct_children() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/a/b/c").unwrap();
        fs.write("/a/file.txt", b"hi", false).unwrap();
        let names: Vec<String> = fs.list("/a").unwrap().into_iter().map(|e| e.name).collect();
        assert!(names.contains(&"b".to_string()));
        assert!(names.contains(&"file.txt".to_string()));
        assert!(!names.contains(&"c".to_string()));
    }

    #[test]
    fn list_is_sorted() {
        let mut fs = MemoryFs::new();
        for name in ["zeta", "alpha", "mid"] {
            fs.mkdir(&format!("/{name}")).unwrap();
        }
        let names: Vec<String> = fs.list("/").unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn entry_sizes() {
        let mut fs = MemoryFs::new();
        fs.write("/f.bin", &[1, 2, 3], false).unwrap();
        let entries = fs.list("/").unwrap();
        assert_eq!(entries[0].size, 3);
    }

    #[test]
    fn normalized_input_paths() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/dir/").unwrap();
        assert!(fs.exists("/dir"));
        fs.write("//dir//file", b"ok", false).unwrap();
        assert_eq!(fs.read("/dir/file").unwrap(), b"ok");
    }

    #[test]
    fn special_characters_in_filename() {
        let mut fs = MemoryFs::new();
        fs.write("/file with spaces.txt", b"ok", false).unwrap();
        assert_eq!(fs.read("/file with spaces.txt").unwrap(), b"ok");
    }

    #[test]
    fn display_path_home_and_absolute() {
        let fs = MemoryFs::new();
        assert_eq!(fs.display_path("/"), "~");
        assert_eq!(fs.display_path("/documents"), "/documents");
    }

    #[test]
    fn escape_policy_clamps() {
        let fs = MemoryFs::new();
        assert_eq!(fs.escape_policy(), RootEscape::Clamp);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn write_then_read_roundtrips(
                dir in "[a-z]{1,8}",
                file in "[a-z]{1,8}",
                data in proptest::collection::vec(any::<u8>(), 0..256),
            ) {
                let mut fs = MemoryFs::new();
                let dir_path = format!("/{dir}");
                fs.mkdir(&dir_path).unwrap();
                let file_path = format!("{dir_path}/{file}");
                fs.write(&file_path, &data, false).unwrap();
                prop_assert_eq!(fs.read(&file_path).unwrap(), data);
            }

            #[test]
            fn append_preserves_prefix(
                first in proptest::collection::vec(any::<u8>(), 0..64),
                second in proptest::collection::vec(any::<u8>(), 0..64),
            ) {
                let mut fs = MemoryFs::new();
                fs.write("/f", &first, false).unwrap();
                fs.write("/f", &second, true).unwrap();
                let mut expected = first.clone();
                expected.extend_from_slice(&second);
                prop_assert_eq!(fs.read("/f").unwrap(), expected);
            }

            #[test]
            fn mkdir_then_all_parents_exist(
                segs in proptest::collection::vec("[a-z]{1,6}", 1..5),
            ) {
                let mut fs = MemoryFs::new();
                let full = format!("/{}", segs.join("/"));
                fs.mkdir(&full).unwrap();
                let mut partial = String::new();
                for seg in &segs {
                    partial.push('/');
                    partial.push_str(seg);
                    prop_assert!(fs.is_dir(&partial), "missing parent: {partial}");
                }
            }
        }
    }
}
