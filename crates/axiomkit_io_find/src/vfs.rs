//! Abstract filesystem roots.
//!
//! Paths handed to a [`VirtualFs`] are `/`-separated and relative to its
//! root; `"."` (or `""`) names the root itself.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::time::SystemTime;

use filetime::FileTime;

use crate::entry::SpecEntryInfo;
use crate::spec::EnumEntryKind;

/// A single child returned by [`VirtualFs::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecVfsDirEntry {
    pub name: String,
    pub kind: EnumEntryKind,
}

/// Minimal read-only filesystem capability a search can be rooted at.
pub trait VirtualFs: Send + Sync + fmt::Debug {
    /// List the children of a directory.
    fn read_dir(&self, path: &str) -> io::Result<Vec<SpecVfsDirEntry>>;

    /// Metadata of `path` itself; a symlink reports [`EnumEntryKind::Symlink`].
    fn stat(&self, path: &str) -> io::Result<SpecEntryInfo>;

    /// Target of a symlink. Filesystems without links keep the default.
    fn read_link(&self, path: &str) -> io::Result<String> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("symlinks are not supported: {path}"),
        ))
    }
}

#[derive(Debug, Clone)]
enum TypeMemoryNode {
    Directory { modified: FileTime, if_readable: bool },
    File { len: u64, modified: FileTime },
    Symlink { target: String },
}

/// In-memory filesystem. Listing order is lexical by name.
#[derive(Debug, Clone)]
pub struct MemoryFs {
    nodes: BTreeMap<String, TypeMemoryNode>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            String::new(),
            TypeMemoryNode::Directory {
                modified: FileTime::from_system_time(SystemTime::now()),
                if_readable: true,
            },
        );
        Self { nodes }
    }

    /// Normalize: drop empty and `.` segments, resolve `..`, no leading `/`.
    fn normalize(path: &str) -> String {
        let mut l_parts: Vec<&str> = Vec::new();
        for part in path.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    l_parts.pop();
                }
                _ => l_parts.push(part),
            }
        }
        l_parts.join("/")
    }

    fn ensure_parents(&mut self, path: &str) {
        let mut path_cursor = String::new();
        let Some((path_parent, _)) = path.rsplit_once('/') else {
            return;
        };
        for part in path_parent.split('/') {
            if !path_cursor.is_empty() {
                path_cursor.push('/');
            }
            path_cursor.push_str(part);
            self.nodes
                .entry(path_cursor.clone())
                .or_insert(TypeMemoryNode::Directory {
                    modified: FileTime::from_system_time(SystemTime::now()),
                    if_readable: true,
                });
        }
    }

    fn insert(&mut self, path: &str, node: TypeMemoryNode) -> &mut Self {
        let path_norm = Self::normalize(path);
        self.ensure_parents(&path_norm);
        self.nodes.insert(path_norm, node);
        self
    }

    /// Add a directory (and any missing parents).
    pub fn insert_dir(&mut self, path: &str) -> &mut Self {
        let modified = FileTime::from_system_time(SystemTime::now());
        self.insert(
            path,
            TypeMemoryNode::Directory {
                modified,
                if_readable: true,
            },
        )
    }

    /// Add a directory whose listing fails with `PermissionDenied`.
    pub fn insert_unreadable_dir(&mut self, path: &str) -> &mut Self {
        let modified = FileTime::from_system_time(SystemTime::now());
        self.insert(
            path,
            TypeMemoryNode::Directory {
                modified,
                if_readable: false,
            },
        )
    }

    /// Add a file; only its length is kept.
    pub fn insert_file(&mut self, path: &str, data: &[u8]) -> &mut Self {
        let modified = FileTime::from_system_time(SystemTime::now());
        self.insert(
            path,
            TypeMemoryNode::File {
                len: data.len() as u64,
                modified,
            },
        )
    }

    /// Add a symlink. Relative targets resolve against the link's directory.
    pub fn insert_symlink(&mut self, path: &str, target: &str) -> &mut Self {
        self.insert(
            path,
            TypeMemoryNode::Symlink {
                target: target.to_string(),
            },
        )
    }

    fn lookup(&self, path: &str) -> io::Result<(String, &TypeMemoryNode)> {
        let path_norm = Self::normalize(path);
        match self.nodes.get(&path_norm) {
            Some(node) => Ok((path_norm, node)),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not found: {path}"),
            )),
        }
    }
}

impl VirtualFs for MemoryFs {
    fn read_dir(&self, path: &str) -> io::Result<Vec<SpecVfsDirEntry>> {
        let (path_norm, node) = self.lookup(path)?;
        match node {
            TypeMemoryNode::Directory {
                if_readable: true, ..
            } => {}
            TypeMemoryNode::Directory {
                if_readable: false, ..
            } => {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("permission denied: {path}"),
                ));
            }
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("not a directory: {path}"),
                ));
            }
        }

        let mut l_entries = Vec::new();
        for (path_node, node_child) in &self.nodes {
            if path_node.is_empty() {
                continue;
            }
            let (path_parent, name) = path_node
                .rsplit_once('/')
                .unwrap_or(("", path_node.as_str()));
            if path_parent != path_norm {
                continue;
            }
            let kind = match node_child {
                TypeMemoryNode::Directory { .. } => EnumEntryKind::Directory,
                TypeMemoryNode::File { .. } => EnumEntryKind::File,
                TypeMemoryNode::Symlink { .. } => EnumEntryKind::Symlink,
            };
            l_entries.push(SpecVfsDirEntry {
                name: name.to_string(),
                kind,
            });
        }
        l_entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(l_entries)
    }

    fn stat(&self, path: &str) -> io::Result<SpecEntryInfo> {
        let (_, node) = self.lookup(path)?;
        let info = match node {
            TypeMemoryNode::Directory { modified, .. } => SpecEntryInfo {
                kind: EnumEntryKind::Directory,
                len: 0,
                modified: *modified,
                accessed: *modified,
                readonly: true,
            },
            TypeMemoryNode::File { len, modified } => SpecEntryInfo {
                kind: EnumEntryKind::File,
                len: *len,
                modified: *modified,
                accessed: *modified,
                readonly: true,
            },
            TypeMemoryNode::Symlink { target } => {
                let modified = FileTime::zero();
                SpecEntryInfo {
                    kind: EnumEntryKind::Symlink,
                    len: target.len() as u64,
                    modified,
                    accessed: modified,
                    readonly: true,
                }
            }
        };
        Ok(info)
    }

    fn read_link(&self, path: &str) -> io::Result<String> {
        match self.lookup(path)? {
            (_, TypeMemoryNode::Symlink { target }) => Ok(target.clone()),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a symlink: {path}"),
            )),
        }
    }
}
