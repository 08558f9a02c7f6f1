//! Pre-order walk primitives over the two kinds of search roots.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::entry::EntryOrigin;
use crate::spec::{EnumEntryKind, SpecFindError};
use crate::util::normalize_relative;
use crate::vfs::VirtualFs;

/// Instruction returned by the visitor for each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumWalkControl {
    Continue,
    /// Do not descend into the node just visited. Ignored for non-directories.
    SkipSubtree,
}

/// One visited node as produced by the walk primitive.
#[derive(Debug, Clone)]
pub struct SpecWalkNode {
    /// Path as walked.
    pub path: PathBuf,
    /// Root-relative path with `/` separators; empty for the root itself.
    pub path_relative: String,
    pub name: String,
    pub kind: EnumEntryKind,
}

/// Visitor callback. Per-node failures arrive as `Err` and cannot be pruned.
pub type TypeWalkVisitor<'a> =
    dyn FnMut(Result<SpecWalkNode, SpecFindError>) -> EnumWalkControl + 'a;

/// A search root that can be walked depth-first, pre-order.
///
/// The root node itself is yielded first with an empty relative path.
/// An `Err` return means the root could not be opened at all.
pub trait WalkRoot {
    fn walk(&self, visitor: &mut TypeWalkVisitor<'_>) -> Result<(), SpecFindError>;

    /// Where entries found under this root read their metadata from.
    fn origin(&self) -> EntryOrigin;

    fn describe(&self) -> String;
}

////////////////////////////////////////////////////////////////////////////////
// #region PhysicalRoot

/// Directory on the host filesystem, enumerated with `walkdir`.
#[derive(Debug, Clone)]
pub struct PhysicalRoot {
    path_root: PathBuf,
}

impl PhysicalRoot {
    pub fn new<P: AsRef<Path>>(path_root: P) -> Self {
        Self {
            path_root: path_root.as_ref().to_path_buf(),
        }
    }
}

impl WalkRoot for PhysicalRoot {
    fn walk(&self, visitor: &mut TypeWalkVisitor<'_>) -> Result<(), SpecFindError> {
        let mut iter_entries = WalkDir::new(&self.path_root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(res_entry) = iter_entries.next() {
            let entry = match res_entry {
                Ok(v) => v,
                Err(e) => {
                    if e.depth() == 0 {
                        return Err(SpecFindError {
                            path: self.path_root.clone(),
                            exception: e.to_string(),
                        });
                    }
                    let path_err = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.path_root.clone());
                    visitor(Err(SpecFindError {
                        path: path_err,
                        exception: e.to_string(),
                    }));
                    continue;
                }
            };

            let path_relative = entry
                .path()
                .strip_prefix(&self.path_root)
                .map(normalize_relative)
                .unwrap_or_default();
            let cfg_file_type = entry.file_type();
            let spec_node = SpecWalkNode {
                path: entry.path().to_path_buf(),
                name: entry.file_name().to_string_lossy().into_owned(),
                path_relative,
                kind: EnumEntryKind::from_file_type(cfg_file_type),
            };

            if visitor(Ok(spec_node)) == EnumWalkControl::SkipSubtree && cfg_file_type.is_dir() {
                iter_entries.skip_current_dir();
            }
        }
        Ok(())
    }

    fn origin(&self) -> EntryOrigin {
        EntryOrigin::Physical
    }

    fn describe(&self) -> String {
        self.path_root.display().to_string()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region VirtualRoot

/// Abstract filesystem, always walked from its synthetic `"."` root.
#[derive(Debug, Clone)]
pub struct VirtualRoot {
    vfs: Arc<dyn VirtualFs>,
}

impl VirtualRoot {
    pub fn new(vfs: Arc<dyn VirtualFs>) -> Self {
        Self { vfs }
    }

    fn list_children(
        &self,
        path_relative: &str,
    ) -> Result<Vec<SpecWalkNode>, SpecFindError> {
        let path_dir = if path_relative.is_empty() { "." } else { path_relative };
        let l_children = self.vfs.read_dir(path_dir).map_err(|e| SpecFindError {
            path: PathBuf::from(path_dir),
            exception: e.to_string(),
        })?;

        Ok(l_children
            .into_iter()
            .map(|child| {
                let path_child = if path_relative.is_empty() {
                    child.name.clone()
                } else {
                    format!("{path_relative}/{}", child.name)
                };
                SpecWalkNode {
                    path: PathBuf::from(&path_child),
                    path_relative: path_child,
                    name: child.name,
                    kind: child.kind,
                }
            })
            .collect())
    }
}

impl WalkRoot for VirtualRoot {
    fn walk(&self, visitor: &mut TypeWalkVisitor<'_>) -> Result<(), SpecFindError> {
        let info_root = self.vfs.stat(".").map_err(|e| SpecFindError {
            path: PathBuf::from("."),
            exception: e.to_string(),
        })?;

        let spec_node_root = SpecWalkNode {
            path: PathBuf::from("."),
            path_relative: String::new(),
            name: ".".to_string(),
            kind: info_root.kind,
        };
        if visitor(Ok(spec_node_root)) == EnumWalkControl::SkipSubtree || !info_root.kind.is_dir()
        {
            return Ok(());
        }

        let mut l_stack = self.list_children("")?;
        l_stack.reverse();

        while let Some(spec_node) = l_stack.pop() {
            let b_is_dir = spec_node.kind.is_dir();
            let path_relative = spec_node.path_relative.clone();
            let enum_control = visitor(Ok(spec_node));
            if !b_is_dir || enum_control == EnumWalkControl::SkipSubtree {
                continue;
            }
            match self.list_children(&path_relative) {
                Ok(mut l_children) => {
                    l_children.reverse();
                    l_stack.extend(l_children);
                }
                Err(e) => {
                    visitor(Err(e));
                }
            }
        }
        Ok(())
    }

    fn origin(&self) -> EntryOrigin {
        EntryOrigin::Virtual(Arc::clone(&self.vfs))
    }

    fn describe(&self) -> String {
        "<virtual>".to_string()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{EnumWalkControl, PhysicalRoot, VirtualRoot, WalkRoot};
    use crate::vfs::MemoryFs;

    fn collect(root: &dyn WalkRoot, skip: &str) -> (Vec<String>, Vec<String>) {
        let mut l_visited = Vec::new();
        let mut l_errors = Vec::new();
        root.walk(&mut |res_node| match res_node {
            Ok(node) => {
                let b_skip = node.path_relative == skip;
                l_visited.push(node.path_relative);
                if b_skip {
                    EnumWalkControl::SkipSubtree
                } else {
                    EnumWalkControl::Continue
                }
            }
            Err(e) => {
                l_errors.push(e.path.display().to_string());
                EnumWalkControl::Continue
            }
        })
        .expect("walk");
        (l_visited, l_errors)
    }

    #[test]
    fn virtual_root_is_pre_order_and_skips_subtrees() {
        let mut vfs = MemoryFs::new();
        vfs.insert_file("a.txt", b"a")
            .insert_file("dir-a/x.txt", b"x")
            .insert_file("dir-a/subdir-a/README", b"r")
            .insert_file("dir-a/subdir-b/README", b"r");
        let root = VirtualRoot::new(Arc::new(vfs));

        let (l_visited, l_errors) = collect(&root, "dir-a/subdir-a");
        assert_eq!(
            l_visited,
            vec![
                "",
                "a.txt",
                "dir-a",
                "dir-a/subdir-a",
                "dir-a/subdir-b",
                "dir-a/subdir-b/README",
                "dir-a/x.txt",
            ]
        );
        assert!(l_errors.is_empty());
    }

    #[test]
    fn virtual_root_reports_unreadable_dir_and_continues() {
        let mut vfs = MemoryFs::new();
        vfs.insert_unreadable_dir("locked").insert_file("z.txt", b"z");
        let root = VirtualRoot::new(Arc::new(vfs));

        let (l_visited, l_errors) = collect(&root, "none");
        assert_eq!(l_visited, vec!["", "locked", "z.txt"]);
        assert_eq!(l_errors, vec!["locked"]);
    }

    #[test]
    fn physical_root_missing_is_root_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = PhysicalRoot::new(tmp.path().join("missing"));
        let res = root.walk(&mut |_| EnumWalkControl::Continue);
        assert!(res.is_err());
    }

    #[test]
    fn physical_root_skip_subtree() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("keep/inner")).expect("mkdir");
        std::fs::create_dir_all(tmp.path().join("skip/inner")).expect("mkdir");
        std::fs::write(tmp.path().join("skip/inner/f.txt"), "f").expect("write");
        let root = PhysicalRoot::new(tmp.path());

        let (l_visited, l_errors) = collect(&root, "skip");
        assert_eq!(l_visited, vec!["", "keep", "keep/inner", "skip"]);
        assert!(l_errors.is_empty());
    }
}
