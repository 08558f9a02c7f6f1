//! Matched entry value and on-demand metadata.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use filetime::FileTime;

use crate::spec::EnumEntryKind;
use crate::util::resolve_symlink_chain;
use crate::vfs::VirtualFs;

/// Extended metadata, fetched from the filesystem on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecEntryInfo {
    pub kind: EnumEntryKind,
    /// Size in bytes.
    pub len: u64,
    pub modified: FileTime,
    pub accessed: FileTime,
    pub readonly: bool,
}

impl SpecEntryInfo {
    pub(crate) fn from_metadata(meta: &fs::Metadata) -> Self {
        Self {
            kind: EnumEntryKind::from_file_type(meta.file_type()),
            len: meta.len(),
            modified: FileTime::from_last_modification_time(meta),
            accessed: FileTime::from_last_access_time(meta),
            readonly: meta.permissions().readonly(),
        }
    }
}

/// Filesystem an entry was found on.
#[derive(Clone)]
pub enum EntryOrigin {
    /// The host filesystem.
    Physical,
    /// An abstract filesystem; paths are `/`-separated and relative to its root.
    Virtual(Arc<dyn VirtualFs>),
}

impl EntryOrigin {
    /// Metadata of `path` itself, without following a final symlink.
    pub(crate) fn stat(&self, path: &Path) -> io::Result<SpecEntryInfo> {
        match self {
            Self::Physical => {
                fs::symlink_metadata(path).map(|meta| SpecEntryInfo::from_metadata(&meta))
            }
            Self::Virtual(vfs) => vfs.stat(&vfs_path(path)),
        }
    }

    pub(crate) fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        match self {
            Self::Physical => fs::read_link(path),
            Self::Virtual(vfs) => vfs.read_link(&vfs_path(path)).map(PathBuf::from),
        }
    }
}

impl fmt::Debug for EntryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Physical => write!(f, "Physical"),
            Self::Virtual(vfs) => f.debug_tuple("Virtual").field(vfs).finish(),
        }
    }
}

fn vfs_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// One matched filesystem node.
///
/// Holds no reference to traversal state and stays valid after the search
/// returns. `info()` goes back to the filesystem each time it is called.
#[derive(Debug, Clone)]
pub struct Entry {
    pub(crate) path: PathBuf,
    pub(crate) path_relative: String,
    pub(crate) name: String,
    pub(crate) depth: usize,
    pub(crate) kind: EnumEntryKind,
    pub(crate) if_followed: bool,
    pub(crate) origin: EntryOrigin,
}

impl Entry {
    /// Path as walked: the search root joined with the relative path for
    /// directory roots, the relative path itself for abstract filesystems.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Root-relative path with `/` separators.
    pub fn relative_path(&self) -> &str {
        &self.path_relative
    }

    /// Bare file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 0 for direct children of a search root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Kind of the node; for followed symlinks, the kind of the final target.
    pub fn kind(&self) -> EnumEntryKind {
        self.kind
    }

    pub fn origin(&self) -> &EntryOrigin {
        &self.origin
    }

    /// Fetch size/timestamps. Followed symlinks report their target.
    pub fn info(&self) -> io::Result<SpecEntryInfo> {
        if self.if_followed {
            return resolve_symlink_chain(&self.origin, &self.path);
        }
        self.origin.stat(&self.path)
    }

    /// Extended attribute names (Linux, host filesystem only).
    pub fn xattr_names(&self) -> io::Result<Vec<String>> {
        #[cfg(target_os = "linux")]
        {
            if let EntryOrigin::Physical = self.origin {
                let iter_xattr_names = if self.if_followed {
                    xattr::list_deref(&self.path)?
                } else {
                    xattr::list(&self.path)?
                };
                return Ok(iter_xattr_names
                    .map(|name| name.to_string_lossy().into_owned())
                    .collect());
            }
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Entry, EntryOrigin};
    use crate::finder::SpecFinder;
    use crate::spec::EnumEntryKind;
    use crate::vfs::MemoryFs;

    #[test]
    fn entry_info_is_fetched_from_origin() {
        let mut vfs = MemoryFs::new();
        vfs.insert_file("docs/readme.md", b"hello");
        let entry = Entry {
            path: "docs/readme.md".into(),
            path_relative: "docs/readme.md".to_string(),
            name: "readme.md".to_string(),
            depth: 1,
            kind: EnumEntryKind::File,
            if_followed: false,
            origin: EntryOrigin::Virtual(Arc::new(vfs)),
        };

        let info = entry.info().expect("info");
        assert_eq!(info.kind, EnumEntryKind::File);
        assert_eq!(info.len, 5);
        assert!(!entry.is_dir());
        assert!(entry.xattr_names().expect("xattrs").is_empty());
    }

    #[test]
    fn entry_info_reports_missing_node() {
        let entry = Entry {
            path: "gone.txt".into(),
            path_relative: "gone.txt".to_string(),
            name: "gone.txt".to_string(),
            depth: 0,
            kind: EnumEntryKind::File,
            if_followed: false,
            origin: EntryOrigin::Virtual(Arc::new(MemoryFs::new())),
        };

        let err = entry.info().expect_err("must fail");
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn xattr_names_on_disk_entries() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("meta.txt");
        std::fs::write(&path_file, "meta").expect("write file");
        symlink("meta.txt", tmp.path().join("link.txt")).expect("symlink");

        let c_xattr_name = "user.axiomkit_find_test";
        let b_if_has_xattr = xattr::set(&path_file, c_xattr_name, b"meta_value").is_ok();
        if !b_if_has_xattr {
            return;
        }

        let entries = SpecFinder::new()
            .in_dirs(&[tmp.path()])
            .name("meta.txt")
            .find();
        assert_eq!(entries.len(), 1);
        let l_names = entries[0].xattr_names().expect("list xattrs");
        assert!(l_names.iter().any(|name| name == c_xattr_name));

        let entries_followed = SpecFinder::new()
            .in_dirs(&[tmp.path()])
            .name("link.txt")
            .follow_symlinks()
            .find();
        assert_eq!(entries_followed.len(), 1);
        assert_eq!(entries_followed[0].kind(), EnumEntryKind::File);
        let l_names = entries_followed[0].xattr_names().expect("list target xattrs");
        assert!(l_names.iter().any(|name| name == c_xattr_name));

        let entries_link = SpecFinder::new()
            .in_dirs(&[tmp.path()])
            .name("link.txt")
            .find();
        assert_eq!(entries_link.len(), 1);
        assert_eq!(entries_link[0].kind(), EnumEntryKind::Symlink);
        let l_names = entries_link[0].xattr_names().expect("list link xattrs");
        assert!(!l_names.iter().any(|name| name == c_xattr_name));
    }
}
