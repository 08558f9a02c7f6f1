use std::io;
use std::path::{Component, Path};

use globset::{Glob, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::entry::{EntryOrigin, SpecEntryInfo};
use crate::spec::EnumIgnoreMask;

/// Upper bound on links followed while resolving one symlink chain.
pub const MAX_SYMLINK_HOPS: usize = 32;

/// Directory names pruned when [`EnumIgnoreMask::VcsFiles`] is set.
pub const VCS_DIR_NAMES: [&str; 9] = [
    ".svn",
    "_svn",
    "CVS",
    "_darcs",
    ".arch-params",
    ".monotone",
    ".bzr",
    ".git",
    ".hg",
];

////////////////////////////////////////////////////////////////////////////////
// #region IgnoreRules

/// Name/path rules evaluated first in the pipeline, derived from the
/// ignore mask and the excluded directory list.
#[derive(Debug, Clone)]
pub(crate) struct SpecIgnoreMatcher {
    set_vcs_dirs: Option<GlobSet>,
    glob_dot: Option<GlobMatcher>,
    l_dirs_excluded: Vec<String>,
}

impl SpecIgnoreMatcher {
    pub(crate) fn from_mask(mask_ignore: u8, dirs_excluded: &[String]) -> Self {
        let set_vcs_dirs = if mask_ignore & EnumIgnoreMask::VcsFiles.bit() != 0 {
            let mut builder_glob_set = GlobSetBuilder::new();
            for name in VCS_DIR_NAMES {
                if let Ok(glob) = Glob::new(&globset::escape(name)) {
                    builder_glob_set.add(glob);
                }
            }
            builder_glob_set.build().ok()
        } else {
            None
        };
        let glob_dot = if mask_ignore & EnumIgnoreMask::DotFiles.bit() != 0 {
            Glob::new(".*").ok().map(|glob| glob.compile_matcher())
        } else {
            None
        };

        Self {
            set_vcs_dirs,
            glob_dot,
            l_dirs_excluded: dirs_excluded
                .iter()
                .map(|d| normalize_relative_str(d))
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// True if a directory and its whole subtree must be skipped.
    pub(crate) fn is_pruned_dir(&self, name: &str, path_relative: &str) -> bool {
        self.set_vcs_dirs
            .as_ref()
            .is_some_and(|set| set.is_match(name))
            || self.is_dot_name(name)
            || self.l_dirs_excluded.iter().any(|d| d == path_relative)
    }

    /// True if a non-directory is hidden by the ignore mask.
    pub(crate) fn is_ignored_file(&self, name: &str) -> bool {
        self.is_dot_name(name)
    }

    fn is_dot_name(&self, name: &str) -> bool {
        self.glob_dot.as_ref().is_some_and(|g| g.is_match(name))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Join the normal components of `path` with `/`.
pub(crate) fn normalize_relative(path: &Path) -> String {
    let mut c_out = String::new();
    for component in path.components() {
        if let Component::Normal(part) = component {
            if !c_out.is_empty() {
                c_out.push('/');
            }
            c_out.push_str(&part.to_string_lossy());
        }
    }
    c_out
}

fn normalize_relative_str(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a `/`-normalized relative path into its directory part (with a
/// trailing `/`, empty at the top level) and the bare name.
pub(crate) fn split_relative(path_relative: &str) -> (&str, &str) {
    match path_relative.rfind('/') {
        Some(n_idx) => (&path_relative[..=n_idx], &path_relative[n_idx + 1..]),
        None => ("", path_relative),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Symlinks

/// Follow a chain of symlinks starting at `path_link` and return the
/// metadata of the first non-link target.
///
/// Relative targets are resolved against the directory holding the link.
/// Dangling links, unreadable links and chains longer than
/// [`MAX_SYMLINK_HOPS`] are errors.
pub(crate) fn resolve_symlink_chain(
    origin: &EntryOrigin,
    path_link: &Path,
) -> io::Result<SpecEntryInfo> {
    let mut path_cursor = path_link.to_path_buf();
    for _ in 0..MAX_SYMLINK_HOPS {
        let path_target = origin.read_link(&path_cursor)?;
        let path_next = if path_target.is_absolute() {
            path_target
        } else {
            path_cursor
                .parent()
                .map(|p| p.join(&path_target))
                .unwrap_or(path_target)
        };
        let info_next = origin.stat(&path_next)?;
        if !info_next.kind.is_symlink() {
            return Ok(info_next);
        }
        path_cursor = path_next;
    }
    Err(io::Error::other(format!(
        "symlink chain exceeds {MAX_SYMLINK_HOPS} hops: {}",
        path_link.display()
    )))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use super::{
        SpecIgnoreMatcher, normalize_relative, resolve_symlink_chain, split_relative,
    };
    use crate::entry::EntryOrigin;
    use crate::spec::{EnumEntryKind, EnumIgnoreMask};
    use crate::vfs::MemoryFs;

    #[test]
    fn split_relative_keeps_trailing_separator() {
        assert_eq!(split_relative("a.txt"), ("", "a.txt"));
        assert_eq!(split_relative("dir-a/x.txt"), ("dir-a/", "x.txt"));
        assert_eq!(
            split_relative("dir-a/subdir-a/README"),
            ("dir-a/subdir-a/", "README")
        );
    }

    #[test]
    fn normalize_relative_drops_cur_dir() {
        assert_eq!(normalize_relative(Path::new("./dir-a/x.txt")), "dir-a/x.txt");
        assert_eq!(normalize_relative(Path::new("")), "");
    }

    #[test]
    fn ignore_matcher_respects_mask() {
        let mask_all = EnumIgnoreMask::VcsFiles.bit() | EnumIgnoreMask::DotFiles.bit();
        let matcher = SpecIgnoreMatcher::from_mask(mask_all, &["./build/out/".to_string()]);
        assert!(matcher.is_pruned_dir(".git", "src/.git"));
        assert!(matcher.is_pruned_dir("CVS", "CVS"));
        assert!(matcher.is_pruned_dir(".cache", ".cache"));
        assert!(matcher.is_pruned_dir("out", "build/out"));
        assert!(!matcher.is_pruned_dir("out", "out"));
        assert!(matcher.is_ignored_file(".hidden"));
        assert!(!matcher.is_ignored_file("visible"));

        let matcher_vcs = SpecIgnoreMatcher::from_mask(EnumIgnoreMask::VcsFiles.bit(), &[]);
        assert!(matcher_vcs.is_pruned_dir(".hg", ".hg"));
        assert!(!matcher_vcs.is_pruned_dir(".gitx", ".gitx"));
        assert!(!matcher_vcs.is_ignored_file(".hidden"));

        let matcher_none = SpecIgnoreMatcher::from_mask(0, &[]);
        assert!(!matcher_none.is_pruned_dir(".git", ".git"));
    }

    #[test]
    fn symlink_chain_resolves_to_final_target() {
        let mut vfs = MemoryFs::new();
        vfs.insert_dir("real")
            .insert_symlink("hop2", "real")
            .insert_symlink("links/hop1", "../hop2");
        let origin = EntryOrigin::Virtual(Arc::new(vfs));

        let info = resolve_symlink_chain(&origin, Path::new("links/hop1")).expect("resolve");
        assert_eq!(info.kind, EnumEntryKind::Directory);
    }

    #[test]
    fn symlink_cycle_and_dangling_are_errors() {
        let mut vfs = MemoryFs::new();
        vfs.insert_symlink("a", "b")
            .insert_symlink("b", "a")
            .insert_symlink("dangling", "nowhere");
        let origin = EntryOrigin::Virtual(Arc::new(vfs));

        let err = resolve_symlink_chain(&origin, Path::new("a")).expect_err("cycle");
        assert!(err.to_string().contains("exceeds"));
        let err = resolve_symlink_chain(&origin, Path::new("dangling")).expect_err("dangling");
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
