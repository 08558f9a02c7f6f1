//! Search configuration.
//!
//! Every builder method takes `&self` and returns a modified copy, so a
//! partially built finder can be reused as the base of several searches.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;

use crate::entry::Entry;
use crate::find::{find, find_with_report};
use crate::glob::GlobPredicate;
use crate::report::ReportFind;
use crate::spec::{EnumFindFileType, EnumIgnoreMask};
use crate::vfs::VirtualFs;

/// One fully specified search intent.
#[derive(Debug, Clone)]
pub struct SpecFinder {
    /// Anchored globs, any of which a non-directory name must match.
    pub(crate) patterns_name: Vec<GlobPredicate>,
    /// Regexes evaluated together with `patterns_name`.
    pub(crate) regexes_name: Vec<Regex>,
    pub(crate) patterns_not_name: Vec<GlobPredicate>,
    /// Unanchored globs over the `/`-normalized relative path.
    pub(crate) patterns_path: Vec<GlobPredicate>,
    pub(crate) patterns_not_path: Vec<GlobPredicate>,
    pub(crate) rule_file_type: EnumFindFileType,
    /// Relative directory paths whose subtrees are pruned.
    pub(crate) dirs_excluded: Vec<String>,
    pub(crate) dirs_root: Vec<PathBuf>,
    pub(crate) fs_roots: Vec<Arc<dyn VirtualFs>>,
    pub(crate) mask_ignore: u8,
    pub(crate) depth_min: Option<usize>,
    pub(crate) depth_max: Option<usize>,
    pub(crate) if_follow_symlinks: bool,
}

impl Default for SpecFinder {
    fn default() -> Self {
        Self {
            patterns_name: Vec::new(),
            regexes_name: Vec::new(),
            patterns_not_name: Vec::new(),
            patterns_path: Vec::new(),
            patterns_not_path: Vec::new(),
            rule_file_type: EnumFindFileType::Any,
            dirs_excluded: Vec::new(),
            dirs_root: Vec::new(),
            fs_roots: Vec::new(),
            mask_ignore: EnumIgnoreMask::DotFiles.bit() | EnumIgnoreMask::VcsFiles.bit(),
            depth_min: None,
            depth_max: None,
            if_follow_symlinks: false,
        }
    }
}

impl SpecFinder {
    /// Empty search: no roots, dot-files and VCS directories ignored,
    /// unbounded depth.
    pub fn new() -> Self {
        Self::default()
    }

    fn derive(&self, apply: impl FnOnce(&mut Self)) -> Self {
        let mut spec_finder = self.clone();
        apply(&mut spec_finder);
        spec_finder
    }

    /// Add a name glob. Multiple calls are or-ed: a file must match any.
    ///
    /// - `*.txt` matches `file.txt`
    /// - `README.*` matches `README.txt` and `README.md`
    /// - `?.x` matches `a.x`, `b.x`, ...
    pub fn name(&self, pattern: &str) -> Self {
        let glob = GlobPredicate::compile(pattern, true);
        self.derive(|f| f.patterns_name.push(glob))
    }

    /// Add a compiled regex to the name-include set.
    pub fn name_regex(&self, regex: Regex) -> Self {
        self.derive(|f| f.regexes_name.push(regex))
    }

    /// Reject entries whose bare name matches `pattern`.
    pub fn not_name(&self, pattern: &str) -> Self {
        let glob = GlobPredicate::compile(pattern, true);
        self.derive(|f| f.patterns_not_name.push(glob))
    }

    /// Require the relative path to contain a match of any of `patterns`.
    pub fn path<S: AsRef<str>>(&self, patterns: &[S]) -> Self {
        let l_globs = _compile_unanchored(patterns);
        self.derive(|f| f.patterns_path.extend(l_globs))
    }

    /// Reject entries whose relative path contains a match of any of `patterns`.
    pub fn not_path<S: AsRef<str>>(&self, patterns: &[S]) -> Self {
        let l_globs = _compile_unanchored(patterns);
        self.derive(|f| f.patterns_not_path.extend(l_globs))
    }

    /// Only report regular files.
    pub fn files(&self) -> Self {
        self.derive(|f| f.rule_file_type = EnumFindFileType::File)
    }

    /// Only report directories.
    pub fn directories(&self) -> Self {
        self.derive(|f| f.rule_file_type = EnumFindFileType::Directory)
    }

    pub fn ignore_vcs_files(&self, if_ignore: bool) -> Self {
        self.derive(|f| _set_mask_bit(&mut f.mask_ignore, EnumIgnoreMask::VcsFiles, if_ignore))
    }

    pub fn ignore_dot_files(&self, if_ignore: bool) -> Self {
        self.derive(|f| _set_mask_bit(&mut f.mask_ignore, EnumIgnoreMask::DotFiles, if_ignore))
    }

    /// Add directories to search. Roots are walked in the order given.
    pub fn in_dirs<P: AsRef<Path>>(&self, directories: &[P]) -> Self {
        let l_dirs: Vec<PathBuf> = directories
            .iter()
            .map(|d| d.as_ref().to_path_buf())
            .collect();
        self.derive(|f| f.dirs_root.extend(l_dirs))
    }

    /// Add an abstract filesystem to search, rooted at its `"."`.
    pub fn in_fs(&self, vfs: Arc<dyn VirtualFs>) -> Self {
        self.derive(|f| f.fs_roots.push(vfs))
    }

    /// Prune directories at these root-relative paths.
    pub fn exclude<S: AsRef<str>>(&self, directories: &[S]) -> Self {
        let l_dirs: Vec<String> = directories
            .iter()
            .map(|d| d.as_ref().to_string())
            .collect();
        self.derive(|f| f.dirs_excluded.extend(l_dirs))
    }

    /// Directories at this depth are reported but not descended into.
    pub fn max_depth(&self, depth: usize) -> Self {
        self.derive(|f| f.depth_max = Some(depth))
    }

    /// Entries shallower than this are walked but not reported.
    pub fn min_depth(&self, depth: usize) -> Self {
        self.derive(|f| f.depth_min = Some(depth))
    }

    /// Report symlinks as the kind of their final target.
    pub fn follow_symlinks(&self) -> Self {
        self.derive(|f| f.if_follow_symlinks = true)
    }

    pub fn file_type(&self) -> EnumFindFileType {
        self.rule_file_type
    }

    pub fn is_ignoring(&self, mask: EnumIgnoreMask) -> bool {
        self.mask_ignore & mask.bit() != 0
    }

    pub fn depth_bounds(&self) -> (Option<usize>, Option<usize>) {
        (self.depth_min, self.depth_max)
    }

    /// Run the search. See [`find`].
    pub fn find(&self) -> Vec<Entry> {
        find(self)
    }

    /// Run the search and keep counters plus skipped-node errors.
    pub fn find_with_report(&self) -> ReportFind {
        find_with_report(self)
    }
}

fn _compile_unanchored<S: AsRef<str>>(patterns: &[S]) -> Vec<GlobPredicate> {
    patterns
        .iter()
        .map(|p| GlobPredicate::compile(p.as_ref(), false))
        .collect()
}

fn _set_mask_bit(mask_ignore: &mut u8, mask: EnumIgnoreMask, if_set: bool) {
    if if_set {
        *mask_ignore |= mask.bit();
    } else {
        *mask_ignore &= !mask.bit();
    }
}
