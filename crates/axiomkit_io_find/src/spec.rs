//! Find option enums, per-node error items and top-level error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Entry type filter applied by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumFindFileType {
    /// Accept every entry kind.
    #[default]
    Any,
    /// Accept regular files only.
    File,
    /// Accept directories only.
    Directory,
}

/// Platform file-mode classification of a visited node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumEntryKind {
    File,
    Directory,
    Symlink,
    /// Sockets, fifos, devices.
    Other,
}

impl EnumEntryKind {
    pub fn from_file_type(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }

    pub fn is_dir(self) -> bool {
        self == Self::Directory
    }

    pub fn is_regular(self) -> bool {
        self == Self::File
    }

    pub fn is_symlink(self) -> bool {
        self == Self::Symlink
    }
}

/// Ignore-mask bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumIgnoreMask {
    /// Version-control directories (`.git`, `.svn`, `.hg`, ...).
    VcsFiles = 1 << 0,
    /// Names starting with `.`.
    DotFiles = 1 << 1,
}

impl EnumIgnoreMask {
    pub fn bit(self) -> u8 {
        self as u8
    }
}

/// Outcome of the filter pipeline for one visited node.
///
/// Reporting and descent are decided independently: a directory at the
/// maximum depth can be accepted and still have its subtree skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumVerdict {
    Accept,
    AcceptAndPrune,
    Reject,
    RejectAndPrune,
}

impl EnumVerdict {
    pub(crate) fn from_flags(if_accept: bool, if_prune: bool) -> Self {
        match (if_accept, if_prune) {
            (true, false) => Self::Accept,
            (true, true) => Self::AcceptAndPrune,
            (false, false) => Self::Reject,
            (false, true) => Self::RejectAndPrune,
        }
    }

    pub fn is_accept(self) -> bool {
        matches!(self, Self::Accept | Self::AcceptAndPrune)
    }

    pub fn is_prune(self) -> bool {
        matches!(self, Self::AcceptAndPrune | Self::RejectAndPrune)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// One skipped node with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFindError {
    /// Path of the node that was skipped.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

impl fmt::Display for SpecFindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.exception)
    }
}

/// Errors surfaced to callers that opt into strict handling.
#[derive(Debug, Error)]
pub enum FindError {
    /// At least one node was skipped because of a traversal error.
    #[error("{count} node(s) skipped during search, first: {first}")]
    SkippedNodes {
        /// Number of skipped nodes.
        count: usize,
        /// The first skipped node in walk order.
        first: SpecFindError,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
