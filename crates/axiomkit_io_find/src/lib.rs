//! `axiomkit_io_find` v1:
//! Rust-side declarative file-tree search.
//!
//! Modules:
//! - `finder` : immutable search configuration (builder)
//! - `find`   : traversal driver, depth tracking and filter pipeline
//! - `glob`   : `*`/`?` glob compiler
//! - `entry`  : matched entry value and on-demand metadata
//! - `walk`   : pre-order walk over directory and abstract filesystem roots
//! - `vfs`    : abstract filesystem trait and in-memory implementation
//! - `spec`   : enums/errors
//! - `report` : run-time report model
//! - `util`   : ignore rules, symlink resolution, path helpers

pub mod entry;
pub mod find;
pub mod finder;
pub mod glob;
pub mod report;
pub mod spec;
mod util;
pub mod vfs;
pub mod walk;

pub use entry::{Entry, EntryOrigin, SpecEntryInfo};
pub use find::{find, find_with_report};
pub use finder::SpecFinder;
pub use glob::GlobPredicate;
pub use report::{ReportFind, ReportFindBuilder};
pub use spec::{
    EnumEntryKind, EnumFindFileType, EnumIgnoreMask, EnumVerdict, FindError, SpecFindError,
};
pub use util::{MAX_SYMLINK_HOPS, VCS_DIR_NAMES};
pub use vfs::{MemoryFs, SpecVfsDirEntry, VirtualFs};
pub use walk::{EnumWalkControl, PhysicalRoot, SpecWalkNode, VirtualRoot, WalkRoot};
