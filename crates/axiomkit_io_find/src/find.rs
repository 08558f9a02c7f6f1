//! Traversal driver and per-node filter pipeline.

use tracing::{debug, trace, warn};

use crate::entry::{Entry, EntryOrigin};
use crate::finder::SpecFinder;
use crate::report::{ReportFind, ReportFindBuilder};
use crate::spec::{EnumFindFileType, EnumVerdict};
use crate::util::{SpecIgnoreMatcher, resolve_symlink_chain, split_relative};
use crate::walk::{EnumWalkControl, PhysicalRoot, SpecWalkNode, VirtualRoot, WalkRoot};

/// Running depth derived from consecutive relative directories of a
/// pre-order walk. Siblings and direct children cost O(1); any other jump
/// recounts the separators of the new directory.
#[derive(Debug, Default)]
struct SpecDepthTracker {
    depth: usize,
    /// Relative directory of the previous node, with trailing `/`.
    depth_prefix: String,
}

impl SpecDepthTracker {
    fn advance(&mut self, dir_relative: &str) -> usize {
        if dir_relative == self.depth_prefix {
            return self.depth;
        }

        let b_is_child = dir_relative
            .strip_prefix(self.depth_prefix.as_str())
            .is_some_and(|rest| rest.find('/') == Some(rest.len() - 1));
        if b_is_child {
            self.depth += 1;
        } else {
            self.depth = dir_relative.matches('/').count();
        }
        self.depth_prefix.clear();
        self.depth_prefix.push_str(dir_relative);
        self.depth
    }
}

#[derive(Debug)]
struct SpecFindContext<'a> {
    spec_finder: &'a SpecFinder,
    matcher_ignore: SpecIgnoreMatcher,
    builder_find_report: ReportFindBuilder,
}

/// Search every configured root and return the accepted entries in walk
/// order.
///
/// Never fails: unreadable nodes, dangling symlinks and missing roots only
/// shrink the result. Use [`find_with_report`] to see what was skipped.
pub fn find(spec_finder: &SpecFinder) -> Vec<Entry> {
    find_with_report(spec_finder).entries
}

/// Like [`find`], also returning counters, warnings and skipped-node errors.
///
/// Directory roots are walked first, then abstract filesystem roots, each
/// group in configuration order. Depth state is fresh for every root.
pub fn find_with_report(spec_finder: &SpecFinder) -> ReportFind {
    let mut spec_find_ctx = SpecFindContext {
        spec_finder,
        matcher_ignore: SpecIgnoreMatcher::from_mask(
            spec_finder.mask_ignore,
            &spec_finder.dirs_excluded,
        ),
        builder_find_report: ReportFindBuilder::default(),
    };

    for path_dir in &spec_finder.dirs_root {
        walk_root(&PhysicalRoot::new(path_dir), &mut spec_find_ctx);
    }
    for vfs in &spec_finder.fs_roots {
        walk_root(&VirtualRoot::new(vfs.clone()), &mut spec_find_ctx);
    }

    let report = spec_find_ctx.builder_find_report.build();
    debug!(summary = %report, "search finished");
    report
}

fn walk_root(root: &dyn WalkRoot, spec_find_ctx: &mut SpecFindContext<'_>) {
    let c_root = root.describe();
    debug!(root = %c_root, "walking search root");

    let origin = root.origin();
    let mut spec_depth = SpecDepthTracker::default();
    let res_walk = root.walk(&mut |res_node| match res_node {
        Ok(spec_node) => visit_node(spec_node, &mut spec_depth, &origin, spec_find_ctx),
        Err(spec_err) => {
            warn!(path = %spec_err.path.display(), error = %spec_err.exception, "node skipped");
            spec_find_ctx.builder_find_report.errors.push(spec_err);
            EnumWalkControl::Continue
        }
    });

    if let Err(spec_err) = res_walk {
        warn!(root = %c_root, error = %spec_err.exception, "search root skipped");
        spec_find_ctx
            .builder_find_report
            .add_warning(format!("Search root skipped: {spec_err}"));
    }
}

fn visit_node(
    mut spec_node: SpecWalkNode,
    spec_depth: &mut SpecDepthTracker,
    origin: &EntryOrigin,
    spec_find_ctx: &mut SpecFindContext<'_>,
) -> EnumWalkControl {
    // the root itself is never a candidate
    if spec_node.path_relative.is_empty() {
        return EnumWalkControl::Continue;
    }
    spec_find_ctx.builder_find_report.add_scanned();

    let (dir_relative, _) = split_relative(&spec_node.path_relative);
    let depth = spec_depth.advance(dir_relative);

    let mut if_followed = false;
    let enum_verdict = decide(&mut spec_node, depth, origin, &mut if_followed, spec_find_ctx);

    if enum_verdict.is_prune() {
        debug!(path = %spec_node.path_relative, depth, "subtree pruned");
        spec_find_ctx.builder_find_report.add_pruned();
    }
    if enum_verdict.is_accept() {
        trace!(path = %spec_node.path_relative, depth, "entry accepted");
        spec_find_ctx.builder_find_report.add_matched(Entry {
            path: spec_node.path,
            path_relative: spec_node.path_relative,
            name: spec_node.name,
            depth,
            kind: spec_node.kind,
            if_followed,
            origin: origin.clone(),
        });
    }

    if enum_verdict.is_prune() {
        EnumWalkControl::SkipSubtree
    } else {
        EnumWalkControl::Continue
    }
}

/// Apply the filter pipeline to one node.
///
/// Order: ignore rules, min depth, max depth, symlink resolution, type,
/// name exclude, name include, path exclude, path include. The max-depth
/// prune is decided before any rejection and survives it.
fn decide(
    spec_node: &mut SpecWalkNode,
    depth: usize,
    origin: &EntryOrigin,
    if_followed: &mut bool,
    spec_find_ctx: &mut SpecFindContext<'_>,
) -> EnumVerdict {
    let spec_finder = spec_find_ctx.spec_finder;
    let b_is_dir_walked = spec_node.kind.is_dir();

    if b_is_dir_walked
        && spec_find_ctx
            .matcher_ignore
            .is_pruned_dir(&spec_node.name, &spec_node.path_relative)
    {
        return EnumVerdict::RejectAndPrune;
    }
    if !b_is_dir_walked && spec_find_ctx.matcher_ignore.is_ignored_file(&spec_node.name) {
        return EnumVerdict::Reject;
    }

    let if_prune = b_is_dir_walked && spec_finder.depth_max.is_some_and(|n| depth >= n);
    let reject = EnumVerdict::from_flags(false, if_prune);

    if spec_finder.depth_min.is_some_and(|n| depth < n) {
        return reject;
    }

    if spec_node.kind.is_symlink() && spec_finder.if_follow_symlinks {
        match resolve_symlink_chain(origin, &spec_node.path) {
            Ok(info_target) => {
                spec_node.kind = info_target.kind;
                *if_followed = true;
            }
            Err(e) => {
                warn!(path = %spec_node.path.display(), error = %e, "unresolvable symlink skipped");
                spec_find_ctx.builder_find_report.add_error(
                    spec_node.path.clone(),
                    format!("Unresolvable symlink: {e}"),
                );
                return reject;
            }
        }
    }

    match spec_finder.rule_file_type {
        EnumFindFileType::File if !spec_node.kind.is_regular() => return reject,
        EnumFindFileType::Directory if !spec_node.kind.is_dir() => return reject,
        _ => {}
    }

    let name = spec_node.name.as_str();
    if spec_finder.patterns_not_name.iter().any(|g| g.is_match(name)) {
        return reject;
    }

    let b_has_name_rules =
        !spec_finder.patterns_name.is_empty() || !spec_finder.regexes_name.is_empty();
    if !spec_node.kind.is_dir()
        && b_has_name_rules
        && !spec_finder.patterns_name.iter().any(|g| g.is_match(name))
        && !spec_finder.regexes_name.iter().any(|r| r.is_match(name))
    {
        return reject;
    }

    let path_relative = spec_node.path_relative.as_str();
    if spec_finder
        .patterns_not_path
        .iter()
        .any(|g| g.is_match(path_relative))
    {
        return reject;
    }
    if !spec_finder.patterns_path.is_empty()
        && !spec_finder
            .patterns_path
            .iter()
            .any(|g| g.is_match(path_relative))
    {
        return reject;
    }

    EnumVerdict::from_flags(true, if_prune)
}
