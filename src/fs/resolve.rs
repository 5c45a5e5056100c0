/*!
 * Path Resolution
 * Breadcrumb ancestry chains and the segment walk that turns path
 * strings into directories and nodes
 */

use std::sync::Arc;

use super::node::{Directory, Node};
use super::MemFs;
use crate::types::{ErrorKind, FsError, FsResult};

/// Resolution gives up past this many symlink dereferences
///
/// Bounds cyclic link chains, which would otherwise recurse forever.
pub(crate) const MAX_SYMLINK_DEPTH: usize = 40;

/// An ephemeral record of how a directory was reached
///
/// Breadcrumbs form a singly linked ancestry chain back to the root;
/// `previous` is one level up and `None` only at the root. They are
/// created fresh during each resolution and never mutate shared state.
/// When a symlink is followed mid-walk, the resolved target's breadcrumb
/// replaces the current one wholesale, so a later `..` ascends from the
/// resolved location rather than the textual one.
#[derive(Debug)]
pub(crate) struct Breadcrumb {
    pub(crate) name: String,
    pub(crate) depth: usize,
    pub(crate) previous: Option<Crumb>,
    pub(crate) dir: Arc<Directory>,
}

pub(crate) type Crumb = Arc<Breadcrumb>;

impl Breadcrumb {
    /// The root breadcrumb for a filesystem rooted at `dir`
    pub fn root(dir: Arc<Directory>) -> Crumb {
        Arc::new(Self {
            name: String::new(),
            depth: 0,
            previous: None,
            dir,
        })
    }

    /// One level up; ascending from the root stays at the root
    pub fn ascend(self: Crumb) -> Crumb {
        match &self.previous {
            Some(prev) => prev.clone(),
            None => self,
        }
    }

    /// Step down into a child directory
    pub fn descend(self: Crumb, name: &str, dir: Arc<Directory>) -> Crumb {
        Arc::new(Breadcrumb {
            name: name.to_string(),
            depth: self.depth + 1,
            previous: Some(self),
            dir,
        })
    }

    /// Root-to-leaf path of this location, `"/"` for the root
    pub fn path(self: Crumb) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.depth);
        let mut crumb = self;
        while crumb.previous.is_some() {
            parts.push(crumb.name.clone());
            crumb = crumb.ascend();
        }
        if parts.is_empty() {
            return "/".to_string();
        }
        parts.reverse();
        format!("/{}", parts.join("/"))
    }
}

/// Split a path into its containing-directory part and final segment
///
/// Trailing separators are ignored: `"/a/b/"` splits like `"/a/b"`. The
/// final segment may be empty (the path was the root), `"."`, or `".."`;
/// callers resolve those against the containing directory.
pub(crate) fn split_path(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        // Empty input, or nothing but separators (the root)
        return if path.is_empty() { ("", "") } else { ("/", "") };
    }
    match trimmed.rfind('/') {
        Some(i) => (&trimmed[..=i], &trimmed[i + 1..]),
        None => ("", trimmed),
    }
}

/// The final path segment, used as the stat name; `"/"` for the root
pub(crate) fn base_name(path: &str) -> &str {
    let (_, base) = split_path(path);
    if base.is_empty() {
        "/"
    } else {
        base
    }
}

impl MemFs {
    /// Resolve a path to a directory, starting from the current directory
    pub(crate) fn resolve_dir(&self, path: &str) -> FsResult<Crumb> {
        self.resolve_dir_at(path, self.cwd_crumb(), 0)
    }

    /// Resolve a path to a directory from an explicit starting location
    ///
    /// Walks segment by segment: absolute paths restart at the root, `.`
    /// and empty segments are skipped, `..` ascends (clamped at the
    /// root), symlinks are dereferenced recursively relative to the
    /// directory that contains them, and a regular file mid-path fails.
    pub(crate) fn resolve_dir_at(
        &self,
        path: &str,
        start: Crumb,
        depth: usize,
    ) -> FsResult<Crumb> {
        if depth > MAX_SYMLINK_DEPTH {
            return Err(FsError::new(ErrorKind::TooManyLinks));
        }

        let mut crumb = if path.starts_with('/') {
            self.root_crumb()
        } else {
            start
        };

        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    crumb = crumb.ascend();
                    continue;
                }
                _ => {}
            }
            match crumb.dir.get(segment)? {
                Node::Directory(dir) => crumb = crumb.descend(segment, dir),
                Node::Symlink(link) => {
                    crumb = self.resolve_dir_at(link.target(), crumb, depth + 1)?;
                }
                Node::File(_) => return Err(FsError::new(ErrorKind::NotADirectory)),
            }
        }
        Ok(crumb)
    }

    /// Resolve the containing directory of a path, returning the crumb
    /// and the unresolved final segment
    pub(crate) fn resolve_parent<'p>(&self, path: &'p str) -> FsResult<(Crumb, &'p str)> {
        let (dir_part, base) = split_path(path);
        let crumb = self.resolve_dir(dir_part)?;
        Ok((crumb, base))
    }

    /// Resolve a path to its node, optionally following a final symlink
    pub(crate) fn resolve_node(&self, path: &str, follow: bool) -> FsResult<Node> {
        self.resolve_node_at(path, self.cwd_crumb(), follow, 0)
    }

    pub(crate) fn resolve_node_at(
        &self,
        path: &str,
        start: Crumb,
        follow: bool,
        depth: usize,
    ) -> FsResult<Node> {
        if depth > MAX_SYMLINK_DEPTH {
            return Err(FsError::new(ErrorKind::TooManyLinks));
        }
        if path.is_empty() {
            return Err(FsError::new(ErrorKind::NotFound));
        }

        let (dir_part, base) = split_path(path);
        let crumb = self.resolve_dir_at(dir_part, start, depth)?;

        let node = match base {
            "" | "." => Node::Directory(crumb.dir.clone()),
            ".." => Node::Directory(crumb.clone().ascend().dir.clone()),
            name => crumb.dir.get(name)?,
        };

        if follow {
            if let Node::Symlink(link) = &node {
                return self.resolve_node_at(link.target(), crumb, true, depth + 1);
            }
        }
        Ok(node)
    }
}
