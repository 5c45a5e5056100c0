/*!
 * Directory Operations
 * Creating, removing, renaming, and linking directory entries
 */

use std::sync::Arc;
use tracing::debug;

use super::node::{Directory, Node, SymlinkNode};
use super::MemFs;
use crate::types::{ErrorKind, FileMode, FsError, FsResult};

/// Final segments that never name a removable or creatable entry
fn is_reserved(base: &str) -> bool {
    matches!(base, "" | "." | "..")
}

impl MemFs {
    /// Create a directory; the parent must already exist
    pub fn mkdir(&self, path: &str, perm: u32) -> FsResult<()> {
        let (crumb, base) = self.resolve_parent(path).map_err(|e| e.in_op("mkdir", path))?;
        if is_reserved(base) {
            return Err(FsError::path("mkdir", path, ErrorKind::AlreadyExists));
        }
        crumb
            .dir
            .insert(base, Node::Directory(Directory::new(FileMode::directory(perm))))
            .map_err(|e| e.in_op("mkdir", path))?;
        debug!(path = %path, "created directory with mode 0o{perm:o}");
        Ok(())
    }

    /// Create a directory and any missing parents
    ///
    /// Existing directory segments are tolerated; an existing
    /// non-directory segment fails with `NotADirectory`.
    pub fn mkdir_all(&self, path: &str, perm: u32) -> FsResult<()> {
        let mut crumb = if path.starts_with('/') {
            self.root_crumb()
        } else {
            self.cwd_crumb()
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
            match crumb.dir.get(segment) {
                Ok(Node::Directory(dir)) => crumb = crumb.descend(segment, dir),
                Ok(Node::Symlink(link)) => {
                    crumb = self
                        .resolve_dir_at(link.target(), crumb, 1)
                        .map_err(|e| e.in_op("mkdir", path))?;
                }
                Ok(Node::File(_)) => {
                    return Err(FsError::path("mkdir", path, ErrorKind::NotADirectory));
                }
                Err(e) if e.is_not_found() => {
                    let dir = Directory::new(FileMode::directory(perm));
                    match crumb.dir.insert(segment, Node::Directory(dir.clone())) {
                        Ok(()) => crumb = crumb.descend(segment, dir),
                        Err(e) if e.is_already_exists() => {
                            // Lost a creation race; continue through the winner
                            match crumb.dir.get(segment) {
                                Ok(Node::Directory(dir)) => crumb = crumb.descend(segment, dir),
                                Ok(_) => {
                                    return Err(FsError::path(
                                        "mkdir",
                                        path,
                                        ErrorKind::NotADirectory,
                                    ));
                                }
                                Err(e) => return Err(e.in_op("mkdir", path)),
                            }
                        }
                        Err(e) => return Err(e.in_op("mkdir", path)),
                    }
                }
                Err(e) => return Err(e.in_op("mkdir", path)),
            }
        }
        Ok(())
    }

    /// Remove a file, symlink, or empty directory
    pub fn remove(&self, path: &str) -> FsResult<()> {
        let (crumb, base) = self.resolve_parent(path).map_err(|e| e.in_op("remove", path))?;
        if is_reserved(base) {
            return Err(FsError::path("remove", path, ErrorKind::Invalid));
        }
        let freed = crumb
            .dir
            .remove(base, false)
            .map_err(|e| e.in_op("remove", path))?;
        self.tracker().release(freed);
        debug!(path = %path, "removed entry");
        Ok(())
    }

    /// Remove a path and everything below it; a missing target is success
    pub fn remove_all(&self, path: &str) -> FsResult<()> {
        let (crumb, base) = match self.resolve_parent(path) {
            Ok(located) => located,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e.in_op("remove", path)),
        };
        if is_reserved(base) {
            return Err(FsError::path("remove", path, ErrorKind::Invalid));
        }
        match crumb.dir.remove(base, true) {
            Ok(freed) => {
                self.tracker().release(freed);
                debug!(path = %path, "removed tree");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.in_op("remove", path)),
        }
    }

    /// Move an entry to a new name and/or directory
    ///
    /// The destination must not already exist (no replace, no merge) and
    /// a directory cannot be moved into its own subtree. On failure both
    /// source and destination are left untouched.
    pub fn rename(&self, old: &str, new: &str) -> FsResult<()> {
        let (old_crumb, old_base) = self
            .resolve_parent(old)
            .map_err(|e| e.in_link_op("rename", old, new))?;
        let (new_crumb, new_base) = self
            .resolve_parent(new)
            .map_err(|e| e.in_link_op("rename", old, new))?;
        if is_reserved(old_base) || is_reserved(new_base) {
            return Err(FsError::link("rename", old, new, ErrorKind::Invalid));
        }

        let node = old_crumb
            .dir
            .take(old_base)
            .map_err(|e| e.in_link_op("rename", old, new))?;

        // The destination chain must not pass through the moved directory
        let creates_cycle = match &node {
            Node::Directory(moved) => {
                let mut cursor = Some(new_crumb.clone());
                let mut found = false;
                while let Some(crumb) = cursor {
                    if Arc::ptr_eq(&crumb.dir, moved) {
                        found = true;
                        break;
                    }
                    cursor = crumb.previous.clone();
                }
                found
            }
            Node::File(_) | Node::Symlink(_) => false,
        };
        if creates_cycle {
            let _ = old_crumb.dir.insert(old_base, node);
            return Err(FsError::link("rename", old, new, ErrorKind::Invalid));
        }

        if let Err(e) = new_crumb.dir.insert(new_base, node.clone()) {
            let _ = old_crumb.dir.insert(old_base, node);
            return Err(e.in_link_op("rename", old, new));
        }
        debug!(from = %old, to = %new, "renamed entry");
        Ok(())
    }

    /// Create a hard link: a second directory entry sharing the file's
    /// content and metadata
    pub fn link(&self, old: &str, new: &str) -> FsResult<()> {
        let node = self
            .resolve_node(old, true)
            .map_err(|e| e.in_link_op("link", old, new))?;
        let file = match node {
            Node::Directory(_) => {
                return Err(FsError::link("link", old, new, ErrorKind::IsADirectory));
            }
            Node::File(file) => file,
            // Resolution with follow never yields a symlink
            Node::Symlink(_) => {
                return Err(FsError::link("link", old, new, ErrorKind::Invalid));
            }
        };
        let (crumb, base) = self
            .resolve_parent(new)
            .map_err(|e| e.in_link_op("link", old, new))?;
        if is_reserved(base) {
            return Err(FsError::link("link", old, new, ErrorKind::Invalid));
        }
        crumb
            .dir
            .insert(base, Node::File(file))
            .map_err(|e| e.in_link_op("link", old, new))?;
        debug!(from = %old, to = %new, "linked file");
        Ok(())
    }

    /// Create a symlink at `linkpath` carrying `target` as an unresolved
    /// path string; `target` is never validated
    pub fn symlink(&self, target: &str, linkpath: &str) -> FsResult<()> {
        let (crumb, base) = self
            .resolve_parent(linkpath)
            .map_err(|e| e.in_link_op("symlink", target, linkpath))?;
        if is_reserved(base) {
            return Err(FsError::link("symlink", target, linkpath, ErrorKind::Invalid));
        }
        crumb
            .dir
            .insert(base, Node::Symlink(SymlinkNode::new(target)))
            .map_err(|e| e.in_link_op("symlink", target, linkpath))?;
        debug!(link = %linkpath, "created symlink to {target}");
        Ok(())
    }
}
