/*!
 * Metadata Operations
 * Stat, permission and timestamp updates, links, and the working
 * directory
 */

use std::time::SystemTime;
use tracing::debug;

use super::handle::resize_content;
use super::node::Node;
use super::resolve::base_name;
use super::MemFs;
use crate::types::{ErrorKind, FsError, FsResult, Metadata};

impl MemFs {
    /// Stat record of the node a path resolves to, following symlinks
    pub fn stat(&self, path: &str) -> FsResult<Metadata> {
        let node = self
            .resolve_node(path, true)
            .map_err(|e| e.in_op("stat", path))?;
        Ok(node.metadata(base_name(path)))
    }

    /// Like `stat`, but a final symlink is reported rather than followed
    pub fn lstat(&self, path: &str) -> FsResult<Metadata> {
        let node = self
            .resolve_node(path, false)
            .map_err(|e| e.in_op("lstat", path))?;
        Ok(node.metadata(base_name(path)))
    }

    /// Check whether a path resolves to a node
    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        self.resolve_node(path, true).is_ok()
    }

    /// Change the working directory; relative resolutions start here
    pub fn chdir(&self, path: &str) -> FsResult<()> {
        let crumb = self
            .resolve_dir(path)
            .map_err(|e| e.in_op("chdir", path))?;
        self.set_cwd(crumb);
        debug!(path = %path, "changed working directory");
        Ok(())
    }

    /// The working directory as an absolute path
    #[must_use]
    pub fn getwd(&self) -> String {
        self.cwd_crumb().path()
    }

    /// Replace a node's permission bits, preserving its type
    ///
    /// Follows symlinks; a symlink's own bits are fixed at creation.
    pub fn chmod(&self, path: &str, perm: u32) -> FsResult<()> {
        let node = self
            .resolve_node(path, true)
            .map_err(|e| e.in_op("chmod", path))?;
        node.set_perm(perm).map_err(|e| e.in_op("chmod", path))?;
        debug!(path = %path, "changed mode to 0o{perm:o}");
        Ok(())
    }

    /// Set a node's modification time; access times are not tracked and
    /// `atime` is ignored
    pub fn chtimes(&self, path: &str, _atime: SystemTime, mtime: SystemTime) -> FsResult<()> {
        let node = self
            .resolve_node(path, true)
            .map_err(|e| e.in_op("chtimes", path))?;
        node.set_modified(mtime);
        Ok(())
    }

    /// Ownership is not modeled in an in-memory filesystem
    pub fn chown(&self, path: &str, _uid: u32, _gid: u32) -> FsResult<()> {
        Err(FsError::path("chown", path, ErrorKind::Unsupported))
    }

    /// Resize a file's content by path, following symlinks
    pub fn truncate(&self, path: &str, size: u64) -> FsResult<()> {
        let node = self
            .resolve_node(path, true)
            .map_err(|e| e.in_op("truncate", path))?;
        match node {
            Node::Directory(_) => Err(FsError::path("truncate", path, ErrorKind::IsADirectory)),
            Node::File(file) => {
                if !file.meta.read().mode.can_write() {
                    return Err(FsError::path("truncate", path, ErrorKind::PermissionDenied));
                }
                resize_content(&file, size, &self.tracker())
                    .map_err(|e| e.in_op("truncate", path))
            }
            // Resolution with follow never yields a symlink
            Node::Symlink(_) => Err(FsError::path("truncate", path, ErrorKind::Invalid)),
        }
    }

    /// The target string of a symlink, without following it
    pub fn readlink(&self, path: &str) -> FsResult<String> {
        let node = self
            .resolve_node(path, false)
            .map_err(|e| e.in_op("readlink", path))?;
        match node {
            Node::Symlink(link) => {
                if !link.meta.read().mode.can_read() {
                    return Err(FsError::path("readlink", path, ErrorKind::PermissionDenied));
                }
                Ok(link.target().to_string())
            }
            Node::Directory(_) | Node::File(_) => {
                Err(FsError::path("readlink", path, ErrorKind::Invalid))
            }
        }
    }
}
