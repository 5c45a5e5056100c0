/*!
 * File Operations
 * Opening files and seeding the tree with byte content
 */

use tracing::debug;

use super::handle::File;
use super::node::{FileNode, Node};
use super::resolve::split_path;
use crate::types::{ErrorKind, FileMode, FsError, FsResult, OpenFlags};

use super::MemFs;

impl MemFs {
    /// Open an existing file or directory read-only
    pub fn open(&self, name: &str) -> FsResult<File> {
        self.open_file(name, OpenFlags::read_only(), 0)
    }

    /// Create a file (read-write), truncating it if it already exists
    pub fn create(&self, name: &str) -> FsResult<File> {
        self.open_file(name, OpenFlags::create(), 0o666)
    }

    /// Open with explicit flags; `perm` is the permission bits for a
    /// newly created file (the type is always forced to regular)
    pub fn open_file(&self, name: &str, flags: OpenFlags, perm: u32) -> FsResult<File> {
        flags.validate().map_err(|e| e.in_op("open", name))?;
        if name.is_empty() {
            return Err(FsError::path("open", name, ErrorKind::NotFound));
        }

        let (crumb, base) = self.resolve_parent(name).map_err(|e| e.in_op("open", name))?;

        let existing = match base {
            "" | "." => Some(Node::Directory(crumb.dir.clone())),
            ".." => Some(Node::Directory(crumb.clone().ascend().dir.clone())),
            _ => match crumb.dir.get(base) {
                Ok(node) => Some(node),
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e.in_op("open", name)),
            },
        };

        let node = match existing {
            Some(node) => {
                if flags.create_new {
                    return Err(FsError::path("open", name, ErrorKind::AlreadyExists));
                }
                // A final symlink is dereferenced relative to its directory
                if let Node::Symlink(link) = &node {
                    self.resolve_node_at(link.target(), crumb.clone(), true, 1)
                        .map_err(|e| e.in_op("open", name))?
                } else {
                    node
                }
            }
            None => {
                if !flags.will_create() {
                    return Err(FsError::path("open", name, ErrorKind::NotFound));
                }
                let file = FileNode::new(FileMode::regular(perm));
                crumb
                    .dir
                    .insert(base, Node::File(file.clone()))
                    .map_err(|e| e.in_op("open", name))?;
                debug!(path = %name, "created file with mode 0o{perm:o}");
                return Ok(File::regular(
                    name.to_string(),
                    file,
                    flags.read,
                    flags.is_writable(),
                    flags.append,
                    0,
                    self.tracker(),
                ));
            }
        };

        match node {
            Node::Directory(dir) => {
                if flags.is_writable() || flags.truncate {
                    return Err(FsError::path("open", name, ErrorKind::IsADirectory));
                }
                let entries = dir.snapshot().map_err(|e| e.in_op("open", name))?;
                Ok(File::directory(name.to_string(), dir, entries))
            }
            Node::File(file) => {
                let mode = file.meta.read().mode;
                if flags.read && !mode.can_read() {
                    return Err(FsError::path("open", name, ErrorKind::PermissionDenied));
                }
                if (flags.is_writable() || flags.truncate) && !mode.can_write() {
                    return Err(FsError::path("open", name, ErrorKind::PermissionDenied));
                }
                if flags.truncate {
                    let mut data = file.data.write();
                    self.tracker().release(data.len());
                    data.clear();
                }
                let pos = if flags.append { file.size() } else { 0 };
                Ok(File::regular(
                    name.to_string(),
                    file,
                    flags.read,
                    flags.is_writable(),
                    flags.append,
                    pos,
                    self.tracker(),
                ))
            }
            // Resolution with follow never yields a symlink
            Node::Symlink(_) => Err(FsError::path("open", name, ErrorKind::Invalid)),
        }
    }

    /// Seed a regular file with the given bytes and permission bits,
    /// creating any missing intermediate directories (mode `0o755`)
    ///
    /// An existing file at the path is replaced; an existing directory is
    /// not.
    pub fn write_bytes(&self, path: &str, perm: u32, data: impl Into<Vec<u8>>) -> FsResult<()> {
        if path.is_empty() {
            return Err(FsError::path("write", path, ErrorKind::NotFound));
        }
        let (dir_part, base) = split_path(path);
        if base.is_empty() || base == "." || base == ".." {
            return Err(FsError::path("write", path, ErrorKind::Invalid));
        }

        self.mkdir_all(dir_part, 0o755)?;
        let crumb = self.resolve_dir(dir_part).map_err(|e| e.in_op("write", path))?;

        match crumb.dir.remove(base, false) {
            Ok(freed) => self.tracker().release(freed),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.in_op("write", path)),
        }

        let bytes: Vec<u8> = data.into();
        self.tracker()
            .reserve(bytes.len())
            .map_err(|e| e.in_op("write", path))?;
        let len = bytes.len();

        if let Err(e) = crumb
            .dir
            .insert(base, Node::File(FileNode::with_data(FileMode::regular(perm), bytes)))
        {
            self.tracker().release(len);
            return Err(e.in_op("write", path));
        }
        debug!(path = %path, bytes = len, "seeded file");
        Ok(())
    }

    /// Seed a read-only (`0o444`) file with string content
    pub fn write_str(&self, path: &str, data: &str) -> FsResult<()> {
        self.write_bytes(path, 0o444, data.as_bytes().to_vec())
    }
}
