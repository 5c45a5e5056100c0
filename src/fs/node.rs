/*!
 * Filesystem Nodes
 * The node tree: directories, regular files, symlinks, and the
 * permission-checked directory store
 */

use ahash::RandomState;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use crate::types::{ErrorKind, FileMode, FsError, FsResult, Metadata};

/// Metadata shared by every node variant
#[derive(Debug, Clone, Copy)]
pub(crate) struct NodeMeta {
    pub mode: FileMode,
    pub modified: SystemTime,
}

impl NodeMeta {
    fn new(mode: FileMode) -> Self {
        Self {
            mode,
            modified: SystemTime::now(),
        }
    }
}

/// Regular file: mode, mtime, and a resizable byte buffer
///
/// Hard links are additional directory entries holding the same
/// `Arc<FileNode>`, so content and metadata are shared between them.
#[derive(Debug)]
pub(crate) struct FileNode {
    pub(crate) meta: RwLock<NodeMeta>,
    pub(crate) data: RwLock<Vec<u8>>,
}

impl FileNode {
    pub fn new(mode: FileMode) -> Arc<Self> {
        Self::with_data(mode, Vec::new())
    }

    pub fn with_data(mode: FileMode, data: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            meta: RwLock::new(NodeMeta::new(mode)),
            data: RwLock::new(data),
        })
    }

    pub fn size(&self) -> u64 {
        self.data.read().len() as u64
    }
}

/// Symbolic link: an unresolved target path string
///
/// The target is never validated at creation and may dangle. Mode is
/// fixed at creation; chmod rejects symlinks.
#[derive(Debug)]
pub(crate) struct SymlinkNode {
    pub(crate) meta: RwLock<NodeMeta>,
    target: String,
}

impl SymlinkNode {
    pub fn new(target: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            meta: RwLock::new(NodeMeta::new(FileMode::symlink())),
            target: target.into(),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Directory: a name-to-node child map behind its own lock
#[derive(Debug)]
pub(crate) struct Directory {
    pub(crate) meta: RwLock<NodeMeta>,
    children: RwLock<HashMap<String, Node, RandomState>>,
}

/// A node in the tree
///
/// Closed over exactly the three kinds the engine supports; every match
/// site accounts for all of them.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Directory(Arc<Directory>),
    File(Arc<FileNode>),
    Symlink(Arc<SymlinkNode>),
}

impl Node {
    pub fn mode(&self) -> FileMode {
        match self {
            Node::Directory(d) => d.meta.read().mode,
            Node::File(f) => f.meta.read().mode,
            Node::Symlink(l) => l.meta.read().mode,
        }
    }

    #[allow(dead_code)]
    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    /// Replace the node's permission bits, preserving type bits
    ///
    /// A symlink's permission bits are fixed at creation and rejected here.
    pub fn set_perm(&self, perm: u32) -> FsResult<()> {
        let meta = match self {
            Node::Directory(d) => &d.meta,
            Node::File(f) => &f.meta,
            Node::Symlink(_) => return Err(FsError::new(ErrorKind::Invalid)),
        };
        let mut meta = meta.write();
        meta.mode = meta.mode.with_perm(perm);
        Ok(())
    }

    pub fn set_modified(&self, modified: SystemTime) {
        let meta = match self {
            Node::Directory(d) => &d.meta,
            Node::File(f) => &f.meta,
            Node::Symlink(l) => &l.meta,
        };
        meta.write().modified = modified;
    }

    /// Build the stat record for this node under the given entry name
    ///
    /// Lock order is content before metadata, matching the write path.
    pub fn metadata(&self, name: &str) -> Metadata {
        let (meta, size) = match self {
            Node::Directory(d) => (*d.meta.read(), 0),
            Node::File(f) => {
                let size = f.size();
                (*f.meta.read(), size)
            }
            Node::Symlink(l) => (*l.meta.read(), l.target().len() as u64),
        };
        Metadata {
            name: name.to_string(),
            size,
            mode: meta.mode,
            modified: meta.modified,
        }
    }
}

/// Validate a directory entry name
///
/// Names must be non-empty and cannot contain path separators or NUL.
pub(crate) fn validate_name(name: &str) -> FsResult<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(FsError::new(ErrorKind::Invalid));
    }
    Ok(())
}

impl Directory {
    pub fn new(mode: FileMode) -> Arc<Self> {
        Arc::new(Self {
            meta: RwLock::new(NodeMeta::new(mode)),
            children: RwLock::new(HashMap::default()),
        })
    }

    pub fn mode(&self) -> FileMode {
        self.meta.read().mode
    }

    fn touch(&self) {
        self.meta.write().modified = SystemTime::now();
    }

    /// Look up a child by name; traversal requires execute permission
    pub fn get(&self, name: &str) -> FsResult<Node> {
        if !self.mode().can_execute() {
            return Err(FsError::new(ErrorKind::PermissionDenied));
        }
        self.children
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| FsError::new(ErrorKind::NotFound))
    }

    /// Insert a child; create never replaces an existing entry
    pub fn insert(&self, name: &str, node: Node) -> FsResult<()> {
        validate_name(name)?;
        if !self.mode().can_write() {
            return Err(FsError::new(ErrorKind::PermissionDenied));
        }
        let mut children = self.children.write();
        if children.contains_key(name) {
            return Err(FsError::new(ErrorKind::AlreadyExists));
        }
        children.insert(name.to_string(), node);
        drop(children);
        self.touch();
        Ok(())
    }

    /// Detach a child and return it (rename moves the subtree intact)
    pub fn take(&self, name: &str) -> FsResult<Node> {
        if !self.mode().can_write() {
            return Err(FsError::new(ErrorKind::PermissionDenied));
        }
        let node = self
            .children
            .write()
            .remove(name)
            .ok_or_else(|| FsError::new(ErrorKind::NotFound))?;
        self.touch();
        Ok(node)
    }

    /// Remove a child, returning the number of file content bytes freed
    ///
    /// A non-empty directory is only removed when `recursive` is set;
    /// recursive removal is depth-first and surfaces the first failure.
    pub fn remove(&self, name: &str, recursive: bool) -> FsResult<usize> {
        if !self.mode().can_write() {
            return Err(FsError::new(ErrorKind::PermissionDenied));
        }
        let mut children = self.children.write();
        let node = children
            .get(name)
            .cloned()
            .ok_or_else(|| FsError::new(ErrorKind::NotFound))?;

        let mut freed = 0;
        match &node {
            Node::Directory(dir) => {
                if recursive {
                    freed += dir.remove_children()?;
                } else if !dir.is_empty() {
                    return Err(FsError::new(ErrorKind::NotEmpty));
                }
            }
            Node::File(file) => freed += file.data.read().len(),
            Node::Symlink(_) => {}
        }

        children.remove(name);
        drop(children);
        self.touch();
        Ok(freed)
    }

    /// Depth-first removal of every child, surfacing the first failure
    fn remove_children(&self) -> FsResult<usize> {
        let names: Vec<String> = self.children.read().keys().cloned().collect();
        let mut freed = 0;
        for name in names {
            freed += self.remove(&name, true)?;
        }
        Ok(freed)
    }

    /// Copy of the child list as sorted stat records; listing requires read
    pub fn snapshot(&self) -> FsResult<Vec<Metadata>> {
        if !self.mode().can_read() {
            return Err(FsError::new(ErrorKind::PermissionDenied));
        }
        let mut entries: Vec<Metadata> = self
            .children
            .read()
            .iter()
            .map(|(name, node)| node.metadata(name))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.children.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_requires_execute() {
        let dir = Directory::new(FileMode::directory(0o755));
        dir.insert("f", Node::File(FileNode::new(FileMode::regular(0o644))))
            .unwrap();

        dir.meta.write().mode = FileMode::directory(0o644);
        let err = dir.get("f").unwrap_err();
        assert!(err.is_permission_denied());

        dir.meta.write().mode = FileMode::directory(0o755);
        assert!(dir.get("f").is_ok());
    }

    #[test]
    fn test_insert_never_replaces() {
        let dir = Directory::new(FileMode::directory(0o755));
        dir.insert("f", Node::File(FileNode::new(FileMode::regular(0o644))))
            .unwrap();
        let err = dir
            .insert("f", Node::File(FileNode::new(FileMode::regular(0o644))))
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_insert_validates_names() {
        let dir = Directory::new(FileMode::directory(0o755));
        let file = || Node::File(FileNode::new(FileMode::regular(0o644)));
        assert_eq!(dir.insert("", file()).unwrap_err().kind(), ErrorKind::Invalid);
        assert_eq!(
            dir.insert("a/b", file()).unwrap_err().kind(),
            ErrorKind::Invalid
        );
        assert_eq!(
            dir.insert("a\0b", file()).unwrap_err().kind(),
            ErrorKind::Invalid
        );
    }

    #[test]
    fn test_remove_non_empty_requires_recursive() {
        let parent = Directory::new(FileMode::directory(0o755));
        let child = Directory::new(FileMode::directory(0o755));
        child
            .insert("f", Node::File(FileNode::with_data(FileMode::regular(0o644), vec![1, 2, 3])))
            .unwrap();
        parent.insert("d", Node::Directory(child)).unwrap();

        let err = parent.remove("d", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotEmpty);

        let freed = parent.remove("d", true).unwrap();
        assert_eq!(freed, 3);
        assert!(parent.is_empty());
    }

    #[test]
    fn test_readonly_directory_rejects_mutation() {
        let dir = Directory::new(FileMode::directory(0o555));
        let err = dir
            .insert("f", Node::File(FileNode::new(FileMode::regular(0o644))))
            .unwrap_err();
        assert!(err.is_permission_denied());
        assert!(dir.remove("f", false).unwrap_err().is_permission_denied());
    }

    #[test]
    fn test_snapshot_sorted_and_requires_read() {
        let dir = Directory::new(FileMode::directory(0o755));
        dir.insert("b", Node::File(FileNode::new(FileMode::regular(0o644))))
            .unwrap();
        dir.insert("a", Node::Directory(Directory::new(FileMode::directory(0o755))))
            .unwrap();

        let entries = dir.snapshot().unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(entries[0].is_dir());

        dir.meta.write().mode = FileMode::directory(0o111);
        assert!(dir.snapshot().unwrap_err().is_permission_denied());
    }
}
