/*!
 * In-Memory Filesystem
 * The constructible filesystem context and its operation set
 */

mod dir_ops;
mod file_ops;
mod handle;
mod metadata_ops;
mod node;
mod resolve;

use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::types::{ErrorKind, FileMode, FsError, FsResult};
use node::Directory;
use resolve::{Breadcrumb, Crumb};

pub use handle::File;

/// An in-memory filesystem
///
/// Each instance is an independent tree rooted at a `drwxr-xr-x`
/// directory, with its own current working directory (initially the
/// root). Clones are cheap and share all state, so one tree can serve
/// many threads; see the crate docs for the locking model.
#[derive(Debug, Clone)]
pub struct MemFs {
    root: Crumb,
    cwd: Arc<RwLock<Crumb>>,
    size: Arc<SizeTracker>,
}

impl MemFs {
    /// Create an unbounded filesystem
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a filesystem that rejects growth past `max_bytes` of file
    /// content with `ErrorKind::OutOfSpace`
    pub fn with_capacity(max_bytes: usize) -> Self {
        Self::build(Some(max_bytes))
    }

    fn build(max_bytes: Option<usize>) -> Self {
        let root = Breadcrumb::root(Directory::new(FileMode::directory(0o755)));
        Self {
            cwd: Arc::new(RwLock::new(root.clone())),
            root,
            size: Arc::new(SizeTracker::new(max_bytes)),
        }
    }

    /// Total bytes of file content currently stored
    pub fn used_bytes(&self) -> usize {
        self.size.used()
    }

    pub(crate) fn root_crumb(&self) -> Crumb {
        self.root.clone()
    }

    /// Snapshot the current working directory pointer
    pub(crate) fn cwd_crumb(&self) -> Crumb {
        self.cwd.read().clone()
    }

    /// Swap the current working directory pointer
    pub(crate) fn set_cwd(&self, crumb: Crumb) {
        *self.cwd.write() = crumb;
    }

    pub(crate) fn tracker(&self) -> Arc<SizeTracker> {
        self.size.clone()
    }
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte accounting for bounded filesystems
///
/// Growth is reserved up front with a compare-exchange loop; releases
/// saturate at zero. Hard links can release the same bytes twice, so
/// the counter is a capacity guard rather than an exact ledger.
#[derive(Debug)]
pub(crate) struct SizeTracker {
    max: Option<usize>,
    current: AtomicUsize,
}

impl SizeTracker {
    fn new(max: Option<usize>) -> Self {
        Self {
            max,
            current: AtomicUsize::new(0),
        }
    }

    pub fn used(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Reserve additional bytes, failing when the capacity would be exceeded
    pub fn reserve(&self, additional: usize) -> FsResult<()> {
        if additional == 0 {
            return Ok(());
        }
        match self.max {
            None => {
                self.current.fetch_add(additional, Ordering::SeqCst);
                Ok(())
            }
            Some(max) => loop {
                let current = self.current.load(Ordering::SeqCst);
                let next = current.saturating_add(additional);
                if next > max {
                    return Err(FsError::new(ErrorKind::OutOfSpace));
                }
                if self
                    .current
                    .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    return Ok(());
                }
            },
        }
    }

    /// Return bytes to the pool, saturating at zero
    pub fn release(&self, amount: usize) {
        if amount == 0 {
            return;
        }
        let _ = self
            .current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_sub(amount))
            });
    }
}
