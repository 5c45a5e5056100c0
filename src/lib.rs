/*!
 * In-Memory Filesystem Engine
 * POSIX-flavored filesystem semantics over in-memory state
 *
 * All filesystem state lives in process memory: a hierarchical node tree
 * (directories, regular files, symbolic links), breadcrumb-based path
 * resolution with symlink following and working-directory tracking, rwx
 * permission enforcement, and open-file handles with flag-derived access
 * restrictions. Nothing touches real storage.
 *
 * Each `MemFs` is an independent filesystem; clones share state, so a
 * single tree can be handed to many threads.
 */

pub mod core;
pub mod fs;
pub mod types;

// Re-exports
pub use fs::{File, MemFs};
pub use types::{ErrorKind, FileMode, FsError, FsResult, Metadata, OpenFlags};
