/*!
 * Open Flags
 * Flags controlling how a file is opened
 */

use super::errors::{ErrorKind, FsError};
use crate::core::serde::is_false;
use serde::{Deserialize, Serialize};

/// File open flags with optimized serialization (skips false values)
///
/// Only true flags are serialized, keeping JSON representations compact.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", default, deny_unknown_fields)]
pub struct OpenFlags {
    #[serde(skip_serializing_if = "is_false")]
    pub read: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub write: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub append: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub truncate: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub create: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub create_new: bool,
}

impl OpenFlags {
    /// Create read-only flags
    #[inline]
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Default::default()
        }
    }

    /// Create write-only flags
    #[inline]
    #[must_use]
    pub fn write_only() -> Self {
        Self {
            write: true,
            ..Default::default()
        }
    }

    /// Create read-write flags
    #[inline]
    #[must_use]
    pub fn read_write() -> Self {
        Self {
            read: true,
            write: true,
            ..Default::default()
        }
    }

    /// Flags for creating a file, truncating it if present (read-write)
    #[inline]
    #[must_use]
    pub fn create() -> Self {
        Self {
            read: true,
            write: true,
            create: true,
            truncate: true,
            ..Default::default()
        }
    }

    /// Flags for creating a new file exclusively (write + create_new)
    #[inline]
    #[must_use]
    pub fn create_new() -> Self {
        Self {
            write: true,
            create_new: true,
            ..Default::default()
        }
    }

    /// Flags for appending (write + append)
    #[inline]
    #[must_use]
    pub fn append_only() -> Self {
        Self {
            write: true,
            append: true,
            ..Default::default()
        }
    }

    /// Check if any write operation is possible
    #[inline]
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.write || self.append
    }

    /// Check if this will create a file
    #[inline]
    #[must_use]
    pub const fn will_create(&self) -> bool {
        self.create || self.create_new
    }

    /// Convert from POSIX-style flags (O_RDONLY, O_WRONLY, O_RDWR, etc.)
    pub fn from_posix(flags: u32) -> Self {
        // Access mode lives in the lower 2 bits: 0 = read, 1 = write, 2 = both
        let access_mode = flags & 0x0003;
        let read = access_mode == 0x0000 || access_mode == 0x0002;
        let write = access_mode == 0x0001 || access_mode == 0x0002;
        let append = flags & 0x0400 != 0;
        let truncate = flags & 0x0200 != 0;
        let create = flags & 0x0040 != 0;
        let create_new = flags & 0x0080 != 0;

        Self {
            read,
            write: write || append,
            append,
            truncate,
            create,
            create_new,
        }
    }

    /// Convert to POSIX-style flags
    pub fn to_posix(&self) -> u32 {
        let mut flags = match (self.read, self.write || self.append) {
            (_, false) => 0x0000,     // O_RDONLY
            (false, true) => 0x0001,  // O_WRONLY
            (true, true) => 0x0002,   // O_RDWR
        };

        if self.append {
            flags |= 0x0400; // O_APPEND
        }
        if self.truncate {
            flags |= 0x0200; // O_TRUNC
        }
        if self.create {
            flags |= 0x0040; // O_CREAT
        }
        if self.create_new {
            flags |= 0x0080; // O_EXCL
        }

        flags
    }

    /// Validate flag combinations
    #[must_use = "validation result must be checked"]
    pub fn validate(&self) -> Result<(), FsError> {
        if self.create_new && !self.is_writable() {
            return Err(FsError::new(ErrorKind::Invalid));
        }
        if self.truncate && !self.write {
            return Err(FsError::new(ErrorKind::Invalid));
        }
        if self.append && self.truncate {
            return Err(FsError::new(ErrorKind::Invalid));
        }
        Ok(())
    }
}
