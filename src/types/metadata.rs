/*!
 * Node Metadata
 * The stat record: name, size, mode, and modification time
 */

use super::file_mode::FileMode;
use crate::core::serde::{is_zero_u64, system_time_micros};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// File metadata as reported by stat/lstat and directory listings
///
/// Timestamps serialize as microseconds since the UNIX epoch; zero sizes
/// are skipped to keep representations compact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Metadata {
    pub name: String,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub size: u64,
    pub mode: FileMode,
    #[serde(with = "system_time_micros")]
    pub modified: SystemTime,
}

impl Metadata {
    /// Check if this is a directory
    ///
    /// # Performance
    /// Hot path - frequently called in path resolution
    #[inline(always)]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }

    /// Check if this is a regular file
    #[inline(always)]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        self.mode.is_file()
    }

    /// Check if this is a symbolic link
    #[inline(always)]
    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        self.mode.is_symlink()
    }

    /// Permission plus special bits of the mode
    #[inline]
    #[must_use]
    pub const fn perm(&self) -> u32 {
        self.mode.perm()
    }
}
