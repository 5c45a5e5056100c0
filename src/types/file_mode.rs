/*!
 * File Mode
 * Unix-style mode word: type bits, special bits, and rwx permissions
 */

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// File mode word
///
/// One `u32` carries the node type (directory / regular / symlink in the
/// `S_IFMT`-style high bits), the setuid/setgid/sticky bits, and the rwx
/// permission bits. Type bits are fixed at node creation; permission and
/// special bits are mutable via chmod.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileMode(u32);

impl FileMode {
    /// Mask selecting the node-type bits
    pub const TYPE_MASK: u32 = 0o170000;
    /// Directory type
    pub const DIR: u32 = 0o040000;
    /// Regular-file type
    pub const REGULAR: u32 = 0o100000;
    /// Symbolic-link type
    pub const SYMLINK: u32 = 0o120000;

    /// Set-user-id bit
    pub const SETUID: u32 = 0o4000;
    /// Set-group-id bit
    pub const SETGID: u32 = 0o2000;
    /// Sticky bit
    pub const STICKY: u32 = 0o1000;

    /// Mask selecting permission plus special bits (everything chmod touches)
    pub const PERM_MASK: u32 = 0o7777;

    const KNOWN_BITS: u32 = Self::TYPE_MASK | Self::PERM_MASK;

    /// Create a mode from raw bits, masking to the known bit set
    #[inline]
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self(bits & Self::KNOWN_BITS)
    }

    /// Regular-file mode with the given permission bits
    #[inline]
    #[must_use]
    pub const fn regular(perm: u32) -> Self {
        Self(Self::REGULAR | (perm & Self::PERM_MASK))
    }

    /// Directory mode with the given permission bits
    #[inline]
    #[must_use]
    pub const fn directory(perm: u32) -> Self {
        Self(Self::DIR | (perm & Self::PERM_MASK))
    }

    /// Symlink mode; permission bits are fixed at creation
    #[inline]
    #[must_use]
    pub const fn symlink() -> Self {
        Self(Self::SYMLINK | 0o777)
    }

    /// Raw mode bits
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Permission plus special bits only
    #[inline]
    #[must_use]
    pub const fn perm(self) -> u32 {
        self.0 & Self::PERM_MASK
    }

    /// Replace permission/special bits, preserving the type bits
    #[inline]
    #[must_use]
    pub const fn with_perm(self, perm: u32) -> Self {
        Self((self.0 & Self::TYPE_MASK) | (perm & Self::PERM_MASK))
    }

    #[inline]
    #[must_use]
    pub const fn is_dir(self) -> bool {
        self.0 & Self::TYPE_MASK == Self::DIR
    }

    #[inline]
    #[must_use]
    pub const fn is_file(self) -> bool {
        self.0 & Self::TYPE_MASK == Self::REGULAR
    }

    #[inline]
    #[must_use]
    pub const fn is_symlink(self) -> bool {
        self.0 & Self::TYPE_MASK == Self::SYMLINK
    }

    /// Check if any read bit is set
    ///
    /// # Performance
    /// Hot path - checked on every directory listing and content read
    #[inline(always)]
    #[must_use]
    pub const fn can_read(self) -> bool {
        self.0 & 0o444 != 0
    }

    /// Check if any write bit is set
    ///
    /// # Performance
    /// Hot path - checked on every mutation
    #[inline(always)]
    #[must_use]
    pub const fn can_write(self) -> bool {
        self.0 & 0o222 != 0
    }

    /// Check if any execute bit is set (directory traversal)
    ///
    /// # Performance
    /// Hot path - checked on every path segment walked
    #[inline(always)]
    #[must_use]
    pub const fn can_execute(self) -> bool {
        self.0 & 0o111 != 0
    }
}

impl fmt::Display for FileMode {
    /// Renders in `ls -l` style, e.g. `drwxr-xr-x`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_char = if self.is_dir() {
            'd'
        } else if self.is_symlink() {
            'l'
        } else {
            '-'
        };
        write!(f, "{type_char}")?;

        let perm = self.perm();
        for (shift, special, special_char) in [
            (6, Self::SETUID, 's'),
            (3, Self::SETGID, 's'),
            (0, Self::STICKY, 't'),
        ] {
            let rwx = (perm >> shift) & 0o7;
            f.write_str(if rwx & 0o4 != 0 { "r" } else { "-" })?;
            f.write_str(if rwx & 0o2 != 0 { "w" } else { "-" })?;
            let execute = rwx & 0o1 != 0;
            let last = match (perm & special != 0, execute) {
                (true, true) => special_char,
                (true, false) => special_char.to_ascii_uppercase(),
                (false, true) => 'x',
                (false, false) => '-',
            };
            write!(f, "{last}")?;
        }
        Ok(())
    }
}

impl Serialize for FileMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for FileMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        if bits & !Self::KNOWN_BITS != 0 {
            return Err(serde::de::Error::custom(format!(
                "invalid mode bits: 0o{bits:o}"
            )));
        }
        Ok(Self(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_bits() {
        assert!(FileMode::directory(0o755).is_dir());
        assert!(FileMode::regular(0o644).is_file());
        assert!(FileMode::symlink().is_symlink());
        assert!(!FileMode::regular(0o644).is_dir());
    }

    #[test]
    fn test_permission_predicates() {
        let mode = FileMode::regular(0o444);
        assert!(mode.can_read());
        assert!(!mode.can_write());
        assert!(!mode.can_execute());

        let mode = FileMode::directory(0o000);
        assert!(!mode.can_read());
        assert!(!mode.can_write());
        assert!(!mode.can_execute());

        // Any permission class grants
        let mode = FileMode::regular(0o002);
        assert!(mode.can_write());
    }

    #[test]
    fn test_with_perm_preserves_type() {
        let mode = FileMode::directory(0o755).with_perm(0o500);
        assert!(mode.is_dir());
        assert_eq!(mode.perm(), 0o500);

        // Special bits travel with perm
        let mode = FileMode::regular(0o644).with_perm(0o4755);
        assert_eq!(mode.perm(), 0o4755);
        assert!(mode.is_file());
    }

    #[test]
    fn test_display() {
        assert_eq!(FileMode::directory(0o755).to_string(), "drwxr-xr-x");
        assert_eq!(FileMode::regular(0o644).to_string(), "-rw-r--r--");
        assert_eq!(FileMode::symlink().to_string(), "lrwxrwxrwx");
        assert_eq!(
            FileMode::regular(0o4755).to_string(),
            "-rwsr-xr-x"
        );
        assert_eq!(
            FileMode::directory(0o1777).to_string(),
            "drwxrwxrwt"
        );
    }

    #[test]
    fn test_serialization() {
        let mode = FileMode::directory(0o755);
        let json = serde_json::to_string(&mode).unwrap();
        let restored: FileMode = serde_json::from_str(&json).unwrap();
        assert_eq!(mode, restored);

        // Unknown bits rejected
        let result: Result<FileMode, _> = serde_json::from_str("4294967295");
        assert!(result.is_err());
    }
}
