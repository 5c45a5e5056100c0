/*!
 * Open File Handles
 * Flag-restricted cursor I/O over file content and directory snapshots
 */

use std::io::{self, SeekFrom};
use std::sync::Arc;
use std::time::SystemTime;

use super::node::{Directory, FileNode, Node};
use super::resolve::base_name;
use super::SizeTracker;
use crate::types::{ErrorKind, FsError, FsResult, Metadata};

/// An open file handle
///
/// Created by `MemFs::open`/`create`/`open_file`. Regular-file handles
/// expose cursor and at-offset I/O restricted by the access derived from
/// the open flags; directory handles expose a listing snapshot taken at
/// open time. Every operation after `close` fails with `Closed`.
#[derive(Debug)]
pub struct File {
    name: String,
    inner: Option<Inner>,
}

#[derive(Debug)]
enum Inner {
    File {
        node: Arc<FileNode>,
        read: bool,
        write: bool,
        append: bool,
        pos: u64,
        tracker: Arc<SizeTracker>,
    },
    Dir {
        node: Arc<Directory>,
        entries: Vec<Metadata>,
        pos: usize,
    },
}

impl File {
    pub(crate) fn regular(
        name: String,
        node: Arc<FileNode>,
        read: bool,
        write: bool,
        append: bool,
        pos: u64,
        tracker: Arc<SizeTracker>,
    ) -> Self {
        Self {
            name,
            inner: Some(Inner::File {
                node,
                read,
                write,
                append,
                pos,
                tracker,
            }),
        }
    }

    pub(crate) fn directory(name: String, node: Arc<Directory>, entries: Vec<Metadata>) -> Self {
        Self {
            name,
            inner: Some(Inner::Dir {
                node,
                entries,
                pos: 0,
            }),
        }
    }

    /// The path this handle was opened with
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn err(&self, op: &str, kind: ErrorKind) -> FsError {
        FsError::path(op, &self.name, kind)
    }

    fn inner(&self, op: &str) -> FsResult<&Inner> {
        self.inner.as_ref().ok_or_else(|| self.err(op, ErrorKind::Closed))
    }

    fn inner_mut(&mut self, op: &str) -> FsResult<&mut Inner> {
        match self.inner.as_mut() {
            Some(inner) => Ok(inner),
            None => Err(FsError::path(op, &self.name, ErrorKind::Closed)),
        }
    }

    /// Read from the cursor, advancing it; `Ok(0)` signals end of content
    pub fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        let name = self.name.clone();
        match self.inner_mut("read")? {
            Inner::Dir { .. } => Err(FsError::path("read", name, ErrorKind::IsADirectory)),
            Inner::File {
                node, read, pos, ..
            } => {
                if !*read {
                    return Err(FsError::path("read", name, ErrorKind::PermissionDenied));
                }
                let n = read_at_offset(node, buf, *pos);
                *pos += n as u64;
                Ok(n)
            }
        }
    }

    /// Read at an absolute offset without moving the cursor
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> FsResult<usize> {
        match self.inner("read")? {
            Inner::Dir { .. } => Err(self.err("read", ErrorKind::IsADirectory)),
            Inner::File { node, read, .. } => {
                if !*read {
                    return Err(self.err("read", ErrorKind::PermissionDenied));
                }
                Ok(read_at_offset(node, buf, offset))
            }
        }
    }

    /// Write at the cursor, growing the buffer as needed
    ///
    /// A cursor past the end zero-fills the gap first; append handles
    /// move the cursor to the end before every write.
    pub fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        let name = self.name.clone();
        match self.inner_mut("write")? {
            Inner::Dir { .. } => Err(FsError::path("write", name, ErrorKind::IsADirectory)),
            Inner::File {
                node,
                read: _,
                write,
                append,
                pos,
                tracker,
            } => {
                if !*write {
                    return Err(FsError::path("write", name, ErrorKind::PermissionDenied));
                }
                let mut data = node.data.write();
                if *append {
                    *pos = data.len() as u64;
                }
                let n = write_at_offset(node, &mut data, buf, *pos, tracker)
                    .map_err(|e| e.in_op("write", &name))?;
                *pos += n as u64;
                Ok(n)
            }
        }
    }

    /// Write at an absolute offset without moving the cursor
    pub fn write_at(&self, buf: &[u8], offset: u64) -> FsResult<usize> {
        match self.inner("write")? {
            Inner::Dir { .. } => Err(self.err("write", ErrorKind::IsADirectory)),
            Inner::File {
                node,
                write,
                tracker,
                ..
            } => {
                if !*write {
                    return Err(self.err("write", ErrorKind::PermissionDenied));
                }
                let mut data = node.data.write();
                write_at_offset(node, &mut data, buf, offset, tracker)
                    .map_err(|e| e.in_op("write", &self.name))
            }
        }
    }

    /// Write a string at the cursor
    pub fn write_str(&mut self, s: &str) -> FsResult<usize> {
        self.write(s.as_bytes())
    }

    /// Reposition the cursor; directory handles may only rewind to the start
    ///
    /// Seeking past the end is permitted; content is only extended by a
    /// later write.
    pub fn seek(&mut self, seek: SeekFrom) -> FsResult<u64> {
        let name = self.name.clone();
        match self.inner_mut("seek")? {
            Inner::Dir { pos, .. } => match seek {
                SeekFrom::Start(0) => {
                    *pos = 0;
                    Ok(0)
                }
                _ => Err(FsError::path("seek", name, ErrorKind::IsADirectory)),
            },
            Inner::File { node, pos, .. } => {
                let target = match seek {
                    SeekFrom::Start(offset) => offset as i64,
                    SeekFrom::Current(delta) => *pos as i64 + delta,
                    SeekFrom::End(delta) => node.size() as i64 + delta,
                };
                if target < 0 {
                    return Err(FsError::path("seek", name, ErrorKind::Invalid));
                }
                *pos = target as u64;
                Ok(*pos)
            }
        }
    }

    /// Resize content: zero-padded on grow, discarded on shrink
    pub fn truncate(&self, size: u64) -> FsResult<()> {
        match self.inner("truncate")? {
            Inner::Dir { .. } => Err(self.err("truncate", ErrorKind::IsADirectory)),
            Inner::File {
                node,
                write,
                tracker,
                ..
            } => {
                if !*write {
                    return Err(self.err("truncate", ErrorKind::PermissionDenied));
                }
                resize_content(node, size, tracker).map_err(|e| e.in_op("truncate", &self.name))
            }
        }
    }

    /// Up to `n` entries from the open-time snapshot (`None` drains the
    /// remainder); an empty vector signals exhaustion
    pub fn readdir(&mut self, n: Option<usize>) -> FsResult<Vec<Metadata>> {
        let name = self.name.clone();
        match self.inner_mut("readdir")? {
            Inner::File { .. } => {
                Err(FsError::path("readdir", name, ErrorKind::NotADirectory))
            }
            Inner::Dir { entries, pos, .. } => {
                let remaining = entries.len() - *pos;
                let take = n.map_or(remaining, |n| n.min(remaining));
                let batch = entries[*pos..*pos + take].to_vec();
                *pos += take;
                Ok(batch)
            }
        }
    }

    /// Like `readdir`, returning entry names only
    pub fn readdirnames(&mut self, n: Option<usize>) -> FsResult<Vec<String>> {
        Ok(self.readdir(n)?.into_iter().map(|e| e.name).collect())
    }

    /// The stat record of the underlying node
    pub fn stat(&self) -> FsResult<Metadata> {
        let base = base_name(&self.name);
        match self.inner("stat")? {
            Inner::File { node, .. } => Ok(Node::File(node.clone()).metadata(base)),
            Inner::Dir { node, .. } => Ok(Node::Directory(node.clone()).metadata(base)),
        }
    }

    /// No-op: content already lives in its final (memory) location
    pub fn sync(&self) -> FsResult<()> {
        self.inner("sync").map(|_| ())
    }

    /// Release the handle; all later operations fail with `Closed`
    pub fn close(&mut self) -> FsResult<()> {
        match self.inner.take() {
            Some(_) => Ok(()),
            None => Err(self.err("close", ErrorKind::Closed)),
        }
    }
}

fn read_at_offset(node: &FileNode, buf: &mut [u8], offset: u64) -> usize {
    let data = node.data.read();
    let len = data.len() as u64;
    if offset >= len {
        return 0;
    }
    let start = offset as usize;
    let n = buf.len().min(data.len() - start);
    buf[..n].copy_from_slice(&data[start..start + n]);
    n
}

/// Shared write path: reserves growth, zero-fills any gap, stamps mtime.
/// Takes the already-held data guard so cursor writes stay atomic with
/// their append repositioning.
fn write_at_offset(
    node: &FileNode,
    data: &mut Vec<u8>,
    buf: &[u8],
    offset: u64,
    tracker: &SizeTracker,
) -> FsResult<usize> {
    let start = offset as usize;
    let end = start + buf.len();
    if end > data.len() {
        tracker.reserve(end - data.len())?;
        data.resize(end, 0);
    }
    data[start..end].copy_from_slice(buf);
    node.meta.write().modified = SystemTime::now();
    Ok(buf.len())
}

pub(super) fn resize_content(node: &FileNode, size: u64, tracker: &SizeTracker) -> FsResult<()> {
    let size = size as usize;
    let mut data = node.data.write();
    if size > data.len() {
        tracker.reserve(size - data.len())?;
    } else {
        tracker.release(data.len() - size);
    }
    data.resize(size, 0);
    node.meta.write().modified = SystemTime::now();
    Ok(())
}

impl io::Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        File::read(self, buf).map_err(Into::into)
    }
}

impl io::Write for File {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        File::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        File::seek(self, pos).map_err(Into::into)
    }
}
