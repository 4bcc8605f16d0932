/*!
 * File Node and Open File Description
 * The kernel-object half of the descriptor model
 *
 * A `FileNode` is the file's contents. An `OpenFileDescription` is the
 * kernel object an `open` produces: flags plus a cursor into one node.
 * Descriptor tables hold `Arc<OpenFileDescription>`, so duplicating a
 * table shares the description (and with it the offset) while the
 * handles themselves stay per-process.
 */

use super::types::{FileError, FileResult, OpenFlags};
use crate::core::types::Size;
use parking_lot::Mutex;
use std::sync::Arc;

/// In-memory file contents
pub struct FileNode {
    path: String,
    data: Mutex<Vec<u8>>,
}

impl FileNode {
    pub(super) fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn len(&self) -> Size {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    /// Snapshot of the full contents
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    pub(super) fn truncate(&self) {
        self.data.lock().clear();
    }

    /// Write at an absolute offset, zero-filling any gap past end-of-file.
    /// Overwrites whatever the range previously held.
    fn write_at(&self, offset: Size, bytes: &[u8]) {
        let mut data = self.data.lock();
        let end = offset + bytes.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[offset..end].copy_from_slice(bytes);
    }
}

impl std::fmt::Debug for FileNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileNode")
            .field("path", &self.path)
            .field("len", &self.len())
            .finish()
    }
}

/// Kernel-level open file description: flags plus a cursor shared by every
/// descriptor-table entry that references it
pub struct OpenFileDescription {
    flags: OpenFlags,
    node: Arc<FileNode>,
    offset: Mutex<Size>,
}

impl OpenFileDescription {
    pub(super) fn new(node: Arc<FileNode>, flags: OpenFlags) -> Self {
        Self {
            flags,
            node,
            offset: Mutex::new(0),
        }
    }

    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    pub fn path(&self) -> &str {
        self.node.path()
    }

    pub fn node(&self) -> &Arc<FileNode> {
        &self.node
    }

    /// Current value of the shared cursor
    pub fn offset(&self) -> Size {
        *self.offset.lock()
    }

    /// Write through the description.
    ///
    /// Append mode positions at end-of-file, writes, and advances the cursor
    /// as one atomic step relative to every sharer: concurrent whole-record
    /// writes never overlap, though their order is unspecified. Without
    /// append the three steps run as separate critical sections (exactly
    /// `stage_write().commit(bytes)`) and sharers can interleave between
    /// them, overwriting each other.
    pub fn write(self: &Arc<Self>, bytes: &[u8]) -> FileResult<Size> {
        if !self.flags.write {
            return Err(FileError::PermissionDenied(format!(
                "{} not opened for writing",
                self.path()
            )));
        }

        if self.flags.append {
            // Lock order: node data, then offset
            let mut data = self.node.data.lock();
            let mut offset = self.offset.lock();
            let end = data.len();
            data.extend_from_slice(bytes);
            *offset = end + bytes.len();
            Ok(bytes.len())
        } else {
            self.stage_write()?.commit(bytes)
        }
    }

    /// First step of a non-append write: capture the shared cursor.
    ///
    /// The remaining two steps run at `commit`. Two sharers that both stage
    /// before either commits capture the same offset and will overwrite
    /// each other, the reproducible form of the non-append race.
    pub fn stage_write(self: &Arc<Self>) -> FileResult<StagedWrite> {
        if !self.flags.write {
            return Err(FileError::PermissionDenied(format!(
                "{} not opened for writing",
                self.path()
            )));
        }
        let offset = *self.offset.lock();
        Ok(StagedWrite {
            description: Arc::clone(self),
            offset,
        })
    }

    /// Read from the shared cursor and advance it. Returns an empty vector
    /// at end-of-file.
    pub fn read(&self, max: Size) -> FileResult<Vec<u8>> {
        if !self.flags.read {
            return Err(FileError::PermissionDenied(format!(
                "{} not opened for reading",
                self.path()
            )));
        }
        // Lock order: node data, then offset (same as the append path)
        let data = self.node.data.lock();
        let mut offset = self.offset.lock();
        let start = (*offset).min(data.len());
        let end = (start + max).min(data.len());
        let bytes = data[start..end].to_vec();
        *offset += bytes.len();
        Ok(bytes)
    }
}

impl std::fmt::Debug for OpenFileDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenFileDescription")
            .field("path", &self.path())
            .field("flags", &self.flags)
            .field("offset", &self.offset())
            .finish()
    }
}

/// A non-append write caught between its offset read and its data write
pub struct StagedWrite {
    description: Arc<OpenFileDescription>,
    offset: Size,
}

impl StagedWrite {
    /// The cursor value captured at stage time
    pub fn staged_offset(&self) -> Size {
        self.offset
    }

    /// Steps two and three: write at the captured offset, then advance the
    /// shared cursor past what was written. Anything other sharers wrote in
    /// the meantime is overwritten.
    pub fn commit(self, bytes: &[u8]) -> FileResult<Size> {
        self.description.node.write_at(self.offset, bytes);
        *self.description.offset.lock() = self.offset + bytes.len();
        Ok(bytes.len())
    }
}
