/*!
 * Descriptor Table
 * Per-process mapping from small integer handles to open file descriptions
 */

use super::file::OpenFileDescription;
use super::store::FileStore;
use super::types::{FileError, FileResult, OpenFlags};
use crate::core::types::Fd;
use std::collections::HashMap;
use std::sync::Arc;

pub const STDIN_FD: Fd = 0;
pub const STDOUT_FD: Fd = 1;
pub const STDERR_FD: Fd = 2;

/// Per-process descriptor table
///
/// `duplicate` copies the handle map, not the descriptions: both tables end
/// up referencing the same `OpenFileDescription` objects, so offsets stay
/// shared while closes stay private to each copy.
#[derive(Debug)]
pub struct DescriptorTable {
    entries: HashMap<Fd, Arc<OpenFileDescription>>,
    next_fd: Fd,
}

impl DescriptorTable {
    /// Empty table; handles start at `first_user_fd`
    pub fn new(first_user_fd: Fd) -> Self {
        Self {
            entries: HashMap::new(),
            next_fd: first_user_fd,
        }
    }

    /// Table with the stdio convention: 0 reads /dev/stdin, 1 and 2 append
    /// to /dev/stdout and /dev/stderr
    pub fn with_stdio(store: &FileStore, first_user_fd: Fd) -> FileResult<Self> {
        let mut table = Self::new(first_user_fd);
        let stdin = store.open("/dev/stdin", OpenFlags::read_only().with_create())?;
        let stdout = store.open(
            "/dev/stdout",
            OpenFlags::write_only().with_create().with_append(),
        )?;
        let stderr = store.open(
            "/dev/stderr",
            OpenFlags::write_only().with_create().with_append(),
        )?;
        table.insert_at(STDIN_FD, stdin);
        table.insert_at(STDOUT_FD, stdout);
        table.insert_at(STDERR_FD, stderr);
        Ok(table)
    }

    /// Install a description under the next free handle
    pub fn install(&mut self, description: Arc<OpenFileDescription>) -> Fd {
        let fd = self.next_fd;
        self.next_fd += 1;
        self.entries.insert(fd, description);
        fd
    }

    /// Install a description under a specific handle, replacing any
    /// previous entry (dup2-style)
    pub fn insert_at(&mut self, fd: Fd, description: Arc<OpenFileDescription>) {
        self.entries.insert(fd, description);
        if fd >= self.next_fd {
            self.next_fd = fd + 1;
        }
    }

    pub fn get(&self, fd: Fd) -> FileResult<Arc<OpenFileDescription>> {
        self.entries
            .get(&fd)
            .map(Arc::clone)
            .ok_or(FileError::BadDescriptor(fd))
    }

    /// Remove a handle. The description itself lives on for as long as any
    /// other handle, in this table or a duplicate, still references it.
    pub fn close(&mut self, fd: Fd) -> FileResult<()> {
        self.entries
            .remove(&fd)
            .map(|_| ())
            .ok_or(FileError::BadDescriptor(fd))
    }

    /// New handle referencing the same description (dup-style): the cursor
    /// is shared between the two handles
    pub fn dup(&mut self, fd: Fd) -> FileResult<Fd> {
        let description = self.get(fd)?;
        Ok(self.install(description))
    }

    /// Fork-time shallow copy: same descriptions, separate handle map
    pub fn duplicate(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(fd, description)| (*fd, Arc::clone(description)))
                .collect(),
            next_fd: self.next_fd,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_file(store: &FileStore, path: &str) -> (DescriptorTable, Fd) {
        let mut table = DescriptorTable::new(3);
        let ofd = store
            .open(path, OpenFlags::read_write().with_create())
            .unwrap();
        let fd = table.install(ofd);
        (table, fd)
    }

    #[test]
    fn test_handles_start_at_first_user_fd() {
        let store = FileStore::new();
        let (_, fd) = table_with_file(&store, "/tmp/x");
        assert_eq!(fd, 3);
    }

    #[test]
    fn test_duplicate_shares_description() {
        let store = FileStore::new();
        let (table, fd) = table_with_file(&store, "/tmp/y");
        let copy = table.duplicate();

        table.get(fd).unwrap().write(b"abc").unwrap();
        // The duplicated table's handle sees the advanced cursor
        assert_eq!(copy.get(fd).unwrap().offset(), 3);
    }

    #[test]
    fn test_close_is_private_to_each_copy() {
        let store = FileStore::new();
        let (mut table, fd) = table_with_file(&store, "/tmp/z");
        let copy = table.duplicate();

        table.close(fd).unwrap();
        assert!(matches!(table.get(fd), Err(FileError::BadDescriptor(_))));
        assert!(copy.get(fd).is_ok());
    }

    #[test]
    fn test_dup_shares_cursor() {
        let store = FileStore::new();
        let (mut table, fd) = table_with_file(&store, "/tmp/w");
        let dup_fd = table.dup(fd).unwrap();
        assert_ne!(fd, dup_fd);

        table.get(fd).unwrap().write(b"1234").unwrap();
        assert_eq!(table.get(dup_fd).unwrap().offset(), 4);
    }

    #[test]
    fn test_close_unknown_handle() {
        let mut table = DescriptorTable::new(3);
        assert!(matches!(table.close(9), Err(FileError::BadDescriptor(9))));
    }
}
