/*!
 * File Store
 * Flat in-memory namespace that hands out open file descriptions
 */

use super::file::{FileNode, OpenFileDescription};
use super::types::{FileError, FileResult, FileStat, OpenFlags};
use dashmap::DashMap;
use log::info;
use std::sync::Arc;

/// Flat file namespace
///
/// Clones share the same files, the way every process shares one kernel
/// file table.
pub struct FileStore {
    nodes: Arc<DashMap<String, Arc<FileNode>>>,
}

impl FileStore {
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(DashMap::new()),
        }
    }

    /// Open a path, producing a fresh open file description.
    ///
    /// Two separate opens of the same path get independent cursors; only
    /// duplication of a descriptor table shares one.
    pub fn open(&self, path: &str, flags: OpenFlags) -> FileResult<Arc<OpenFileDescription>> {
        let node = match self.nodes.get(path) {
            Some(entry) => Arc::clone(entry.value()),
            None => {
                if !flags.create {
                    return Err(FileError::NotFound(path.to_string()));
                }
                let node = Arc::new(FileNode::new(path));
                self.nodes.insert(path.to_string(), Arc::clone(&node));
                info!("Created file {}", path);
                node
            }
        };

        if flags.truncate {
            node.truncate();
        }

        Ok(Arc::new(OpenFileDescription::new(node, flags)))
    }

    /// Full contents of a file, for inspection
    pub fn contents(&self, path: &str) -> FileResult<Vec<u8>> {
        self.nodes
            .get(path)
            .map(|entry| entry.value().contents())
            .ok_or_else(|| FileError::NotFound(path.to_string()))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn stat(&self, path: &str) -> FileResult<FileStat> {
        self.nodes
            .get(path)
            .map(|entry| FileStat {
                path: path.to_string(),
                len: entry.value().len(),
            })
            .ok_or_else(|| FileError::NotFound(path.to_string()))
    }

    pub fn list(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.nodes.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }
}

impl Clone for FileStore {
    fn clone(&self) -> Self {
        Self {
            nodes: Arc::clone(&self.nodes),
        }
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}
