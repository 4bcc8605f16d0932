/*!
 * Program Registry
 * The namespace of executable images exec can resolve against
 *
 * Entries distinguish the three ways resolution can go wrong: the path is
 * absent (`NotFound`), present but not executable (`PermissionDenied`),
 * or executable but not a loadable program (`ExecFormat`).
 */

use super::types::{ExecError, ExecResult, ResolutionMode};
use crate::core::types::ExitCode;
use crate::process::ProcessContext;
use dashmap::DashMap;
use log::info;
use parking_lot::RwLock;
use std::sync::Arc;

/// A registered program's body, run when exec lands on it. Its return
/// value is the new image's exit code.
pub type ProgramBody = Arc<dyn Fn(&ProcessContext) -> ExitCode + Send + Sync>;

#[derive(Clone)]
struct ImageEntry {
    executable: bool,
    body: Option<ProgramBody>,
}

/// Registry of installable program images plus the ordered search path
/// used by path-search resolution
pub struct ProgramRegistry {
    images: Arc<DashMap<String, ImageEntry>>,
    search_path: Arc<RwLock<Vec<String>>>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self {
            images: Arc::new(DashMap::new()),
            search_path: Arc::new(RwLock::new(vec![
                "/bin".to_string(),
                "/usr/bin".to_string(),
            ])),
        }
    }

    /// Install an executable program image at `path`
    pub fn install<F>(&self, path: impl Into<String>, body: F)
    where
        F: Fn(&ProcessContext) -> ExitCode + Send + Sync + 'static,
    {
        let path = path.into();
        info!("Installed program {}", path);
        self.images.insert(
            path,
            ImageEntry {
                executable: true,
                body: Some(Arc::new(body)),
            },
        );
    }

    /// Install something occupying a path with the executable bit set but
    /// no loadable image behind it: resolution reaches it and fails with
    /// `ExecFormat`
    pub fn install_data(&self, path: impl Into<String>) {
        self.images.insert(
            path.into(),
            ImageEntry {
                executable: true,
                body: None,
            },
        );
    }

    /// Install a program with the executable bit cleared: resolution
    /// reaches it and fails with `PermissionDenied`
    pub fn install_no_exec(&self, path: impl Into<String>) {
        self.images.insert(
            path.into(),
            ImageEntry {
                executable: false,
                body: None,
            },
        );
    }

    pub fn set_search_path(&self, dirs: Vec<String>) {
        *self.search_path.write() = dirs;
    }

    pub fn search_path(&self) -> Vec<String> {
        self.search_path.read().clone()
    }

    /// Sorted list of every registered path
    pub fn list(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.images.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Resolve a program operand to the path and body exec will enter.
    /// Every failure is reported before anything about the caller changes.
    pub fn resolve(
        &self,
        program: &str,
        mode: ResolutionMode,
    ) -> ExecResult<(String, ProgramBody)> {
        let path = match mode {
            ResolutionMode::Direct => program.to_string(),
            ResolutionMode::PathSearch => {
                if program.contains('/') {
                    program.to_string()
                } else {
                    self.search(program)?
                }
            }
        };
        self.load(&path)
    }

    /// First directory in the search path holding the name wins
    fn search(&self, name: &str) -> ExecResult<String> {
        let dirs = self.search_path.read();
        for dir in dirs.iter() {
            let candidate = format!("{}/{}", dir.trim_end_matches('/'), name);
            if self.images.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(ExecError::NotFound(name.to_string()))
    }

    fn load(&self, path: &str) -> ExecResult<(String, ProgramBody)> {
        let entry = self
            .images
            .get(path)
            .ok_or_else(|| ExecError::NotFound(path.to_string()))?;
        if !entry.executable {
            return Err(ExecError::PermissionDenied(path.to_string()));
        }
        match &entry.body {
            Some(body) => Ok((path.to_string(), Arc::clone(body))),
            None => Err(ExecError::ExecFormat(path.to_string())),
        }
    }
}

impl Clone for ProgramRegistry {
    fn clone(&self) -> Self {
        Self {
            images: Arc::clone(&self.images),
            search_path: Arc::clone(&self.search_path),
        }
    }
}

impl Default for ProgramRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_resolution() {
        let registry = ProgramRegistry::new();
        registry.install("/bin/true", |_| 0);

        assert!(registry.resolve("/bin/true", ResolutionMode::Direct).is_ok());
        assert!(matches!(
            registry.resolve("true", ResolutionMode::Direct),
            Err(ExecError::NotFound(_))
        ));
    }

    #[test]
    fn test_search_path_order_first_match_wins() {
        let registry = ProgramRegistry::new();
        registry.install("/bin/tool", |_| 1);
        registry.install("/usr/bin/tool", |_| 2);

        let (path, _) = registry.resolve("tool", ResolutionMode::PathSearch).unwrap();
        assert_eq!(path, "/bin/tool");
    }

    #[test]
    fn test_path_search_with_slash_skips_search() {
        let registry = ProgramRegistry::new();
        registry.install("/opt/tool", |_| 0);
        registry.set_search_path(vec!["/bin".to_string()]);

        let (path, _) = registry
            .resolve("/opt/tool", ResolutionMode::PathSearch)
            .unwrap();
        assert_eq!(path, "/opt/tool");
    }

    #[test]
    fn test_not_executable() {
        let registry = ProgramRegistry::new();
        registry.install_no_exec("/bin/locked");
        assert!(matches!(
            registry.resolve("/bin/locked", ResolutionMode::Direct),
            Err(ExecError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_bad_image_format() {
        let registry = ProgramRegistry::new();
        registry.install_data("/bin/garbage");
        assert!(matches!(
            registry.resolve("/bin/garbage", ResolutionMode::Direct),
            Err(ExecError::ExecFormat(_))
        ));
    }
}
