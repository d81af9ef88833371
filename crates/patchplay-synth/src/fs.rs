//! In-memory filesystem handed to the engine.

use std::collections::{BTreeMap, BTreeSet};

use patchplay_core::{FsError, VirtualFs};

/// Flat map of absolute paths to file contents, plus the set of directories.
///
/// Paths are absolute and `/`-separated. `.` and `..` components are
/// rejected rather than resolved.
#[derive(Debug, Clone)]
pub struct MemFs {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
}

impl Default for MemFs {
    fn default() -> Self {
        Self {
            dirs: BTreeSet::from(["/".to_string()]),
            files: BTreeMap::new(),
        }
    }
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical form of `path`, e.g. `a//b/` becomes `/a/b`.
    fn normalize(path: &str) -> Result<String, FsError> {
        let mut out = String::new();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            if component == "." || component == ".." {
                return Err(FsError::InvalidPath(path.to_string()));
            }
            out.push('/');
            out.push_str(component);
        }
        if out.is_empty() {
            out.push('/');
        }
        Ok(out)
    }

    fn parent(path: &str) -> &str {
        match path.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &path[..idx],
        }
    }

    fn check_parent(&self, path: &str) -> Result<(), FsError> {
        let parent = Self::parent(path);
        if self.dirs.contains(parent) {
            Ok(())
        } else if self.files.contains_key(parent) {
            Err(FsError::NotADirectory(parent.to_string()))
        } else {
            Err(FsError::NotFound(parent.to_string()))
        }
    }

    pub fn is_dir(&self, path: &str) -> bool {
        Self::normalize(path).is_ok_and(|p| self.dirs.contains(&p))
    }

    /// Paths of every stored file, sorted.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

impl VirtualFs for MemFs {
    fn mkdir(&mut self, path: &str) -> Result<(), FsError> {
        let path = Self::normalize(path)?;
        if self.dirs.contains(&path) || self.files.contains_key(&path) {
            return Err(FsError::AlreadyExists(path));
        }
        self.check_parent(&path)?;
        self.dirs.insert(path);
        Ok(())
    }

    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let path = Self::normalize(path)?;
        if self.dirs.contains(&path) {
            return Err(FsError::InvalidPath(path));
        }
        self.check_parent(&path)?;
        self.files.insert(path, data.to_vec());
        Ok(())
    }

    fn read_file(&self, path: &str) -> Option<&[u8]> {
        let path = Self::normalize(path).ok()?;
        self.files.get(&path).map(Vec::as_slice)
    }

    fn exists(&self, path: &str) -> bool {
        Self::normalize(path).is_ok_and(|p| self.dirs.contains(&p) || self.files.contains_key(&p))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_root_exists() {
        let fs = MemFs::new();
        assert!(fs.exists("/"));
        assert!(fs.is_dir("/"));
    }

    #[test]
    fn test_mkdir_requires_parent() {
        let mut fs = MemFs::new();
        assert_eq!(
            fs.mkdir("/a/b"),
            Err(FsError::NotFound("/a".to_string()))
        );
        fs.mkdir("/a").unwrap();
        fs.mkdir("/a/b").unwrap();
        assert!(fs.is_dir("/a/b"));
    }

    #[test]
    fn test_mkdir_existing() {
        let mut fs = MemFs::new();
        fs.mkdir("/a").unwrap();
        assert_eq!(fs.mkdir("/a/"), Err(FsError::AlreadyExists("/a".to_string())));

        fs.write_file("/f", b"x").unwrap();
        assert_eq!(fs.mkdir("/f"), Err(FsError::AlreadyExists("/f".to_string())));
    }

    #[test]
    fn test_file_as_parent() {
        let mut fs = MemFs::new();
        fs.write_file("/f", b"x").unwrap();
        assert_eq!(
            fs.write_file("/f/g", b"y"),
            Err(FsError::NotADirectory("/f".to_string()))
        );
        assert_eq!(
            fs.mkdir("/f/g"),
            Err(FsError::NotADirectory("/f".to_string()))
        );
    }

    #[test]
    fn test_write_and_read() {
        let mut fs = MemFs::new();
        fs.write_file("cfg", b"one").unwrap();
        assert_eq!(fs.read_file("/cfg"), Some(&b"one"[..]));
        fs.write_file("/cfg", b"two").unwrap();
        assert_eq!(fs.read_file("//cfg"), Some(&b"two"[..]));
        assert_eq!(fs.files().collect::<Vec<_>>(), vec!["/cfg"]);
    }

    #[test]
    fn test_rejects_dot_components() {
        let mut fs = MemFs::new();
        assert!(matches!(fs.mkdir("/a/../b"), Err(FsError::InvalidPath(_))));
        assert!(matches!(fs.write_file("./x", b""), Err(FsError::InvalidPath(_))));
        assert!(!fs.exists("/a/.."));
    }

    #[test]
    fn test_directory_cannot_be_overwritten() {
        let mut fs = MemFs::new();
        fs.mkdir("/d").unwrap();
        assert!(matches!(fs.write_file("/d", b""), Err(FsError::InvalidPath(_))));
        assert!(matches!(fs.write_file("/", b""), Err(FsError::InvalidPath(_))));
    }
}
