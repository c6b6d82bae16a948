// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! The set of files making up a bag.
//!
//! A bag is addressed as a flat set of relative paths (`metadata.yaml`,
//! `rec_0.db3`, ...). [`LocalFileSystem`] walks a directory on disk;
//! [`MemoryFileSystem`] serves byte buffers for bags that never touch disk.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::{BagError, Result};

/// Random-access read handle over a single file.
pub trait FileLike: Send {
    /// Read `len` bytes starting at `offset`. Short reads at EOF are errors.
    fn read(&mut self, offset: u64, len: usize) -> Result<Vec<u8>>;

    /// Total file size in bytes.
    fn size(&mut self) -> Result<u64>;

    /// Read the whole file as UTF-8 text.
    fn read_to_string(&mut self) -> Result<String> {
        let size = self.size()?;
        let len = usize::try_from(size)
            .map_err(|_| BagError::Other(format!("file of {size} bytes exceeds address space")))?;
        let bytes = self.read(0, len)?;
        String::from_utf8(bytes).map_err(|e| BagError::Other(format!("file is not UTF-8: {e}")))
    }
}

/// Enumerates and opens the files of one bag.
pub trait BagFileSystem: Send + Sync {
    /// Human-readable location used in logs and errors.
    fn location(&self) -> String;

    /// All file paths relative to the bag root, `/`-separated, recursively.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Open a file by relative path.
    fn open(&self, relative_path: &str) -> Result<Box<dyn FileLike>>;

    /// On-disk path of a file, for engines that need one.
    fn local_path(&self, _relative_path: &str) -> Option<PathBuf> {
        None
    }

    /// Whether `relative_path` names a file of this bag.
    fn contains(&self, relative_path: &str) -> bool {
        self.list_files()
            .map(|files| files.iter().any(|f| f == relative_path))
            .unwrap_or(false)
    }
}

/// Normalize a relative path: `/` separators, no `.` components, no leading `./`.
pub fn normalize_relative(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// A bag directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walk(&self, dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<()> {
        let entries =
            std::fs::read_dir(dir).map_err(|e| BagError::io(dir.display().to_string(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| BagError::io(dir.display().to_string(), e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| BagError::io(entry.path().display().to_string(), e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            if file_type.is_dir() {
                self.walk(&entry.path(), &relative, out)?;
            } else if file_type.is_file() {
                out.push(relative);
            }
        }
        Ok(())
    }
}

impl BagFileSystem for LocalFileSystem {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        self.walk(&self.root, "", &mut files)?;
        files.sort();
        Ok(files)
    }

    fn open(&self, relative_path: &str) -> Result<Box<dyn FileLike>> {
        let path = self.root.join(normalize_relative(relative_path));
        let file = File::open(&path).map_err(|e| BagError::io(path.display().to_string(), e))?;
        Ok(Box::new(LocalFile { path, file }))
    }

    fn local_path(&self, relative_path: &str) -> Option<PathBuf> {
        Some(self.root.join(normalize_relative(relative_path)))
    }

    fn contains(&self, relative_path: &str) -> bool {
        self.root.join(normalize_relative(relative_path)).is_file()
    }
}

struct LocalFile {
    path: PathBuf,
    file: File,
}

impl FileLike for LocalFile {
    fn read(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.read_exact(&mut buf))
            .map_err(|e| BagError::io(self.path.display().to_string(), e))?;
        Ok(buf)
    }

    fn size(&mut self) -> Result<u64> {
        self.file
            .metadata()
            .map(|m| m.len())
            .map_err(|e| BagError::io(self.path.display().to_string(), e))
    }
}

/// A bag held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    name: String,
    files: BTreeMap<String, Arc<[u8]>>,
}

impl MemoryFileSystem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: BTreeMap::new(),
        }
    }

    /// Add a file (builder style).
    pub fn with_file(mut self, relative_path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(relative_path, data);
        self
    }

    pub fn insert(&mut self, relative_path: &str, data: impl Into<Vec<u8>>) {
        self.files
            .insert(normalize_relative(relative_path), Arc::from(data.into()));
    }
}

impl BagFileSystem for MemoryFileSystem {
    fn location(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn open(&self, relative_path: &str) -> Result<Box<dyn FileLike>> {
        let key = normalize_relative(relative_path);
        let data = self.files.get(&key).cloned().ok_or_else(|| {
            BagError::io(
                key.clone(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file in memory bag"),
            )
        })?;
        Ok(Box::new(MemoryFile { path: key, data }))
    }

    fn contains(&self, relative_path: &str) -> bool {
        self.files.contains_key(&normalize_relative(relative_path))
    }
}

struct MemoryFile {
    path: String,
    data: Arc<[u8]>,
}

impl FileLike for MemoryFile {
    fn read(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let start = usize::try_from(offset).ok();
        let end = start.and_then(|s| s.checked_add(len));
        match (start, end) {
            (Some(start), Some(end)) if end <= self.data.len() => Ok(self.data[start..end].to_vec()),
            _ => Err(BagError::io(
                self.path.clone(),
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("read of {len} bytes at {offset} past end of {} byte file", self.data.len()),
                ),
            )),
        }
    }

    fn size(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_relative() {
        assert_eq!(normalize_relative("./rec/rec_0.db3"), "rec/rec_0.db3");
        assert_eq!(normalize_relative("rec\\rec_0.db3"), "rec/rec_0.db3");
        assert_eq!(normalize_relative("metadata.yaml"), "metadata.yaml");
    }

    #[test]
    fn test_memory_file_system() {
        let fs = MemoryFileSystem::new("talker")
            .with_file("metadata.yaml", "rosbag2_bagfile_information: {}")
            .with_file("./talker_0.db3", vec![1u8, 2, 3, 4]);
        assert_eq!(
            fs.list_files().unwrap(),
            vec!["metadata.yaml".to_string(), "talker_0.db3".to_string()]
        );
        assert!(fs.contains("talker_0.db3"));
        assert!(fs.local_path("talker_0.db3").is_none());

        let mut file = fs.open("talker_0.db3").unwrap();
        assert_eq!(file.size().unwrap(), 4);
        assert_eq!(file.read(1, 2).unwrap(), vec![2, 3]);
        assert!(file.read(3, 2).is_err());

        let text = fs.open("metadata.yaml").unwrap().read_to_string().unwrap();
        assert!(text.starts_with("rosbag2"));
        assert!(fs.open("missing").is_err());
    }

    #[test]
    fn test_local_file_system_walks_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("metadata.yaml"), "x: 1").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/b_0.db3"), [0u8; 8]).unwrap();

        let fs = LocalFileSystem::new(dir.path());
        assert_eq!(
            fs.list_files().unwrap(),
            vec!["metadata.yaml".to_string(), "nested/b_0.db3".to_string()]
        );
        assert!(fs.contains("nested/b_0.db3"));
        assert!(!fs.contains("nested"));

        let mut file = fs.open("nested/b_0.db3").unwrap();
        assert_eq!(file.size().unwrap(), 8);
        assert_eq!(file.read(4, 4).unwrap(), vec![0; 4]);
        assert_eq!(
            fs.open("metadata.yaml").unwrap().read_to_string().unwrap(),
            "x: 1"
        );
    }

    #[test]
    fn test_local_missing_directory() {
        let fs = LocalFileSystem::new("/definitely/not/a/bag");
        assert!(matches!(fs.list_files(), Err(BagError::Io { .. })));
    }
}
