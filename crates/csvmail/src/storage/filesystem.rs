use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::StorageError;

/// Move a file from `src` to `dst`. Uses `rename` first (fast, atomic on same
/// filesystem). Falls back to copy + delete when rename fails, which covers
/// cross-device moves.
pub fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    // Fast path: atomic rename
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    // Slow path: copy then remove original
    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

pub fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// A regular file found by [`FileStorage::list_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListedFile {
    /// A file addressable by its name.
    Named(String),
    /// A file whose name is not valid UTF-8, carried as a lossy rendering.
    NonUtf8(String),
}

impl ListedFile {
    pub fn name(&self) -> &str {
        match self {
            ListedFile::Named(name) | ListedFile::NonUtf8(name) => name,
        }
    }
}

/// A flat directory of files addressed by bare file name.
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn ensure_exists(&self) -> Result<(), StorageError> {
        ensure_directory(&self.directory)
    }

    /// Writes `content` to `<directory>/<filename>`, replacing any existing file.
    ///
    /// `filename` must already be sanitized; it is joined as-is.
    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, StorageError> {
        self.ensure_exists()?;

        let path = self.directory.join(filename);
        std::fs::write(&path, content).map_err(|e| StorageError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }

    /// Lists the regular files directly inside the directory, sorted by
    /// name. Subdirectories are ignored.
    pub fn list_files(&self) -> Result<Vec<ListedFile>, StorageError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| StorageError::ReadDirectory {
                path: self.directory.clone(),
                source: e,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            files.push(match entry.file_name().to_str() {
                Some(name) => ListedFile::Named(name.to_string()),
                None => ListedFile::NonUtf8(entry.file_name().to_string_lossy().into_owned()),
            });
        }

        Ok(files)
    }

    /// Moves `filename` from this directory into `destination`, keeping its name.
    pub fn move_to(&self, filename: &str, destination: &FileStorage) -> Result<PathBuf, StorageError> {
        destination.ensure_exists()?;

        let from = self.directory.join(filename);
        let to = destination.directory.join(filename);
        move_file(&from, &to)?;

        Ok(to)
    }
}
