use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {operation} failed for {}", path.display())]
    StorageUnavailable {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("destination already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },
    #[error("decode utf-8 failed: {}", path.display())]
    DecodeError {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl StoreError {
    fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == ErrorKind::NotFound {
            return Self::NotFound { path };
        }
        Self::StorageUnavailable {
            operation,
            path,
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// One file in the store directory, snapshotted at listing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    pub modified_at: Option<SystemTime>,
    pub size_bytes: u64,
}

/// Single source of truth for the store directory's contents. Holds no
/// cache: every `list`/`read` reflects on-disk state at call time.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

const COPY_MARKER: &str = "_copia";

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub async fn ensure_store_exists(&self) -> Result<(), StoreError> {
        compio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::StorageUnavailable {
                operation: "create store directory",
                path: self.root.clone(),
                source,
            })
    }

    pub async fn exists(&self, path: &Path) -> Result<bool, StoreError> {
        match compio::fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::StorageUnavailable {
                operation: "stat",
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Non-recursive snapshot of the store directory, in directory order.
    pub async fn list(&self) -> Result<Vec<FileEntry>, StoreError> {
        let read_dir =
            std::fs::read_dir(&self.root).map_err(|source| StoreError::StorageUnavailable {
                operation: "list store directory",
                path: self.root.clone(),
                source,
            })?;

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|source| StoreError::StorageUnavailable {
                operation: "list store directory",
                path: self.root.clone(),
                source,
            })?;
            let path = dir_entry.path();
            let metadata = match compio::fs::metadata(&path).await {
                Ok(metadata) => metadata,
                // vanished between readdir and stat; the snapshot just skips it
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(source) => return Err(StoreError::io("stat", &path, source)),
            };
            entries.push(FileEntry {
                name: dir_entry.file_name().to_string_lossy().to_string(),
                is_directory: metadata.is_dir(),
                modified_at: metadata.modified().ok(),
                size_bytes: metadata.len(),
                path,
            });
        }
        debug!("listed store: {} entries", entries.len());
        Ok(entries)
    }

    pub async fn read(&self, path: &Path) -> Result<String, StoreError> {
        let bytes = compio::fs::read(path)
            .await
            .map_err(|source| StoreError::io("read file", path, source))?;
        String::from_utf8(bytes).map_err(|source| StoreError::DecodeError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Creates or overwrites the file at `path` with `content`.
    pub async fn write(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        let write_result = compio::fs::write(path, content.as_bytes().to_vec()).await.0;
        write_result
            .map(|_| ())
            .map_err(|source| StoreError::StorageUnavailable {
                operation: "write file",
                path: path.to_path_buf(),
                source,
            })
    }

    pub async fn remove(&self, path: &Path) -> Result<(), StoreError> {
        compio::fs::remove_file(path)
            .await
            .map_err(|source| StoreError::io("remove file", path, source))
    }

    /// Duplicates `source`'s bytes to `dest`. The destination must be free;
    /// callers resolve one through `resolve_collision_free_name` first.
    pub async fn copy(&self, source: &Path, dest: &Path) -> Result<(), StoreError> {
        if self.exists(dest).await? {
            return Err(StoreError::AlreadyExists {
                path: dest.to_path_buf(),
            });
        }
        let bytes = compio::fs::read(source)
            .await
            .map_err(|err| StoreError::io("read file", source, err))?;
        let write_result = compio::fs::write(dest, bytes).await.0;
        write_result
            .map(|_| ())
            .map_err(|source| StoreError::StorageUnavailable {
                operation: "write file",
                path: dest.to_path_buf(),
                source,
            })
    }

    /// Returns a name guaranteed not to collide with any current entry:
    /// the copy marker goes before the final extension segment, then a
    /// numeric counter disambiguates if the marked name is taken too.
    pub async fn resolve_collision_free_name(
        &self,
        base_name: &str,
    ) -> Result<String, StoreError> {
        let taken: HashSet<String> = self
            .list()
            .await?
            .into_iter()
            .map(|entry| entry.name)
            .collect();

        let candidate = insert_copy_marker(base_name, COPY_MARKER);
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
        let mut counter: u32 = 2;
        loop {
            let marker = format!("{COPY_MARKER}{counter}");
            let candidate = insert_copy_marker(base_name, &marker);
            if !taken.contains(&candidate) {
                return Ok(candidate);
            }
            counter += 1;
        }
    }
}

/// `note.txt` + `_copia` -> `note_copia.txt`; no extension appends the
/// marker; a leading-dot name keeps its dot segment as the extension.
fn insert_copy_marker(name: &str, marker: &str) -> String {
    match name.rfind('.') {
        Some(dot_index) => {
            let (stem, extension) = name.split_at(dot_index);
            format!("{stem}{marker}{extension}")
        }
        None => format!("{name}{marker}"),
    }
}
