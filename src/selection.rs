use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::store::{FileStore, StoreError};

/// Outcome of one item in a best-effort batch.
#[derive(Debug)]
pub struct BatchItem<T> {
    pub path: PathBuf,
    pub result: Result<T, StoreError>,
}

/// Accumulated per-item outcomes of a batch operation. A batch as a whole
/// never fails; its success is a property of this list.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub outcomes: Vec<BatchItem<T>>,
}

impl<T> BatchReport<T> {
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|item| item.result.is_err())
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Multi-select state over the browse listing plus the batch operations
/// that consume it. Selected paths are only ever non-empty while selection
/// mode is on; every batch terminates with the selection cleared and mode
/// off, whatever the per-item outcomes.
#[derive(Debug, Default)]
pub struct SelectionController {
    selection_mode: bool,
    selected: Vec<PathBuf>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection_mode(&self) -> bool {
        self.selection_mode
    }

    pub fn selected_paths(&self) -> &[PathBuf] {
        &self.selected
    }

    pub fn is_selected(&self, path: &Path) -> bool {
        self.selected.iter().any(|selected| selected == path)
    }

    pub fn enter_selection_mode(&mut self, initial_path: impl Into<PathBuf>) {
        self.selection_mode = true;
        let path = initial_path.into();
        if !self.is_selected(&path) {
            self.selected.push(path);
        }
    }

    pub fn toggle(&mut self, path: impl Into<PathBuf>) {
        if !self.selection_mode {
            return;
        }
        let path = path.into();
        match self.selected.iter().position(|selected| *selected == path) {
            Some(index) => {
                self.selected.remove(index);
            }
            None => self.selected.push(path),
        }
    }

    pub fn cancel(&mut self) {
        self.selected.clear();
        self.selection_mode = false;
    }

    /// Duplicates every selected file to a collision-free name. Per-item
    /// failures are recorded and do not stop the rest of the batch; the
    /// selection is cleared and mode exited whatever happened.
    pub async fn duplicate_selected(&mut self, store: &FileStore) -> BatchReport<String> {
        let mut outcomes = Vec::new();
        for path in self.batch_order(store).await {
            let result = duplicate_one(store, &path).await;
            if let Err(err) = &result {
                error!("duplicate failed: {}: {}", path.display(), err);
            }
            outcomes.push(BatchItem { path, result });
        }
        self.cancel();
        info!("duplicate batch done: {} items", outcomes.len());
        BatchReport { outcomes }
    }

    /// Removes every selected file. The caller is responsible for having
    /// confirmed the deletion; same best-effort semantics as duplication.
    pub async fn delete_selected(&mut self, store: &FileStore) -> BatchReport<()> {
        let mut outcomes = Vec::new();
        for path in self.batch_order(store).await {
            let result = store.remove(&path).await;
            if let Err(err) = &result {
                error!("delete failed: {}: {}", path.display(), err);
            }
            outcomes.push(BatchItem { path, result });
        }
        self.cancel();
        info!("delete batch done: {} items", outcomes.len());
        BatchReport { outcomes }
    }

    /// Selected paths in listing order, then any selected path no longer
    /// listed, in selection order. Ordering is a convenience, not a
    /// correctness requirement; when the listing itself fails the batch
    /// just runs in selection order.
    async fn batch_order(&self, store: &FileStore) -> Vec<PathBuf> {
        let listing = match store.list().await {
            Ok(entries) => entries,
            Err(err) => {
                error!("batch listing failed, using selection order: {}", err);
                return self.selected.clone();
            }
        };

        let mut ordered: Vec<PathBuf> = listing
            .iter()
            .map(|entry| &entry.path)
            .filter(|path| self.is_selected(path))
            .cloned()
            .collect();
        for path in &self.selected {
            if !ordered.contains(path) {
                ordered.push(path.clone());
            }
        }
        ordered
    }
}

async fn duplicate_one(store: &FileStore, path: &Path) -> Result<String, StoreError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let new_name = store.resolve_collision_free_name(&name).await?;
    store.copy(path, &store.entry_path(&new_name)).await?;
    Ok(new_name)
}
