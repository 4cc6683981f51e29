use std::path::PathBuf;

use tracing::error;

use crate::selection::{BatchReport, SelectionController};
use crate::store::{FileEntry, FileStore, StoreError};

/// Ordered view of the store's contents for display. The snapshot is
/// replaced wholesale on refresh; a failed refresh keeps the previous
/// snapshot so the view degrades to stale rather than empty.
#[derive(Debug, Default)]
pub struct BrowseListModel {
    entries: Vec<FileEntry>,
}

impl BrowseListModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn refresh(&mut self, store: &FileStore) -> Result<(), StoreError> {
        match store.list().await {
            Ok(entries) => {
                self.entries = entries;
                Ok(())
            }
            Err(err) => {
                error!("browse refresh failed, keeping stale snapshot: {}", err);
                Err(err)
            }
        }
    }

    /// Last successfully fetched entries, in listing order.
    pub fn current_entries(&self) -> &[FileEntry] {
        &self.entries
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowsePhase {
    Loading,
    Ready,
    Selecting,
}

/// The browse view as a whole: listing snapshot, selection state, and the
/// phase machine `Loading -> Ready <-> Selecting` from the top of the
/// screen's lifecycle. Batches always land back in `Ready`.
#[derive(Debug)]
pub struct BrowseView {
    model: BrowseListModel,
    selection: SelectionController,
    phase: BrowsePhase,
}

impl BrowseView {
    pub fn new() -> Self {
        Self {
            model: BrowseListModel::new(),
            selection: SelectionController::new(),
            phase: BrowsePhase::Loading,
        }
    }

    pub fn phase(&self) -> BrowsePhase {
        self.phase
    }

    pub fn entries(&self) -> &[FileEntry] {
        self.model.current_entries()
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Manual refresh: drops any live selection, reloads the snapshot, and
    /// lands in `Ready` whether or not the listing succeeded (a failure
    /// keeps the stale snapshot).
    pub async fn refresh(&mut self, store: &FileStore) -> Result<(), StoreError> {
        self.phase = BrowsePhase::Loading;
        self.selection.cancel();
        let result = self.model.refresh(store).await;
        self.phase = BrowsePhase::Ready;
        result
    }

    /// Long-press entry point; ignored while the listing is still loading.
    pub fn enter_selection(&mut self, initial_path: impl Into<PathBuf>) {
        if self.phase == BrowsePhase::Loading {
            return;
        }
        self.selection.enter_selection_mode(initial_path);
        self.phase = BrowsePhase::Selecting;
    }

    pub fn toggle(&mut self, path: impl Into<PathBuf>) {
        if self.phase != BrowsePhase::Selecting {
            return;
        }
        self.selection.toggle(path);
    }

    pub fn cancel_selection(&mut self) {
        self.selection.cancel();
        if self.phase == BrowsePhase::Selecting {
            self.phase = BrowsePhase::Ready;
        }
    }

    pub async fn duplicate_selected(&mut self, store: &FileStore) -> BatchReport<String> {
        let report = self.selection.duplicate_selected(store).await;
        self.finish_batch(store).await;
        report
    }

    pub async fn delete_selected(&mut self, store: &FileStore) -> BatchReport<()> {
        let report = self.selection.delete_selected(store).await;
        self.finish_batch(store).await;
        report
    }

    /// Every batch ends in `Ready` with a fresh snapshot attempt, success
    /// or partial failure alike.
    async fn finish_batch(&mut self, store: &FileStore) {
        if let Err(err) = self.model.refresh(store).await {
            error!("post-batch refresh failed: {}", err);
        }
        self.phase = BrowsePhase::Ready;
    }
}

impl Default for BrowseView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[compio::test]
    async fn refresh_should_replace_the_snapshot_wholesale() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());
        store
            .write(&store.entry_path("a.txt"), "a")
            .await
            .expect("write a");

        let mut model = BrowseListModel::new();
        model.refresh(&store).await.expect("refresh succeeds");
        assert_eq!(model.current_entries().len(), 1);

        store
            .remove(&store.entry_path("a.txt"))
            .await
            .expect("remove a");
        store
            .write(&store.entry_path("b.txt"), "b")
            .await
            .expect("write b");
        model.refresh(&store).await.expect("refresh succeeds");
        assert_eq!(model.current_entries().len(), 1);
        assert_eq!(model.current_entries()[0].name, "b.txt");
    }

    #[compio::test]
    async fn failed_refresh_should_keep_the_stale_snapshot() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path().join("store"));
        store.ensure_store_exists().await.expect("store exists");
        store
            .write(&store.entry_path("a.txt"), "a")
            .await
            .expect("write a");

        let mut model = BrowseListModel::new();
        model.refresh(&store).await.expect("refresh succeeds");

        let unreachable = FileStore::new(dir.path().join("nowhere"));
        model
            .refresh(&unreachable)
            .await
            .expect_err("refresh must fail");
        assert_eq!(model.current_entries().len(), 1);
        assert_eq!(model.current_entries()[0].name, "a.txt");
    }

    #[compio::test]
    async fn view_should_walk_loading_ready_selecting() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());
        store
            .write(&store.entry_path("a.txt"), "a")
            .await
            .expect("write a");

        let mut view = BrowseView::new();
        assert_eq!(view.phase(), BrowsePhase::Loading);
        // long-press before the first load is ignored
        view.enter_selection(store.entry_path("a.txt"));
        assert_eq!(view.phase(), BrowsePhase::Loading);

        view.refresh(&store).await.expect("refresh succeeds");
        assert_eq!(view.phase(), BrowsePhase::Ready);

        view.enter_selection(store.entry_path("a.txt"));
        assert_eq!(view.phase(), BrowsePhase::Selecting);
        view.cancel_selection();
        assert_eq!(view.phase(), BrowsePhase::Ready);
    }

    #[compio::test]
    async fn batch_should_land_back_in_ready_with_a_fresh_snapshot() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());
        store
            .write(&store.entry_path("a.txt"), "a")
            .await
            .expect("write a");

        let mut view = BrowseView::new();
        view.refresh(&store).await.expect("refresh succeeds");
        view.enter_selection(store.entry_path("a.txt"));

        let report = view.duplicate_selected(&store).await;
        assert!(report.is_clean());
        assert_eq!(view.phase(), BrowsePhase::Ready);
        assert!(!view.selection().selection_mode());
        assert_eq!(view.entries().len(), 2);
    }

    #[compio::test]
    async fn refresh_should_drop_a_live_selection() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());
        store
            .write(&store.entry_path("a.txt"), "a")
            .await
            .expect("write a");

        let mut view = BrowseView::new();
        view.refresh(&store).await.expect("refresh succeeds");
        view.enter_selection(store.entry_path("a.txt"));

        view.refresh(&store).await.expect("refresh succeeds");
        assert_eq!(view.phase(), BrowsePhase::Ready);
        assert!(!view.selection().selection_mode());
    }
}
