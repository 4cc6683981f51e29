use thiserror::Error;
use tracing::{info, warn};

use crate::store::{FileStore, StoreError};

pub const DEFAULT_EXTENSION: &str = ".txt";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a name is required to save")]
    NameRequired,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Byte-offset selection into the session's content. `start == end` is a
/// bare cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorSelection {
    pub start: usize,
    pub end: usize,
}

/// One document edit transaction: the name it was opened under, the name it
/// will be saved under, the buffer, and whether the buffer has been
/// persisted since the last change.
#[derive(Debug, Clone)]
pub struct EditorSession {
    original_name: String,
    current_name: String,
    content: String,
    saved: bool,
    selection: CursorSelection,
}

impl EditorSession {
    /// Pristine empty session for a new document.
    pub fn new() -> Self {
        Self {
            original_name: String::new(),
            current_name: String::new(),
            content: String::new(),
            saved: false,
            selection: CursorSelection::default(),
        }
    }

    /// Session loaded from an existing file's content.
    pub fn open(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            original_name: name.clone(),
            current_name: name,
            content: content.into(),
            saved: true,
            selection: CursorSelection::default(),
        }
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn current_name(&self) -> &str {
        &self.current_name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn selection(&self) -> CursorSelection {
        self.selection
    }

    pub fn update_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.saved = false;
        self.clamp_selection();
    }

    /// Empty names are permitted here and rejected at save time.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.current_name = name.into();
        self.saved = false;
    }

    /// Offsets are clamped to the buffer and snapped down to char
    /// boundaries.
    pub fn set_selection(&mut self, start: usize, end: usize) {
        let start = snap_to_char_boundary(&self.content, start.min(self.content.len()));
        let end = snap_to_char_boundary(&self.content, end.min(self.content.len()));
        self.selection = CursorSelection {
            start: start.min(end),
            end: start.max(end),
        };
    }

    /// Splices `text` over the selected range and leaves the cursor right
    /// after the inserted text.
    pub fn insert_at_cursor(&mut self, text: &str) {
        let CursorSelection { start, end } = self.selection;
        self.content.replace_range(start..end, text);
        let cursor = start + text.len();
        self.selection = CursorSelection {
            start: cursor,
            end: cursor,
        };
        self.saved = false;
    }

    /// True iff closing this session would lose something: dirty and not
    /// entirely empty. A pristine untouched session never claims unsaved
    /// work, so it can be discarded without confirmation.
    pub fn has_unsaved_work(&self) -> bool {
        !self.saved && (!self.current_name.is_empty() || !self.content.is_empty())
    }

    /// Persists the buffer under the current name's effective form
    /// (default `.txt` appended when the name has no extension), removing
    /// the previously saved file when the save is also a rename. Session
    /// state is only mutated after the write lands; on failure the session
    /// stays dirty and unchanged. Returns the effective file name.
    pub async fn save(&mut self, store: &FileStore) -> Result<String, SessionError> {
        if self.current_name.is_empty() {
            return Err(SessionError::NameRequired);
        }

        let new_name = effective_name(&self.current_name);
        let path = store.entry_path(&new_name);

        store.ensure_store_exists().await?;

        if !self.original_name.is_empty() {
            let effective_original = effective_name(&self.original_name);
            if effective_original != new_name {
                let original_path = store.entry_path(&effective_original);
                if store.exists(&original_path).await? {
                    match store.remove(&original_path).await {
                        Ok(()) => info!("removed stale file {}", original_path.display()),
                        // listed a moment ago, gone now; nothing left to clean up
                        Err(err) if err.is_not_found() => {
                            warn!("stale file already gone: {}", original_path.display());
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }

        store.write(&path, &self.content).await?;

        self.original_name = new_name.clone();
        self.current_name = new_name.clone();
        self.saved = true;
        info!("saved {}", path.display());
        Ok(new_name)
    }

    fn clamp_selection(&mut self) {
        let CursorSelection { start, end } = self.selection;
        self.set_selection(start, end);
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the default extension when the name has no `.` anywhere.
fn effective_name(name: &str) -> String {
    if name.contains('.') {
        name.to_string()
    } else {
        format!("{name}{DEFAULT_EXTENSION}")
    }
}

fn snap_to_char_boundary(content: &str, mut offset: usize) -> usize {
    while offset > 0 && !content.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn pristine_session_should_not_claim_unsaved_work() {
        let session = EditorSession::new();
        assert!(!session.has_unsaved_work());
    }

    #[test]
    fn editing_or_renaming_should_mark_unsaved_work() {
        let mut session = EditorSession::new();
        session.update_content("draft");
        assert!(session.has_unsaved_work());

        let mut session = EditorSession::open("note.txt", "body");
        assert!(!session.has_unsaved_work());
        session.rename("renamed");
        assert!(session.has_unsaved_work());
    }

    #[test]
    fn insert_at_cursor_should_splice_and_advance() {
        let mut session = EditorSession::new();
        session.update_content("ab");
        session.set_selection(1, 1);

        session.insert_at_cursor("\t");
        assert_eq!(session.content(), "a\tb");
        assert_eq!(session.selection(), CursorSelection { start: 2, end: 2 });
    }

    #[test]
    fn insert_at_cursor_should_replace_the_selected_range() {
        let mut session = EditorSession::new();
        session.update_content("hello world");
        session.set_selection(6, 11);

        session.insert_at_cursor("there");
        assert_eq!(session.content(), "hello there");
        assert_eq!(session.selection(), CursorSelection { start: 11, end: 11 });
    }

    #[test]
    fn set_selection_should_clamp_and_snap_to_char_boundaries() {
        let mut session = EditorSession::new();
        session.update_content("héllo");
        session.set_selection(2, 99);
        // offset 2 falls inside the two-byte é and snaps down to 1
        assert_eq!(session.selection(), CursorSelection { start: 1, end: 6 });
    }

    #[test]
    fn shrinking_content_should_keep_selection_in_bounds() {
        let mut session = EditorSession::new();
        session.update_content("long content");
        session.set_selection(5, 12);
        session.update_content("ab");
        assert_eq!(session.selection(), CursorSelection { start: 2, end: 2 });
    }

    #[compio::test]
    async fn save_without_a_name_should_fail_and_leave_state_untouched() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());
        let mut session = EditorSession::new();
        session.update_content("body");

        let err = session.save(&store).await.expect_err("save must fail");
        assert!(matches!(err, SessionError::NameRequired));
        assert_eq!(session.content(), "body");
        assert_eq!(session.current_name(), "");
        assert!(!session.is_saved());
    }

    #[compio::test]
    async fn save_should_apply_the_default_extension() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());
        let mut session = EditorSession::new();
        session.rename("note");
        session.update_content("body");

        let name = session.save(&store).await.expect("save succeeds");
        assert_eq!(name, "note.txt");
        assert!(session.is_saved());
        assert_eq!(session.original_name(), "note.txt");
        assert_eq!(
            store.read(&store.entry_path("note.txt")).await.expect("read back"),
            "body"
        );
    }

    #[compio::test]
    async fn save_as_rename_should_remove_the_stale_original() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());
        store.ensure_store_exists().await.expect("store exists");
        store
            .write(&store.entry_path("old.txt"), "body")
            .await
            .expect("seed old file");

        let mut session = EditorSession::open("old.txt", "body");
        session.rename("new");
        session.save(&store).await.expect("save succeeds");

        assert!(!store
            .exists(&store.entry_path("old.txt"))
            .await
            .expect("stat old"));
        assert_eq!(
            store.read(&store.entry_path("new.txt")).await.expect("read new"),
            "body"
        );
    }

    #[compio::test]
    async fn save_with_unchanged_name_should_overwrite_in_place() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());
        let mut session = EditorSession::new();
        session.rename("note.txt");
        session.update_content("first");
        session.save(&store).await.expect("first save");

        session.update_content("second");
        session.save(&store).await.expect("second save");

        let entries = store.list().await.expect("list succeeds");
        assert_eq!(entries.len(), 1);
        assert_eq!(
            store.read(&store.entry_path("note.txt")).await.expect("read back"),
            "second"
        );
    }

    #[compio::test]
    async fn save_of_a_new_session_should_not_remove_anything() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());
        store.ensure_store_exists().await.expect("store exists");
        store
            .write(&store.entry_path("bystander.txt"), "x")
            .await
            .expect("seed bystander");

        let mut session = EditorSession::new();
        session.rename("fresh");
        session.update_content("body");
        session.save(&store).await.expect("save succeeds");

        assert!(store
            .exists(&store.entry_path("bystander.txt"))
            .await
            .expect("stat bystander"));
    }

    #[compio::test]
    async fn failed_save_should_leave_the_session_dirty() {
        let dir = TempDir::new().expect("temp dir");
        // a file where the store directory should be makes every step fail
        let root = dir.path().join("blocked");
        std::fs::write(&root, b"not a directory").expect("seed blocker");
        let store = FileStore::new(&root);

        let mut session = EditorSession::new();
        session.rename("note");
        session.update_content("body");
        let err = session.save(&store).await.expect_err("save must fail");
        assert!(matches!(err, SessionError::Store(_)));
        assert!(!session.is_saved());
        assert_eq!(session.current_name(), "note");
        assert!(session.has_unsaved_work());
    }
}
