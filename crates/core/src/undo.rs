use crate::error::UndoFailure;
use crate::fs_ops::FileSystem;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameAction {
    pub original_path: PathBuf,
    /// Where the asset actually ended up, including a successful move.
    pub final_path: PathBuf,
}

impl RenameAction {
    pub fn is_noop(&self) -> bool {
        self.original_path == self.final_path
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameBatch {
    pub id: u64,
    pub created_at: DateTime<Local>,
    actions: Vec<RenameAction>,
}

impl RenameBatch {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            created_at: Local::now(),
            actions: Vec::new(),
        }
    }

    pub fn push(&mut self, action: RenameAction) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[RenameAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

/// Completed batches, newest last.
#[derive(Debug, Default)]
pub struct UndoStack {
    batches: Vec<RenameBatch>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, batch: RenameBatch) {
        self.batches.push(batch);
    }

    pub fn pop(&mut self) -> Option<RenameBatch> {
        self.batches.pop()
    }

    pub fn peek(&self) -> Option<&RenameBatch> {
        self.batches.last()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn batches(&self) -> &[RenameBatch] {
        &self.batches
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum UndoOutcome {
    Restored,
    Unchanged,
    Failed(UndoFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoEntry {
    pub action: RenameAction,
    pub outcome: UndoOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UndoResult {
    Empty,
    Reverted { batch_id: u64, entries: Vec<UndoEntry> },
}

impl UndoResult {
    pub fn restored(&self) -> usize {
        self.count(|o| matches!(o, UndoOutcome::Restored))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UndoOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&UndoOutcome) -> bool) -> usize {
        match self {
            UndoResult::Empty => 0,
            UndoResult::Reverted { entries, .. } => {
                entries.iter().filter(|e| pred(&e.outcome)).count()
            }
        }
    }
}

/// Reverses `batch` newest action first. Every action is attempted; failures
/// are reported per entry.
pub fn revert_batch<F: FileSystem + ?Sized>(fs: &F, batch: &RenameBatch) -> Vec<UndoEntry> {
    batch
        .actions()
        .iter()
        .rev()
        .map(|action| UndoEntry {
            action: action.clone(),
            outcome: revert_action(fs, action),
        })
        .collect()
}

fn revert_action<F: FileSystem + ?Sized>(fs: &F, action: &RenameAction) -> UndoOutcome {
    if action.is_noop() {
        return UndoOutcome::Unchanged;
    }
    if !fs.exists(&action.final_path) {
        warn!(path = %action.final_path.display(), "undo target is gone");
        return UndoOutcome::Failed(UndoFailure::Missing(action.final_path.clone()));
    }
    if fs.exists(&action.original_path) {
        warn!(path = %action.original_path.display(), "original name is taken, not overwriting");
        return UndoOutcome::Failed(UndoFailure::Occupied(action.original_path.clone()));
    }

    let same_dir = action.final_path.parent() == action.original_path.parent();
    let result = if same_dir {
        fs.rename(&action.final_path, &action.original_path)
    } else {
        fs.move_file(&action.final_path, &action.original_path)
    };

    match result {
        Ok(()) => {
            debug!(
                from = %action.final_path.display(),
                to = %action.original_path.display(),
                "restored"
            );
            UndoOutcome::Restored
        }
        Err(err) => {
            warn!(path = %action.final_path.display(), error = %err, "undo rename failed");
            UndoOutcome::Failed(UndoFailure::Filesystem(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_ops::{LocalFs, MemoryFs};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn action(from: &str, to: &str) -> RenameAction {
        RenameAction {
            original_path: PathBuf::from(from),
            final_path: PathBuf::from(to),
        }
    }

    #[test]
    fn stack_is_lifo() {
        let mut stack = UndoStack::new();
        stack.push(RenameBatch::new(1));
        stack.push(RenameBatch::new(2));
        assert_eq!(stack.peek().map(|b| b.id), Some(2));
        assert_eq!(stack.pop().map(|b| b.id), Some(2));
        assert_eq!(stack.pop().map(|b| b.id), Some(1));
        assert!(stack.pop().is_none());
    }

    #[test]
    fn revert_runs_in_reverse_order() {
        let fs = MemoryFs::new();
        // a -> b, then c takes a's old name
        fs.add_file("/w/b.mkv", b"A".to_vec());
        fs.add_file("/w/a.mkv", b"C".to_vec());
        let mut batch = RenameBatch::new(1);
        batch.push(action("/w/a.mkv", "/w/b.mkv"));
        batch.push(action("/w/c.mkv", "/w/a.mkv"));

        let entries = revert_batch(&fs, &batch);
        assert!(entries.iter().all(|e| e.outcome == UndoOutcome::Restored));
        assert_eq!(fs.read(Path::new("/w/a.mkv")), Some(b"A".to_vec()));
        assert_eq!(fs.read(Path::new("/w/c.mkv")), Some(b"C".to_vec()));
        assert!(!fs.exists(Path::new("/w/b.mkv")));
    }

    #[test]
    fn missing_target_does_not_stop_the_pass() {
        let fs = MemoryFs::new();
        fs.add_file("/w/new_a.mkv", b"A".to_vec());
        let mut batch = RenameBatch::new(1);
        batch.push(action("/w/a.mkv", "/w/new_a.mkv"));
        batch.push(action("/w/b.mkv", "/w/new_b.mkv"));

        let entries = revert_batch(&fs, &batch);
        assert_eq!(
            entries[0].outcome,
            UndoOutcome::Failed(UndoFailure::Missing(PathBuf::from("/w/new_b.mkv")))
        );
        assert_eq!(entries[1].outcome, UndoOutcome::Restored);
        assert!(fs.exists(Path::new("/w/a.mkv")));
    }

    #[test]
    fn occupied_original_is_not_overwritten() {
        let fs = MemoryFs::new();
        fs.add_file("/w/new.mkv", b"renamed".to_vec());
        fs.add_file("/w/old.mkv", b"intruder".to_vec());
        let mut batch = RenameBatch::new(1);
        batch.push(action("/w/old.mkv", "/w/new.mkv"));

        let entries = revert_batch(&fs, &batch);
        assert!(matches!(
            entries[0].outcome,
            UndoOutcome::Failed(UndoFailure::Occupied(_))
        ));
        assert_eq!(fs.read(Path::new("/w/old.mkv")), Some(b"intruder".to_vec()));
    }

    #[test]
    fn noop_action_reports_unchanged() {
        let fs = MemoryFs::new();
        fs.add_file("/w/same.mkv", b"x".to_vec());
        let mut batch = RenameBatch::new(1);
        batch.push(action("/w/same.mkv", "/w/same.mkv"));
        let entries = revert_batch(&fs, &batch);
        assert_eq!(entries[0].outcome, UndoOutcome::Unchanged);
    }

    #[test]
    fn moved_asset_returns_to_original_directory() {
        let temp = tempdir().expect("tempdir");
        let work = temp.path().join("work");
        let library = temp.path().join("library");
        fs::create_dir_all(&work).expect("mkdir work");
        fs::create_dir_all(&library).expect("mkdir library");
        let moved = library.join("Inception (2010).mkv");
        fs::write(&moved, b"x").expect("write");

        let mut batch = RenameBatch::new(7);
        batch.push(RenameAction {
            original_path: work.join("movie.mkv"),
            final_path: moved.clone(),
        });
        let entries = revert_batch(&LocalFs, &batch);
        assert_eq!(entries[0].outcome, UndoOutcome::Restored);
        assert!(work.join("movie.mkv").exists());
        assert!(!moved.exists());
    }

    #[test]
    fn result_counts() {
        let result = UndoResult::Reverted {
            batch_id: 1,
            entries: vec![
                UndoEntry {
                    action: action("/a", "/b"),
                    outcome: UndoOutcome::Restored,
                },
                UndoEntry {
                    action: action("/c", "/d"),
                    outcome: UndoOutcome::Failed(UndoFailure::Missing(PathBuf::from("/d"))),
                },
            ],
        };
        assert_eq!(result.restored(), 1);
        assert_eq!(result.failed(), 1);
        assert_eq!(UndoResult::Empty.restored(), 0);
    }
}
