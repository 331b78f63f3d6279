//! Batch rename orchestration.
//!
//! A run validates the pattern, reads metadata for every asset, formats every
//! target name and only then starts touching the filesystem, one asset at a
//! time in discovery order. Whatever was applied is committed to the engine's
//! undo history as one batch.

use crate::error::{FailureReason, PatternError, SkipReason};
use crate::fs_ops::{FileSystem, LocalFs};
use crate::media::{media_extension, DetailFields, MediaAsset, MediaMetadata, MediaType};
use crate::mover::move_to_dir;
use crate::probe::{MediaProbe, MetadataExtractor};
use crate::sidecar;
use crate::template::{format_stem, parse_pattern, NamingPattern, PlaceholderTable};
use crate::undo::{revert_batch, RenameAction, RenameBatch, UndoResult, UndoStack};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_FILENAME_LEN: usize = 240;
pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Asset paths in discovery order.
    pub assets: Vec<PathBuf>,
    pub media_type: MediaType,
    pub details: DetailFields,
    pub pattern: String,
    pub language: String,
    pub move_files: bool,
    pub destination: Option<PathBuf>,
    /// Read metadata for all assets concurrently before renaming.
    pub parallel_probe: bool,
}

impl Default for BatchRequest {
    fn default() -> Self {
        Self {
            assets: Vec::new(),
            media_type: MediaType::Movie,
            details: DetailFields::default(),
            pattern: crate::template::DEFAULT_PATTERN.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            move_files: false,
            destination: None,
            parallel_probe: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub max_filename_len: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_filename_len: DEFAULT_MAX_FILENAME_LEN,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Called after each asset with a 1-based index.
pub trait ProgressObserver {
    fn on_progress(&self, index: usize, total: usize);
}

impl<F: Fn(usize, usize)> ProgressObserver for F {
    fn on_progress(&self, index: usize, total: usize) {
        self(index, total)
    }
}

#[derive(Default)]
pub struct RunControl<'a> {
    pub cancel: CancelToken,
    pub progress: Option<&'a dyn ProgressObserver>,
}

impl<'a> RunControl<'a> {
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressObserver) -> Self {
        self.progress = Some(progress);
        self
    }

    fn report(&self, index: usize, total: usize) {
        if let Some(progress) = self.progress {
            progress.on_progress(index, total);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum AssetOutcome {
    Succeeded { unchanged: bool },
    Skipped(SkipReason),
    Failed(FailureReason),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetReport {
    pub original_path: PathBuf,
    /// Present whenever the asset was touched, i.e. a rename action exists.
    pub final_path: Option<PathBuf>,
    pub sidecar_path: Option<PathBuf>,
    pub outcome: AssetOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Set when the batch was committed to the undo history.
    pub batch_id: Option<u64>,
    pub entries: Vec<AssetReport>,
    pub counts: BatchCounts,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub id: u64,
    pub created_at: chrono::DateTime<chrono::Local>,
    pub actions: usize,
}

#[derive(Debug)]
struct EngineState {
    history: UndoStack,
    next_batch_id: u64,
}

pub struct RenameEngine<F = LocalFs, X = MediaProbe> {
    fs: F,
    extractor: X,
    options: EngineOptions,
    state: Mutex<EngineState>,
}

impl RenameEngine<LocalFs, MediaProbe> {
    pub fn local(extractor: MediaProbe) -> Self {
        Self::new(LocalFs, extractor)
    }
}

impl<F: FileSystem, X: MetadataExtractor> RenameEngine<F, X> {
    pub fn new(fs: F, extractor: X) -> Self {
        Self {
            fs,
            extractor,
            options: EngineOptions::default(),
            state: Mutex::new(EngineState {
                history: UndoStack::new(),
                next_batch_id: 1,
            }),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn history_len(&self) -> usize {
        self.state.lock().history.len()
    }

    pub fn history(&self) -> Vec<BatchSummary> {
        self.state
            .lock()
            .history
            .batches()
            .iter()
            .map(|b| BatchSummary {
                id: b.id,
                created_at: b.created_at,
                actions: b.len(),
            })
            .collect()
    }

    /// Runs one batch. Only a pattern problem fails the call, and it does so
    /// before any file is touched; everything else is reported per asset.
    pub fn run(
        &self,
        request: &BatchRequest,
        control: &RunControl<'_>,
    ) -> Result<BatchResult, PatternError> {
        let mut state = self.state.lock();

        let pattern = parse_pattern(&request.pattern)?;
        let details = request.details.relevant_to(request.media_type);
        let assets: Vec<MediaAsset> = request
            .assets
            .iter()
            .map(|path| MediaAsset::new(path.clone(), request.media_type))
            .collect();

        info!(
            assets = assets.len(),
            media_type = %request.media_type,
            pattern = %pattern.as_str(),
            "starting rename batch"
        );

        let probed = self.probe_all(&assets, request.parallel_probe, &control.cancel);
        let plans = self.plan_targets(&assets, probed, &pattern, &details, &request.language)?;

        let mut batch = RenameBatch::new(state.next_batch_id);
        let mut entries = Vec::with_capacity(plans.len());
        let mut cancelled = false;
        let total = plans.len();

        for (index, (asset, plan)) in assets.iter().zip(plans).enumerate() {
            if control.cancel.is_cancelled() {
                cancelled = true;
            }
            let plan = if cancelled {
                Err(SkipReason::Cancelled)
            } else {
                plan
            };

            let report = match plan {
                Ok(target) => self.apply_one(asset, &target, request, &details, &mut batch),
                Err(reason) => {
                    if reason != SkipReason::Cancelled {
                        warn!(path = %asset.path.display(), %reason, "skipped");
                    }
                    AssetReport {
                        original_path: asset.path.clone(),
                        final_path: None,
                        sidecar_path: None,
                        outcome: AssetOutcome::Skipped(reason),
                    }
                }
            };
            entries.push(report);
            control.report(index + 1, total);
        }

        let batch_id = if batch.is_empty() {
            None
        } else {
            let id = batch.id;
            state.next_batch_id += 1;
            state.history.push(batch);
            Some(id)
        };

        let counts = count_outcomes(&entries);
        info!(
            batch_id = ?batch_id,
            succeeded = counts.succeeded,
            skipped = counts.skipped,
            failed = counts.failed,
            cancelled,
            "rename batch finished"
        );

        Ok(BatchResult {
            batch_id,
            entries,
            counts,
            cancelled,
        })
    }

    /// Reverts the most recent batch. The batch leaves the history even when
    /// some of its actions cannot be reverted.
    pub fn undo_last(&self) -> UndoResult {
        let mut state = self.state.lock();
        let Some(batch) = state.history.pop() else {
            info!("nothing to undo");
            return UndoResult::Empty;
        };

        let entries = revert_batch(&self.fs, &batch);
        let result = UndoResult::Reverted {
            batch_id: batch.id,
            entries,
        };
        info!(
            batch_id = batch.id,
            restored = result.restored(),
            failed = result.failed(),
            "undo finished"
        );
        result
    }

    fn probe_all(
        &self,
        assets: &[MediaAsset],
        parallel: bool,
        cancel: &CancelToken,
    ) -> Vec<Result<MediaMetadata, SkipReason>> {
        let probe_one = |asset: &MediaAsset| {
            if cancel.is_cancelled() {
                return Err(SkipReason::Cancelled);
            }
            self.extractor
                .extract(&asset.path)
                .map_err(|err| SkipReason::Metadata(err.to_string()))
        };

        if parallel {
            assets.par_iter().map(probe_one).collect()
        } else {
            assets.iter().map(probe_one).collect()
        }
    }

    fn plan_targets(
        &self,
        assets: &[MediaAsset],
        probed: Vec<Result<MediaMetadata, SkipReason>>,
        pattern: &NamingPattern,
        details: &DetailFields,
        language: &str,
    ) -> Result<Vec<Result<PathBuf, SkipReason>>, PatternError> {
        let mut plans = Vec::with_capacity(assets.len());
        for (asset, metadata) in assets.iter().zip(probed) {
            let plan = match metadata {
                Ok(metadata) => {
                    let table = PlaceholderTable::new(details, &metadata, language);
                    Ok(self.target_path(&asset.path, pattern, &table)?)
                }
                Err(reason) => Err(reason),
            };
            plans.push(plan);
        }
        Ok(plans)
    }

    fn target_path(
        &self,
        path: &Path,
        pattern: &NamingPattern,
        table: &PlaceholderTable,
    ) -> Result<PathBuf, PatternError> {
        let extension = media_extension(path)
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let stem = format_stem(pattern, table, &extension, self.options.max_filename_len)?;
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(parent.join(format!("{stem}{extension}")))
    }

    fn apply_one(
        &self,
        asset: &MediaAsset,
        target: &Path,
        request: &BatchRequest,
        details: &DetailFields,
        batch: &mut RenameBatch,
    ) -> AssetReport {
        let original = &asset.path;
        let unchanged = target == original.as_path();
        let mut report = AssetReport {
            original_path: original.clone(),
            final_path: None,
            sidecar_path: None,
            outcome: AssetOutcome::Succeeded { unchanged },
        };

        if !unchanged {
            if self.fs.exists(target) {
                warn!(path = %original.display(), target = %target.display(), "target exists, skipping");
                report.outcome = AssetOutcome::Skipped(SkipReason::Collision(target.to_path_buf()));
                return report;
            }
            if let Err(err) = self.fs.rename(original, target) {
                warn!(path = %original.display(), error = %err, "rename failed");
                report.outcome = AssetOutcome::Failed(FailureReason::Filesystem(err.to_string()));
                return report;
            }
            debug!(from = %original.display(), to = %target.display(), "renamed");
        }

        let mut current = target.to_path_buf();
        let outcome = self.finish_asset(asset, &mut current, &mut report, request, details);
        batch.push(RenameAction {
            original_path: original.clone(),
            final_path: current.clone(),
        });
        report.final_path = Some(current);
        if let Err(reason) = outcome {
            warn!(path = %original.display(), %reason, "asset failed after rename");
            report.outcome = AssetOutcome::Failed(reason);
        }
        report
    }

    /// Relocation, then the sidecar at wherever the asset ended up.
    /// `current` always tracks where the asset is.
    fn finish_asset(
        &self,
        asset: &MediaAsset,
        current: &mut PathBuf,
        report: &mut AssetReport,
        request: &BatchRequest,
        details: &DetailFields,
    ) -> Result<(), FailureReason> {
        if request.move_files {
            let destination = request.destination.as_deref().ok_or_else(|| {
                FailureReason::Destination("no destination directory given".to_string())
            })?;
            *current = move_to_dir(&self.fs, current, destination)?;
            debug!(to = %current.display(), "moved");
        }

        if asset.media_type.emits_sidecar() {
            let path = sidecar::emit(&self.fs, details, current)
                .map_err(|err| FailureReason::Sidecar(err.to_string()))?;
            debug!(path = %path.display(), "sidecar written");
            report.sidecar_path = Some(path);
        }
        Ok(())
    }
}

fn count_outcomes(entries: &[AssetReport]) -> BatchCounts {
    let mut counts = BatchCounts::default();
    for entry in entries {
        match entry.outcome {
            AssetOutcome::Succeeded { .. } => counts.succeeded += 1,
            AssetOutcome::Skipped(_) => counts.skipped += 1,
            AssetOutcome::Failed(_) => counts.failed += 1,
        }
    }
    counts
}
