use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    pub recursive: bool,
    pub include_hidden: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    pub scanned_files: usize,
    pub skipped_hidden: usize,
    pub skipped_sidecars: usize,
}

/// Lists the files of a working directory in a stable, name-sorted order.
///
/// Previously written `.nfo` sidecars are not media and are left out.
pub fn collect_assets(root: &Path, options: ScanOptions) -> Result<(Vec<PathBuf>, ScanStats)> {
    if !root.is_dir() {
        anyhow::bail!("working directory does not exist: {}", root.display());
    }

    let mut stats = ScanStats::default();
    let mut out = Vec::new();

    if options.recursive {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("failed to walk directory: {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            consider(entry.path(), options, &mut stats, &mut out);
        }
    } else {
        for entry in fs::read_dir(root)
            .with_context(|| format!("cannot read directory: {}", root.display()))?
        {
            let entry =
                entry.with_context(|| format!("cannot read entry in: {}", root.display()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            consider(&path, options, &mut stats, &mut out);
        }
        out.sort();
    }

    Ok((out, stats))
}

fn consider(path: &Path, options: ScanOptions, stats: &mut ScanStats, out: &mut Vec<PathBuf>) {
    stats.scanned_files += 1;
    if is_hidden(path) && !options.include_hidden {
        stats.skipped_hidden += 1;
        return;
    }
    if is_sidecar(path) {
        stats.skipped_sidecars += 1;
        return;
    }
    out.push(path.to_path_buf());
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn is_sidecar(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(crate::sidecar::SIDECAR_EXTENSION))
        .unwrap_or(false)
}
