use crate::error::SidecarWriteError;
use crate::fs_ops::FileSystem;
use crate::media::{media_extension, DetailFields};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const SIDECAR_EXTENSION: &str = "nfo";

pub fn sidecar_path_for(asset_path: &Path) -> PathBuf {
    if media_extension(asset_path).is_some() {
        return asset_path.with_extension(SIDECAR_EXTENSION);
    }
    let mut name = asset_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".");
    name.push(SIDECAR_EXTENSION);
    asset_path.with_file_name(name)
}

pub fn render_movie_nfo(details: &DetailFields) -> String {
    let title = escape_xml(details.title.as_deref().unwrap_or_default());
    let year = escape_xml(details.year.as_deref().unwrap_or_default());
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<movie>\n  <title>{title}</title>\n  <year>{year}</year>\n</movie>\n"
    )
}

/// Writes `<basename>.nfo` next to the asset, replacing any existing one.
pub fn emit<F: FileSystem + ?Sized>(
    fs: &F,
    details: &DetailFields,
    asset_path: &Path,
) -> Result<PathBuf, SidecarWriteError> {
    let path = sidecar_path_for(asset_path);
    let body = render_movie_nfo(details);
    fs.write_file(&path, body.as_bytes())
        .map_err(|source| SidecarWriteError {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
