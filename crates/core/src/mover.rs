use crate::error::MoveError;
use crate::fs_ops::FileSystem;
use std::path::{Path, PathBuf};

/// Moves `path` into `destination`, keeping its file name.
///
/// The destination directory must already exist and an existing file at the
/// target is never replaced. A failed move leaves `path` where it was.
pub fn move_to_dir<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    destination: &Path,
) -> Result<PathBuf, MoveError> {
    if !fs.is_dir(destination) {
        return Err(MoveError::Destination(destination.to_path_buf()));
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| MoveError::NoFileName(path.to_path_buf()))?;
    let target = destination.join(file_name);
    if target == path {
        return Ok(target);
    }
    if fs.exists(&target) {
        return Err(MoveError::Occupied(target));
    }

    fs.move_file(path, &target).map_err(|source| MoveError::Io {
        from: path.to_path_buf(),
        to: target.clone(),
        source,
    })?;
    Ok(target)
}
