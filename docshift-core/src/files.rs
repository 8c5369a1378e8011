//! File moving helpers used by the conversion pipeline.

use crate::error::{ConvertError, ConvertResult};
use glob::Pattern;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Replace (or with an empty `extension`, remove) the extension of `path`.
pub(crate) fn change_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension)
}

/// `path` without its extension.
pub(crate) fn strip_extension(path: &Path) -> PathBuf {
    path.with_extension("")
}

/// `path` with `suffix` appended to its file name (`doc.dvi` -> `doc.dvi.out`).
pub(crate) fn append_extension(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Directory containing `path`, `.` for bare file names.
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub(crate) fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Copy a single file, creating the destination directory if needed.
pub(crate) async fn copy_file(source: &Path, destination: &Path) -> ConvertResult<()> {
    let copy_failed = |error| ConvertError::CopyFailed {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        error,
    };

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await.map_err(copy_failed)?;
    }
    fs::copy(source, destination).await.map_err(copy_failed)?;
    Ok(())
}

/// Move a single file, falling back to copy and delete across filesystems.
pub(crate) async fn move_file(source: &Path, destination: &Path) -> ConvertResult<()> {
    let move_failed = |error| ConvertError::MoveFailed {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        error,
    };

    match fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(move_failed(e)),
        Err(_) => {
            fs::copy(source, destination).await.map_err(move_failed)?;
            fs::remove_file(source).await.map_err(move_failed)
        }
    }
}

/// Move (or copy) `from` to `to` together with every file in the same
/// directory that shares `from`'s extension and starts with its base name.
///
/// `doc.ps` and `doc-page2.ps` moved to `/out/paper.pdf` become
/// `/out/paper.pdf` and `/out/paper-page2.pdf`.
pub(crate) async fn move_with_siblings(
    from: &Path,
    to: &Path,
    copy: bool,
) -> ConvertResult<Vec<PathBuf>> {
    if from == to {
        return Ok(vec![to.to_path_buf()]);
    }

    let Some(extension) = from.extension().map(|e| e.to_string_lossy().into_owned()) else {
        transfer(from, to, copy).await?;
        return Ok(vec![to.to_path_buf()]);
    };

    if !from.exists() {
        return Err(ConvertError::MoveFailed {
            source: from.to_path_buf(),
            destination: to.to_path_buf(),
            error: std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
        });
    }

    let base = file_name_lossy(&strip_extension(from));
    let to_base = strip_extension(to);
    let to_extension = to
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();

    let pattern = format!(
        "{}/{}*.{}",
        Pattern::escape(&parent_dir(from).to_string_lossy()),
        Pattern::escape(&base),
        Pattern::escape(&extension)
    );

    let mut siblings: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(_) => vec![from.to_path_buf()],
    };
    if !siblings.iter().any(|p| p == from) {
        siblings.push(from.to_path_buf());
    }

    let mut moved = Vec::with_capacity(siblings.len());
    for sibling in siblings {
        let name = file_name_lossy(&sibling);
        let rest = name.get(base.len()..).unwrap_or_default();
        let mut target: OsString = to_base.as_os_str().to_owned();
        target.push(rest);
        let target = change_extension(Path::new(&target), &to_extension);

        transfer(&sibling, &target, copy).await?;
        moved.push(target);
    }

    Ok(moved)
}

async fn transfer(from: &Path, to: &Path, copy: bool) -> ConvertResult<()> {
    debug!(from = %from.display(), to = %to.display(), copy, "Transferring file");
    if copy {
        copy_file(from, to).await
    } else {
        move_file(from, to).await
    }
}

/// Rename a directory, replacing whatever is at the destination.
pub(crate) async fn replace_dir(from: &Path, to: &Path) -> ConvertResult<()> {
    let move_failed = |error| ConvertError::MoveFailed {
        source: from.to_path_buf(),
        destination: to.to_path_buf(),
        error,
    };

    if fs::metadata(to).await.is_ok() {
        fs::remove_dir_all(to).await.map_err(move_failed)?;
    }
    fs::rename(from, to).await.map_err(move_failed)
}
