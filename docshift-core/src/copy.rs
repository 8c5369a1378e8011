//! Copying export results out of the temp directory.

use crate::document::{OverwriteChoice, UserInterface};
use crate::error::ConvertResult;
use crate::files::copy_file;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::debug;

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// State of a copy batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    /// Copied, keep asking before overwriting
    Success,
    /// Copied, overwrite without asking from now on
    Force,
    /// The user cancelled; copy nothing more
    Cancel,
}

impl CopyStatus {
    pub fn is_forced(self) -> bool {
        self == CopyStatus::Force
    }
}

/// Copy `source` to `destination` as one step of an export batch.
///
/// Only files inside `temp_dir` are copied; anything else already lives
/// where the user put it. An existing destination with different content
/// needs confirmation unless `force` is set.
pub async fn copy_export_file(
    ui: &dyn UserInterface,
    temp_dir: &Path,
    source: &Path,
    destination: &Path,
    force: bool,
) -> ConvertResult<CopyStatus> {
    let mut status = if force {
        CopyStatus::Force
    } else {
        CopyStatus::Success
    };

    if !is_inside(source, temp_dir) {
        debug!(file = %source.display(), "Not in temp dir, leaving in place");
        return Ok(status);
    }

    if tokio::fs::metadata(destination).await.is_ok() {
        if same_content(source, destination).await? {
            debug!(file = %destination.display(), "Destination already up to date");
            return Ok(status);
        }
        if !force {
            status = match ui.confirm_overwrite(destination).await {
                OverwriteChoice::Overwrite => CopyStatus::Success,
                OverwriteChoice::OverwriteAll => CopyStatus::Force,
                OverwriteChoice::Cancel => return Ok(CopyStatus::Cancel),
            };
        }
    }

    copy_file(source, destination).await?;
    Ok(status)
}

fn is_inside(path: &Path, dir: &Path) -> bool {
    match (std::fs::canonicalize(path), std::fs::canonicalize(dir)) {
        (Ok(path), Ok(dir)) => path.starts_with(dir),
        _ => path.starts_with(dir),
    }
}

async fn same_content(a: &Path, b: &Path) -> ConvertResult<bool> {
    let (len_a, len_b) = (
        tokio::fs::metadata(a).await?.len(),
        tokio::fs::metadata(b).await?.len(),
    );
    if len_a != len_b {
        return Ok(false);
    }
    Ok(sha256_file(a).await? == sha256_file(b).await?)
}

/// Hex SHA-256 of a file's content.
pub async fn sha256_file(path: &Path) -> ConvertResult<String> {
    let file = File::open(path).await?;
    let mut reader = BufReader::with_capacity(HASH_BUFFER_SIZE, file);
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    let mut hasher = Sha256::new();

    loop {
        let bytes_read = reader.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
