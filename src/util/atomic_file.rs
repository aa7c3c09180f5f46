use std::fs::{remove_file, rename, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, trace};
use uuid::Uuid;

use crate::error::{Result, SdkError};

/// Replaces the full contents of `path` with `data`.
///
/// The data is written to a uniquely named sibling file first, which is then renamed over the
///  target. A failure while writing leaves the previous file untouched.
pub fn write_atomically(path: &Path, data: &[u8]) -> Result<()> {
    let temp_path = temp_path_for(path);
    trace!("writing {} via temporary file {}", path.display(), temp_path.display());

    match do_write(&temp_path, data) {
        Ok(()) => {
            rename(&temp_path, path)
                .map_err(|e| SdkError::io(path, e))
        }
        Err(e) => {
            if temp_path.exists() {
                if let Err(cleanup_error) = remove_file(&temp_path) {
                    error!("error cleaning up temporary file {} after failed write: {}", temp_path.display(), cleanup_error);
                }
            }
            Err(e)
        }
    }
}

fn do_write(temp_path: &Path, data: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(temp_path)
        .map_err(|e| SdkError::io(temp_path, e))?;

    file.write_all(data)
        .map_err(|e| SdkError::io(temp_path, e))?;
    file.sync_all()
        .map_err(|e| SdkError::io(temp_path, e))?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut result = path.to_path_buf();
    result.set_file_name(format!(".{}.{}.writing", file_name, Uuid::new_v4().as_hyphenated()));
    result
}
