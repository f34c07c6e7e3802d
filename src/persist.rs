// Atomic file replacement shared by the on-disk stores
//
// The new contents go to a temporary file in the destination directory,
// which is synced and then renamed over `path`. Readers see either the old
// file or the new one, never a partial write.

use atomicwrites::{AllowOverwrite, AtomicFile};
use std::io::Write;
use std::path::Path;

/// Replace `path` with `contents`, creating parent directories as needed
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    AtomicFile::new(path, AllowOverwrite)
        .write(|file| file.write_all(contents))
        .map_err(|err| match err {
            atomicwrites::Error::Internal(err) => err,
            atomicwrites::Error::User(err) => err,
        })
}
