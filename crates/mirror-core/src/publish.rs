//! Whole-document publication.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{MirrorError, Result};

/// Replace `path` with `contents` so readers only ever see the old or the new file.
///
/// Content goes to a temp file in the destination directory which is synced
/// and then renamed over `path`. If anything fails the temp file is dropped
/// and the previous document stays as it was.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let publish_err = |source| MirrorError::Publish {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(&parent).map_err(publish_err)?;

    let mut temp = NamedTempFile::new_in(&parent).map_err(publish_err)?;
    temp.write_all(contents).map_err(publish_err)?;
    temp.as_file().sync_all().map_err(publish_err)?;

    // Temp files are created owner-only; published documents are served to others.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(publish_err)?;
    }

    temp.persist(path).map_err(|e| publish_err(e.error))?;

    Ok(())
}
