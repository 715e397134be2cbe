use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

/// Temporary directory for intermediate renders
///
/// Lives next to the final output so finished files can be moved into place
/// with a rename. The directory and everything in it is removed when the
/// value is dropped, whichever way the run ends.
pub struct ScratchSpace {
    dir: Option<tempfile::TempDir>,
    path: PathBuf,
}

impl ScratchSpace {
    pub fn create_in<P: AsRef<Path>>(parent: P) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(".timelapse-tmp-")
            .tempdir_in(parent.as_ref())?;
        let path = dir.path().to_path_buf();
        debug!("Created scratch space {:?}", path);

        Ok(Self { dir: Some(dir), path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of an intermediate file inside the scratch space
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Remove the scratch space now, reporting failures instead of ignoring them
    pub fn close(mut self) -> Result<()> {
        if let Some(dir) = self.dir.take() {
            dir.close()?;
            debug!("Removed scratch space {:?}", self.path);
        }
        Ok(())
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                warn!("Failed to remove scratch space {:?}: {}", self.path, e);
            }
        }
    }
}
