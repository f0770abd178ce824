//! Per-request scratch directories

use std::path::Path;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::JudgeError;

/// Exclusively-owned scratch directory for one execution request.
///
/// The directory is removed when the value is dropped, so cleanup runs on
/// every exit path out of the owning request: normal completion, an early
/// `?` return, or a panic unwinding through the judger.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Allocate a fresh uniquely-named directory
    pub fn create() -> Result<Self, JudgeError> {
        let dir = tempfile::Builder::new()
            .prefix("judge-")
            .tempdir()
            .map_err(JudgeError::Workspace)?;

        debug!("Created workspace at {:?}", dir.path());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now instead of at drop. Removal failures are
    /// logged, not returned; the request already has its outcome by the
    /// time cleanup runs.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove workspace {:?}: {}", path, e);
        } else {
            debug!("Removed workspace {:?}", path);
        }
    }
}
