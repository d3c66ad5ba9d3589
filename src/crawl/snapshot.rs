//! Raw-HTML diagnostic snapshots.
//!
//! On lookup runs the page source can be dumped after each step so a human
//! can reconstruct what the site actually served when a run goes wrong.
//! Nothing else consumes these files; snapshot failures never affect the
//! crawl, they are logged and dropped.

use std::path::PathBuf;
use tracing::{debug, warn};

pub struct SnapshotDir {
    dir: PathBuf,
}

impl SnapshotDir {
    /// Best-effort: if the directory cannot be created, snapshots are
    /// silently disabled for the run.
    pub fn new(dir: impl Into<PathBuf>) -> Option<Self> {
        let dir = dir.into();
        match std::fs::create_dir_all(&dir) {
            Ok(()) => Some(Self { dir }),
            Err(e) => {
                warn!("snapshot dir {} unavailable: {}", dir.display(), e);
                None
            }
        }
    }

    pub fn save(&self, name: &str, html: &str) {
        let path = self.dir.join(format!("{name}.html"));
        match std::fs::write(&path, html) {
            Ok(()) => debug!("saved snapshot {}", path.display()),
            Err(e) => warn!("failed to save snapshot {}: {}", path.display(), e),
        }
    }

    /// Sequence-indexed snapshot, one per attempted detail page.
    pub fn save_indexed(&self, prefix: &str, index: usize, html: &str) {
        self.save(&format!("{prefix}_{index}"), html);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let snaps = SnapshotDir::new(tmp.path().join("debug")).unwrap();
        snaps.save_indexed("detail", 3, "<html></html>");
        let written = tmp.path().join("debug").join("detail_3.html");
        assert_eq!(std::fs::read_to_string(written).unwrap(), "<html></html>");
    }
}
