//! Post-hoc evidence: a screenshot and the rendered markup, captured on
//! every exit path. Capture is strictly best-effort: it runs inside the
//! cleanup of a possibly-failed run and must never throw or replace the
//! error that brought it there.

use std::path::{Path, PathBuf};

use fantoccini::Client;
use tracing::{debug, warn};

/// Fixed destination paths, overwritten on each run.
#[derive(Debug, Clone)]
pub struct EvidencePaths {
    pub screenshot: PathBuf,
    pub html: PathBuf,
}

/// Capture both artifacts from the client's current browsing context.
/// Swallows every internal failure (page gone, session dead, disk full).
pub async fn capture(client: &Client, paths: &EvidencePaths) {
    match client.screenshot().await {
        Ok(png) => write_artifact(&paths.screenshot, &png),
        Err(err) => warn!(error = %err, "screenshot capture failed"),
    }

    match client.source().await {
        Ok(html) => write_artifact(&paths.html, html.as_bytes()),
        Err(err) => warn!(error = %err, "markup capture failed"),
    }
}

fn write_artifact(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(path = %path.display(), error = %err, "evidence directory not writable");
                return;
            }
        }
    }
    match std::fs::write(path, bytes) {
        Ok(()) => debug!(path = %path.display(), bytes = bytes.len(), "evidence written"),
        Err(err) => warn!(path = %path.display(), error = %err, "evidence write failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_artifact_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/deeper/shot.png");

        write_artifact(&path, b"png-bytes");

        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");
    }

    #[test]
    fn write_artifact_overwrites_previous_runs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("page.html");

        write_artifact(&path, b"first");
        write_artifact(&path, b"second");

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn write_artifact_swallows_unwritable_destinations() {
        let tmp = TempDir::new().unwrap();
        let file_as_dir = tmp.path().join("occupied");
        std::fs::write(&file_as_dir, b"a file, not a directory").unwrap();

        // parent path is a file; creation fails and is only logged
        write_artifact(&file_as_dir.join("shot.png"), b"bytes");
    }
}
