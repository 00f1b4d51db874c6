//! Best-effort removal of files matching an extension.

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::GenieError;

/// Result of a sweep: what was removed and what could not be.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<GenieError>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Delete every `*.{extension}` file directly inside `dir`.
///
/// Each file is attempted independently; failures are collected in the
/// report and never stop the sweep.
pub async fn sweep_files(dir: &Path, extension: &str) -> SweepReport {
    sweep_with(dir, extension, |path| async move { tokio::fs::remove_file(&path).await }).await
}

async fn sweep_with<F, Fut>(dir: &Path, extension: &str, remove: F) -> SweepReport
where
    F: Fn(PathBuf) -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    let mut report = SweepReport::default();

    let Some(dir_str) = dir.to_str() else {
        report.failures.push(GenieError::Cleanup {
            path: dir.to_path_buf(),
            message: "directory path is not valid UTF-8".into(),
        });
        return report;
    };
    let pattern = format!("{}/*.{extension}", glob::Pattern::escape(dir_str));

    let entries = match glob::glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            report.failures.push(GenieError::Cleanup {
                path: dir.to_path_buf(),
                message: e.to_string(),
            });
            return report;
        }
    };

    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Failed to read sweep candidate");
                report.failures.push(GenieError::Cleanup {
                    path: e.path().to_path_buf(),
                    message: e.error().to_string(),
                });
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        match remove(path.clone()).await {
            Ok(()) => {
                info!(path = %path.display(), "Deleted image file");
                report.removed.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to delete file");
                report.failures.push(GenieError::Cleanup {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }

    report
}
