//! Local directory repository.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;
use walkdir::WalkDir;

use super::{RepositoryError, SourceFilter, SourceRef, SourceRepository};
use crate::config::RepositoryConfig;

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["__pycache__", "node_modules", "venv", "site-packages"];

/// A checkout or any directory tree on disk.
pub struct LocalRepository {
    root: PathBuf,
    filter: SourceFilter,
}

impl LocalRepository {
    pub fn new<P: AsRef<Path>>(root: P, config: &RepositoryConfig) -> Result<Self, RepositoryError> {
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            filter: SourceFilter::from_config(config)?,
        })
    }

    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

#[async_trait]
impl SourceRepository for LocalRepository {
    fn identity(&self) -> String {
        self.root
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| "local".to_string())
    }

    async fn list_sources(&self) -> Result<Vec<SourceRef>, RepositoryError> {
        let mut sources = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !name.starts_with('.') && !SKIPPED_DIRS.contains(&&*name)
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = self.relative_path(entry.path());
            if self.filter.matches(&relative) {
                sources.push(SourceRef::new(
                    relative,
                    entry.path().to_string_lossy().to_string(),
                ));
            }
        }

        Ok(sources)
    }

    async fn fetch(&self, source: &SourceRef) -> Result<String, RepositoryError> {
        Ok(std::fs::read_to_string(&source.location)?)
    }
}
