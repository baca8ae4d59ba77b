use crate::archive::ArchiveExtractor;
use domain::models::{RepositoryContext, SourceFile};
use memmap2::Mmap;
use rayon::prelude::*;
use shared::error::{ArchiveError, FileReadError};
use shared::telemetry::Telemetry;
use shared::utils::{is_ignored_dir, is_supported_file};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extract `archive_path` and collect its source files into a repository
/// context. The scratch directory is gone by the time this returns.
pub fn collect_archive(archive_path: &Path) -> Result<RepositoryContext, ArchiveError> {
    let telemetry = Telemetry::new();
    let context =
        ArchiveExtractor::with_extracted(archive_path, |root| SourceCollector::new(root).collect())??;
    info!(
        archive = %archive_path.display(),
        files = context.file_count(),
        bytes = context.context_blob().len(),
        elapsed_ms = telemetry.elapsed_ms() as u64,
        "repository collected"
    );
    Ok(context)
}

/// Walks an extracted tree and concatenates every readable source file.
pub struct SourceCollector {
    root_path: PathBuf,
}

impl SourceCollector {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    pub fn collect(&self) -> io::Result<RepositoryContext> {
        let files = self.collect_files()?;
        Ok(RepositoryContext::from_sources(self.read_sources(&files)))
    }

    /// Supported files in walk order: each directory's files sorted by name,
    /// then its subdirectories sorted by name.
    pub fn collect_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        self.collect_files_recursive(&self.root_path, &mut files)?;
        Ok(files)
    }

    /// Read `paths` in parallel, keeping their order. Unreadable files are
    /// dropped along with their path.
    pub fn read_sources(&self, paths: &[PathBuf]) -> Vec<SourceFile> {
        let results: Vec<Result<SourceFile, FileReadError>> =
            paths.par_iter().map(|path| self.read_source(path)).collect();
        results
            .into_iter()
            .filter_map(|res| match res {
                Ok(source) => Some(source),
                Err(err) => {
                    debug!(error = %err, "skipping unreadable file");
                    None
                }
            })
            .collect()
    }

    fn collect_files_recursive(&self, dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
        let mut dir_files = Vec::new();
        let mut subdirs = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                let name = entry.file_name();
                if is_ignored_dir(&name.to_string_lossy()) {
                    debug!(dir = %path.display(), "pruning directory");
                    continue;
                }
                subdirs.push(path);
            } else if path.is_file() && is_supported_file(&path) {
                dir_files.push(path);
            }
        }

        dir_files.sort();
        subdirs.sort();
        files.append(&mut dir_files);

        for subdir in subdirs {
            if let Err(err) = self.collect_files_recursive(&subdir, files) {
                warn!(dir = %subdir.display(), error = %err, "skipping unreadable directory");
            }
        }
        Ok(())
    }

    fn read_source(&self, path: &Path) -> Result<SourceFile, FileReadError> {
        let wrap = |source: io::Error| FileReadError {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(wrap)?;
        let len = file.metadata().map_err(wrap)?.len();
        let content = if len == 0 {
            String::new()
        } else {
            let mmap = unsafe { Mmap::map(&file).map_err(wrap)? };
            // Lossy conversion ensures non-UTF8 bytes don't abort the walk.
            String::from_utf8_lossy(&mmap).into_owned()
        };
        Ok(SourceFile::new(self.relative_path(path), content))
    }

    fn relative_path(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root_path).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
