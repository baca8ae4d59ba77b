use shared::error::ArchiveError;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

const SCRATCH_PREFIX: &str = "repomind-";

/// Unpacks zip archives into a scratch directory that only lives as long as
/// the caller's read pass.
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    /// Extract `archive_path` into a fresh scratch directory, run `read` on the
    /// extraction root, then delete the directory. The directory is removed on
    /// every path out of this function, including extraction failures.
    pub fn with_extracted<T>(
        archive_path: &Path,
        read: impl FnOnce(&Path) -> T,
    ) -> Result<T, ArchiveError> {
        Self::with_extracted_in(&std::env::temp_dir(), archive_path, read)
    }

    /// Same as [`ArchiveExtractor::with_extracted`], with the scratch
    /// directory created under `scratch_parent`.
    pub fn with_extracted_in<T>(
        scratch_parent: &Path,
        archive_path: &Path,
        read: impl FnOnce(&Path) -> T,
    ) -> Result<T, ArchiveError> {
        if !archive_path.is_file() {
            return Err(ArchiveError::NotFound(archive_path.to_path_buf()));
        }

        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(scratch_parent)?;
        let written = Self::extract_into(archive_path, scratch.path())?;
        debug!(
            archive = %archive_path.display(),
            scratch = %scratch.path().display(),
            files = written,
            "archive extracted"
        );

        let output = read(scratch.path());
        Self::release(scratch);
        Ok(output)
    }

    fn extract_into(archive_path: &Path, dest: &Path) -> Result<usize, ArchiveError> {
        let file = File::open(archive_path)?;
        let mut archive = ZipArchive::new(BufReader::new(file)).map_err(map_zip_error)?;
        let mut written = 0;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(map_zip_error)?;
            let Some(relative) = entry.enclosed_name() else {
                warn!(entry = entry.name(), "skipping archive entry outside extraction root");
                continue;
            };
            let target = dest.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&target)?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            io::copy(&mut entry, &mut out)?;
            written += 1;
        }

        Ok(written)
    }

    fn release(scratch: TempDir) {
        let path = scratch.path().to_path_buf();
        if let Err(err) = scratch.close() {
            warn!(scratch = %path.display(), error = %err, "failed to remove scratch directory");
        }
    }
}

fn map_zip_error(err: ZipError) -> ArchiveError {
    match err {
        ZipError::Io(io) => ArchiveError::Io(io),
        other => ArchiveError::Invalid(other.to_string()),
    }
}
