use domain::session::Session;
use infrastructure::source_collector::collect_archive;
use shared::error::{ArchiveError, MissingInputError, RepoMindError};
use std::path::PathBuf;
use tracing::{info, warn};

/// Inputs of the combined "submit & analyze" action.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeRequest {
    pub api_key: Option<String>,
    pub archive: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeOutcome {
    pub file_count: usize,
    pub transcript_cleared: bool,
}

pub struct AnalyzeService {
    keep_transcript: bool,
}

impl AnalyzeService {
    pub fn new(keep_transcript: bool) -> Self {
        Self { keep_transcript }
    }

    /// Validate inputs, extract and collect the archive, and replace the
    /// session's repository on success. On any error the session is left
    /// untouched.
    pub async fn on_analyze_requested(
        &self,
        session: &mut Session,
        request: AnalyzeRequest,
    ) -> Result<AnalyzeOutcome, RepoMindError> {
        let api_key = request
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(MissingInputError::ApiKey)?;
        let archive = request.archive.ok_or(MissingInputError::Archive)?;

        info!(archive = %archive.display(), "analyzing repository");
        let repository = tokio::task::spawn_blocking(move || collect_archive(&archive))
            .await
            .map_err(|e| ArchiveError::Io(std::io::Error::other(e)))?
            .inspect_err(|err| warn!(error = %err, "archive could not be loaded"))?;

        let transcript_cleared = !self.keep_transcript && !session.transcript().is_empty();
        let file_count = repository.file_count();
        session.set_api_key(Some(api_key));
        session.replace_repository(repository, self.keep_transcript);

        Ok(AnalyzeOutcome {
            file_count,
            transcript_cleared,
        })
    }
}
