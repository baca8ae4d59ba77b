//! Fixtures shared by the end-to-end suites.

use domain::models::{GenerationChunk, PromptPart};
use futures::stream::{self, StreamExt};
use infrastructure::model_client::{ChunkStream, ModelClient};
use shared::error::ModelRequestError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// What the scripted model does for one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Chunks(Vec<&'static str>),
    ChunksThenError(Vec<&'static str>, &'static str),
}

/// Model client replaying canned replies in order and recording every prompt.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    replies: Arc<Mutex<Vec<Reply>>>,
    prompts: Arc<Mutex<Vec<Vec<PromptPart>>>>,
    api_key: Arc<Mutex<Option<String>>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Reply>) -> Self {
        let mut replies = replies;
        replies.reverse();
        Self {
            replies: Arc::new(Mutex::new(replies)),
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<Vec<PromptPart>> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn api_key(&self) -> Option<String> {
        self.api_key.lock().unwrap().clone()
    }
}

impl ModelClient for ScriptedClient {
    fn configure(&mut self, api_key: &str) {
        *self.api_key.lock().unwrap() = Some(api_key.to_string());
    }

    fn generate_content(&self, parts: Vec<PromptPart>, _stream: bool) -> ChunkStream {
        self.prompts.lock().unwrap().push(parts);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Reply::Chunks(Vec::new()));
        let (chunks, error) = match reply {
            Reply::Chunks(chunks) => (chunks, None),
            Reply::ChunksThenError(chunks, message) => (chunks, Some(message)),
        };
        let mut items: Vec<Result<GenerationChunk, ModelRequestError>> = chunks
            .into_iter()
            .map(|c| Ok(GenerationChunk::text(c)))
            .collect();
        if let Some(message) = error {
            items.push(Err(ModelRequestError::Api {
                status: 429,
                message: message.to_string(),
            }));
        }
        stream::iter(items).boxed()
    }
}

/// Write a zip archive; names ending in `/` become directory entries.
pub fn write_zip(dir: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let mut writer = ZipWriter::new(std::fs::File::create(&path).expect("create zip"));
    let options = SimpleFileOptions::default();
    for (entry, content) in files {
        if entry.ends_with('/') {
            writer.add_directory(*entry, options).expect("add dir");
        } else {
            writer.start_file(*entry, options).expect("start file");
            writer.write_all(content.as_bytes()).expect("write entry");
        }
    }
    writer.finish().expect("finish zip");
    path
}

pub fn segment_count(blob: &str) -> usize {
    blob.matches(domain::models::START_FILE_MARKER).count()
}
