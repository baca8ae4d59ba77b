use serde::{Deserialize, Serialize};

pub const START_FILE_MARKER: &str = "--- START FILE: ";
pub const END_FILE_MARKER: &str = "--- END FILE: ";

/// One collected source file, path relative to the archive root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub relative_path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            content: content.into(),
        }
    }

    /// Append this file's delimited segment to `blob`. Content is copied
    /// verbatim; delimiter text inside a file is not escaped.
    pub fn write_segment(&self, blob: &mut String) {
        let path = &self.relative_path;
        blob.push('\n');
        blob.push_str(START_FILE_MARKER);
        blob.push_str(path);
        blob.push_str(" ---\n");
        blob.push_str(&self.content);
        blob.push('\n');
        blob.push_str(END_FILE_MARKER);
        blob.push_str(path);
        blob.push_str(" ---\n");
    }
}

/// The collected file list and the concatenated context blob of one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryContext {
    file_paths: Vec<String>,
    context_blob: String,
}

impl RepositoryContext {
    /// Build the path list and blob in one pass so they always agree.
    pub fn from_sources(sources: impl IntoIterator<Item = SourceFile>) -> Self {
        let mut file_paths = Vec::new();
        let mut context_blob = String::new();
        for source in sources {
            source.write_segment(&mut context_blob);
            file_paths.push(source.relative_path);
        }
        Self {
            file_paths,
            context_blob,
        }
    }

    pub fn file_paths(&self) -> &[String] {
        &self.file_paths
    }

    pub fn context_blob(&self) -> &str {
        &self.context_blob
    }

    pub fn file_count(&self) -> usize {
        self.file_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_paths.is_empty()
    }
}

/// Display metadata for a screenshot attached to a user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub name: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

/// A decoded screenshot, held only for the duration of one turn.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub name: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    pub fn to_ref(&self) -> ImageRef {
        ImageRef {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// One element of the ordered prompt sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPart {
    Text(String),
    Image(ImageAttachment),
}

impl PromptPart {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Image(_) => None,
        }
    }
}

/// One increment of a model response. Chunks may carry no text at all
/// (safety metadata, finish markers).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationChunk {
    pub text: Option<String>,
}

impl GenerationChunk {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            text: Some(value.into()),
        }
    }

    pub fn empty() -> Self {
        Self { text: None }
    }
}
