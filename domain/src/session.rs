use crate::models::{ImageRef, RepositoryContext};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
    image: Option<ImageRef>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, image: Option<ImageRef>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            image,
        }
    }

    /// Assistant messages never carry an attachment.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            image: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }
}

/// Append-only record of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Per-user session state. Created empty; the credential is never persisted.
#[derive(Debug, Clone, Default)]
pub struct Session {
    api_key: Option<String>,
    repository: Option<RepositoryContext>,
    transcript: Transcript,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(api_key: Option<String>) -> Self {
        let mut session = Self::new();
        session.set_api_key(api_key);
        session
    }

    /// Blank keys are treated as absent.
    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn repository(&self) -> Option<&RepositoryContext> {
        self.repository.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.repository.is_some()
    }

    /// Replace the repository context wholesale. When `keep_transcript` is
    /// false the previous conversation is discarded with it.
    pub fn replace_repository(&mut self, repository: RepositoryContext, keep_transcript: bool) {
        self.repository = Some(repository);
        if !keep_transcript {
            self.transcript = Transcript::default();
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn push_user(&mut self, content: impl Into<String>, image: Option<ImageRef>) {
        self.transcript.push(ChatMessage::user(content, image));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatMessage::assistant(content));
    }
}
