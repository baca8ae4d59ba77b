use domain::session::{Role, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryStatus {
    NotLoaded,
    Loaded { files: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub role: Role,
    pub content: String,
    pub attachment: Option<String>,
}

/// What the terminal should show for the current session. The question
/// prompt only exists once a repository is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub repository: RepositoryStatus,
    pub has_api_key: bool,
    pub chat_input_visible: bool,
    pub messages: Vec<MessageView>,
}

impl SessionView {
    pub fn from_session(session: &Session) -> Self {
        let repository = match session.repository() {
            Some(repo) => RepositoryStatus::Loaded {
                files: repo.file_count(),
            },
            None => RepositoryStatus::NotLoaded,
        };
        let messages = session
            .transcript()
            .messages()
            .iter()
            .map(|m| MessageView {
                role: m.role(),
                content: m.content().to_string(),
                attachment: m
                    .image()
                    .map(|i| format!("{} ({}x{})", i.name, i.width, i.height)),
            })
            .collect();
        Self {
            chat_input_visible: matches!(repository, RepositoryStatus::Loaded { .. }),
            repository,
            has_api_key: session.api_key().is_some(),
            messages,
        }
    }

    pub fn input_prompt(&self) -> &'static str {
        if self.chat_input_visible {
            "Ask about the code"
        } else {
            "Command"
        }
    }
}
