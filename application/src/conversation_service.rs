use crate::prompt::build_prompt;
use domain::models::ImageAttachment;
use domain::session::Session;
use futures::StreamExt;
use infrastructure::model_client::{ChunkStream, ModelClient};
use shared::error::{MissingInputError, ModelRequestError, RepoMindError};
use shared::telemetry::Telemetry;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// One user submission: a question and an optional screenshot.
#[derive(Debug, Clone, Default)]
pub struct UserTurn {
    pub question: String,
    pub image: Option<ImageAttachment>,
}

impl UserTurn {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }
}

/// Subscriber for a streaming reply. The terminal renderer, logging and tests
/// all hook in here.
pub trait TurnObserver {
    /// Called for every non-empty chunk with the new text and everything
    /// received so far.
    fn on_text(&mut self, delta: &str, accumulated: &str);

    fn on_complete(&mut self, _reply: &str) {}

    fn on_failed(&mut self, _error: &ModelRequestError) {}
}

/// Observer that ignores everything.
pub struct SilentObserver;

impl TurnObserver for SilentObserver {
    fn on_text(&mut self, _delta: &str, _accumulated: &str) {}
}

pub struct ConversationService<C> {
    client: C,
}

impl<C: ModelClient> ConversationService<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run one turn to completion.
    ///
    /// The user message is recorded before the model is called. The assistant
    /// message is recorded only when the stream finishes cleanly; on failure or
    /// cancellation the transcript keeps just the user entry.
    pub async fn on_user_turn_submitted(
        &mut self,
        session: &mut Session,
        turn: UserTurn,
        observer: &mut dyn TurnObserver,
        cancel: &CancellationToken,
    ) -> Result<String, RepoMindError> {
        if turn.question.trim().is_empty() {
            return Err(MissingInputError::EmptyQuestion.into());
        }
        let parts = {
            let repository = session
                .repository()
                .ok_or(MissingInputError::RepositoryNotLoaded)?;
            build_prompt(repository, &turn.question, turn.image.as_ref())
        };
        let api_key = session.api_key().ok_or(MissingInputError::ApiKey)?;
        self.client.configure(api_key);

        let telemetry = Telemetry::new();
        session.push_user(turn.question, turn.image.as_ref().map(|i| i.to_ref()));

        let stream = self.client.generate_content(parts, true);
        match drain(stream, observer, cancel).await {
            Ok(reply) => {
                info!(
                    chars = reply.len(),
                    elapsed_ms = telemetry.elapsed_ms() as u64,
                    "turn complete"
                );
                observer.on_complete(&reply);
                session.push_assistant(reply.clone());
                Ok(reply)
            }
            Err(err) => {
                warn!(error = %err, "turn failed");
                observer.on_failed(&err);
                Err(err.into())
            }
        }
    }
}

/// Consume a reply stream, forwarding text to `observer`, until it ends, fails
/// or `cancel` fires.
pub async fn drain(
    mut stream: ChunkStream,
    observer: &mut dyn TurnObserver,
    cancel: &CancellationToken,
) -> Result<String, ModelRequestError> {
    let mut accumulated = String::new();
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ModelRequestError::Cancelled),
            item = stream.next() => item,
        };
        match next {
            None => break,
            Some(Err(err)) => return Err(err),
            Some(Ok(chunk)) => {
                let Some(text) = chunk.text.filter(|t| !t.is_empty()) else {
                    continue;
                };
                accumulated.push_str(&text);
                observer.on_text(&text, &accumulated);
            }
        }
    }
    Ok(accumulated)
}
