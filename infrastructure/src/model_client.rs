use domain::models::{GenerationChunk, PromptPart};
use futures::stream::BoxStream;
use shared::error::ModelRequestError;

pub type ChunkStream = BoxStream<'static, Result<GenerationChunk, ModelRequestError>>;

/// The one capability the conversation needs from a hosted model.
///
/// `generate_content` never fails eagerly: request errors arrive as the first
/// item of the returned stream. With `stream == false` the stream yields the
/// whole reply as a single chunk.
pub trait ModelClient: Send + Sync {
    fn configure(&mut self, api_key: &str);

    fn generate_content(&self, parts: Vec<PromptPart>, stream: bool) -> ChunkStream;
}
