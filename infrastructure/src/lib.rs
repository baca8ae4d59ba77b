pub mod archive;
pub mod config;
pub mod gemini_client;
pub mod image_loader;
pub mod model_client;
pub mod source_collector;
