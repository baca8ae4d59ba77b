pub mod analyze_service;
pub mod conversation_service;
pub mod prompt;
