use domain::models::{ImageAttachment, PromptPart, RepositoryContext};

pub const SYSTEM_INSTRUCTION: &str = "Role: You are 'RepoMind Vision', an expert Full-Stack Architect.

Goal: Analyze the code and the visual screenshot to find the bug.

Rules:
1. If an image is provided, start by describing what you see (UI bugs, alignment, colors).
2. Link the visual error to specific lines of code in the provided codebase.
3. Provide the FIX in a code block.";

pub const SCREENSHOT_INSTRUCTION: &str =
    "Instruction: Compare this screenshot with the code above.";

pub const BEGIN_CONTEXT_MARKER: &str = "--- BEGIN REPOSITORY CONTEXT ---";
pub const END_CONTEXT_MARKER: &str = "--- END REPOSITORY CONTEXT ---";

/// Trailing glyph shown while a reply is still streaming.
pub const CURSOR_GLYPH: char = '▌';

/// Ordered prompt for one turn: instructions, repository, question, then the
/// screenshot and its instruction when one is attached.
pub fn build_prompt(
    repository: &RepositoryContext,
    question: &str,
    image: Option<&ImageAttachment>,
) -> Vec<PromptPart> {
    let mut parts = vec![
        PromptPart::text(SYSTEM_INSTRUCTION),
        PromptPart::Text(repository_block(repository)),
        PromptPart::Text(format!("User Question: {}", question)),
    ];
    if let Some(image) = image {
        parts.push(PromptPart::Image(image.clone()));
        parts.push(PromptPart::text(SCREENSHOT_INSTRUCTION));
    }
    parts
}

pub fn repository_block(repository: &RepositoryContext) -> String {
    format!(
        "{}\nFile Structure: {:?}\n\n{}\n{}",
        BEGIN_CONTEXT_MARKER,
        repository.file_paths(),
        repository.context_blob(),
        END_CONTEXT_MARKER
    )
}

/// Partial reply as it should be displayed mid-stream.
pub fn live_view(accumulated: &str) -> String {
    let mut view = String::with_capacity(accumulated.len() + CURSOR_GLYPH.len_utf8());
    view.push_str(accumulated);
    view.push(CURSOR_GLYPH);
    view
}
