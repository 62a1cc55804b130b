//! Fixed prompts sent to the AI service.

/// Instruction sent alongside image bytes to the captioning model. The
/// resulting caption is embedded through the same path as text chunks, so it
/// has to stand alone as a faithful textual rendition of the image.
pub const IMAGE_CAPTION_PROMPT: &str = "Provide a detailed factual description of the image. \
List all visible text, diagrams, charts, labels, and objects, including their spatial layout \
and relationships. Focus only on what can be directly seen, avoiding interpretation or \
assumptions. Describe every element as if preparing the image for a blind person to \
understand its structure and content.";
