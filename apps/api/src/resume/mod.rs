pub mod extractor;
pub mod handlers;
pub mod prompts;
pub mod upload;
