pub mod error;
pub mod generator;
pub mod prompt;

pub use error::GenError;
pub use generator::{ChunkCallback, Generate, Generator};
pub use prompt::{PromptSet, related_prompt, topic_prompt};
