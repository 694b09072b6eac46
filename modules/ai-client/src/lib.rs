pub mod error;
pub mod openai;
pub mod openrouter;
pub mod registry;
pub mod traits;
pub mod util;
pub(crate) mod wire;

pub use error::AiError;
pub use openai::OpenAi;
pub use openrouter::OpenRouter;
pub use registry::{build_provider, ProviderKind};
pub use traits::{
    Completion, CompletionParams, CompletionRequest, Message, MessageRole, TextGenerationProvider,
};
pub use util::{last_turns, truncate_to_char_boundary};
