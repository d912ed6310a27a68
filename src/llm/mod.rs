pub mod client;
pub mod openai;

pub use client::{
    CompletionClientBuilder, CompletionProvider, CompletionRequest, CompletionResponse,
    FinishReason, ProviderError, Usage,
};
pub use openai::OpenAiCompatibleClient;
