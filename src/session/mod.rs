pub mod message;
pub mod request;

pub use message::{Message, MessageContent, MessageRole};
pub use request::{ChatRequest, ChatResponse};
