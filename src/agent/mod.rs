pub mod orchestrator;
pub mod state;

pub use orchestrator::{ChatOrchestrator, ChatTurn};
pub use state::{OrchestrationState, StateTrace};
