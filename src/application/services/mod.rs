//! Application services - Use case implementations
//!
//! The session orchestrator runs the rules of one room; the AI planners
//! decide what unattended figures do on their turn.

pub mod ai;
pub mod errors;
pub mod session_orchestrator;

pub use errors::GameError;
pub use session_orchestrator::{CompletionCheck, SessionOrchestrator};
