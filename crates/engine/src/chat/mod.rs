pub mod cost;
pub mod engine;
pub mod session;
pub mod transcript;
pub mod turn;

pub use engine::ChatEngine;
pub use session::{ChatSession, SessionManager};
pub use transcript::Transcript;
pub use turn::{TurnError, TurnOutcome, TurnReport};
