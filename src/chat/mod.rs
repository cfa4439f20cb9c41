//! Client-side consumption of the token stream: transcript models, one
//! stream session per turn, the turn state machine, and prompt history.
mod core;
mod history;
mod models;
mod session;

pub use self::core::{Chat, ChatError, ERROR_NOTICE, TurnEvent, TurnState};
pub use history::PromptHistory;
pub use models::{Message, Role, Transcript};
pub use session::{SessionEvent, StreamSession};
