//! Conversation driver and interactive session.
//!
//! | Module | Role |
//! |--------|------|
//! | [`transcript`] | append-only history with tool-result correlation checks |
//! | [`driver`] | bounded model/tool loop over an explicit transcript |
//! | [`session`] | prompt loop, quit handling and peer shutdown |
//! | [`prompt`] | default system prompt and user-facing hints |

pub mod driver;
pub mod prompt;
pub mod session;
pub mod transcript;

pub use driver::{ConversationDriver, RoundOutcome, TurnOutcome, DEFAULT_MAX_ROUNDS};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use session::{Session, SessionEnd};
pub use transcript::Transcript;
