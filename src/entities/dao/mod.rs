//! Plain data structs mirroring database rows.

pub mod chat;
pub mod event;
pub mod session;

pub use chat::{ChatMessage, Sender};
pub use event::EventRecord;
pub use session::{ChatSession, SessionSummary};
