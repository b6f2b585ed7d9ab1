//! Session state: entries, the append-only log, windowing, and the disk mirror

pub mod log;
pub mod message;
pub mod mirror;
pub mod window;

pub use log::ConversationLog;
pub use message::{Message, Role};
pub use mirror::HistoryMirror;
pub use window::submission_window;
