//! View model shared by the chat and admin controllers.
//!
//! `MessageLog` is the state behind one message container; `ViewEvent` is
//! what a controller publishes so a front end can mirror that state.

mod entry;
mod event;
mod log;

pub use entry::{ActionEntry, ActionKind, Entry, MessageEntry, NoticeLevel};
pub use event::{UserSummary, ViewEvent};
pub use log::{EntryHandle, MessageLog, PendingHandle, RenderError};
