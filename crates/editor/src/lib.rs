#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod edit_cache;
mod session;

pub use edit_cache::{PendingEdits, RowField};
pub use session::{EditorSession, PARSE_DEBOUNCE_MS, SyncRefused, TYPING_IDLE_MS};
