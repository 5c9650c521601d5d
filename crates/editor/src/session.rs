use chrono::{DateTime, Duration, Utc};
use log::debug;

use traintext_domain::{
    WorkoutExecutionState, apply_parsed, generate_workout_text, parse_workout_text,
};

/// A keystroke keeps the user "typing" for this long.
pub const TYPING_IDLE_MS: i64 = 1000;
/// A text change is parsed into structured state after this much quiet.
pub const PARSE_DEBOUNCE_MS: i64 = 400;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SyncRefused {
    #[error("user is typing")]
    UserTyping,
}

/// Session-scoped controller binding a text buffer to a structured
/// workout state.
///
/// Text to state is continuous: every buffer change (re)arms a debounce
/// deadline, and a later [`EditorSession::poll`] parses the latest buffer
/// (last write wins). State to text is discrete: it happens only on an
/// explicit [`EditorSession::request_ui_to_text_sync`] call and is refused
/// while the user is typing, so in-progress keystrokes are never
/// clobbered.
///
/// Timers are plain deadline data driven by the caller's clock; dropping
/// or closing the session can therefore never leave a dangling callback.
#[derive(Debug, Clone)]
pub struct EditorSession {
    state: WorkoutExecutionState,
    buffer: String,
    last_parsed: Option<String>,
    typing_until: Option<DateTime<Utc>>,
    parse_at: Option<DateTime<Utc>>,
}

impl EditorSession {
    /// Opens a session on the given state. The buffer starts out as the
    /// serialized form of the state.
    #[must_use]
    pub fn new(state: WorkoutExecutionState) -> Self {
        let buffer = generate_workout_text(&state.workout, &state.progress);
        Self {
            state,
            last_parsed: Some(buffer.clone()),
            buffer,
            typing_until: None,
            parse_at: None,
        }
    }

    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub fn state(&self) -> &WorkoutExecutionState {
        &self.state
    }

    /// Direct structured edits (checkboxes, row fields) mutate the state
    /// in place; they do not touch the text buffer until an explicit
    /// [`EditorSession::request_ui_to_text_sync`].
    pub fn state_mut(&mut self) -> &mut WorkoutExecutionState {
        &mut self.state
    }

    #[must_use]
    pub fn is_user_typing(&self, now: DateTime<Utc>) -> bool {
        self.typing_until.is_some_and(|deadline| now < deadline)
    }

    #[must_use]
    pub fn has_pending_parse(&self) -> bool {
        self.parse_at.is_some()
    }

    /// Stores the changed text. Unless the change is a self-echo of the
    /// last parsed or serialized text (a programmatic overwrite records
    /// `last_parsed`, so the change event it triggers is suppressed
    /// here), the typing and parse deadlines are (re)armed; a new
    /// keystroke before the parse deadline fires reschedules it.
    pub fn handle_text_changed(&mut self, text: &str, now: DateTime<Utc>) {
        if self.buffer != text {
            self.buffer = text.to_string();
        }
        if self.last_parsed.as_deref() == Some(text) {
            debug!("ignoring self-echo of {} bytes", text.len());
            return;
        }
        self.typing_until = Some(now + Duration::milliseconds(TYPING_IDLE_MS));
        self.parse_at = Some(now + Duration::milliseconds(PARSE_DEBOUNCE_MS));
    }

    /// Fires a due parse deadline: the latest buffer replaces the
    /// structured state. Returns whether the state was replaced.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        let due = self.parse_at.is_some_and(|deadline| now >= deadline);
        if !due {
            return false;
        }
        self.parse_at = None;
        let parsed = parse_workout_text(&self.buffer);
        self.state = apply_parsed(&parsed, &self.state);
        self.last_parsed = Some(self.buffer.clone());
        debug!("parsed buffer into {} exercises", parsed.len());
        true
    }

    /// Serializes the current state and overwrites the text buffer.
    /// Refused while the user is typing; the caller retries after the
    /// inactivity timeout (observable via the returned error). A parse
    /// deadline that is still armed is flushed first, so a quiet but
    /// not yet polled text edit reaches the state before the buffer is
    /// regenerated and is never lost.
    pub fn request_ui_to_text_sync(&mut self, now: DateTime<Utc>) -> Result<(), SyncRefused> {
        if self.is_user_typing(now) {
            debug!("refusing state to text sync while typing");
            return Err(SyncRefused::UserTyping);
        }
        // The parse deadline always precedes the typing-idle deadline,
        // so a pending parse is due by now and fires here.
        self.poll(now);
        let text = generate_workout_text(&self.state.workout, &self.state.progress);
        self.buffer.clone_from(&text);
        self.last_parsed = Some(text);
        Ok(())
    }

    /// Cancels all pending deadlines. Called on every exit path of the
    /// surrounding editor (close, unmount, navigation).
    pub fn close(&mut self) {
        self.typing_until = None;
        self.parse_at = None;
    }
}
