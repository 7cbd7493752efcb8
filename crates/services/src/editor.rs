//! The slice of the editor widget the session needs to drive.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Banner seeded above the starter query when a lesson page opens.
pub const SUBMIT_HINT: &str = "-- Press Ctrl + Enter to submit your query\n";

/// Editor operations the session depends on. The widget itself stays a
/// black box behind this trait.
pub trait EditorSurface: Send + Sync {
    /// Current buffer content.
    fn text(&self) -> String;

    /// Replace the whole buffer.
    fn set_text(&self, text: &str);

    /// Lock or unlock the buffer against edits.
    fn set_read_only(&self, read_only: bool);

    /// Switch between the regular and the enlarged editor layout.
    fn set_large_layout(&self, large: bool);
}

/// In-memory editor surface used by tests and the terminal front-end.
#[derive(Debug, Default)]
pub struct BufferEditor {
    state: Mutex<EditorState>,
}

#[derive(Debug, Default)]
struct EditorState {
    text: String,
    read_only: bool,
    large_layout: bool,
}

impl BufferEditor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.state().read_only
    }

    #[must_use]
    pub fn large_layout(&self) -> bool {
        self.state().large_layout
    }
}

impl EditorSurface for BufferEditor {
    fn text(&self) -> String {
        self.state().text.clone()
    }

    fn set_text(&self, text: &str) {
        self.state().text = text.to_owned();
    }

    fn set_read_only(&self, read_only: bool) {
        self.state().read_only = read_only;
    }

    fn set_large_layout(&self, large: bool) {
        self.state().large_layout = large;
    }
}
