//! Transient notices and modal popups surfaced to the user.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tutor_core::model::TaskId;

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short-lived message shown near the editor, auto-dismissed by the
/// front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    level: NoticeLevel,
    message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn level(&self) -> NoticeLevel {
        self.level
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Modal popup content for the answer-reveal flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    /// A revealed answer: which task, its description, and the answer SQL.
    Answer {
        task: TaskId,
        description: String,
        sql: String,
    },
    /// The reveal was refused; carries the user-facing message.
    RevealError { message: String },
}

/// Sink for notices and popups.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    /// Show a popup. Any popup already on screen is fully replaced, content
    /// and style both.
    fn popup(&self, popup: Popup);
}

/// Recording notifier used by tests and the terminal front-end.
#[derive(Debug, Default)]
pub struct BufferNotifier {
    state: Mutex<NotifierState>,
}

#[derive(Debug, Default)]
struct NotifierState {
    notices: Vec<Notice>,
    popup: Option<Popup>,
}

impl BufferNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, NotifierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every notice received so far, oldest first.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.state().notices.clone()
    }

    #[must_use]
    pub fn last_notice(&self) -> Option<Notice> {
        self.state().notices.last().cloned()
    }

    /// The popup currently on screen.
    #[must_use]
    pub fn current_popup(&self) -> Option<Popup> {
        self.state().popup.clone()
    }
}

impl Notifier for BufferNotifier {
    fn notify(&self, notice: Notice) {
        self.state().notices.push(notice);
    }

    fn popup(&self, popup: Popup) {
        self.state().popup = Some(popup);
    }
}
