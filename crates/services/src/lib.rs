#![forbid(unsafe_code)]

pub mod editor;
pub mod error;
pub mod notify;
pub mod pane;
pub mod session;

pub use tutor_core::Clock;

pub use editor::{BufferEditor, EditorSurface, SUBMIT_HINT};
pub use error::SessionError;
pub use notify::{BufferNotifier, Notice, NoticeLevel, Notifier, Popup};
pub use pane::{BufferPane, BufferSourcePane, PreviewPane, SourcePane, SourceTable};

pub use session::{
    ANSWER_MISSING_MESSAGE, CORRECT_MESSAGE, DEBOUNCE_QUIET_PERIOD, INCORRECT_MESSAGE,
    NETWORK_MESSAGE, SessionDriver, SessionLauncher, SessionView, Surfaces, TIMER_LOCKED_MESSAGE,
};
