mod context;
mod driver;
mod progression;
mod view;

// Public API of the session subsystem.
pub use context::ContextResolver;
pub use driver::{
    ANSWER_MISSING_MESSAGE, CORRECT_MESSAGE, DEBOUNCE_QUIET_PERIOD, INCORRECT_MESSAGE,
    NETWORK_MESSAGE, SessionDriver, SessionLauncher, Surfaces, TIMER_LOCKED_MESSAGE,
};
pub use progression::{SelectOutcome, TaskProgression};
pub use view::{LessonProgress, SessionView, TaskItem};
