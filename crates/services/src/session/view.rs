//! Presentation-agnostic snapshots of the running session.

use tutor_core::model::{LessonId, NavigationView, NextLessonTarget};

/// One row of the task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub number: u32,
    pub description: String,
    pub completed: bool,
    pub selected: bool,
}

/// Completion tally for the lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonProgress {
    pub total: usize,
    pub completed: usize,
    pub is_terminal: bool,
}

/// Everything a front-end needs to render the session, captured in one
/// consistent snapshot.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub lesson_id: LessonId,
    pub title: String,
    pub subtitle: String,
    pub tasks: Vec<TaskItem>,
    pub progress: LessonProgress,
    pub navigation: NavigationView,
    pub next_lesson: Option<NextLessonTarget>,
}
