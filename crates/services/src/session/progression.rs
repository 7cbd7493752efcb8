//! Task progression: which task is selected and how the cursor moves.

use tutor_core::model::{ExerciseTask, Lesson, LessonError};

/// Outcome of a user-initiated task selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected,
    AlreadyCompleted,
    UnknownTask,
}

/// Owns the lesson copy and the selection cursor for one session.
///
/// The cursor is `None` only in the terminal state, once every task is
/// complete. At most one task is ever selected.
#[derive(Debug, Clone)]
pub struct TaskProgression {
    lesson: Lesson,
    cursor: Option<u32>,
}

impl TaskProgression {
    /// Start at the first uncompleted task, or terminal when there is none.
    #[must_use]
    pub fn new(lesson: Lesson) -> Self {
        let cursor = lesson.first_uncompleted();
        Self { lesson, cursor }
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn cursor(&self) -> Option<u32> {
        self.cursor
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.cursor.is_none()
    }

    /// The selected task, unless the session is terminal.
    #[must_use]
    pub fn selected_task(&self) -> Option<&ExerciseTask> {
        self.cursor.and_then(|number| self.lesson.task(number))
    }

    /// Move the cursor to `number` if it names an uncompleted task.
    ///
    /// The current selection is validated before anything changes, so a
    /// rejected select leaves the cursor exactly where it was.
    pub fn select(&mut self, number: u32) -> SelectOutcome {
        match self.lesson.task(number) {
            None => SelectOutcome::UnknownTask,
            Some(task) if task.is_completed() => SelectOutcome::AlreadyCompleted,
            Some(_) => {
                self.cursor = Some(number);
                SelectOutcome::Selected
            }
        }
    }

    /// Mark task `number` complete. Never reversed.
    ///
    /// # Errors
    ///
    /// Returns [`LessonError::UnknownTask`] if no task carries that number.
    pub fn complete(&mut self, number: u32) -> Result<(), LessonError> {
        self.lesson.complete_task(number)
    }

    /// Scan forward from just past `from`, wrapping to the start, for the
    /// next uncompleted task. Moves the cursor there, or into the terminal
    /// state when nothing remains.
    pub fn advance(&mut self, from: u32) -> Option<u32> {
        self.cursor = self.lesson.next_uncompleted_after(from);
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::model::{LessonId, TaskId};

    fn build_task(number: u32, completed: bool) -> ExerciseTask {
        ExerciseTask::new(
            TaskId::new(format!("1.{number}")),
            number,
            format!("Task {number}"),
            "SELECT 1;",
        )
        .unwrap()
        .with_completed(completed)
    }

    fn build_progression(completed: &[bool]) -> TaskProgression {
        let tasks = completed
            .iter()
            .enumerate()
            .map(|(index, done)| build_task(index as u32 + 1, *done))
            .collect();
        let lesson = Lesson::new(
            LessonId::new("lesson-1"),
            "Lesson 1",
            "Basics",
            tasks,
            Vec::new(),
        )
        .unwrap();
        TaskProgression::new(lesson)
    }

    #[test]
    fn starts_at_first_uncompleted_task() {
        let progression = build_progression(&[true, false, false]);
        assert_eq!(progression.cursor(), Some(2));
        assert!(!progression.is_terminal());
    }

    #[test]
    fn starts_terminal_when_everything_is_done() {
        let progression = build_progression(&[true, true]);
        assert_eq!(progression.cursor(), None);
        assert!(progression.is_terminal());
        assert!(progression.selected_task().is_none());
    }

    #[test]
    fn select_rejects_completed_and_unknown_targets() {
        let mut progression = build_progression(&[true, false, false]);

        assert_eq!(progression.select(1), SelectOutcome::AlreadyCompleted);
        assert_eq!(progression.cursor(), Some(2));

        assert_eq!(progression.select(9), SelectOutcome::UnknownTask);
        assert_eq!(progression.cursor(), Some(2));

        assert_eq!(progression.select(3), SelectOutcome::Selected);
        assert_eq!(progression.cursor(), Some(3));
    }

    #[test]
    fn advance_wraps_to_the_earliest_remaining_task() {
        // Tasks: 1 done, 2 open, 3 open. Completing 3 must wrap around to 2.
        let mut progression = build_progression(&[true, false, false]);
        progression.select(3);
        progression.complete(3).unwrap();

        assert_eq!(progression.advance(3), Some(2));
        assert_eq!(progression.cursor(), Some(2));
    }

    #[test]
    fn advance_after_the_last_task_is_terminal() {
        let mut progression = build_progression(&[true, false, true]);
        progression.complete(2).unwrap();

        assert_eq!(progression.advance(2), None);
        assert!(progression.is_terminal());
    }

    #[test]
    fn cursor_is_single_valued_across_transitions() {
        let mut progression = build_progression(&[false, false, false]);

        for number in [2, 3, 1, 3] {
            progression.select(number);
            let selected: Vec<u32> = progression
                .lesson()
                .tasks()
                .iter()
                .map(ExerciseTask::number)
                .filter(|n| progression.cursor() == Some(*n))
                .collect();
            assert_eq!(selected, vec![number]);
        }
    }
}
