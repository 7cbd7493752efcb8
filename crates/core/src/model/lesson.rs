use thiserror::Error;

use crate::model::ids::LessonId;
use crate::model::schema::TableName;
use crate::model::task::ExerciseTask;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("lesson has no exercise tasks")]
    NoTasks,

    #[error("duplicate exercise order {0}")]
    DuplicateTaskNumber(u32),

    #[error("exercise orders must be dense from 1: expected {expected}, found {found}")]
    NonDenseTaskNumber { expected: u32, found: u32 },

    #[error("no task with exercise order {0}")]
    UnknownTask(u32),
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// A lesson and its graded exercise tasks, fetched once per session.
///
/// This is the single source of truth for the session: the task list is
/// immutable except for completion flags, which are flipped in place as
/// optimistic feedback when the server confirms a correct submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    id: LessonId,
    title: String,
    subtitle: String,
    tasks: Vec<ExerciseTask>,
    tables: Vec<TableName>,
}

impl Lesson {
    /// Build a lesson, sorting tasks by exercise order and verifying that the
    /// orders are unique and dense from 1.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` for a blank title,
    /// `LessonError::NoTasks` for an empty task list, and
    /// `LessonError::DuplicateTaskNumber` / `LessonError::NonDenseTaskNumber`
    /// when the exercise orders do not form 1..=N.
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        mut tasks: Vec<ExerciseTask>,
        tables: Vec<TableName>,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        if tasks.is_empty() {
            return Err(LessonError::NoTasks);
        }

        tasks.sort_by_key(ExerciseTask::number);
        for (index, task) in tasks.iter().enumerate() {
            let expected = index as u32 + 1;
            let found = task.number();
            if found == expected {
                continue;
            }
            if index > 0 && tasks[index - 1].number() == found {
                return Err(LessonError::DuplicateTaskNumber(found));
            }
            return Err(LessonError::NonDenseTaskNumber { expected, found });
        }

        Ok(Self {
            id,
            title,
            subtitle: subtitle.into(),
            tasks,
            tables,
        })
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    /// Tasks sorted by exercise order; position `i` holds order `i + 1`.
    #[must_use]
    pub fn tasks(&self) -> &[ExerciseTask] {
        &self.tasks
    }

    /// Default table references visible to every task without an override.
    #[must_use]
    pub fn tables(&self) -> &[TableName] {
        &self.tables
    }

    #[must_use]
    pub fn task(&self, number: u32) -> Option<&ExerciseTask> {
        let index = number.checked_sub(1)? as usize;
        self.tasks.get(index)
    }

    /// Lowest-numbered task not yet completed.
    #[must_use]
    pub fn first_uncompleted(&self) -> Option<u32> {
        self.tasks
            .iter()
            .find(|task| !task.is_completed())
            .map(ExerciseTask::number)
    }

    /// Next uncompleted task after `number`, scanning forward and wrapping to
    /// the start, visiting every order exactly once.
    #[must_use]
    pub fn next_uncompleted_after(&self, number: u32) -> Option<u32> {
        let total = self.tasks.len() as u32;
        (number + 1..=total)
            .chain(1..=number.min(total))
            .find(|&candidate| self.task(candidate).is_some_and(|task| !task.is_completed()))
    }

    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.tasks.iter().all(ExerciseTask::is_completed)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_completed()).count()
    }

    /// Flip the completion flag for one task. One-way, like
    /// [`ExerciseTask::mark_completed`].
    ///
    /// # Errors
    ///
    /// Returns `LessonError::UnknownTask` if no task has that order.
    pub fn complete_task(&mut self, number: u32) -> Result<(), LessonError> {
        let index = number
            .checked_sub(1)
            .map(|i| i as usize)
            .filter(|&i| i < self.tasks.len())
            .ok_or(LessonError::UnknownTask(number))?;
        self.tasks[index].mark_completed();
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::TaskId;

    fn task(id: u64, number: u32) -> ExerciseTask {
        ExerciseTask::new(
            TaskId::new(format!("1.{id}")),
            number,
            format!("task {number}"),
            "SELECT 1;",
        )
        .unwrap()
    }

    fn lesson(tasks: Vec<ExerciseTask>) -> Result<Lesson, LessonError> {
        Lesson::new(
            LessonId::new("lesson-1-basic-select"),
            "Basic SELECT",
            "Reading rows",
            tasks,
            Vec::new(),
        )
    }

    #[test]
    fn sorts_tasks_by_exercise_order() {
        let lesson = lesson(vec![task(20, 2), task(10, 1), task(30, 3)]).unwrap();
        let numbers: Vec<_> = lesson.tasks().iter().map(ExerciseTask::number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(lesson.task(2).unwrap().id(), &TaskId::new("1.20"));
    }

    #[test]
    fn rejects_duplicate_orders() {
        let err = lesson(vec![task(1, 1), task(2, 1)]).unwrap_err();
        assert_eq!(err, LessonError::DuplicateTaskNumber(1));
    }

    #[test]
    fn rejects_gapped_orders() {
        let err = lesson(vec![task(1, 1), task(2, 3)]).unwrap_err();
        assert_eq!(
            err,
            LessonError::NonDenseTaskNumber {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn rejects_orders_not_starting_at_one() {
        let err = lesson(vec![task(1, 2), task(2, 3)]).unwrap_err();
        assert_eq!(
            err,
            LessonError::NonDenseTaskNumber {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn rejects_empty_task_list() {
        assert_eq!(lesson(Vec::new()).unwrap_err(), LessonError::NoTasks);
    }

    #[test]
    fn first_uncompleted_skips_completed_prefix() {
        let tasks = vec![task(1, 1).with_completed(true), task(2, 2), task(3, 3)];
        let lesson = lesson(tasks).unwrap();
        assert_eq!(lesson.first_uncompleted(), Some(2));
    }

    #[test]
    fn next_uncompleted_scans_forward_then_wraps() {
        let tasks = vec![task(1, 1).with_completed(true), task(2, 2), task(3, 3)];
        let mut lesson = lesson(tasks).unwrap();
        lesson.complete_task(3).unwrap();
        assert_eq!(lesson.next_uncompleted_after(3), Some(2));
    }

    #[test]
    fn next_uncompleted_is_none_when_all_done() {
        let tasks = vec![task(1, 1).with_completed(true), task(2, 2)];
        let mut lesson = lesson(tasks).unwrap();
        lesson.complete_task(2).unwrap();
        assert_eq!(lesson.next_uncompleted_after(2), None);
        assert!(lesson.all_completed());
    }

    #[test]
    fn complete_task_rejects_unknown_order() {
        let mut lesson = lesson(vec![task(1, 1)]).unwrap();
        assert_eq!(
            lesson.complete_task(9).unwrap_err(),
            LessonError::UnknownTask(9)
        );
        assert_eq!(
            lesson.complete_task(0).unwrap_err(),
            LessonError::UnknownTask(0)
        );
    }
}
