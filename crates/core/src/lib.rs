#![forbid(unsafe_code)]

pub mod completion;
pub mod model;
pub mod time;

pub use completion::{Suggestion, SuggestionKind, TRIGGER_CHARACTERS};
pub use model::{
    CatalogEntry, Evaluation, ExerciseTask, Lesson, LessonError, LessonId, NavigationItem,
    NavigationView, NextLessonTarget, ParseIdError, PreviewTable, SchemaError, SqlContext,
    TableName, TableSchema, TaskError, TaskId,
};
pub use time::{Clock, FIXED_TEST_TIMESTAMP, fixed_clock, fixed_now};
