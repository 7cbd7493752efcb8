mod catalog;
mod ids;
mod lesson;
mod preview;
mod schema;
mod task;

pub use catalog::{CatalogEntry, NavigationItem, NavigationView, NextLessonTarget};
pub use ids::{LessonId, ParseIdError, TaskId};

pub use lesson::{Lesson, LessonError};
pub use preview::{Evaluation, PreviewTable};
pub use schema::{SchemaError, SqlContext, TableName, TableSchema};
pub use task::{ExerciseTask, TaskError};
