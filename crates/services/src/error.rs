//! Shared error types for the services crate.

use thiserror::Error;

use gateway::GatewayError;
use tutor_core::model::LessonError;

/// Errors raised while starting a session.
///
/// A running session never bubbles errors to the caller: operational
/// failures are converted into notices and logged, and the prior state is
/// kept so the user can simply retry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Lesson(#[from] LessonError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
