//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::{ProgressError, QuizError};
use gateway::GatewayError;

/// Errors emitted by `LessonTracker`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackerError {
    #[error("lesson does not take video position samples")]
    NotAVideoLesson,
    #[error("lesson does not take reading time samples")]
    NotATextLesson,
    #[error("lesson has no quiz")]
    NoQuiz,
    #[error("lesson has no assignment")]
    NoAssignment,
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Errors emitted by `ProgressStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("lesson is not part of the course")]
    UnknownLesson,
    #[error("lesson has no quiz")]
    NoQuiz,
    #[error("lesson has no assignment")]
    NoAssignment,
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Errors emitted by `LessonFlowService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlowError {
    #[error("lesson is not part of the course")]
    UnknownLesson,
    #[error("lesson has no quiz")]
    NoQuiz,
    #[error("lesson has no assignment")]
    NoAssignment,
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors emitted by `NavigationController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NavigationError {
    #[error("course has no lessons")]
    EmptyCourse,
    #[error("no lesson at module {module_idx}, lesson {lesson_idx}")]
    OutOfBounds {
        module_idx: usize,
        lesson_idx: usize,
    },
}

/// Errors emitted by `CertificateService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CertificateServiceError {
    #[error("course does not offer a certificate")]
    Unavailable,
    #[error("completion {percent:.1}% is below the required {required}%")]
    CompletionBelowRequirement { percent: f64, required: u8 },
    #[error("overall score {score:.1} is below the required minimum {required}")]
    ScoreBelowMinimum { score: f64, required: u8 },
    #[error(transparent)]
    Certificate(#[from] course_core::model::CertificateError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
