use thiserror::Error;

use crate::model::assignment::Assignment;
use crate::model::criteria::CompletionCriteria;
use crate::model::ids::LessonId;
use crate::model::quiz::Quiz;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("quiz lesson must carry a quiz")]
    MissingQuiz,

    #[error("assignment lesson must carry an assignment")]
    MissingAssignment,

    #[error("completion criteria require a quiz pass but the lesson has no quiz")]
    QuizGateWithoutQuiz,

    #[error("completion criteria require a submission but the lesson has no assignment")]
    AssignmentGateWithoutAssignment,
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// The five supported lesson content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonType {
    Video,
    Text,
    Quiz,
    Assignment,
    Live,
}

/// Smallest unit of course content.
///
/// A lesson owns its completion criteria and any quiz/assignment content.
/// Cross-field consistency is enforced at construction so the completion
/// evaluator never has to re-check it.
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    id: LessonId,
    order: u32,
    title: String,
    lesson_type: LessonType,
    criteria: CompletionCriteria,
    quiz: Option<Quiz>,
    assignment: Option<Assignment>,
    video_duration_secs: u32,
}

impl Lesson {
    /// Creates a validated lesson.
    ///
    /// `video_duration_secs` is only meaningful for video lessons; 0 means
    /// the duration is unknown.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` when the title is blank, a quiz/assignment
    /// lesson is missing its content, or a criteria gate points at content
    /// the lesson does not have.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: LessonId,
        order: u32,
        title: impl Into<String>,
        lesson_type: LessonType,
        criteria: CompletionCriteria,
        quiz: Option<Quiz>,
        assignment: Option<Assignment>,
        video_duration_secs: u32,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        if lesson_type == LessonType::Quiz && quiz.is_none() {
            return Err(LessonError::MissingQuiz);
        }
        if lesson_type == LessonType::Assignment && assignment.is_none() {
            return Err(LessonError::MissingAssignment);
        }
        if criteria.require_quiz_pass() && quiz.is_none() {
            return Err(LessonError::QuizGateWithoutQuiz);
        }
        if criteria.require_assignment_submission() && assignment.is_none() {
            return Err(LessonError::AssignmentGateWithoutAssignment);
        }

        Ok(Self {
            id,
            order,
            title: title.trim().to_owned(),
            lesson_type,
            criteria,
            quiz,
            assignment,
            video_duration_secs,
        })
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn lesson_type(&self) -> LessonType {
        self.lesson_type
    }

    #[must_use]
    pub fn criteria(&self) -> &CompletionCriteria {
        &self.criteria
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    #[must_use]
    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    #[must_use]
    pub fn video_duration_secs(&self) -> u32 {
        self.video_duration_secs
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
