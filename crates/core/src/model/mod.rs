mod assignment;
mod certificate;
mod course;
mod criteria;
mod ids;
mod lesson;
mod progress;
mod quiz;

pub use assignment::{Assignment, AssignmentError, SubmissionKind};
pub use certificate::{
    Certificate, CertificateError, CertificateId, Grade, VerificationCode,
};
pub use course::{
    CertificatePolicy, CertificateRequirements, Course, CourseError, CourseModule,
};
pub use criteria::{
    CompletionCriteria, CriteriaError, DEFAULT_READ_TIME_SECS, DEFAULT_WATCH_PERCENT,
    MIN_READ_TIME_SECS,
};
pub use ids::{CourseId, LessonId, ModuleId, StudentId};
pub use lesson::{Lesson, LessonError, LessonType};
pub use progress::{LessonProgress, ProgressError};
pub use quiz::{AttemptLimit, Quiz, QuizError, QuizQuestion};
