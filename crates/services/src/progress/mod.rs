mod aggregate;
mod store;
mod tracker;
mod workflow;

// Public API of the progress subsystem.
pub use crate::error::{StoreError, TrackerError};
pub use aggregate::{CourseCompletion, ModuleCompletion};
pub use store::{ProgressStore, ProgressUpdate};
pub use tracker::{AUTOSAVE_INTERVAL_SECS, LessonTracker, Sample};
pub use workflow::{LessonFlowService, QuizOutcome, SampleOutcome};
