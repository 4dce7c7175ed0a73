#![forbid(unsafe_code)]

pub mod certificates;
pub mod error;
pub mod navigation;
pub mod progress;

pub use course_core::Clock;

pub use certificates::{
    CertificateService, Eligibility, Verification, VerifiedCertificate, check_eligibility,
};
pub use error::{
    CertificateServiceError, FlowError, NavigationError, StoreError, TrackerError,
};
pub use navigation::{
    AUTO_ADVANCE_DELAY, AdvanceTrigger, CourseCompletedEvent, NavigationController,
    NavigationStep, SessionPosition,
};
pub use progress::{
    AUTOSAVE_INTERVAL_SECS, CourseCompletion, LessonFlowService, LessonTracker,
    ModuleCompletion, ProgressStore, ProgressUpdate, QuizOutcome, Sample, SampleOutcome,
};
