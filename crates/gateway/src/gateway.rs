use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_core::model::{
    Certificate, CertificateId, CourseId, LessonId, LessonProgress, ProgressError, StudentId,
    VerificationCode,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by gateway implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request failed with status {0}")]
    Status(u16),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    InvalidRecord(#[from] ProgressError),
}

/// Persisted shape for a lesson progress record.
///
/// Mirrors the domain `LessonProgress` so gateways can serialize it without
/// leaking transport concerns into the domain layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgressRecord {
    pub lesson_id: LessonId,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub furthest_position_secs: u32,
    pub last_position_secs: u32,
    pub read_time_secs: u32,
    pub quiz_attempts_used: u32,
    pub quiz_best_score: Option<f64>,
    pub assignment_submitted: bool,
    pub assignment_score: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub revision: u64,
}

impl LessonProgressRecord {
    #[must_use]
    pub fn from_progress(progress: &LessonProgress) -> Self {
        Self {
            lesson_id: progress.lesson_id(),
            completed: progress.completed(),
            completed_at: progress.completed_at(),
            furthest_position_secs: progress.furthest_position_secs(),
            last_position_secs: progress.last_position_secs(),
            read_time_secs: progress.read_time_secs(),
            quiz_attempts_used: progress.quiz_attempts_used(),
            quiz_best_score: progress.quiz_best_score(),
            assignment_submitted: progress.assignment_submitted(),
            assignment_score: progress.assignment_score(),
            started_at: progress.started_at(),
            last_activity_at: progress.last_activity_at(),
            revision: progress.revision(),
        }
    }

    /// Convert the record back into a domain `LessonProgress`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the persisted state fails validation.
    pub fn into_progress(self) -> Result<LessonProgress, ProgressError> {
        LessonProgress::from_persisted(
            self.lesson_id,
            self.completed,
            self.completed_at,
            self.furthest_position_secs,
            self.last_position_secs,
            self.read_time_secs,
            self.quiz_attempts_used,
            self.quiz_best_score,
            self.assignment_submitted,
            self.assignment_score,
            self.started_at,
            self.last_activity_at,
            self.revision,
        )
    }
}

/// Save payload for one lesson's progress.
///
/// `seq` is the client's monotonically increasing revision; the store must
/// discard an update whose `seq` is not newer than what it already holds, so
/// a slow early autosave can never overwrite a later one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgressUpdate {
    pub lesson_id: LessonId,
    pub watch_time_secs: u32,
    pub last_position_secs: u32,
    pub read_time_secs: u32,
    pub completed: bool,
    pub total_duration_secs: u32,
    pub seq: u64,
    pub recorded_at: DateTime<Utc>,
}

/// Acknowledgement for a progress save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveAck {
    /// False when the update was stale and discarded.
    pub applied: bool,
    /// Revision the store holds after the call.
    pub stored_seq: u64,
}

/// A video-timestamped bookmark within a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    pub lesson_id: LessonId,
    pub timestamp_secs: u32,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// A free-form note attached to a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub lesson_id: LessonId,
    pub timestamp_secs: u32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Remote store of record for per-student lesson progress.
#[async_trait]
pub trait ProgressGateway: Send + Sync {
    /// Fetch the stored progress for a lesson, if any.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport or decoding failures.
    async fn get_lesson_progress(
        &self,
        student: StudentId,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgressRecord>, GatewayError>;

    /// Persist a progress update; stale sequences are discarded, not errors.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failures.
    async fn update_lesson_progress(
        &self,
        student: StudentId,
        course_id: CourseId,
        update: &LessonProgressUpdate,
    ) -> Result<SaveAck, GatewayError>;

    /// Record that a lesson is complete. Monotonic and idempotent.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failures.
    async fn mark_lesson_complete(
        &self,
        student: StudentId,
        course_id: CourseId,
        lesson_id: LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<(), GatewayError>;

    /// Record that the whole course is complete. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failures.
    async fn complete_course(
        &self,
        student: StudentId,
        course_id: CourseId,
        completed_at: DateTime<Utc>,
    ) -> Result<(), GatewayError>;

    /// Append a bookmark. Ancillary, not part of completion logic.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failures.
    async fn add_bookmark(
        &self,
        student: StudentId,
        course_id: CourseId,
        bookmark: &BookmarkRecord,
    ) -> Result<(), GatewayError>;

    /// Append a note. Ancillary, not part of completion logic.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failures.
    async fn add_note(
        &self,
        student: StudentId,
        course_id: CourseId,
        note: &NoteRecord,
    ) -> Result<(), GatewayError>;
}

/// Store of record for issued certificates.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Look up the certificate issued to a student for a course, if any.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failures.
    async fn find_certificate(
        &self,
        student: StudentId,
        course_id: CourseId,
    ) -> Result<Option<Certificate>, GatewayError>;

    /// Insert a freshly issued certificate.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Conflict` when one already exists for the
    /// (student, course) pair.
    async fn insert_certificate(&self, certificate: &Certificate) -> Result<(), GatewayError>;

    /// Public verification by `(certificate_id, verification_code)`.
    ///
    /// Returns `None` for an unknown pair or a revoked certificate; callers
    /// must not receive partial data.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failures.
    async fn verify_certificate(
        &self,
        certificate_id: &CertificateId,
        verification_code: &VerificationCode,
    ) -> Result<Option<Certificate>, GatewayError>;

    /// Revoke a certificate so verification stops vouching for it.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` for an unknown id.
    async fn revoke_certificate(&self, certificate_id: &CertificateId)
    -> Result<(), GatewayError>;
}

//
// ─── IN-MEMORY GATEWAY ─────────────────────────────────────────────────────────
//

type ProgressKey = (StudentId, CourseId, LessonId);
type CourseKey = (StudentId, CourseId);

/// In-memory gateway implementation for testing and prototyping.
///
/// Implements the same ordering discipline a production store must: updates
/// are applied last-write-wins by sequence number, and completion flags are
/// monotonic.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    progress: Arc<Mutex<HashMap<ProgressKey, LessonProgressRecord>>>,
    course_completions: Arc<Mutex<HashMap<CourseKey, DateTime<Utc>>>>,
    bookmarks: Arc<Mutex<HashMap<CourseKey, Vec<BookmarkRecord>>>>,
    notes: Arc<Mutex<HashMap<CourseKey, Vec<NoteRecord>>>>,
    certificates: Arc<Mutex<HashMap<CourseKey, (Certificate, bool)>>>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When the course was recorded complete, if it was. Test helper.
    #[must_use]
    pub fn course_completed_at(
        &self,
        student: StudentId,
        course_id: CourseId,
    ) -> Option<DateTime<Utc>> {
        self.course_completions
            .lock()
            .ok()?
            .get(&(student, course_id))
            .copied()
    }

    /// Bookmarks stored for a (student, course) pair. Test helper.
    #[must_use]
    pub fn bookmarks_for(&self, student: StudentId, course_id: CourseId) -> Vec<BookmarkRecord> {
        self.bookmarks
            .lock()
            .map(|guard| guard.get(&(student, course_id)).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn record_from_update(update: &LessonProgressUpdate) -> LessonProgressRecord {
        LessonProgressRecord {
            lesson_id: update.lesson_id,
            completed: update.completed,
            completed_at: update.completed.then_some(update.recorded_at),
            furthest_position_secs: update.watch_time_secs,
            last_position_secs: update.last_position_secs,
            read_time_secs: update.read_time_secs,
            quiz_attempts_used: 0,
            quiz_best_score: None,
            assignment_submitted: false,
            assignment_score: None,
            started_at: update.recorded_at,
            last_activity_at: update.recorded_at,
            revision: update.seq,
        }
    }
}

#[async_trait]
impl ProgressGateway for InMemoryGateway {
    async fn get_lesson_progress(
        &self,
        student: StudentId,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgressRecord>, GatewayError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        Ok(guard.get(&(student, course_id, lesson_id)).cloned())
    }

    async fn update_lesson_progress(
        &self,
        student: StudentId,
        course_id: CourseId,
        update: &LessonProgressUpdate,
    ) -> Result<SaveAck, GatewayError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        let key = (student, course_id, update.lesson_id);

        match guard.get_mut(&key) {
            Some(existing) if existing.revision >= update.seq => Ok(SaveAck {
                applied: false,
                stored_seq: existing.revision,
            }),
            Some(existing) => {
                existing.furthest_position_secs =
                    existing.furthest_position_secs.max(update.watch_time_secs);
                existing.last_position_secs = update.last_position_secs;
                existing.read_time_secs = existing.read_time_secs.max(update.read_time_secs);
                if update.completed && !existing.completed {
                    existing.completed = true;
                    existing.completed_at = Some(update.recorded_at);
                }
                existing.last_activity_at = update.recorded_at;
                existing.revision = update.seq;
                Ok(SaveAck {
                    applied: true,
                    stored_seq: update.seq,
                })
            }
            None => {
                guard.insert(key, Self::record_from_update(update));
                Ok(SaveAck {
                    applied: true,
                    stored_seq: update.seq,
                })
            }
        }
    }

    async fn mark_lesson_complete(
        &self,
        student: StudentId,
        course_id: CourseId,
        lesson_id: LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        let record = guard
            .entry((student, course_id, lesson_id))
            .or_insert_with(|| LessonProgressRecord {
                lesson_id,
                completed: false,
                completed_at: None,
                furthest_position_secs: 0,
                last_position_secs: 0,
                read_time_secs: 0,
                quiz_attempts_used: 0,
                quiz_best_score: None,
                assignment_submitted: false,
                assignment_score: None,
                started_at: completed_at,
                last_activity_at: completed_at,
                revision: 0,
            });
        if !record.completed {
            record.completed = true;
            record.completed_at = Some(completed_at);
        }
        record.last_activity_at = completed_at;
        Ok(())
    }

    async fn complete_course(
        &self,
        student: StudentId,
        course_id: CourseId,
        completed_at: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let mut guard = self
            .course_completions
            .lock()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        guard.entry((student, course_id)).or_insert(completed_at);
        Ok(())
    }

    async fn add_bookmark(
        &self,
        student: StudentId,
        course_id: CourseId,
        bookmark: &BookmarkRecord,
    ) -> Result<(), GatewayError> {
        let mut guard = self
            .bookmarks
            .lock()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        guard
            .entry((student, course_id))
            .or_default()
            .push(bookmark.clone());
        Ok(())
    }

    async fn add_note(
        &self,
        student: StudentId,
        course_id: CourseId,
        note: &NoteRecord,
    ) -> Result<(), GatewayError> {
        let mut guard = self
            .notes
            .lock()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        guard
            .entry((student, course_id))
            .or_default()
            .push(note.clone());
        Ok(())
    }
}

#[async_trait]
impl CertificateStore for InMemoryGateway {
    async fn find_certificate(
        &self,
        student: StudentId,
        course_id: CourseId,
    ) -> Result<Option<Certificate>, GatewayError> {
        let guard = self
            .certificates
            .lock()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        Ok(guard
            .get(&(student, course_id))
            .map(|(cert, _)| cert.clone()))
    }

    async fn insert_certificate(&self, certificate: &Certificate) -> Result<(), GatewayError> {
        let mut guard = self
            .certificates
            .lock()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        let key = (certificate.student_id(), certificate.course_id());
        if guard.contains_key(&key) {
            return Err(GatewayError::Conflict);
        }
        guard.insert(key, (certificate.clone(), false));
        Ok(())
    }

    async fn verify_certificate(
        &self,
        certificate_id: &CertificateId,
        verification_code: &VerificationCode,
    ) -> Result<Option<Certificate>, GatewayError> {
        let guard = self
            .certificates
            .lock()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        Ok(guard.values().find_map(|(cert, revoked)| {
            (!revoked
                && cert.certificate_id() == certificate_id
                && cert.verification_code() == verification_code)
                .then(|| cert.clone())
        }))
    }

    async fn revoke_certificate(
        &self,
        certificate_id: &CertificateId,
    ) -> Result<(), GatewayError> {
        let mut guard = self
            .certificates
            .lock()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        for (cert, revoked) in guard.values_mut() {
            if cert.certificate_id() == certificate_id {
                *revoked = true;
                return Ok(());
            }
        }
        Err(GatewayError::NotFound)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
