use chrono::{DateTime, Duration, Utc};

use course_core::completion;
use course_core::model::{CourseId, Lesson, LessonProgress, LessonType, StudentId};
use gateway::LessonProgressUpdate;

use crate::error::TrackerError;

/// Seconds of active session time between periodic save requests.
///
/// Bounds progress loss on a crash to at most this much.
pub const AUTOSAVE_INTERVAL_SECS: i64 = 30;

/// One consumption sample from the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Player position for a video lesson, in seconds.
    VideoPosition { position_secs: u32 },
    /// Foreground time spent on a text lesson since the previous sample.
    ReadingTime { elapsed_secs: u32 },
}

/// Live session state for one student on one lesson.
///
/// Owns the lesson's `LessonProgress` while the session runs: samples are
/// bounded to the lesson duration, completion is evaluated against the pure
/// rules, and save requests are stamped with the record revision so the
/// gateway can discard stale writes. Seed it from the persisted record on
/// entry so a resumed session starts at `resume_position_secs` and a
/// previously higher watch percentage is never lowered.
#[derive(Debug)]
pub struct LessonTracker {
    student: StudentId,
    course_id: CourseId,
    lesson: Lesson,
    progress: LessonProgress,
    last_save_requested_at: DateTime<Utc>,
    dirty: bool,
}

impl LessonTracker {
    #[must_use]
    pub fn new(
        student: StudentId,
        course_id: CourseId,
        lesson: Lesson,
        progress: LessonProgress,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            student,
            course_id,
            lesson,
            progress,
            last_save_requested_at: now,
            dirty: false,
        }
    }

    #[must_use]
    pub fn student(&self) -> StudentId {
        self.student
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn progress(&self) -> &LessonProgress {
        &self.progress
    }

    /// Where playback should resume for this lesson.
    #[must_use]
    pub fn resume_position_secs(&self) -> u32 {
        self.progress.last_position_secs()
    }

    /// Fraction of the lesson consumed so far, in `[0.0, 1.0]`.
    #[must_use]
    pub fn percent_consumed(&self) -> f64 {
        completion::percent_consumed(&self.lesson, &self.progress)
    }

    /// Whether the lesson's completion criteria are currently satisfied.
    #[must_use]
    pub fn criteria_satisfied(&self) -> bool {
        completion::is_satisfied(&self.lesson, &self.progress)
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply a consumption sample; returns whether a periodic save is due.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotAVideoLesson` / `TrackerError::NotATextLesson`
    /// when the sample kind does not match the lesson type.
    pub fn apply_sample(
        &mut self,
        sample: Sample,
        now: DateTime<Utc>,
    ) -> Result<bool, TrackerError> {
        match (sample, self.lesson.lesson_type()) {
            (Sample::VideoPosition { position_secs }, LessonType::Video) => {
                self.progress.record_video_position(
                    position_secs,
                    self.lesson.video_duration_secs(),
                    now,
                );
            }
            (Sample::ReadingTime { elapsed_secs }, LessonType::Text) => {
                self.progress.record_reading(elapsed_secs, now);
            }
            (Sample::VideoPosition { .. }, _) => return Err(TrackerError::NotAVideoLesson),
            (Sample::ReadingTime { .. }, _) => return Err(TrackerError::NotATextLesson),
        }
        self.dirty = true;
        Ok(self.autosave_due(now))
    }

    fn autosave_due(&self, now: DateTime<Utc>) -> bool {
        now - self.last_save_requested_at >= Duration::seconds(AUTOSAVE_INTERVAL_SECS)
    }

    /// Record a scored quiz attempt for this lesson.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NoQuiz` when the lesson has no quiz and
    /// propagates attempt/score validation errors.
    pub fn record_quiz_score(
        &mut self,
        score: f64,
        now: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        let limit = self
            .lesson
            .quiz()
            .ok_or(TrackerError::NoQuiz)?
            .attempts_allowed();
        self.progress.record_quiz_score(score, limit, now)?;
        self.dirty = true;
        Ok(())
    }

    /// Record an assignment submission for this lesson.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NoAssignment` when the lesson has no assignment.
    pub fn record_assignment_submission(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        if self.lesson.assignment().is_none() {
            return Err(TrackerError::NoAssignment);
        }
        self.progress.record_assignment_submission(now);
        self.dirty = true;
        Ok(())
    }

    /// Record the instructor-assigned grade for this lesson's assignment.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NoAssignment` when the lesson has no assignment
    /// and propagates score validation errors.
    pub fn record_assignment_grade(
        &mut self,
        score: f64,
        now: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        if self.lesson.assignment().is_none() {
            return Err(TrackerError::NoAssignment);
        }
        self.progress.record_assignment_grade(score, now)?;
        self.dirty = true;
        Ok(())
    }

    /// Flip the monotonic completed flag; returns whether it changed.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) -> bool {
        let newly = self.progress.mark_completed(now);
        if newly {
            self.dirty = true;
        }
        newly
    }

    /// Build the save payload and reset the autosave window.
    ///
    /// The sequence number is the record revision, so every state change
    /// produces a strictly newer save than the one before it.
    pub fn save_request(&mut self, now: DateTime<Utc>) -> LessonProgressUpdate {
        self.last_save_requested_at = now;
        self.dirty = false;
        LessonProgressUpdate {
            lesson_id: self.progress.lesson_id(),
            watch_time_secs: self.progress.furthest_position_secs(),
            last_position_secs: self.progress.last_position_secs(),
            read_time_secs: self.progress.read_time_secs(),
            completed: self.progress.completed(),
            total_duration_secs: self.lesson.video_duration_secs(),
            seq: self.progress.revision(),
            recorded_at: now,
        }
    }

    /// Put unsaved changes back on the table after a failed save, so the
    /// next periodic attempt retries them.
    pub fn mark_save_failed(&mut self) {
        self.dirty = true;
    }

    /// Final flush when the session ends (unmount / navigate away).
    ///
    /// Returns `None` when there is nothing unsaved.
    pub fn end(&mut self, now: DateTime<Utc>) -> Option<LessonProgressUpdate> {
        if self.dirty {
            Some(self.save_request(now))
        } else {
            None
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
