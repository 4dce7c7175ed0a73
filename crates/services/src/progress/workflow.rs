use std::sync::Arc;

use chrono::{DateTime, Utc};

use course_core::Clock;
use course_core::model::{Course, CourseId, LessonId, LessonProgress, StudentId};
use gateway::{BookmarkRecord, NoteRecord, ProgressGateway};

use crate::error::FlowError;
use crate::progress::tracker::{LessonTracker, Sample};

/// Result of applying one consumption sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleOutcome {
    /// True exactly when this sample flipped the lesson to complete.
    pub newly_completed: bool,
    /// True when a periodic save was issued for this sample.
    pub save_issued: bool,
    /// Fraction of the lesson consumed after the sample, in `[0.0, 1.0]`.
    pub percent_consumed: f64,
}

/// Result of submitting a quiz answer sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizOutcome {
    pub score: f64,
    pub passed: bool,
    pub newly_completed: bool,
    /// Attempts left after this one; `None` when unlimited.
    pub attempts_remaining: Option<u32>,
}

/// Orchestrates lesson sessions against the persistence gateway.
///
/// Local tracker state is authoritative until a save is confirmed: autosave
/// failures are logged and retried on the next interval, while completion
/// saves surface as errors with the local flag kept set so a retry via
/// [`LessonFlowService::sync_completion`] is idempotent.
#[derive(Clone)]
pub struct LessonFlowService {
    clock: Clock,
    gateway: Arc<dyn ProgressGateway>,
}

impl LessonFlowService {
    #[must_use]
    pub fn new(clock: Clock, gateway: Arc<dyn ProgressGateway>) -> Self {
        Self { clock, gateway }
    }

    /// Open a lesson session, seeding from the stored record when one exists
    /// so playback resumes at the saved position.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::UnknownLesson` when the lesson is not part of the
    /// course, and propagates gateway/decoding failures.
    pub async fn start_lesson(
        &self,
        student: StudentId,
        course: &Course,
        lesson_id: LessonId,
    ) -> Result<LessonTracker, FlowError> {
        let lesson = course
            .find_lesson(lesson_id)
            .ok_or(FlowError::UnknownLesson)?
            .clone();
        let now = self.clock.now();

        let progress = match self
            .gateway
            .get_lesson_progress(student, course.id(), lesson_id)
            .await?
        {
            Some(record) => record.into_progress()?,
            None => LessonProgress::start(lesson_id, now),
        };

        Ok(LessonTracker::new(
            student,
            course.id(),
            lesson,
            progress,
            now,
        ))
    }

    /// Apply a playback/reading sample: autosave if due, then evaluate the
    /// completion rules.
    ///
    /// # Errors
    ///
    /// Propagates sample-kind mismatches and, when the sample completes the
    /// lesson, a failed completion save (the local flag stays set).
    pub async fn record_sample(
        &self,
        tracker: &mut LessonTracker,
        sample: Sample,
    ) -> Result<SampleOutcome, FlowError> {
        let now = self.clock.now();
        let save_due = tracker.apply_sample(sample, now)?;
        if save_due {
            self.push_autosave(tracker, now).await;
        }
        let newly_completed = self.evaluate_and_sync(tracker, now).await?;

        Ok(SampleOutcome {
            newly_completed,
            save_issued: save_due,
            percent_consumed: tracker.percent_consumed(),
        })
    }

    /// Score a full answer sheet against the lesson's quiz and record it.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NoQuiz` when the lesson has no quiz, propagates
    /// exhausted-attempt and sheet-shape errors, and surfaces a failed
    /// completion save.
    pub async fn submit_quiz(
        &self,
        tracker: &mut LessonTracker,
        answers: &[Option<usize>],
    ) -> Result<QuizOutcome, FlowError> {
        let now = self.clock.now();
        let (score, passed, attempts_allowed) = {
            let quiz = tracker.lesson().quiz().ok_or(FlowError::NoQuiz)?;
            let score = quiz.score_answers(answers)?;
            (score, quiz.is_passing(score), quiz.attempts_allowed())
        };

        tracker.record_quiz_score(score, now)?;
        let newly_completed = self.evaluate_and_sync(tracker, now).await?;
        self.push_autosave(tracker, now).await;

        Ok(QuizOutcome {
            score,
            passed,
            newly_completed,
            attempts_remaining: attempts_allowed.remaining(tracker.progress().quiz_attempts_used()),
        })
    }

    /// Record an assignment submission; returns whether it completed the
    /// lesson.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NoAssignment` when the lesson has no assignment
    /// and surfaces a failed completion save.
    pub async fn submit_assignment(
        &self,
        tracker: &mut LessonTracker,
    ) -> Result<bool, FlowError> {
        let now = self.clock.now();
        tracker.record_assignment_submission(now)?;
        let newly_completed = self.evaluate_and_sync(tracker, now).await?;
        self.push_autosave(tracker, now).await;
        Ok(newly_completed)
    }

    /// Record the instructor-assigned grade for the lesson's assignment.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NoAssignment` when the lesson has no assignment
    /// and propagates score validation errors.
    pub async fn record_assignment_grade(
        &self,
        tracker: &mut LessonTracker,
        score: f64,
    ) -> Result<(), FlowError> {
        let now = self.clock.now();
        tracker.record_assignment_grade(score, now)?;
        self.push_autosave(tracker, now).await;
        Ok(())
    }

    /// Explicit completion action (live lessons, manual "mark complete").
    ///
    /// # Errors
    ///
    /// Surfaces a failed completion save; the local flag stays set so the
    /// call is retryable.
    pub async fn mark_complete(&self, tracker: &mut LessonTracker) -> Result<bool, FlowError> {
        let now = self.clock.now();
        let newly = tracker.mark_completed(now);
        if newly {
            self.sync_completion(tracker).await?;
        }
        Ok(newly)
    }

    /// Push the completed flag to the gateway.
    ///
    /// Use this to retry after `mark_complete`/`record_sample` surfaced a
    /// transient save failure; a no-op when the lesson is not complete.
    ///
    /// # Errors
    ///
    /// Propagates the gateway failure so the caller can surface it.
    pub async fn sync_completion(&self, tracker: &LessonTracker) -> Result<(), FlowError> {
        let Some(completed_at) = tracker.progress().completed_at() else {
            return Ok(());
        };
        self.gateway
            .mark_lesson_complete(
                tracker.student(),
                tracker.course_id(),
                tracker.progress().lesson_id(),
                completed_at,
            )
            .await
            .map_err(|err| {
                tracing::warn!(
                    error = %err,
                    lesson = %tracker.progress().lesson_id(),
                    "completion save failed; local flag retained for retry"
                );
                err
            })?;
        Ok(())
    }

    /// Close the session, flushing any unsaved progress immediately.
    ///
    /// A failed final save is logged like an autosave failure, not surfaced;
    /// local state remains authoritative.
    pub async fn end_lesson(&self, tracker: &mut LessonTracker) {
        let now = self.clock.now();
        if let Some(update) = tracker.end(now) {
            if let Err(err) = self
                .gateway
                .update_lesson_progress(tracker.student(), tracker.course_id(), &update)
                .await
            {
                tracing::warn!(
                    error = %err,
                    lesson = %update.lesson_id,
                    "final save failed on session end"
                );
                tracker.mark_save_failed();
            }
        }
    }

    /// Record course-level completion with the gateway. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates the gateway failure so the caller can surface it and
    /// retry.
    pub async fn complete_course(
        &self,
        student: StudentId,
        course_id: CourseId,
    ) -> Result<(), FlowError> {
        self.gateway
            .complete_course(student, course_id, self.clock.now())
            .await?;
        Ok(())
    }

    /// Store a video-timestamped bookmark. Ancillary.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn add_bookmark(
        &self,
        student: StudentId,
        course_id: CourseId,
        lesson_id: LessonId,
        timestamp_secs: u32,
        note: impl Into<String>,
    ) -> Result<(), FlowError> {
        let bookmark = BookmarkRecord {
            lesson_id,
            timestamp_secs,
            note: note.into(),
            created_at: self.clock.now(),
        };
        self.gateway
            .add_bookmark(student, course_id, &bookmark)
            .await?;
        Ok(())
    }

    /// Store a free-form lesson note. Ancillary.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn add_note(
        &self,
        student: StudentId,
        course_id: CourseId,
        lesson_id: LessonId,
        timestamp_secs: u32,
        content: impl Into<String>,
    ) -> Result<(), FlowError> {
        let note = NoteRecord {
            lesson_id,
            timestamp_secs,
            content: content.into(),
            created_at: self.clock.now(),
        };
        self.gateway.add_note(student, course_id, &note).await?;
        Ok(())
    }

    async fn evaluate_and_sync(
        &self,
        tracker: &mut LessonTracker,
        now: DateTime<Utc>,
    ) -> Result<bool, FlowError> {
        if tracker.progress().completed() || !tracker.criteria_satisfied() {
            return Ok(false);
        }
        tracker.mark_completed(now);
        self.sync_completion(tracker).await?;
        Ok(true)
    }

    async fn push_autosave(&self, tracker: &mut LessonTracker, now: DateTime<Utc>) {
        let update = tracker.save_request(now);
        if let Err(err) = self
            .gateway
            .update_lesson_progress(tracker.student(), tracker.course_id(), &update)
            .await
        {
            tracing::warn!(
                error = %err,
                lesson = %update.lesson_id,
                seq = update.seq,
                "autosave failed; will retry on the next interval"
            );
            tracker.mark_save_failed();
        }
    }
}
