use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::LessonId;
use crate::model::quiz::AttemptLimit;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("score must be a finite value between 0 and 100, got {provided}")]
    ScoreOutOfRange { provided: f64 },

    #[error("quiz attempt limit of {allowed} already reached")]
    AttemptsExhausted { allowed: u32 },

    #[error("completed flag and completion timestamp disagree")]
    InconsistentCompletion,
}

fn validate_score(score: f64) -> Result<f64, ProgressError> {
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(ProgressError::ScoreOutOfRange { provided: score });
    }
    Ok(score)
}

//
// ─── LESSON PROGRESS ───────────────────────────────────────────────────────────
//

/// Per-student consumption and completion state for one lesson.
///
/// Created on first view, mutated only through methods that uphold two
/// invariants: `completed` is monotonic (once true it never reverts), and the
/// furthest watched position is a high-water mark that a rewind cannot lower.
/// Every mutation bumps `revision`, which save requests carry as their
/// sequence number so stale writes can be discarded downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonProgress {
    lesson_id: LessonId,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
    furthest_position_secs: u32,
    last_position_secs: u32,
    read_time_secs: u32,
    quiz_attempts_used: u32,
    quiz_best_score: Option<f64>,
    assignment_submitted: bool,
    assignment_score: Option<f64>,
    started_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    revision: u64,
}

impl LessonProgress {
    /// Fresh progress record for a lesson viewed for the first time.
    #[must_use]
    pub fn start(lesson_id: LessonId, now: DateTime<Utc>) -> Self {
        Self {
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
            started_at: now,
            last_activity_at: now,
            revision: 0,
        }
    }

    /// Rehydrate progress from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InconsistentCompletion` when the completed
    /// flag and timestamp disagree, or `ProgressError::ScoreOutOfRange` for
    /// an invalid persisted score.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        lesson_id: LessonId,
        completed: bool,
        completed_at: Option<DateTime<Utc>>,
        furthest_position_secs: u32,
        last_position_secs: u32,
        read_time_secs: u32,
        quiz_attempts_used: u32,
        quiz_best_score: Option<f64>,
        assignment_submitted: bool,
        assignment_score: Option<f64>,
        started_at: DateTime<Utc>,
        last_activity_at: DateTime<Utc>,
        revision: u64,
    ) -> Result<Self, ProgressError> {
        if completed != completed_at.is_some() {
            return Err(ProgressError::InconsistentCompletion);
        }
        if let Some(score) = quiz_best_score {
            validate_score(score)?;
        }
        if let Some(score) = assignment_score {
            validate_score(score)?;
        }

        Ok(Self {
            lesson_id,
            completed,
            completed_at,
            furthest_position_secs,
            last_position_secs,
            read_time_secs,
            quiz_attempts_used,
            quiz_best_score,
            assignment_submitted,
            assignment_score,
            started_at,
            last_activity_at,
            revision,
        })
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
        self.revision += 1;
    }

    /// Record a playback position sample, bounded to the lesson duration.
    ///
    /// `last_position_secs` follows the player (so a rewind is a valid resume
    /// point) while the furthest position only ever grows.
    pub fn record_video_position(
        &mut self,
        position_secs: u32,
        duration_secs: u32,
        now: DateTime<Utc>,
    ) {
        let bounded = if duration_secs > 0 {
            position_secs.min(duration_secs)
        } else {
            position_secs
        };
        self.last_position_secs = bounded;
        self.furthest_position_secs = self.furthest_position_secs.max(bounded);
        self.touch(now);
    }

    /// Add foreground reading time to the cumulative total.
    pub fn record_reading(&mut self, elapsed_secs: u32, now: DateTime<Utc>) {
        self.read_time_secs = self.read_time_secs.saturating_add(elapsed_secs);
        self.touch(now);
    }

    /// Record a scored quiz attempt, keeping the best score.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::AttemptsExhausted` when the attempt limit has
    /// been reached and `ProgressError::ScoreOutOfRange` for invalid scores.
    pub fn record_quiz_score(
        &mut self,
        score: f64,
        limit: AttemptLimit,
        now: DateTime<Utc>,
    ) -> Result<(), ProgressError> {
        let score = validate_score(score)?;
        if let AttemptLimit::Limited(allowed) = limit {
            if self.quiz_attempts_used >= allowed {
                return Err(ProgressError::AttemptsExhausted { allowed });
            }
        }

        self.quiz_attempts_used += 1;
        self.quiz_best_score = Some(match self.quiz_best_score {
            Some(best) if best >= score => best,
            _ => score,
        });
        self.touch(now);
        Ok(())
    }

    /// Mark the assignment as submitted.
    pub fn record_assignment_submission(&mut self, now: DateTime<Utc>) {
        self.assignment_submitted = true;
        self.touch(now);
    }

    /// Record the instructor-assigned assignment grade.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::ScoreOutOfRange` for invalid scores.
    pub fn record_assignment_grade(
        &mut self,
        score: f64,
        now: DateTime<Utc>,
    ) -> Result<(), ProgressError> {
        self.assignment_score = Some(validate_score(score)?);
        self.touch(now);
        Ok(())
    }

    /// Set the completed flag; returns whether it changed.
    ///
    /// Completion is monotonic: calling this again is a no-op and the
    /// original completion timestamp is preserved.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.completed_at = Some(now);
        self.touch(now);
        true
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn furthest_position_secs(&self) -> u32 {
        self.furthest_position_secs
    }

    #[must_use]
    pub fn last_position_secs(&self) -> u32 {
        self.last_position_secs
    }

    #[must_use]
    pub fn read_time_secs(&self) -> u32 {
        self.read_time_secs
    }

    #[must_use]
    pub fn quiz_attempts_used(&self) -> u32 {
        self.quiz_attempts_used
    }

    #[must_use]
    pub fn quiz_best_score(&self) -> Option<f64> {
        self.quiz_best_score
    }

    #[must_use]
    pub fn assignment_submitted(&self) -> bool {
        self.assignment_submitted
    }

    #[must_use]
    pub fn assignment_score(&self) -> Option<f64> {
        self.assignment_score
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The score that enters certificate averaging, if this lesson was graded.
    ///
    /// The quiz best score wins when both a quiz and a graded assignment
    /// exist on the same lesson.
    #[must_use]
    pub fn graded_score(&self) -> Option<f64> {
        self.quiz_best_score.or(self.assignment_score)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
