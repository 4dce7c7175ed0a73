use std::collections::HashMap;

use chrono::{DateTime, Utc};

use course_core::completion;
use course_core::model::{Course, CourseId, LessonId, LessonProgress, StudentId};

use crate::error::StoreError;
use crate::progress::aggregate::CourseCompletion;

/// A single mutation applied to a lesson's progress record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressUpdate {
    VideoPosition { position_secs: u32 },
    ReadingTime { elapsed_secs: u32 },
    QuizScore { score: f64 },
    AssignmentSubmitted,
    AssignmentGrade { score: f64 },
    /// Explicit completion, used for live lessons and manual actions.
    MarkCompleted,
}

#[derive(Debug, Default)]
struct StudentCourseEntry {
    by_lesson: HashMap<LessonId, LessonProgress>,
    streak_days: u32,
    last_active_date: Option<DateTime<Utc>>,
}

impl StudentCourseEntry {
    /// Consecutive-day streak bookkeeping: next-day activity extends the
    /// streak, a gap resets it to 1, same-day activity leaves it alone.
    fn touch(&mut self, now: DateTime<Utc>) {
        match self.last_active_date {
            None => self.streak_days = 1,
            Some(last) => {
                let days = (now.date_naive() - last.date_naive()).num_days();
                if days == 1 {
                    self.streak_days += 1;
                } else if days > 1 {
                    self.streak_days = 1;
                }
            }
        }
        self.last_active_date = Some(now);
    }
}

/// Progress records keyed by `(student, course)`, independent of any UI.
///
/// Records are created on first view and never deleted. The store does not
/// own course structure: aggregation takes the current `Course` so removed
/// lessons stop counting without any cleanup pass here.
#[derive(Debug, Default)]
pub struct ProgressStore {
    entries: HashMap<(StudentId, CourseId), StudentCourseEntry>,
}

impl ProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one progress mutation, creating the record on first view.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UnknownLesson` when the lesson is not part of the
    /// course, `StoreError::NoQuiz`/`StoreError::NoAssignment` when the
    /// update targets content the lesson does not have, and propagates
    /// domain validation errors.
    pub fn record_progress(
        &mut self,
        student: StudentId,
        course: &Course,
        lesson_id: LessonId,
        update: ProgressUpdate,
        now: DateTime<Utc>,
    ) -> Result<&LessonProgress, StoreError> {
        let lesson = course
            .find_lesson(lesson_id)
            .ok_or(StoreError::UnknownLesson)?;

        let entry = self.entries.entry((student, course.id())).or_default();
        entry.touch(now);
        let progress = entry
            .by_lesson
            .entry(lesson_id)
            .or_insert_with(|| LessonProgress::start(lesson_id, now));

        match update {
            ProgressUpdate::VideoPosition { position_secs } => {
                progress.record_video_position(position_secs, lesson.video_duration_secs(), now);
            }
            ProgressUpdate::ReadingTime { elapsed_secs } => {
                progress.record_reading(elapsed_secs, now);
            }
            ProgressUpdate::QuizScore { score } => {
                let limit = lesson
                    .quiz()
                    .ok_or(StoreError::NoQuiz)?
                    .attempts_allowed();
                progress.record_quiz_score(score, limit, now)?;
            }
            ProgressUpdate::AssignmentSubmitted => {
                if lesson.assignment().is_none() {
                    return Err(StoreError::NoAssignment);
                }
                progress.record_assignment_submission(now);
            }
            ProgressUpdate::AssignmentGrade { score } => {
                if lesson.assignment().is_none() {
                    return Err(StoreError::NoAssignment);
                }
                progress.record_assignment_grade(score, now)?;
            }
            ProgressUpdate::MarkCompleted => {
                progress.mark_completed(now);
            }
        }

        Ok(progress)
    }

    /// Run the completion rules for a lesson; returns whether it flipped to
    /// complete on this call. Completion stays monotonic.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UnknownLesson` when the lesson is not part of the
    /// course.
    pub fn evaluate_completion(
        &mut self,
        student: StudentId,
        course: &Course,
        lesson_id: LessonId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let lesson = course
            .find_lesson(lesson_id)
            .ok_or(StoreError::UnknownLesson)?;

        let entry = self.entries.entry((student, course.id())).or_default();
        let progress = entry
            .by_lesson
            .entry(lesson_id)
            .or_insert_with(|| LessonProgress::start(lesson_id, now));

        if progress.completed() || !completion::is_satisfied(lesson, progress) {
            return Ok(false);
        }
        Ok(progress.mark_completed(now))
    }

    /// Derived course completion for a student, recomputed fresh.
    #[must_use]
    pub fn aggregate(&self, student: StudentId, course: &Course) -> CourseCompletion {
        match self.entries.get(&(student, course.id())) {
            Some(entry) => CourseCompletion::compute(course, &entry.by_lesson),
            None => CourseCompletion::compute(course, &HashMap::new()),
        }
    }

    /// Commit externally tracked progress (e.g. from a `LessonTracker`),
    /// keeping whichever side has the newer revision.
    pub fn upsert_lesson(
        &mut self,
        student: StudentId,
        course_id: CourseId,
        progress: LessonProgress,
    ) {
        let entry = self.entries.entry((student, course_id)).or_default();
        match entry.by_lesson.get(&progress.lesson_id()) {
            Some(existing) if existing.revision() >= progress.revision() => {}
            _ => {
                entry.by_lesson.insert(progress.lesson_id(), progress);
            }
        }
    }

    #[must_use]
    pub fn lesson_progress(
        &self,
        student: StudentId,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Option<&LessonProgress> {
        self.entries
            .get(&(student, course_id))?
            .by_lesson
            .get(&lesson_id)
    }

    /// Current consecutive-day learning streak for a (student, course) pair.
    #[must_use]
    pub fn streak_days(&self, student: StudentId, course_id: CourseId) -> u32 {
        self.entries
            .get(&(student, course_id))
            .map_or(0, |entry| entry.streak_days)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
