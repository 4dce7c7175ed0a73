//! Pure completion rules: decide whether a lesson's criteria are satisfied.
//!
//! The evaluator is a function of the lesson definition and the student's
//! progress record; it never mutates anything. Callers flip the monotonic
//! `completed` flag on [`LessonProgress`] when the rules first pass. Live
//! lessons carry no automatic metric and only complete by explicit action.

use crate::model::{Lesson, LessonProgress, LessonType};

/// Fraction of a video lesson consumed, in `[0.0, 1.0]`.
///
/// Based on the furthest position reached, so a rewind never lowers it.
/// Returns 0 when the duration is zero or unknown.
#[must_use]
pub fn percent_consumed(lesson: &Lesson, progress: &LessonProgress) -> f64 {
    let duration = lesson.video_duration_secs();
    if duration == 0 {
        return 0.0;
    }
    f64::from(progress.furthest_position_secs().min(duration)) / f64::from(duration)
}

/// Whether the watch-time threshold has been reached.
///
/// Compared in integer arithmetic so an exact ratio (480s of 600s against an
/// 80% threshold) meets the boundary without floating-point error.
fn watch_target_met(lesson: &Lesson, progress: &LessonProgress) -> bool {
    let duration = lesson.video_duration_secs();
    if duration == 0 {
        return false;
    }
    let watched = u64::from(progress.furthest_position_secs().min(duration));
    watched * 100 >= u64::from(lesson.criteria().watch_percent()) * u64::from(duration)
}

fn read_target_met(lesson: &Lesson, progress: &LessonProgress) -> bool {
    progress.read_time_secs() >= lesson.criteria().read_time_secs()
}

fn quiz_passed(lesson: &Lesson, progress: &LessonProgress) -> bool {
    match (lesson.quiz(), progress.quiz_best_score()) {
        (Some(quiz), Some(best)) => quiz.is_passing(best),
        _ => false,
    }
}

fn quiz_gate(lesson: &Lesson, progress: &LessonProgress) -> bool {
    !lesson.criteria().require_quiz_pass() || quiz_passed(lesson, progress)
}

fn assignment_gate(lesson: &Lesson, progress: &LessonProgress) -> bool {
    !lesson.criteria().require_assignment_submission() || progress.assignment_submitted()
}

/// Evaluate the completion rules for a lesson against current progress.
///
/// This is the full rule table: watch/read thresholds for video and text
/// (plus optional quiz/assignment gates), a passing score for quiz lessons,
/// a submission for assignment lessons, and never-automatic for live ones.
#[must_use]
pub fn is_satisfied(lesson: &Lesson, progress: &LessonProgress) -> bool {
    match lesson.lesson_type() {
        LessonType::Video => {
            watch_target_met(lesson, progress)
                && quiz_gate(lesson, progress)
                && assignment_gate(lesson, progress)
        }
        LessonType::Text => {
            read_target_met(lesson, progress)
                && quiz_gate(lesson, progress)
                && assignment_gate(lesson, progress)
        }
        LessonType::Quiz => quiz_passed(lesson, progress),
        LessonType::Assignment => progress.assignment_submitted(),
        LessonType::Live => false,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Assignment, AttemptLimit, CompletionCriteria, LessonId, Quiz, QuizQuestion,
        SubmissionKind,
    };
    use crate::time::fixed_now;

    fn video_lesson(watch_percent: u8, duration: u32) -> Lesson {
        Lesson::new(
            LessonId::new(1),
            1,
            "Intro",
            LessonType::Video,
            CompletionCriteria::new(watch_percent, 60, false, false).unwrap(),
            None,
            None,
            duration,
        )
        .unwrap()
    }

    fn build_quiz(passing_score: u8) -> Quiz {
        let question =
            QuizQuestion::new("Q", vec!["a".to_owned(), "b".to_owned()], 0).unwrap();
        Quiz::new(passing_score, AttemptLimit::Unlimited, vec![question]).unwrap()
    }

    #[test]
    fn watch_boundary_is_inclusive() {
        let lesson = video_lesson(80, 100);
        let mut progress = LessonProgress::start(lesson.id(), fixed_now());

        progress.record_video_position(79, 100, fixed_now());
        assert!(!is_satisfied(&lesson, &progress));

        progress.record_video_position(80, 100, fixed_now());
        assert!(is_satisfied(&lesson, &progress));
    }

    #[test]
    fn exact_ratio_meets_threshold() {
        // 480 of 600 seconds is exactly 80%.
        let lesson = video_lesson(80, 600);
        let mut progress = LessonProgress::start(lesson.id(), fixed_now());

        progress.record_video_position(479, 600, fixed_now());
        assert!(!is_satisfied(&lesson, &progress));

        progress.record_video_position(480, 600, fixed_now());
        assert!(is_satisfied(&lesson, &progress));
    }

    #[test]
    fn zero_duration_never_auto_completes() {
        let lesson = video_lesson(80, 0);
        let mut progress = LessonProgress::start(lesson.id(), fixed_now());
        progress.record_video_position(1_000, 0, fixed_now());

        assert_eq!(percent_consumed(&lesson, &progress), 0.0);
        assert!(!is_satisfied(&lesson, &progress));
    }

    #[test]
    fn text_lesson_uses_read_time() {
        let lesson = Lesson::new(
            LessonId::new(2),
            1,
            "Reading",
            LessonType::Text,
            CompletionCriteria::new(80, 60, false, false).unwrap(),
            None,
            None,
            0,
        )
        .unwrap();
        let mut progress = LessonProgress::start(lesson.id(), fixed_now());

        progress.record_reading(59, fixed_now());
        assert!(!is_satisfied(&lesson, &progress));

        progress.record_reading(1, fixed_now());
        assert!(is_satisfied(&lesson, &progress));
    }

    #[test]
    fn quiz_lesson_requires_passing_score() {
        let lesson = Lesson::new(
            LessonId::new(3),
            1,
            "Checkpoint",
            LessonType::Quiz,
            CompletionCriteria::default(),
            Some(build_quiz(70)),
            None,
            0,
        )
        .unwrap();
        let mut progress = LessonProgress::start(lesson.id(), fixed_now());

        progress
            .record_quiz_score(65.0, AttemptLimit::Unlimited, fixed_now())
            .unwrap();
        assert!(!is_satisfied(&lesson, &progress));

        progress
            .record_quiz_score(70.0, AttemptLimit::Unlimited, fixed_now())
            .unwrap();
        assert!(is_satisfied(&lesson, &progress));
    }

    #[test]
    fn video_quiz_gate_blocks_until_pass() {
        let lesson = Lesson::new(
            LessonId::new(4),
            1,
            "Gated",
            LessonType::Video,
            CompletionCriteria::new(80, 60, true, false).unwrap(),
            Some(build_quiz(70)),
            None,
            100,
        )
        .unwrap();
        let mut progress = LessonProgress::start(lesson.id(), fixed_now());

        progress.record_video_position(100, 100, fixed_now());
        assert!(!is_satisfied(&lesson, &progress));

        progress
            .record_quiz_score(70.0, AttemptLimit::Unlimited, fixed_now())
            .unwrap();
        assert!(is_satisfied(&lesson, &progress));
    }

    #[test]
    fn assignment_gate_blocks_until_submission() {
        let lesson = Lesson::new(
            LessonId::new(5),
            1,
            "Gated",
            LessonType::Text,
            CompletionCriteria::new(80, 60, false, true).unwrap(),
            None,
            Some(Assignment::new(100, SubmissionKind::Text).unwrap()),
            0,
        )
        .unwrap();
        let mut progress = LessonProgress::start(lesson.id(), fixed_now());

        progress.record_reading(60, fixed_now());
        assert!(!is_satisfied(&lesson, &progress));

        progress.record_assignment_submission(fixed_now());
        assert!(is_satisfied(&lesson, &progress));
    }

    #[test]
    fn assignment_lesson_completes_on_submission() {
        let lesson = Lesson::new(
            LessonId::new(6),
            1,
            "Homework",
            LessonType::Assignment,
            CompletionCriteria::default(),
            None,
            Some(Assignment::new(50, SubmissionKind::File).unwrap()),
            0,
        )
        .unwrap();
        let mut progress = LessonProgress::start(lesson.id(), fixed_now());

        assert!(!is_satisfied(&lesson, &progress));
        progress.record_assignment_submission(fixed_now());
        assert!(is_satisfied(&lesson, &progress));
    }

    #[test]
    fn live_lesson_never_satisfied_automatically() {
        let lesson = Lesson::new(
            LessonId::new(7),
            1,
            "Workshop",
            LessonType::Live,
            CompletionCriteria::default(),
            None,
            None,
            0,
        )
        .unwrap();
        let mut progress = LessonProgress::start(lesson.id(), fixed_now());
        progress.record_video_position(10_000, 0, fixed_now());
        progress.record_reading(10_000, fixed_now());

        assert!(!is_satisfied(&lesson, &progress));
    }
}
