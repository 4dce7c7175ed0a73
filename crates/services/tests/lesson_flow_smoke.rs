use std::sync::Arc;

use course_core::model::{
    AttemptLimit, CertificatePolicy, CompletionCriteria, Course, CourseId, CourseModule, Lesson,
    LessonId, LessonType, ModuleId, Quiz, QuizQuestion, StudentId,
};
use course_core::time::fixed_now;
use gateway::{InMemoryGateway, ProgressGateway};
use services::{Clock, LessonFlowService, Sample};

fn video_course(duration_secs: u32, watch_percent: u8) -> Course {
    let lesson = Lesson::new(
        LessonId::new(1),
        1,
        "Intro",
        LessonType::Video,
        CompletionCriteria::new(watch_percent, 60, false, false).unwrap(),
        None,
        None,
        duration_secs,
    )
    .unwrap();
    let module = CourseModule::new(ModuleId::new(1), 1, "Basics", vec![lesson]).unwrap();
    Course::new(
        CourseId::new(1),
        "Rust Fundamentals",
        vec![module],
        CertificatePolicy::disabled(),
    )
    .unwrap()
}

fn quiz_course(passing_score: u8, attempts: u32) -> Course {
    let questions = (0..4)
        .map(|i| {
            QuizQuestion::new(
                format!("Q{i}"),
                vec!["right".to_owned(), "wrong".to_owned()],
                0,
            )
            .unwrap()
        })
        .collect();
    let quiz = Quiz::new(
        passing_score,
        AttemptLimit::limited(attempts).unwrap(),
        questions,
    )
    .unwrap();
    let lesson = Lesson::new(
        LessonId::new(1),
        1,
        "Checkpoint",
        LessonType::Quiz,
        CompletionCriteria::default(),
        Some(quiz),
        None,
        0,
    )
    .unwrap();
    let module = CourseModule::new(ModuleId::new(1), 1, "Basics", vec![lesson]).unwrap();
    Course::new(
        CourseId::new(1),
        "Rust Fundamentals",
        vec![module],
        CertificatePolicy::disabled(),
    )
    .unwrap()
}

/// Answer sheet with the first `correct` answers right and the rest wrong.
fn sheet(correct: usize) -> Vec<Option<usize>> {
    (0..4usize).map(|i| Some(usize::from(i >= correct))).collect()
}

#[tokio::test]
async fn watch_completion_flips_exactly_once_at_the_boundary() {
    let gw = Arc::new(InMemoryGateway::new());
    let flow = LessonFlowService::new(Clock::fixed(fixed_now()), gw.clone());
    let course = video_course(600, 80);
    let student = StudentId::new(7);

    let mut tracker = flow
        .start_lesson(student, &course, LessonId::new(1))
        .await
        .unwrap();

    let mut completions = Vec::new();
    for position_secs in [0, 200, 480, 481] {
        let outcome = flow
            .record_sample(&mut tracker, Sample::VideoPosition { position_secs })
            .await
            .unwrap();
        completions.push(outcome.newly_completed);
    }

    // 480 of 600 seconds is exactly 80%: completion fires there, once.
    assert_eq!(completions, vec![false, false, true, false]);
    assert!(tracker.progress().completed());

    flow.end_lesson(&mut tracker).await;

    let record = gw
        .get_lesson_progress(student, course.id(), LessonId::new(1))
        .await
        .unwrap()
        .expect("progress persisted");
    assert!(record.completed);
    assert_eq!(record.furthest_position_secs, 481);
}

#[tokio::test]
async fn session_resumes_from_saved_position() {
    let gw = Arc::new(InMemoryGateway::new());
    let flow = LessonFlowService::new(Clock::fixed(fixed_now()), gw.clone());
    let course = video_course(600, 80);
    let student = StudentId::new(7);

    let mut tracker = flow
        .start_lesson(student, &course, LessonId::new(1))
        .await
        .unwrap();
    flow.record_sample(&mut tracker, Sample::VideoPosition { position_secs: 250 })
        .await
        .unwrap();
    flow.end_lesson(&mut tracker).await;

    let resumed = flow
        .start_lesson(student, &course, LessonId::new(1))
        .await
        .unwrap();
    assert_eq!(resumed.resume_position_secs(), 250);
    assert_eq!(resumed.progress().furthest_position_secs(), 250);
}

#[tokio::test]
async fn resume_never_lowers_watched_share() {
    let gw = Arc::new(InMemoryGateway::new());
    let flow = LessonFlowService::new(Clock::fixed(fixed_now()), gw.clone());
    let course = video_course(600, 80);
    let student = StudentId::new(7);

    let mut tracker = flow
        .start_lesson(student, &course, LessonId::new(1))
        .await
        .unwrap();
    flow.record_sample(&mut tracker, Sample::VideoPosition { position_secs: 400 })
        .await
        .unwrap();
    flow.end_lesson(&mut tracker).await;

    let mut resumed = flow
        .start_lesson(student, &course, LessonId::new(1))
        .await
        .unwrap();
    // The student rewinds; the high-water mark holds.
    flow.record_sample(&mut resumed, Sample::VideoPosition { position_secs: 50 })
        .await
        .unwrap();
    assert_eq!(resumed.progress().furthest_position_secs(), 400);
    assert_eq!(resumed.resume_position_secs(), 50);
}

#[tokio::test]
async fn quiz_passes_on_threshold_and_completes_lesson() {
    let gw = Arc::new(InMemoryGateway::new());
    let flow = LessonFlowService::new(Clock::fixed(fixed_now()), gw.clone());
    let course = quiz_course(70, 3);
    let student = StudentId::new(7);

    let mut tracker = flow
        .start_lesson(student, &course, LessonId::new(1))
        .await
        .unwrap();

    let first = flow.submit_quiz(&mut tracker, &sheet(2)).await.unwrap();
    assert_eq!(first.score, 50.0);
    assert!(!first.passed);
    assert!(!first.newly_completed);
    assert_eq!(first.attempts_remaining, Some(2));

    let second = flow.submit_quiz(&mut tracker, &sheet(3)).await.unwrap();
    assert_eq!(second.score, 75.0);
    assert!(second.passed);
    assert!(second.newly_completed);

    let record = gw
        .get_lesson_progress(student, course.id(), LessonId::new(1))
        .await
        .unwrap()
        .expect("progress persisted");
    assert!(record.completed);
}

#[tokio::test]
async fn exhausted_attempts_never_complete_the_lesson() {
    let gw = Arc::new(InMemoryGateway::new());
    let flow = LessonFlowService::new(Clock::fixed(fixed_now()), gw.clone());
    let course = quiz_course(70, 2);
    let student = StudentId::new(7);

    let mut tracker = flow
        .start_lesson(student, &course, LessonId::new(1))
        .await
        .unwrap();

    let first = flow.submit_quiz(&mut tracker, &sheet(2)).await.unwrap();
    assert_eq!(first.attempts_remaining, Some(1));
    let second = flow.submit_quiz(&mut tracker, &sheet(2)).await.unwrap();
    assert_eq!(second.attempts_remaining, Some(0));
    assert!(!second.newly_completed);

    // Third attempt is rejected and the lesson stays incomplete.
    assert!(flow.submit_quiz(&mut tracker, &sheet(4)).await.is_err());
    assert!(!tracker.progress().completed());
}

#[tokio::test]
async fn live_lesson_completes_by_explicit_action() {
    let lesson = Lesson::new(
        LessonId::new(1),
        1,
        "Workshop",
        LessonType::Live,
        CompletionCriteria::default(),
        None,
        None,
        0,
    )
    .unwrap();
    let module = CourseModule::new(ModuleId::new(1), 1, "Basics", vec![lesson]).unwrap();
    let course = Course::new(
        CourseId::new(1),
        "Rust Fundamentals",
        vec![module],
        CertificatePolicy::disabled(),
    )
    .unwrap();

    let gw = Arc::new(InMemoryGateway::new());
    let flow = LessonFlowService::new(Clock::fixed(fixed_now()), gw.clone());
    let student = StudentId::new(7);

    let mut tracker = flow
        .start_lesson(student, &course, LessonId::new(1))
        .await
        .unwrap();

    assert!(flow.mark_complete(&mut tracker).await.unwrap());
    // Marking again is a no-op; completion stays monotonic.
    assert!(!flow.mark_complete(&mut tracker).await.unwrap());

    let record = gw
        .get_lesson_progress(student, course.id(), LessonId::new(1))
        .await
        .unwrap()
        .expect("completion persisted");
    assert!(record.completed);
}

#[tokio::test]
async fn bookmarks_pass_through_to_the_gateway() {
    let gw = Arc::new(InMemoryGateway::new());
    let flow = LessonFlowService::new(Clock::fixed(fixed_now()), gw.clone());
    let student = StudentId::new(7);
    let course_id = CourseId::new(1);

    flow.add_bookmark(student, course_id, LessonId::new(1), 125, "key definition")
        .await
        .unwrap();

    let bookmarks = gw.bookmarks_for(student, course_id);
    assert_eq!(bookmarks.len(), 1);
    assert_eq!(bookmarks[0].timestamp_secs, 125);
    assert_eq!(bookmarks[0].note, "key definition");
}
