use std::time::Duration;

use course_core::model::Course;

use crate::error::NavigationError;

/// Pause before an automatic advance fires, so the "lesson complete"
/// acknowledgment can be perceived. Carried as data on the step; this module
/// never arms a timer.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_secs(1);

/// Where a learning session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPosition {
    AtLesson {
        module_idx: usize,
        lesson_idx: usize,
    },
    CourseCompleted,
}

/// What caused a forward transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceTrigger {
    /// Explicit "next" action by the student.
    Manual,
    /// Automatic completion event from the rule evaluator.
    AutoCompletion,
}

/// Emitted when the session enters `CourseCompleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseCompletedEvent {
    /// True exactly once per session: certificate eligibility is evaluated
    /// on the first entry and never again.
    pub eligibility_check_due: bool,
}

/// One resolved navigation transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationStep {
    pub to: SessionPosition,
    /// Present for automatic transitions; the caller schedules the delay.
    pub delay: Option<Duration>,
    /// Present when this step entered `CourseCompleted`.
    pub course_completed: Option<CourseCompletedEvent>,
}

/// Per-session state machine over a course's module/lesson ordering.
///
/// Forward movement is next lesson in the module, else first lesson of the
/// next non-empty module, else `CourseCompleted`. Backward movement mirrors
/// that ordering and is explicit only. `CourseCompleted` is terminal for the
/// session but re-enterable idempotently on later visits.
#[derive(Debug)]
pub struct NavigationController {
    position: SessionPosition,
    eligibility_requested: bool,
    auto_advance_delay: Duration,
}

impl NavigationController {
    /// Start a session at the first lesson of the first non-empty module.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::EmptyCourse` when no module has lessons.
    pub fn start(course: &Course) -> Result<Self, NavigationError> {
        let module_idx = course
            .modules()
            .iter()
            .position(|module| module.lesson_count() > 0)
            .ok_or(NavigationError::EmptyCourse)?;

        Ok(Self {
            position: SessionPosition::AtLesson {
                module_idx,
                lesson_idx: 0,
            },
            eligibility_requested: false,
            auto_advance_delay: AUTO_ADVANCE_DELAY,
        })
    }

    #[must_use]
    pub fn with_auto_advance_delay(mut self, delay: Duration) -> Self {
        self.auto_advance_delay = delay;
        self
    }

    #[must_use]
    pub fn position(&self) -> SessionPosition {
        self.position
    }

    /// Jump directly to a lesson (sidebar selection).
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::OutOfBounds` when the indices point past
    /// the current course structure.
    pub fn jump_to(
        &mut self,
        course: &Course,
        module_idx: usize,
        lesson_idx: usize,
    ) -> Result<SessionPosition, NavigationError> {
        if course.lesson_at(module_idx, lesson_idx).is_none() {
            return Err(NavigationError::OutOfBounds {
                module_idx,
                lesson_idx,
            });
        }
        self.position = SessionPosition::AtLesson {
            module_idx,
            lesson_idx,
        };
        Ok(self.position)
    }

    /// Advance to the next lesson, next module, or course completion.
    ///
    /// Automatic triggers carry the configured delay. Entering
    /// `CourseCompleted` emits the completion event, with the eligibility
    /// check due only on the first entry of this session; advancing while
    /// already completed is a no-op re-entry.
    pub fn advance(&mut self, course: &Course, trigger: AdvanceTrigger) -> NavigationStep {
        let delay = match trigger {
            AdvanceTrigger::AutoCompletion => Some(self.auto_advance_delay),
            AdvanceTrigger::Manual => None,
        };

        let SessionPosition::AtLesson {
            module_idx,
            lesson_idx,
        } = self.position
        else {
            return NavigationStep {
                to: SessionPosition::CourseCompleted,
                delay: None,
                course_completed: None,
            };
        };

        let next = Self::next_position(course, module_idx, lesson_idx);
        self.position = next;

        let course_completed = match next {
            SessionPosition::CourseCompleted => {
                let event = CourseCompletedEvent {
                    eligibility_check_due: !self.eligibility_requested,
                };
                self.eligibility_requested = true;
                Some(event)
            }
            SessionPosition::AtLesson { .. } => None,
        };

        NavigationStep {
            to: next,
            delay,
            course_completed,
        }
    }

    /// Step back to the previous lesson; explicit only, never automatic.
    ///
    /// Returns `None` at the start of the course and from the terminal
    /// `CourseCompleted` state.
    pub fn retreat(&mut self, course: &Course) -> Option<SessionPosition> {
        let SessionPosition::AtLesson {
            module_idx,
            lesson_idx,
        } = self.position
        else {
            return None;
        };

        if lesson_idx > 0 {
            self.position = SessionPosition::AtLesson {
                module_idx,
                lesson_idx: lesson_idx - 1,
            };
            return Some(self.position);
        }

        let previous_module = course
            .modules()
            .iter()
            .enumerate()
            .take(module_idx)
            .rev()
            .find(|(_, module)| module.lesson_count() > 0)?;
        self.position = SessionPosition::AtLesson {
            module_idx: previous_module.0,
            lesson_idx: previous_module.1.lesson_count() - 1,
        };
        Some(self.position)
    }

    fn next_position(course: &Course, module_idx: usize, lesson_idx: usize) -> SessionPosition {
        if let Some(module) = course.modules().get(module_idx) {
            if lesson_idx + 1 < module.lesson_count() {
                return SessionPosition::AtLesson {
                    module_idx,
                    lesson_idx: lesson_idx + 1,
                };
            }
        }
        course
            .modules()
            .iter()
            .enumerate()
            .skip(module_idx + 1)
            .find(|(_, module)| module.lesson_count() > 0)
            .map_or(SessionPosition::CourseCompleted, |(idx, _)| {
                SessionPosition::AtLesson {
                    module_idx: idx,
                    lesson_idx: 0,
                }
            })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{
        CertificatePolicy, CompletionCriteria, Course, CourseId, CourseModule, Lesson, LessonId,
        LessonType, ModuleId,
    };

    fn build_course(lessons_per_module: &[usize]) -> Course {
        let mut next_lesson = 1u64;
        let modules = lessons_per_module
            .iter()
            .enumerate()
            .map(|(i, count)| {
                let lessons = (0..*count)
                    .map(|j| {
                        let lesson = Lesson::new(
                            LessonId::new(next_lesson),
                            u32::try_from(j).unwrap() + 1,
                            format!("Lesson {next_lesson}"),
                            LessonType::Text,
                            CompletionCriteria::default(),
                            None,
                            None,
                            0,
                        )
                        .unwrap();
                        next_lesson += 1;
                        lesson
                    })
                    .collect();
                CourseModule::new(
                    ModuleId::new(u64::try_from(i).unwrap() + 1),
                    u32::try_from(i).unwrap() + 1,
                    format!("Module {i}"),
                    lessons,
                )
                .unwrap()
            })
            .collect();
        Course::new(CourseId::new(1), "Rust", modules, CertificatePolicy::disabled()).unwrap()
    }

    fn at(module_idx: usize, lesson_idx: usize) -> SessionPosition {
        SessionPosition::AtLesson {
            module_idx,
            lesson_idx,
        }
    }

    #[test]
    fn starts_at_first_lesson() {
        let course = build_course(&[2, 1]);
        let nav = NavigationController::start(&course).unwrap();
        assert_eq!(nav.position(), at(0, 0));
    }

    #[test]
    fn start_skips_empty_leading_module() {
        let course = build_course(&[0, 2]);
        let nav = NavigationController::start(&course).unwrap();
        assert_eq!(nav.position(), at(1, 0));
    }

    #[test]
    fn empty_course_cannot_start() {
        let course = build_course(&[0, 0]);
        let err = NavigationController::start(&course).unwrap_err();
        assert!(matches!(err, NavigationError::EmptyCourse));
    }

    #[test]
    fn advances_within_then_across_modules() {
        let course = build_course(&[2, 1]);
        let mut nav = NavigationController::start(&course).unwrap();

        let step = nav.advance(&course, AdvanceTrigger::Manual);
        assert_eq!(step.to, at(0, 1));
        assert_eq!(step.delay, None);

        let step = nav.advance(&course, AdvanceTrigger::Manual);
        assert_eq!(step.to, at(1, 0));

        let step = nav.advance(&course, AdvanceTrigger::Manual);
        assert_eq!(step.to, SessionPosition::CourseCompleted);
        assert!(step.course_completed.unwrap().eligibility_check_due);
    }

    #[test]
    fn auto_completion_carries_delay() {
        let course = build_course(&[2]);
        let mut nav = NavigationController::start(&course).unwrap();

        let step = nav.advance(&course, AdvanceTrigger::AutoCompletion);
        assert_eq!(step.to, at(0, 1));
        assert_eq!(step.delay, Some(AUTO_ADVANCE_DELAY));
    }

    #[test]
    fn eligibility_check_due_exactly_once() {
        let course = build_course(&[1]);
        let mut nav = NavigationController::start(&course).unwrap();

        let first = nav.advance(&course, AdvanceTrigger::AutoCompletion);
        assert!(first.course_completed.unwrap().eligibility_check_due);

        // Session revisits completion: idempotent, no second check.
        let again = nav.advance(&course, AdvanceTrigger::Manual);
        assert_eq!(again.to, SessionPosition::CourseCompleted);
        assert!(again.course_completed.is_none());

        let mut nav = NavigationController::start(&course).unwrap();
        nav.jump_to(&course, 0, 0).unwrap();
        let reentry = nav.advance(&course, AdvanceTrigger::Manual);
        assert!(reentry.course_completed.unwrap().eligibility_check_due);
    }

    #[test]
    fn retreat_mirrors_forward_order() {
        let course = build_course(&[2, 1]);
        let mut nav = NavigationController::start(&course).unwrap();
        nav.jump_to(&course, 1, 0).unwrap();

        assert_eq!(nav.retreat(&course), Some(at(0, 1)));
        assert_eq!(nav.retreat(&course), Some(at(0, 0)));
        assert_eq!(nav.retreat(&course), None);
    }

    #[test]
    fn retreat_is_blocked_from_terminal_state() {
        let course = build_course(&[1]);
        let mut nav = NavigationController::start(&course).unwrap();
        nav.advance(&course, AdvanceTrigger::Manual);

        assert_eq!(nav.position(), SessionPosition::CourseCompleted);
        assert_eq!(nav.retreat(&course), None);
    }

    #[test]
    fn advance_skips_empty_middle_module() {
        let course = build_course(&[1, 0, 1]);
        let mut nav = NavigationController::start(&course).unwrap();

        let step = nav.advance(&course, AdvanceTrigger::Manual);
        assert_eq!(step.to, at(2, 0));
    }

    #[test]
    fn jump_rejects_out_of_bounds() {
        let course = build_course(&[1]);
        let mut nav = NavigationController::start(&course).unwrap();
        let err = nav.jump_to(&course, 0, 5).unwrap_err();
        assert!(matches!(
            err,
            NavigationError::OutOfBounds {
                module_idx: 0,
                lesson_idx: 5
            }
        ));
    }
}
