use std::collections::HashMap;

use course_core::model::{Course, LessonId, LessonProgress, ModuleId};
use serde::Serialize;

/// Completion rollup for one module; display-only, never used for
/// certificate logic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleCompletion {
    pub module_id: ModuleId,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub percent: f64,
}

/// Derived course-level completion view.
///
/// Always recomputed fresh from the current course structure and the set of
/// lesson progress records; never patched incrementally, so a lesson removed
/// from the course drops out of both numerator and denominator on the next
/// compute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseCompletion {
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub percent: f64,
    /// Average of graded lesson scores; `None` when nothing is graded yet.
    pub overall_score: Option<f64>,
    pub modules: Vec<ModuleCompletion>,
}

#[allow(clippy::cast_precision_loss)]
fn percent_of(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

impl CourseCompletion {
    /// Roll up per-lesson completion over the current course structure.
    #[must_use]
    pub fn compute(
        course: &Course,
        by_lesson: &HashMap<LessonId, LessonProgress>,
    ) -> Self {
        let mut completed_lessons = 0;
        let mut total_lessons = 0;
        let mut modules = Vec::with_capacity(course.modules().len());

        for module in course.modules() {
            let total = module.lesson_count();
            let completed = module
                .lessons()
                .iter()
                .filter(|lesson| {
                    by_lesson
                        .get(&lesson.id())
                        .is_some_and(LessonProgress::completed)
                })
                .count();
            completed_lessons += completed;
            total_lessons += total;
            modules.push(ModuleCompletion {
                module_id: module.id(),
                completed_lessons: completed,
                total_lessons: total,
                percent: percent_of(completed, total),
            });
        }

        let graded: Vec<f64> = course
            .lessons()
            .filter_map(|lesson| by_lesson.get(&lesson.id()))
            .filter_map(LessonProgress::graded_score)
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let overall_score = if graded.is_empty() {
            None
        } else {
            Some(graded.iter().sum::<f64>() / graded.len() as f64)
        };

        Self {
            completed_lessons,
            total_lessons,
            percent: percent_of(completed_lessons, total_lessons),
            overall_score,
            modules,
        }
    }

    /// Rounded percentage for display.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rounded_percent(&self) -> u8 {
        self.percent.round() as u8
    }

    /// Whether every lesson in the current structure is complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total_lessons > 0 && self.completed_lessons == self.total_lessons
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
