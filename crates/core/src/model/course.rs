use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{CourseId, LessonId, ModuleId};
use crate::model::lesson::Lesson;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("module title cannot be empty")]
    EmptyModuleTitle,

    #[error("module order must be a positive integer")]
    InvalidModuleOrder,

    #[error("duplicate module order {order} within course")]
    DuplicateModuleOrder { order: u32 },

    #[error("duplicate lesson order {order} within module {module}")]
    DuplicateLessonOrder { module: ModuleId, order: u32 },

    #[error("certificate requirement percentage must be between 0 and 100, got {provided}")]
    RequirementOutOfRange { provided: u8 },
}

//
// ─── CERTIFICATE POLICY ────────────────────────────────────────────────────────
//

/// Thresholds a student must reach before a certificate can be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateRequirements {
    minimum_score: u8,
    completion_percentage: u8,
}

impl CertificateRequirements {
    /// Creates validated requirements; both values are percentages.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::RequirementOutOfRange` for values above 100.
    pub fn new(minimum_score: u8, completion_percentage: u8) -> Result<Self, CourseError> {
        if minimum_score > 100 {
            return Err(CourseError::RequirementOutOfRange {
                provided: minimum_score,
            });
        }
        if completion_percentage > 100 {
            return Err(CourseError::RequirementOutOfRange {
                provided: completion_percentage,
            });
        }
        Ok(Self {
            minimum_score,
            completion_percentage,
        })
    }

    #[must_use]
    pub fn minimum_score(&self) -> u8 {
        self.minimum_score
    }

    #[must_use]
    pub fn completion_percentage(&self) -> u8 {
        self.completion_percentage
    }
}

/// Whether a course offers a certificate, and under what requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificatePolicy {
    is_available: bool,
    requirements: CertificateRequirements,
}

impl CertificatePolicy {
    #[must_use]
    pub fn new(is_available: bool, requirements: CertificateRequirements) -> Self {
        Self {
            is_available,
            requirements,
        }
    }

    /// Policy for a course without a certificate feature.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            is_available: false,
            requirements: CertificateRequirements {
                minimum_score: 0,
                completion_percentage: 100,
            },
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.is_available
    }

    #[must_use]
    pub fn requirements(&self) -> CertificateRequirements {
        self.requirements
    }
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// An ordered group of lessons within a course.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseModule {
    id: ModuleId,
    order: u32,
    title: String,
    lessons: Vec<Lesson>,
}

impl CourseModule {
    /// Creates a module, sorting its lessons by order.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::InvalidModuleOrder` for order 0,
    /// `CourseError::EmptyModuleTitle` for a blank title, and
    /// `CourseError::DuplicateLessonOrder` when two lessons share an order.
    pub fn new(
        id: ModuleId,
        order: u32,
        title: impl Into<String>,
        mut lessons: Vec<Lesson>,
    ) -> Result<Self, CourseError> {
        if order == 0 {
            return Err(CourseError::InvalidModuleOrder);
        }
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyModuleTitle);
        }

        let mut seen = HashSet::new();
        for lesson in &lessons {
            if !seen.insert(lesson.order()) {
                return Err(CourseError::DuplicateLessonOrder {
                    module: id,
                    order: lesson.order(),
                });
            }
        }
        lessons.sort_by_key(Lesson::order);

        Ok(Self {
            id,
            order,
            title: title.trim().to_owned(),
            lessons,
        })
    }

    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A published course: ordered modules plus a certificate policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    id: CourseId,
    title: String,
    modules: Vec<CourseModule>,
    certificate: CertificatePolicy,
}

impl Course {
    /// Creates a course, sorting its modules by order.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` for a blank title and
    /// `CourseError::DuplicateModuleOrder` when two modules share an order.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        mut modules: Vec<CourseModule>,
        certificate: CertificatePolicy,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }

        let mut seen = HashSet::new();
        for module in &modules {
            if !seen.insert(module.order()) {
                return Err(CourseError::DuplicateModuleOrder {
                    order: module.order(),
                });
            }
        }
        modules.sort_by_key(CourseModule::order);

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            modules,
            certificate,
        })
    }

    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn modules(&self) -> &[CourseModule] {
        &self.modules
    }

    #[must_use]
    pub fn certificate(&self) -> &CertificatePolicy {
        &self.certificate
    }

    /// Total lessons across all modules in the current structure.
    #[must_use]
    pub fn total_lessons(&self) -> usize {
        self.modules.iter().map(CourseModule::lesson_count).sum()
    }

    /// Iterate all lessons in module/lesson order.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.modules.iter().flat_map(|m| m.lessons().iter())
    }

    /// Find a lesson anywhere in the course.
    #[must_use]
    pub fn find_lesson(&self, lesson_id: LessonId) -> Option<&Lesson> {
        self.lessons().find(|lesson| lesson.id() == lesson_id)
    }

    /// Lesson at a (module, lesson) index pair, if both are in range.
    #[must_use]
    pub fn lesson_at(&self, module_idx: usize, lesson_idx: usize) -> Option<&Lesson> {
        self.modules.get(module_idx)?.lessons().get(lesson_idx)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
