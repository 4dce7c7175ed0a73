use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{CourseId, StudentId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CertificateError {
    #[error("certificate id cannot be empty")]
    EmptyId,

    #[error("verification code cannot be empty")]
    EmptyVerificationCode,

    #[error("student name cannot be empty")]
    EmptyStudentName,

    #[error("course title cannot be empty")]
    EmptyCourseTitle,

    #[error("certificate score must be a finite value between 0 and 100, got {provided}")]
    ScoreOutOfRange { provided: f64 },
}

//
// ─── IDENTIFIERS ───────────────────────────────────────────────────────────────
//

/// Public identifier printed on a certificate (e.g. `CERT-2024-ABC123`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertificateId(String);

impl CertificateId {
    /// Creates a certificate id from a non-empty string.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::EmptyId` for a blank value.
    pub fn new(value: impl Into<String>) -> Result<Self, CertificateError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(CertificateError::EmptyId);
        }
        Ok(Self(value.trim().to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Secret paired with a certificate id for public verification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Creates a verification code from a non-empty string.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::EmptyVerificationCode` for a blank value.
    pub fn new(value: impl Into<String>) -> Result<Self, CertificateError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(CertificateError::EmptyVerificationCode);
        }
        Ok(Self(value.trim().to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── GRADE ─────────────────────────────────────────────────────────────────────
//

/// Letter grade printed on a certificate, derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    Pass,
}

impl Grade {
    /// Maps a 0-100 score onto the letter scale.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 95.0 {
            Self::APlus
        } else if score >= 90.0 {
            Self::A
        } else if score >= 85.0 {
            Self::BPlus
        } else if score >= 80.0 {
            Self::B
        } else if score >= 75.0 {
            Self::CPlus
        } else if score >= 70.0 {
            Self::C
        } else {
            Self::Pass
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::Pass => "Pass",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//
// ─── CERTIFICATE ───────────────────────────────────────────────────────────────
//

/// An issued course-completion certificate.
///
/// Immutable after issuance: score, grade and completion date are fixed at
/// issue time. Verification is keyed by the `(certificate_id,
/// verification_code)` pair and needs no student session.
#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
    certificate_id: CertificateId,
    verification_code: VerificationCode,
    student_id: StudentId,
    student_name: String,
    course_id: CourseId,
    course_title: String,
    completion_date: DateTime<Utc>,
    grade: Grade,
    score: f64,
}

impl Certificate {
    /// Issues a certificate; the grade is derived from the score.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError` for blank display names or an out-of-range
    /// score.
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        certificate_id: CertificateId,
        verification_code: VerificationCode,
        student_id: StudentId,
        student_name: impl Into<String>,
        course_id: CourseId,
        course_title: impl Into<String>,
        completion_date: DateTime<Utc>,
        score: f64,
    ) -> Result<Self, CertificateError> {
        let student_name = student_name.into();
        if student_name.trim().is_empty() {
            return Err(CertificateError::EmptyStudentName);
        }
        let course_title = course_title.into();
        if course_title.trim().is_empty() {
            return Err(CertificateError::EmptyCourseTitle);
        }
        if !score.is_finite() || !(0.0..=100.0).contains(&score) {
            return Err(CertificateError::ScoreOutOfRange { provided: score });
        }

        Ok(Self {
            certificate_id,
            verification_code,
            student_id,
            student_name: student_name.trim().to_owned(),
            course_id,
            course_title: course_title.trim().to_owned(),
            completion_date,
            grade: Grade::from_score(score),
            score,
        })
    }

    #[must_use]
    pub fn certificate_id(&self) -> &CertificateId {
        &self.certificate_id
    }

    #[must_use]
    pub fn verification_code(&self) -> &VerificationCode {
        &self.verification_code
    }

    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    #[must_use]
    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn course_title(&self) -> &str {
        &self.course_title
    }

    #[must_use]
    pub fn completion_date(&self) -> DateTime<Utc> {
        self.completion_date
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        self.grade
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
