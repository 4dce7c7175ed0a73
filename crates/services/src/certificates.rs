use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;

use course_core::Clock;
use course_core::model::{
    Certificate, CertificateId, Course, Grade, StudentId, VerificationCode,
};
use gateway::{CertificateStore, GatewayError};

use crate::error::CertificateServiceError;
use crate::progress::CourseCompletion;

/// Outcome of the eligibility comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Eligibility {
    Eligible { score: f64 },
    CompletionTooLow { percent: f64, required: u8 },
    ScoreTooLow { score: f64, required: u8 },
    /// The course's certificate feature is disabled; no check is made.
    Unavailable,
}

impl Eligibility {
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible { .. })
    }
}

/// Compare aggregated completion against the course's certificate policy.
///
/// The overall score is the average of graded lesson scores; a course with
/// nothing graded counts as full marks, since there is no evidence against
/// the student.
#[must_use]
pub fn check_eligibility(course: &Course, completion: &CourseCompletion) -> Eligibility {
    let policy = course.certificate();
    if !policy.is_available() {
        return Eligibility::Unavailable;
    }

    let requirements = policy.requirements();
    if completion.percent < f64::from(requirements.completion_percentage()) {
        return Eligibility::CompletionTooLow {
            percent: completion.percent,
            required: requirements.completion_percentage(),
        };
    }

    let score = completion.overall_score.unwrap_or(100.0);
    if score < f64::from(requirements.minimum_score()) {
        return Eligibility::ScoreTooLow {
            score,
            required: requirements.minimum_score(),
        };
    }

    Eligibility::Eligible { score }
}

/// Publicly verifiable projection of an issued certificate.
///
/// Every field is fixed at issuance; verification never exposes anything
/// else, and never returns a partial object.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedCertificate {
    pub student_name: String,
    pub course_title: String,
    pub completion_date: DateTime<Utc>,
    pub grade: Grade,
    pub score: f64,
}

/// Result of a public verification lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Valid(VerifiedCertificate),
    /// Unknown pair or revoked certificate; deliberately not distinguished.
    NotValid,
}

/// Issues and verifies course-completion certificates.
#[derive(Clone)]
pub struct CertificateService {
    clock: Clock,
    store: Arc<dyn CertificateStore>,
}

impl CertificateService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn CertificateStore>) -> Self {
        Self { clock, store }
    }

    /// Issue a certificate for an eligible student. One-time and idempotent:
    /// when one already exists for the (student, course) pair it is returned
    /// unchanged, including on insert races.
    ///
    /// # Errors
    ///
    /// Returns `CertificateServiceError::Unavailable` when the course offers
    /// no certificate, the specific shortfall when requirements are not met,
    /// and propagates gateway failures.
    pub async fn issue(
        &self,
        student: StudentId,
        student_name: &str,
        course: &Course,
        completion: &CourseCompletion,
    ) -> Result<Certificate, CertificateServiceError> {
        let score = match check_eligibility(course, completion) {
            Eligibility::Eligible { score } => score,
            Eligibility::Unavailable => return Err(CertificateServiceError::Unavailable),
            Eligibility::CompletionTooLow { percent, required } => {
                return Err(CertificateServiceError::CompletionBelowRequirement {
                    percent,
                    required,
                });
            }
            Eligibility::ScoreTooLow { score, required } => {
                return Err(CertificateServiceError::ScoreBelowMinimum { score, required });
            }
        };

        if let Some(existing) = self.store.find_certificate(student, course.id()).await? {
            return Ok(existing);
        }

        let now = self.clock.now();
        let certificate = Certificate::issue(
            generate_certificate_id(now)?,
            generate_verification_code()?,
            student,
            student_name,
            course.id(),
            course.title(),
            now,
            score,
        )?;

        match self.store.insert_certificate(&certificate).await {
            Ok(()) => Ok(certificate),
            // Lost a concurrent issuance race: the stored certificate wins.
            Err(GatewayError::Conflict) => self
                .store
                .find_certificate(student, course.id())
                .await?
                .ok_or(CertificateServiceError::Gateway(GatewayError::NotFound)),
            Err(err) => Err(err.into()),
        }
    }

    /// Public verification by the `(certificate_id, verification_code)` pair.
    ///
    /// Requires no student session. A nonexistent or revoked certificate
    /// yields a definite `Verification::NotValid`.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn verify(
        &self,
        certificate_id: &CertificateId,
        verification_code: &VerificationCode,
    ) -> Result<Verification, CertificateServiceError> {
        match self
            .store
            .verify_certificate(certificate_id, verification_code)
            .await?
        {
            Some(certificate) => Ok(Verification::Valid(VerifiedCertificate {
                student_name: certificate.student_name().to_owned(),
                course_title: certificate.course_title().to_owned(),
                completion_date: certificate.completion_date(),
                grade: certificate.grade(),
                score: certificate.score(),
            })),
            None => Ok(Verification::NotValid),
        }
    }
}

fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

fn generate_certificate_id(
    now: DateTime<Utc>,
) -> Result<CertificateId, CertificateServiceError> {
    Ok(CertificateId::new(format!(
        "CERT-{}-{}",
        now.year(),
        random_token(10)
    ))?)
}

fn generate_verification_code() -> Result<VerificationCode, CertificateServiceError> {
    Ok(VerificationCode::new(random_token(12))?)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{CertificatePolicy, CertificateRequirements, CourseId};
    use course_core::time::{fixed_clock, fixed_now};
    use gateway::InMemoryGateway;

    fn build_course(is_available: bool, minimum_score: u8, completion_percentage: u8) -> Course {
        Course::new(
            CourseId::new(1),
            "Rust Fundamentals",
            Vec::new(),
            CertificatePolicy::new(
                is_available,
                CertificateRequirements::new(minimum_score, completion_percentage).unwrap(),
            ),
        )
        .unwrap()
    }

    fn completion(percent: f64, overall_score: Option<f64>) -> CourseCompletion {
        CourseCompletion {
            completed_lessons: 0,
            total_lessons: 0,
            percent,
            overall_score,
            modules: Vec::new(),
        }
    }

    fn service() -> (CertificateService, Arc<InMemoryGateway>) {
        let gateway = Arc::new(InMemoryGateway::new());
        (
            CertificateService::new(fixed_clock(), gateway.clone()),
            gateway,
        )
    }

    #[test]
    fn gating_on_minimum_score() {
        let course = build_course(true, 70, 100);

        let below = check_eligibility(&course, &completion(100.0, Some(65.0)));
        assert!(!below.is_eligible());
        assert!(matches!(
            below,
            Eligibility::ScoreTooLow {
                required: 70,
                ..
            }
        ));

        let at = check_eligibility(&course, &completion(100.0, Some(70.0)));
        assert_eq!(at, Eligibility::Eligible { score: 70.0 });
    }

    #[test]
    fn gating_on_completion_percentage() {
        let course = build_course(true, 70, 100);
        let result = check_eligibility(&course, &completion(75.0, Some(95.0)));
        assert!(matches!(
            result,
            Eligibility::CompletionTooLow {
                required: 100,
                ..
            }
        ));
    }

    #[test]
    fn disabled_policy_skips_the_check() {
        let course = build_course(false, 0, 0);
        let result = check_eligibility(&course, &completion(100.0, Some(100.0)));
        assert_eq!(result, Eligibility::Unavailable);
    }

    #[test]
    fn ungraded_course_counts_as_full_marks() {
        let course = build_course(true, 70, 100);
        let result = check_eligibility(&course, &completion(100.0, None));
        assert_eq!(result, Eligibility::Eligible { score: 100.0 });
    }

    #[tokio::test]
    async fn issuance_is_idempotent() {
        let (service, _) = service();
        let course = build_course(true, 70, 100);
        let done = completion(100.0, Some(88.0));

        let first = service
            .issue(StudentId::new(7), "Ada Lovelace", &course, &done)
            .await
            .unwrap();
        let second = service
            .issue(StudentId::new(7), "Ada Lovelace", &course, &done)
            .await
            .unwrap();

        assert_eq!(first.certificate_id(), second.certificate_id());
        assert_eq!(first.verification_code(), second.verification_code());
    }

    #[tokio::test]
    async fn ineligible_student_gets_no_certificate() {
        let (service, _) = service();
        let course = build_course(true, 70, 100);

        let err = service
            .issue(
                StudentId::new(7),
                "Ada",
                &course,
                &completion(100.0, Some(65.0)),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CertificateServiceError::ScoreBelowMinimum { required: 70, .. }
        ));
    }

    #[tokio::test]
    async fn disabled_course_never_issues() {
        let (service, _) = service();
        let course = build_course(false, 0, 0);

        let err = service
            .issue(
                StudentId::new(7),
                "Ada",
                &course,
                &completion(100.0, Some(100.0)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CertificateServiceError::Unavailable));
    }

    #[tokio::test]
    async fn verify_round_trip_and_not_valid() {
        let (service, gateway) = service();
        let course = build_course(true, 70, 100);

        let certificate = service
            .issue(
                StudentId::new(7),
                "Ada Lovelace",
                &course,
                &completion(100.0, Some(92.0)),
            )
            .await
            .unwrap();

        let verification = service
            .verify(certificate.certificate_id(), certificate.verification_code())
            .await
            .unwrap();
        let Verification::Valid(fields) = verification else {
            panic!("expected a valid certificate");
        };
        assert_eq!(fields.student_name, "Ada Lovelace");
        assert_eq!(fields.course_title, "Rust Fundamentals");
        assert_eq!(fields.grade, Grade::A);
        assert_eq!(fields.completion_date, fixed_now());

        let bogus = CertificateId::new("CERT-2024-UNKNOWN").unwrap();
        let result = service
            .verify(&bogus, certificate.verification_code())
            .await
            .unwrap();
        assert_eq!(result, Verification::NotValid);

        gateway
            .revoke_certificate(certificate.certificate_id())
            .await
            .unwrap();
        let result = service
            .verify(certificate.certificate_id(), certificate.verification_code())
            .await
            .unwrap();
        assert_eq!(result, Verification::NotValid);
    }

    #[tokio::test]
    async fn certificate_id_carries_issue_year() {
        let (service, _) = service();
        let course = build_course(true, 0, 0);

        let certificate = service
            .issue(StudentId::new(7), "Ada", &course, &completion(0.0, None))
            .await
            .unwrap();
        let expected_prefix = format!("CERT-{}-", fixed_now().year());
        assert!(certificate.certificate_id().as_str().starts_with(&expected_prefix));
    }
}
