use chrono::{DateTime, Utc};
use course_core::model::{
    Certificate, CertificateId, CourseId, StudentId, VerificationCode,
};
use serde::{Deserialize, Serialize};

use crate::gateway::GatewayError;

/// Body for completion endpoints.
#[derive(Debug, Serialize)]
pub(super) struct CompletionBody {
    pub student: StudentId,
    pub completed_at: DateTime<Utc>,
}

/// Wraps an ancillary payload with the acting student.
#[derive(Debug, Serialize)]
pub(super) struct StampedBody<'a, T: Serialize> {
    pub student: StudentId,
    #[serde(flatten)]
    pub payload: &'a T,
}

/// Wire shape of a certificate.
///
/// The grade travels for display-only consumers; decoding re-derives it from
/// the score so a tampered grade cannot survive the round trip.
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct CertificateWire {
    pub certificate_id: String,
    pub verification_code: String,
    pub student_id: StudentId,
    pub student_name: String,
    pub course_id: CourseId,
    pub course_title: String,
    pub completion_date: DateTime<Utc>,
    pub grade: String,
    pub score: f64,
}

impl CertificateWire {
    pub(super) fn from_certificate(certificate: &Certificate) -> Self {
        Self {
            certificate_id: certificate.certificate_id().as_str().to_owned(),
            verification_code: certificate.verification_code().as_str().to_owned(),
            student_id: certificate.student_id(),
            student_name: certificate.student_name().to_owned(),
            course_id: certificate.course_id(),
            course_title: certificate.course_title().to_owned(),
            completion_date: certificate.completion_date(),
            grade: certificate.grade().as_str().to_owned(),
            score: certificate.score(),
        }
    }

    pub(super) fn into_certificate(self) -> Result<Certificate, GatewayError> {
        let certificate_id = CertificateId::new(self.certificate_id)
            .map_err(|e| GatewayError::Serialization(e.to_string()))?;
        let verification_code = VerificationCode::new(self.verification_code)
            .map_err(|e| GatewayError::Serialization(e.to_string()))?;
        Certificate::issue(
            certificate_id,
            verification_code,
            self.student_id,
            self.student_name,
            self.course_id,
            self.course_title,
            self.completion_date,
            self.score,
        )
        .map_err(|e| GatewayError::Serialization(e.to_string()))
    }
}
