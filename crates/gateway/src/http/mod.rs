use std::env;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_core::model::{
    Certificate, CertificateId, CourseId, LessonId, StudentId, VerificationCode,
};
use reqwest::{Client, Response, StatusCode};

use crate::gateway::{
    BookmarkRecord, CertificateStore, GatewayError, LessonProgressRecord, LessonProgressUpdate,
    NoteRecord, ProgressGateway, SaveAck,
};

mod wire;

use wire::{CertificateWire, CompletionBody, StampedBody};

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Serialization(err.to_string())
        } else {
            GatewayError::Connection(err.to_string())
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
}

impl HttpGatewayConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("LMS_GATEWAY_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let auth_token = env::var("LMS_GATEWAY_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        Some(Self {
            base_url,
            auth_token,
        })
    }
}

/// Gateway implementation backed by the platform's REST API.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    config: HttpGatewayConfig,
}

impl HttpGateway {
    #[must_use]
    pub fn new(config: HttpGatewayConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Build a gateway from `LMS_GATEWAY_URL` / `LMS_GATEWAY_TOKEN`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        HttpGatewayConfig::from_env().map(Self::new)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map error statuses; 404 is left to callers that treat it as absence.
    fn check_status(response: Response) -> Result<Response, GatewayError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound),
            StatusCode::CONFLICT => Err(GatewayError::Conflict),
            status => Err(GatewayError::Status(status.as_u16())),
        }
    }
}

#[async_trait]
impl ProgressGateway for HttpGateway {
    async fn get_lesson_progress(
        &self,
        student: StudentId,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgressRecord>, GatewayError> {
        let url = self.url(&format!("progress/{course_id}/lessons/{lesson_id}"));
        let response = self
            .authorize(self.client.get(url).query(&[("student", student.value())]))
            .send()
            .await?;

        match Self::check_status(response) {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(GatewayError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn update_lesson_progress(
        &self,
        student: StudentId,
        course_id: CourseId,
        update: &LessonProgressUpdate,
    ) -> Result<SaveAck, GatewayError> {
        let url = self.url(&format!(
            "progress/{course_id}/lessons/{}",
            update.lesson_id
        ));
        let response = self
            .authorize(
                self.client
                    .put(url)
                    .query(&[("student", student.value())])
                    .json(update),
            )
            .send()
            .await?;
        let response = Self::check_status(response)?;
        Ok(response.json().await?)
    }

    async fn mark_lesson_complete(
        &self,
        student: StudentId,
        course_id: CourseId,
        lesson_id: LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!(
            "progress/{course_id}/lessons/{lesson_id}/complete"
        ));
        let body = CompletionBody {
            student,
            completed_at,
        };
        let response = self
            .authorize(self.client.post(url).json(&body))
            .send()
            .await?;
        Self::check_status(response)?;
        Ok(())
    }

    async fn complete_course(
        &self,
        student: StudentId,
        course_id: CourseId,
        completed_at: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!("progress/{course_id}/complete"));
        let body = CompletionBody {
            student,
            completed_at,
        };
        let response = self
            .authorize(self.client.post(url).json(&body))
            .send()
            .await?;
        Self::check_status(response)?;
        Ok(())
    }

    async fn add_bookmark(
        &self,
        student: StudentId,
        course_id: CourseId,
        bookmark: &BookmarkRecord,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!("progress/{course_id}/bookmarks"));
        let body = StampedBody {
            student,
            payload: bookmark,
        };
        let response = self
            .authorize(self.client.post(url).json(&body))
            .send()
            .await?;
        Self::check_status(response)?;
        Ok(())
    }

    async fn add_note(
        &self,
        student: StudentId,
        course_id: CourseId,
        note: &NoteRecord,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!("progress/{course_id}/notes"));
        let body = StampedBody {
            student,
            payload: note,
        };
        let response = self
            .authorize(self.client.post(url).json(&body))
            .send()
            .await?;
        Self::check_status(response)?;
        Ok(())
    }
}

#[async_trait]
impl CertificateStore for HttpGateway {
    async fn find_certificate(
        &self,
        student: StudentId,
        course_id: CourseId,
    ) -> Result<Option<Certificate>, GatewayError> {
        let url = self.url(&format!("certificates/{course_id}"));
        let response = self
            .authorize(self.client.get(url).query(&[("student", student.value())]))
            .send()
            .await?;

        match Self::check_status(response) {
            Ok(response) => {
                let wire: CertificateWire = response.json().await?;
                Ok(Some(wire.into_certificate()?))
            }
            Err(GatewayError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn insert_certificate(&self, certificate: &Certificate) -> Result<(), GatewayError> {
        let url = self.url("certificates");
        let body = CertificateWire::from_certificate(certificate);
        let response = self
            .authorize(self.client.post(url).json(&body))
            .send()
            .await?;
        Self::check_status(response)?;
        Ok(())
    }

    async fn verify_certificate(
        &self,
        certificate_id: &CertificateId,
        verification_code: &VerificationCode,
    ) -> Result<Option<Certificate>, GatewayError> {
        // Public endpoint: no auth header required.
        let url = self.url(&format!(
            "certificates/verify/{certificate_id}/{verification_code}"
        ));
        let response = self.client.get(url).send().await?;

        match Self::check_status(response) {
            Ok(response) => {
                let wire: CertificateWire = response.json().await?;
                Ok(Some(wire.into_certificate()?))
            }
            Err(GatewayError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn revoke_certificate(
        &self,
        certificate_id: &CertificateId,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!("certificates/{certificate_id}/revoke"));
        let response = self.authorize(self.client.post(url)).send().await?;
        Self::check_status(response)?;
        Ok(())
    }
}
