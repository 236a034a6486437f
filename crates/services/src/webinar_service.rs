use std::sync::Arc;

use lms_core::model::{EnrolledWebinar, UserId, Webinar, WebinarDraft, WebinarId};
use storage::repository::{StorageError, WebinarRepository};

use crate::Clock;
use crate::error::WebinarServiceError;

#[derive(Clone)]
pub struct WebinarService {
    clock: Clock,
    webinars: Arc<dyn WebinarRepository>,
}

impl WebinarService {
    #[must_use]
    pub fn new(clock: Clock, webinars: Arc<dyn WebinarRepository>) -> Self {
        Self { clock, webinars }
    }

    /// # Errors
    ///
    /// Returns `WebinarServiceError::Webinar` for validation failures.
    /// Returns `WebinarServiceError::Storage` if persistence fails.
    pub async fn create_webinar(
        &self,
        draft: WebinarDraft,
    ) -> Result<Webinar, WebinarServiceError> {
        let webinar = draft.validate()?;
        Ok(self.webinars.insert_webinar(&webinar, self.clock.now()).await?)
    }

    /// Register a user for a webinar and report its join state as of now.
    ///
    /// # Errors
    ///
    /// Returns `WebinarServiceError::NotFound` for an unknown webinar.
    /// Returns `WebinarServiceError::AlreadyEnrolled` if already registered.
    pub async fn enroll(
        &self,
        user_id: Option<UserId>,
        webinar_id: Option<WebinarId>,
    ) -> Result<EnrolledWebinar, WebinarServiceError> {
        let user_id = user_id.ok_or(WebinarServiceError::MissingUserId)?;
        let webinar_id = webinar_id.ok_or(WebinarServiceError::MissingWebinarId)?;

        let webinar = self
            .webinars
            .get_webinar(webinar_id)
            .await?
            .ok_or(WebinarServiceError::NotFound(webinar_id))?;

        let now = self.clock.now();
        match self
            .webinars
            .insert_webinar_enrollment(user_id, webinar_id, now)
            .await
        {
            Ok(()) => Ok(EnrolledWebinar::at(webinar, now, now)),
            Err(StorageError::Conflict) => Err(WebinarServiceError::AlreadyEnrolled(webinar_id)),
            Err(StorageError::NotFound) => Err(WebinarServiceError::NotFound(webinar_id)),
            Err(e) => Err(e.into()),
        }
    }
}
