use std::env;

use async_trait::async_trait;
use recall_core::model::{FlashcardId, LessonId, UserId};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::{ProgressApi, RemoteError, RemoteProgress};

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
}

impl RemoteConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("RECALL_PROGRESS_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        Some(Self { base_url })
    }
}

/// Progress service adapter speaking the HTTP wire protocol.
#[derive(Clone, Debug)]
pub struct HttpProgressApi {
    client: Client,
    base_url: Url,
}

impl HttpProgressApi {
    /// Build an adapter from a validated base URL.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::InvalidBaseUrl` if the configured URL cannot be
    /// parsed or cannot carry path segments.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| RemoteError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidBaseUrl(config.base_url.clone()));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    /// Append path segments to the base URL, percent-escaping each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ProgressApi for HttpProgressApi {
    async fn fetch_progress(&self, user: &UserId) -> Result<RemoteProgress, RemoteError> {
        let url = self.endpoint(&["progress", user.as_str()])?;
        tracing::debug!(user = %user, "fetching progress");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status {
                status: response.status().as_u16(),
            });
        }

        let body: ProgressBody = response.json().await?;
        Ok(RemoteProgress {
            completed_lessons: body.completed_lessons,
            mastered_flashcards: body.mastered_flashcards,
        })
    }

    async fn record_lesson_complete(
        &self,
        user: &UserId,
        lesson: &LessonId,
    ) -> Result<(), RemoteError> {
        let url = self.endpoint(&["progress", "lesson-complete"])?;
        tracing::debug!(user = %user, lesson = %lesson, "recording lesson completion");

        let response = self
            .client
            .post(url)
            .json(&LessonCompleteBody {
                user_id: user,
                lesson_id: lesson,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn record_flashcard_mastered(
        &self,
        user: &UserId,
        flashcard: &FlashcardId,
    ) -> Result<(), RemoteError> {
        let url = self.endpoint(&["progress", "flashcard-master"])?;
        tracing::debug!(user = %user, flashcard = %flashcard, "recording flashcard mastery");

        let response = self
            .client
            .post(url)
            .json(&FlashcardMasterBody {
                user_id: user,
                flashcard_id: flashcard,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressBody {
    #[serde(default)]
    completed_lessons: Vec<LessonId>,
    #[serde(default)]
    mastered_flashcards: Vec<FlashcardId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LessonCompleteBody<'a> {
    user_id: &'a UserId,
    lesson_id: &'a LessonId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlashcardMasterBody<'a> {
    user_id: &'a UserId,
    flashcard_id: &'a FlashcardId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_base_url() {
        let err = HttpProgressApi::new(&RemoteConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, RemoteError::InvalidBaseUrl(_)));
    }

    #[test]
    fn rejects_base_url_without_path_segments() {
        let err = HttpProgressApi::new(&RemoteConfig::new("mailto:someone@example.com"))
            .unwrap_err();
        assert!(matches!(err, RemoteError::InvalidBaseUrl(_)));
    }

    #[test]
    fn endpoint_escapes_path_segments() {
        let api = HttpProgressApi::new(&RemoteConfig::new("http://localhost:8080/api/")).unwrap();
        let url = api.endpoint(&["progress", "team/42 a"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/progress/team%2F42%20a"
        );
    }
}
