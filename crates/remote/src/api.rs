use async_trait::async_trait;
use recall_core::model::{FlashcardId, LessonId, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by progress service adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("request failed with status {status}")]
    Status { status: u16 },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error("connection error: {0}")]
    Connection(String),
}

/// A user's progress as reported by the remote service.
///
/// Absent fields on the wire are already normalized to empty sequences by the
/// adapter, so consumers never see "missing" progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteProgress {
    pub completed_lessons: Vec<LessonId>,
    pub mastered_flashcards: Vec<FlashcardId>,
}

/// Contract for the remote progress service.
#[async_trait]
pub trait ProgressApi: Send + Sync {
    /// Fetch the full progress record for a user.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Status` on a non-2xx response, or other
    /// `RemoteError` variants for transport and decode failures.
    async fn fetch_progress(&self, user: &UserId) -> Result<RemoteProgress, RemoteError>;

    /// Record a lesson as completed for a user.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Status` on a non-2xx response, or other
    /// `RemoteError` variants for transport failures.
    async fn record_lesson_complete(
        &self,
        user: &UserId,
        lesson: &LessonId,
    ) -> Result<(), RemoteError>;

    /// Record a flashcard as mastered for a user.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Status` on a non-2xx response, or other
    /// `RemoteError` variants for transport failures.
    async fn record_flashcard_mastered(
        &self,
        user: &UserId,
        flashcard: &FlashcardId,
    ) -> Result<(), RemoteError>;
}

/// Simple in-memory progress service for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryProgressApi {
    records: Arc<Mutex<HashMap<UserId, RemoteProgress>>>,
}

impl InMemoryProgressApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the progress record for a user.
    pub fn seed(&self, user: UserId, progress: RemoteProgress) {
        if let Ok(mut guard) = self.records.lock() {
            guard.insert(user, progress);
        }
    }
}

#[async_trait]
impl ProgressApi for InMemoryProgressApi {
    async fn fetch_progress(&self, user: &UserId) -> Result<RemoteProgress, RemoteError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        // Users without a record have no progress yet, same as a fresh account.
        Ok(guard.get(user).cloned().unwrap_or_default())
    }

    async fn record_lesson_complete(
        &self,
        user: &UserId,
        lesson: &LessonId,
    ) -> Result<(), RemoteError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let record = guard.entry(user.clone()).or_default();
        if !record.completed_lessons.contains(lesson) {
            record.completed_lessons.push(lesson.clone());
        }
        Ok(())
    }

    async fn record_flashcard_mastered(
        &self,
        user: &UserId,
        flashcard: &FlashcardId,
    ) -> Result<(), RemoteError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let record = guard.entry(user.clone()).or_default();
        if !record.mastered_flashcards.contains(flashcard) {
            record.mastered_flashcards.push(flashcard.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_unknown_user_yields_empty_progress() {
        let api = InMemoryProgressApi::new();
        let progress = api.fetch_progress(&UserId::new("u1")).await.unwrap();
        assert_eq!(progress, RemoteProgress::default());
    }

    #[tokio::test]
    async fn records_round_trip_through_fetch() {
        let api = InMemoryProgressApi::new();
        let user = UserId::new("u1");

        api.record_lesson_complete(&user, &LessonId::new("L1"))
            .await
            .unwrap();
        api.record_flashcard_mastered(&user, &FlashcardId::new("F1"))
            .await
            .unwrap();
        // Re-recording the same lesson keeps the record duplicate-free.
        api.record_lesson_complete(&user, &LessonId::new("L1"))
            .await
            .unwrap();

        let progress = api.fetch_progress(&user).await.unwrap();
        assert_eq!(progress.completed_lessons, vec![LessonId::new("L1")]);
        assert_eq!(progress.mastered_flashcards, vec![FlashcardId::new("F1")]);
    }

    #[tokio::test]
    async fn seed_overwrites_existing_record() {
        let api = InMemoryProgressApi::new();
        let user = UserId::new("u1");

        api.seed(
            user.clone(),
            RemoteProgress {
                completed_lessons: vec![LessonId::new("L1"), LessonId::new("L2")],
                mastered_flashcards: vec![],
            },
        );

        let progress = api.fetch_progress(&user).await.unwrap();
        assert_eq!(progress.completed_lessons.len(), 2);
    }
}
