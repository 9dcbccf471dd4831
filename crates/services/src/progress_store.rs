use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use recall_core::model::{FlashcardId, LessonId, ProgressOverview, ProgressSnapshot, UserId};
use remote::{ProgressApi, RemoteError};

use crate::error::ProgressStoreError;
use crate::identity::IdentitySource;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

struct StoreState {
    snapshot: ProgressSnapshot,
    /// Which user's progress the snapshot currently reflects.
    loaded_user: Option<UserId>,
    /// Bumped on every identity change, sign-out, and reset. A fetch started
    /// under an older generation must not write its data.
    generation: u64,
    /// Generation token of the in-flight fetch, if any. The store reports
    /// loading exactly while this is set.
    pending_load: Option<u64>,
}

/// Tracks a signed-in user's completed lessons and mastered flashcards,
/// synchronizing with the remote progress service through optimistic updates.
///
/// The store owns its snapshot exclusively: readers get owned copies, and the
/// only writers are the identity reaction, the two mark operations, and
/// `reset`. All remote failures during mutations roll the optimistic change
/// back and propagate to the caller; failures during the initial load are
/// swallowed into an empty-but-loaded state.
pub struct ProgressStore {
    identity: Arc<dyn IdentitySource>,
    remote: Arc<dyn ProgressApi>,
    state: Mutex<StoreState>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(identity: Arc<dyn IdentitySource>, remote: Arc<dyn ProgressApi>) -> Self {
        Self {
            identity,
            remote,
            state: Mutex::new(StoreState {
                snapshot: ProgressSnapshot::new(),
                loaded_user: None,
                generation: 0,
                pending_load: None,
            }),
        }
    }

    fn state_guard(&self) -> MutexGuard<'_, StoreState> {
        // A poisoned lock still holds consistent state; no mutation here can
        // panic partway through an update.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    //
    // ─── IDENTITY REACTION ─────────────────────────────────────────────────────
    //

    /// React to a (possible) change of the signed-in user.
    ///
    /// Call this whenever the observed identity may have changed. Signed out:
    /// clears all progress without a network call. Signed in as the user the
    /// snapshot already reflects: no-op. Otherwise fetches that user's
    /// progress, treating a failed fetch as "no progress yet".
    ///
    /// A fetch left in flight by an earlier call cannot overwrite the state
    /// written here; its response is discarded when it settles.
    pub async fn sync_identity(&self) {
        let Some(user) = self.identity.current_user() else {
            let mut state = self.state_guard();
            state.snapshot.clear();
            state.loaded_user = None;
            state.generation += 1;
            state.pending_load = None;
            return;
        };

        let token = {
            let mut state = self.state_guard();
            if state.loaded_user.as_ref() == Some(&user) {
                return;
            }
            state.generation += 1;
            state.pending_load = Some(state.generation);
            state.generation
        };

        let fetched = self.remote.fetch_progress(&user).await;

        let mut state = self.state_guard();
        if state.generation == token {
            state.snapshot = match fetched {
                Ok(progress) => ProgressSnapshot::from_parts(
                    progress.completed_lessons,
                    progress.mastered_flashcards,
                ),
                Err(err) => {
                    tracing::warn!(user = %user, error = %err, "progress fetch failed; starting empty");
                    ProgressSnapshot::new()
                }
            };
            state.loaded_user = Some(user);
        }
        if state.pending_load == Some(token) {
            state.pending_load = None;
        }
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────────
    //

    /// Mark a lesson as completed for the signed-in user.
    ///
    /// The lesson appears in the completed set before the remote call
    /// resolves; if the remote service rejects the call or the transport
    /// fails, the optimistic insert is undone.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Unauthenticated` if no user is signed in.
    /// Returns `ProgressStoreError::Remote` after rollback if the remote call
    /// fails.
    pub async fn mark_lesson_complete(&self, lesson: LessonId) -> Result<(), ProgressStoreError> {
        let user = self
            .identity
            .current_user()
            .ok_or(ProgressStoreError::Unauthenticated)?;

        self.apply_optimistic(
            |snapshot| snapshot.insert_completed_lesson(lesson.clone()),
            |snapshot| {
                snapshot.remove_completed_lesson(&lesson);
            },
            self.remote.record_lesson_complete(&user, &lesson),
        )
        .await
    }

    /// Mark a flashcard as mastered for the signed-in user.
    ///
    /// Same contract as [`Self::mark_lesson_complete`], operating on the
    /// mastered set and the flashcard endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Unauthenticated` if no user is signed in.
    /// Returns `ProgressStoreError::Remote` after rollback if the remote call
    /// fails.
    pub async fn mark_flashcard_mastered(
        &self,
        flashcard: FlashcardId,
    ) -> Result<(), ProgressStoreError> {
        let user = self
            .identity
            .current_user()
            .ok_or(ProgressStoreError::Unauthenticated)?;

        self.apply_optimistic(
            |snapshot| snapshot.insert_mastered_flashcard(flashcard.clone()),
            |snapshot| {
                snapshot.remove_mastered_flashcard(&flashcard);
            },
            self.remote.record_flashcard_mastered(&user, &flashcard),
        )
        .await
    }

    /// Apply an optimistic local change, attempt the remote call, and undo the
    /// change if the call fails.
    ///
    /// `apply` reports whether it changed the snapshot; `undo` only runs for a
    /// change this call made, and only while the snapshot it touched is still
    /// current (same generation).
    async fn apply_optimistic<A, U, F>(
        &self,
        apply: A,
        undo: U,
        call: F,
    ) -> Result<(), ProgressStoreError>
    where
        A: FnOnce(&mut ProgressSnapshot) -> bool,
        U: FnOnce(&mut ProgressSnapshot),
        F: Future<Output = Result<(), RemoteError>>,
    {
        let (applied, generation) = {
            let mut state = self.state_guard();
            (apply(&mut state.snapshot), state.generation)
        };

        match call.await {
            Ok(()) => Ok(()),
            Err(err) => {
                if applied {
                    let mut state = self.state_guard();
                    if state.generation == generation {
                        undo(&mut state.snapshot);
                    }
                }
                Err(err.into())
            }
        }
    }

    /// Clear all local progress and the load marker.
    ///
    /// Local-only: the remote service is not contacted, and the next
    /// `sync_identity` for a signed-in user will fetch again. An in-flight
    /// fetch keeps the loading flag until it settles but can no longer write
    /// its data.
    pub fn reset(&self) {
        let mut state = self.state_guard();
        state.snapshot.clear();
        state.loaded_user = None;
        state.generation += 1;
    }

    //
    // ─── READ INTERFACE ────────────────────────────────────────────────────────
    //

    /// Completed lessons in insertion order.
    #[must_use]
    pub fn completed_lessons(&self) -> Vec<LessonId> {
        self.state_guard().snapshot.completed_lessons().to_vec()
    }

    /// Mastered flashcards in insertion order.
    #[must_use]
    pub fn mastered_flashcards(&self) -> Vec<FlashcardId> {
        self.state_guard().snapshot.mastered_flashcards().to_vec()
    }

    #[must_use]
    pub fn is_lesson_completed(&self, lesson: &LessonId) -> bool {
        self.state_guard().snapshot.is_lesson_completed(lesson)
    }

    #[must_use]
    pub fn is_flashcard_mastered(&self, flashcard: &FlashcardId) -> bool {
        self.state_guard().snapshot.is_flashcard_mastered(flashcard)
    }

    /// True while a progress fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state_guard().pending_load.is_some()
    }

    /// The user whose progress the snapshot currently reflects, if any.
    #[must_use]
    pub fn loaded_user(&self) -> Option<UserId> {
        self.state_guard().loaded_user.clone()
    }

    /// Aggregated counts for UI consumption.
    #[must_use]
    pub fn overview(&self) -> ProgressOverview {
        let state = self.state_guard();
        ProgressOverview {
            lessons_completed: state.snapshot.completed_lessons().len(),
            flashcards_mastered: state.snapshot.mastered_flashcards().len(),
            is_loading: state.pending_load.is_some(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SharedIdentity;
    use remote::{InMemoryProgressApi, RemoteProgress};

    fn store_with(identity: &SharedIdentity, api: &InMemoryProgressApi) -> ProgressStore {
        ProgressStore::new(Arc::new(identity.clone()), Arc::new(api.clone()))
    }

    #[tokio::test]
    async fn starts_empty_and_not_loading() {
        let identity = SharedIdentity::new();
        let api = InMemoryProgressApi::new();
        let store = store_with(&identity, &api);

        assert!(store.completed_lessons().is_empty());
        assert!(store.mastered_flashcards().is_empty());
        assert!(!store.is_loading());
        assert_eq!(store.loaded_user(), None);
    }

    #[tokio::test]
    async fn overview_reflects_counts() {
        let identity = SharedIdentity::signed_in(UserId::new("u1"));
        let api = InMemoryProgressApi::new();
        api.seed(
            UserId::new("u1"),
            RemoteProgress {
                completed_lessons: vec![LessonId::new("L1"), LessonId::new("L2")],
                mastered_flashcards: vec![FlashcardId::new("F1")],
            },
        );
        let store = store_with(&identity, &api);
        store.sync_identity().await;

        let overview = store.overview();
        assert_eq!(overview.lessons_completed, 2);
        assert_eq!(overview.flashcards_mastered, 1);
        assert!(!overview.is_loading);
    }

    #[tokio::test]
    async fn reset_clears_progress_and_marker() {
        let identity = SharedIdentity::signed_in(UserId::new("u1"));
        let api = InMemoryProgressApi::new();
        api.seed(
            UserId::new("u1"),
            RemoteProgress {
                completed_lessons: vec![LessonId::new("L1")],
                mastered_flashcards: vec![],
            },
        );
        let store = store_with(&identity, &api);
        store.sync_identity().await;
        assert_eq!(store.loaded_user(), Some(UserId::new("u1")));

        store.reset();

        assert!(store.completed_lessons().is_empty());
        assert!(store.mastered_flashcards().is_empty());
        assert_eq!(store.loaded_user(), None);
    }
}
