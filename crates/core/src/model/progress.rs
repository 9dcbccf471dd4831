use crate::model::ids::{FlashcardId, LessonId};

/// A user's learning progress: which lessons are completed and which
/// flashcards are mastered.
///
/// Both collections are duplicate-free and keep insertion order, so they can
/// be rendered directly in the order progress was earned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    completed_lessons: Vec<LessonId>,
    mastered_flashcards: Vec<FlashcardId>,
}

impl ProgressSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from raw id sequences, dropping duplicates while
    /// keeping the first occurrence of each id.
    #[must_use]
    pub fn from_parts(lessons: Vec<LessonId>, flashcards: Vec<FlashcardId>) -> Self {
        let mut snapshot = Self::new();
        for lesson in lessons {
            snapshot.insert_completed_lesson(lesson);
        }
        for flashcard in flashcards {
            snapshot.insert_mastered_flashcard(flashcard);
        }
        snapshot
    }

    /// Completed lessons in insertion order.
    #[must_use]
    pub fn completed_lessons(&self) -> &[LessonId] {
        &self.completed_lessons
    }

    /// Mastered flashcards in insertion order.
    #[must_use]
    pub fn mastered_flashcards(&self) -> &[FlashcardId] {
        &self.mastered_flashcards
    }

    #[must_use]
    pub fn is_lesson_completed(&self, lesson: &LessonId) -> bool {
        self.completed_lessons.contains(lesson)
    }

    #[must_use]
    pub fn is_flashcard_mastered(&self, flashcard: &FlashcardId) -> bool {
        self.mastered_flashcards.contains(flashcard)
    }

    /// Appends a lesson unless it is already present.
    ///
    /// Returns `true` if this call inserted the id.
    pub fn insert_completed_lesson(&mut self, lesson: LessonId) -> bool {
        if self.is_lesson_completed(&lesson) {
            return false;
        }
        self.completed_lessons.push(lesson);
        true
    }

    /// Appends a flashcard unless it is already present.
    ///
    /// Returns `true` if this call inserted the id.
    pub fn insert_mastered_flashcard(&mut self, flashcard: FlashcardId) -> bool {
        if self.is_flashcard_mastered(&flashcard) {
            return false;
        }
        self.mastered_flashcards.push(flashcard);
        true
    }

    /// Removes a lesson if present. Returns `true` if it was removed.
    pub fn remove_completed_lesson(&mut self, lesson: &LessonId) -> bool {
        let before = self.completed_lessons.len();
        self.completed_lessons.retain(|id| id != lesson);
        self.completed_lessons.len() != before
    }

    /// Removes a flashcard if present. Returns `true` if it was removed.
    pub fn remove_mastered_flashcard(&mut self, flashcard: &FlashcardId) -> bool {
        let before = self.mastered_flashcards.len();
        self.mastered_flashcards.retain(|id| id != flashcard);
        self.mastered_flashcards.len() != before
    }

    /// Removes all progress.
    pub fn clear(&mut self) {
        self.completed_lessons.clear();
        self.mastered_flashcards.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed_lessons.is_empty() && self.mastered_flashcards.is_empty()
    }
}

/// Aggregated view of a user's progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressOverview {
    pub lessons_completed: usize,
    pub flashcards_mastered: usize,
    pub is_loading: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_insertion_order() {
        let mut snapshot = ProgressSnapshot::new();
        assert!(snapshot.insert_completed_lesson(LessonId::new("L2")));
        assert!(snapshot.insert_completed_lesson(LessonId::new("L1")));
        assert!(snapshot.insert_completed_lesson(LessonId::new("L3")));

        let ids: Vec<&str> = snapshot
            .completed_lessons()
            .iter()
            .map(LessonId::as_str)
            .collect();
        assert_eq!(ids, ["L2", "L1", "L3"]);
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut snapshot = ProgressSnapshot::new();
        assert!(snapshot.insert_mastered_flashcard(FlashcardId::new("F1")));
        assert!(!snapshot.insert_mastered_flashcard(FlashcardId::new("F1")));
        assert_eq!(snapshot.mastered_flashcards().len(), 1);
    }

    #[test]
    fn from_parts_drops_duplicates_keeping_first() {
        let snapshot = ProgressSnapshot::from_parts(
            vec![
                LessonId::new("L1"),
                LessonId::new("L2"),
                LessonId::new("L1"),
            ],
            vec![FlashcardId::new("F1")],
        );

        let ids: Vec<&str> = snapshot
            .completed_lessons()
            .iter()
            .map(LessonId::as_str)
            .collect();
        assert_eq!(ids, ["L1", "L2"]);
        assert_eq!(snapshot.mastered_flashcards().len(), 1);
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let mut snapshot = ProgressSnapshot::new();
        snapshot.insert_completed_lesson(LessonId::new("L1"));

        assert!(snapshot.remove_completed_lesson(&LessonId::new("L1")));
        assert!(!snapshot.remove_completed_lesson(&LessonId::new("L1")));
        assert!(snapshot.is_empty());
    }

    #[test]
    fn clear_empties_both_sets() {
        let mut snapshot = ProgressSnapshot::from_parts(
            vec![LessonId::new("L1")],
            vec![FlashcardId::new("F1")],
        );
        snapshot.clear();

        assert!(snapshot.is_empty());
        assert!(snapshot.completed_lessons().is_empty());
        assert!(snapshot.mastered_flashcards().is_empty());
    }
}
