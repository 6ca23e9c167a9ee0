use crate::score::Score;
use crate::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdCategory {
    /// Notes, and holds keyed by their start note.
    Note,
    HiSpeed,
    Skill,
}

/// Per-session id counters. Ids are never handed out twice by the same allocator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAllocator {
    next_note: Id,
    next_hi_speed: Id,
    next_skill: Id,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts every counter past the largest id already used by `score`.
    pub fn seeded_from(score: &Score) -> Self {
        let after = |max: Option<&Id>| max.map_or(0, |id| id + 1);
        Self {
            next_note: after(score.notes.keys().next_back()),
            next_hi_speed: after(score.hi_speed_changes.keys().next_back()),
            next_skill: after(score.skills.keys().next_back()),
        }
    }

    pub fn next(&mut self, category: IdCategory) -> Id {
        let slot = match category {
            IdCategory::Note => &mut self.next_note,
            IdCategory::HiSpeed => &mut self.next_hi_speed,
            IdCategory::Skill => &mut self.next_skill,
        };
        let id = *slot;
        *slot += 1;
        id
    }

    pub fn next_note(&mut self) -> Id {
        self.next(IdCategory::Note)
    }

    pub fn next_hi_speed(&mut self) -> Id {
        self.next(IdCategory::HiSpeed)
    }

    /// Raises the counters so they stay ahead of `score` without ever moving backwards.
    pub fn reserve_past(&mut self, score: &Score) {
        let seeded = Self::seeded_from(score);
        self.next_note = self.next_note.max(seeded.next_note);
        self.next_hi_speed = self.next_hi_speed.max(seeded.next_hi_speed);
        self.next_skill = self.next_skill.max(seeded.next_skill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{Note, NoteType};

    #[test]
    fn categories_count_independently() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_note(), 0);
        assert_eq!(ids.next_note(), 1);
        assert_eq!(ids.next_hi_speed(), 0);
        assert_eq!(ids.next(IdCategory::Skill), 0);
        assert_eq!(ids.next_note(), 2);
    }

    #[test]
    fn seeding_skips_existing_ids() {
        let mut score = Score::default();
        let mut n = Note::new(NoteType::Tap, 0, 0.0, 3.0);
        n.id = 41;
        score.notes.insert(41, n);

        let mut ids = IdAllocator::seeded_from(&score);
        assert_eq!(ids.next_note(), 42);
        assert_eq!(ids.next_hi_speed(), 0);
    }

    #[test]
    fn reserve_never_moves_backwards() {
        let mut ids = IdAllocator::new();
        for _ in 0..10 {
            ids.next_note();
        }
        ids.reserve_past(&Score::default());
        assert_eq!(ids.next_note(), 10);
    }
}
