use std::collections::VecDeque;

use chart_model::Score;
use tracing::debug;

/// One recorded edit: the score as it was before the edit (on the undo side)
/// or after it (on the redo side).
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub description: String,
    pub score: Score,
}

#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    max_size: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(256)
    }
}

impl HistoryManager {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_size: max_size.max(1),
        }
    }

    /// Records `prev` under `description`. Returns false (and records nothing)
    /// when the edit left the score unchanged.
    pub fn push_history(
        &mut self,
        description: impl Into<String>,
        prev: Score,
        curr: &Score,
    ) -> bool {
        if prev == *curr {
            return false;
        }

        let description = description.into();
        debug!(description = %description, depth = self.undo.len() + 1, "history push");
        self.undo.push_back(HistoryEntry {
            description,
            score: prev,
        });
        while self.undo.len() > self.max_size {
            self.undo.pop_front();
        }
        self.redo.clear();
        true
    }

    /// Pops the latest snapshot, parking `current` on the redo stack.
    pub fn undo(&mut self, current: Score) -> Option<Score> {
        let entry = self.undo.pop_back()?;
        debug!(description = %entry.description, "undo");
        self.redo.push(HistoryEntry {
            description: entry.description,
            score: current,
        });
        Some(entry.score)
    }

    pub fn redo(&mut self, current: Score) -> Option<Score> {
        let entry = self.redo.pop()?;
        debug!(description = %entry.description, "redo");
        self.undo.push_back(HistoryEntry {
            description: entry.description,
            score: current,
        });
        Some(entry.score)
    }

    pub fn has_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn has_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo.back().map(|e| e.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo.last().map(|e| e.description.as_str())
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score_titled(title: &str) -> Score {
        let mut s = Score::default();
        s.metadata.title = title.to_string();
        s
    }

    #[test]
    fn null_edits_are_not_recorded() {
        let mut h = HistoryManager::new(8);
        let s = score_titled("a");
        assert!(!h.push_history("noop", s.clone(), &s));
        assert!(!h.has_undo());
    }

    #[test]
    fn undo_then_redo_swaps_snapshots() {
        let mut h = HistoryManager::new(8);
        let a = score_titled("a");
        let b = score_titled("b");
        assert!(h.push_history("rename", a.clone(), &b));
        assert_eq!(h.undo_description(), Some("rename"));

        let restored = h.undo(b.clone()).unwrap();
        assert_eq!(restored, a);
        assert_eq!(h.redo_description(), Some("rename"));

        let again = h.redo(restored).unwrap();
        assert_eq!(again, b);
        assert!(h.has_undo());
        assert!(!h.has_redo());
    }

    #[test]
    fn push_clears_redo() {
        let mut h = HistoryManager::new(8);
        let a = score_titled("a");
        let b = score_titled("b");
        let c = score_titled("c");
        h.push_history("ab", a.clone(), &b);
        h.undo(b).unwrap();
        h.push_history("ac", a, &c);
        assert!(!h.has_redo());
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut h = HistoryManager::new(2);
        for i in 0..5 {
            let prev = score_titled(&i.to_string());
            let curr = score_titled(&(i + 1).to_string());
            h.push_history(format!("edit {i}"), prev, &curr);
        }
        assert_eq!(h.undo_len(), 2);
        assert_eq!(h.undo(score_titled("5")).unwrap().metadata.title, "4");
        assert_eq!(h.undo(score_titled("4")).unwrap().metadata.title, "3");
        assert!(h.undo(score_titled("3")).is_none());
    }
}
