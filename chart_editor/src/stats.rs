use chart_model::{HoldNoteType, HoldStepType, NoteType, Score, TICKS_PER_BEAT};

/// Note counts and combo for a score. Always recomputed from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreStats {
    hi_speeds: usize,
    taps: usize,
    flicks: usize,
    holds: usize,
    guides: usize,
    steps: usize,
    traces: usize,
    total: usize,
    combo: i64,
}

impl Default for ScoreStats {
    fn default() -> Self {
        Self {
            hi_speeds: 1,
            taps: 0,
            flicks: 0,
            holds: 0,
            guides: 0,
            steps: 0,
            traces: 0,
            total: 0,
            combo: 0,
        }
    }
}

impl ScoreStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_score(score: &Score) -> Self {
        let mut stats = Self::default();
        stats.calculate_stats(score);
        stats
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn calculate_stats(&mut self, score: &Score) {
        let is_guide = |id| score.hold_notes.get(&id).is_some_and(|h| h.is_guide());

        self.hi_speeds = score.hi_speed_changes.len();
        self.taps = 0;
        self.flicks = 0;
        self.holds = 0;
        self.guides = 0;
        self.steps = 0;
        self.traces = 0;

        for note in score.notes.values() {
            match note.note_type {
                NoteType::Tap if !note.is_flick() && !note.friction => self.taps += 1,
                NoteType::Hold if is_guide(note.id) => self.guides += 1,
                NoteType::Hold => self.holds += 1,
                NoteType::HoldMid => self.steps += 1,
                _ => {}
            }
            if note.is_flick() {
                self.flicks += 1;
            }
            if note.friction {
                self.traces += 1;
            }
        }

        self.total = score.notes.len();
        self.calculate_combo(score);
    }

    pub fn calculate_combo(&mut self, score: &Score) {
        const HALF_BEAT: i32 = TICKS_PER_BEAT / 2;

        let mut combo = score.notes.len() as i64;
        for (id, hold) in &score.hold_notes {
            if hold.is_guide() {
                combo -= 2 + hold.steps.len() as i64;
                continue;
            }

            // hidden starts and ends do not count
            if hold.start_type != HoldNoteType::Normal {
                combo -= 1;
            }
            if hold.end_type != HoldNoteType::Normal {
                combo -= 1;
            }
            combo -= hold
                .steps
                .iter()
                .filter(|s| s.step_type == HoldStepType::Hidden)
                .count() as i64;

            let start_tick = score.notes[id].tick;
            let mut end_tick = score.notes[&hold.end].tick;

            let mut eighth_tick = start_tick + HALF_BEAT;
            eighth_tick -= eighth_tick.rem_euclid(HALF_BEAT);

            // hold is an eighth or shorter
            if eighth_tick == start_tick || eighth_tick == end_tick {
                continue;
            }

            if end_tick.rem_euclid(HALF_BEAT) != 0 {
                end_tick += HALF_BEAT - end_tick.rem_euclid(HALF_BEAT);
            }
            combo += ((end_tick - eighth_tick) / HALF_BEAT) as i64;
        }

        self.combo = combo;
    }

    pub fn hi_speeds(&self) -> usize {
        self.hi_speeds
    }

    pub fn taps(&self) -> usize {
        self.taps
    }

    pub fn flicks(&self) -> usize {
        self.flicks
    }

    pub fn holds(&self) -> usize {
        self.holds
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn guides(&self) -> usize {
        self.guides
    }

    pub fn traces(&self) -> usize {
        self.traces
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn combo(&self) -> i64 {
        self.combo
    }
}
