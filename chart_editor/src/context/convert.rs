use chart_model::timing::{division_ticks, ease};
use chart_model::{
    EaseType, FlickType, GuideColor, HiSpeedChange, HoldNoteType, HoldStepType, Id, Note,
    NoteType,
};
use tracing::debug;

use super::ScoreContext;

/// A point along a hold path used for interpolation.
#[derive(Debug, Clone, Copy)]
struct PathPoint {
    tick: i32,
    lane: f32,
    width: f32,
    ease: EaseType,
}

impl PathPoint {
    fn of(note: &Note, ease: EaseType) -> Self {
        Self {
            tick: note.tick,
            lane: note.lane,
            width: note.width,
            ease,
        }
    }
}

impl ScoreContext {
    /// Samples every selected hold at `division` and places a trace tap at each sample.
    /// Normal start and end points are skipped unless the holds are being replaced.
    pub fn convert_hold_to_traces(&mut self, division: i32, delete_origin: bool) {
        let Some(interval) = division_ticks(division) else {
            return;
        };
        let targets: Vec<Id> = self
            .selected_notes
            .iter()
            .copied()
            .filter(|id| self.score.notes[id].note_type == NoteType::Hold)
            .collect();
        if targets.is_empty() {
            return;
        }

        let prev = self.score.clone();
        for hold_id in targets {
            let Some(hold) = self.score.hold_notes.get(&hold_id).cloned() else {
                continue;
            };
            let start = &self.score.notes[&hold_id];
            let end = &self.score.notes[&hold.end];
            let (start_tick, end_tick, layer) = (start.tick, end.tick, start.layer);
            let critical =
                start.critical || (hold.is_guide() && hold.guide_color == GuideColor::Yellow);

            let mut points = vec![PathPoint::of(start, hold.start.ease)];
            points.extend(
                hold.steps
                    .iter()
                    .filter(|s| s.step_type != HoldStepType::Skip)
                    .map(|s| PathPoint::of(&self.score.notes[&s.id], s.ease)),
            );
            points.push(PathPoint::of(end, EaseType::Linear));

            let mut tick = start_tick;
            while tick <= end_tick {
                let keeps_point = (tick == start_tick && hold.start_type == HoldNoteType::Normal)
                    || (tick == end_tick && hold.end_type == HoldNoteType::Normal);
                if !delete_origin && keeps_point {
                    tick += interval;
                    continue;
                }

                let tail = points
                    .iter()
                    .skip(1)
                    .position(|p| p.tick >= tick)
                    .map_or(points.len() - 1, |i| i + 1);
                let (head, tail) = (points[tail - 1], points[tail]);
                let span = tail.tick - head.tick;
                let t = if span > 0 {
                    (tick - head.tick) as f32 / span as f32
                } else {
                    0.0
                };
                let left = ease(head.ease, head.lane, tail.lane, t);
                let right = ease(head.ease, head.lane + head.width, tail.lane + tail.width, t);

                let mut trace = Note::new(NoteType::Tap, tick, left, right - left);
                trace.id = self.ids.next_note();
                trace.critical = critical;
                trace.friction = true;
                trace.layer = layer;
                self.score.notes.insert(trace.id, trace);

                tick += interval;
            }

            if delete_origin {
                self.score.remove_hold(hold_id);
            }
        }

        self.selected_notes.clear();
        self.push_history("Convert slides into traces", prev);
    }

    /// Fills the gap between each pair of selected hi-speed changes with linearly
    /// interpolated changes at every `division` grid line.
    pub fn lerp_hi_speeds(&mut self, division: i32) {
        if self.selected_hi_speed_changes.len() < 2 {
            return;
        }
        let Some(interval) = division_ticks(division) else {
            return;
        };

        let mut anchors: Vec<HiSpeedChange> = self
            .selected_hi_speed_changes
            .iter()
            .map(|id| self.score.hi_speed_changes[id])
            .collect();
        anchors.sort_by_key(|hs| hs.tick);
        let layer = anchors[0].layer;

        let prev = self.score.clone();
        for pair in anchors.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            let span = (to.tick - from.tick) as f32;
            let mut tick = from.tick - from.tick.rem_euclid(interval) + interval;
            while tick < to.tick {
                let t = (tick - from.tick) as f32 / span;
                let id = self.ids.next_hi_speed();
                self.score.hi_speed_changes.insert(
                    id,
                    HiSpeedChange {
                        id,
                        tick,
                        speed: from.speed + (to.speed - from.speed) * t,
                        layer,
                    },
                );
                tick += interval;
            }
        }

        debug!(anchors = anchors.len(), "interpolated hi-speed changes");
        self.push_history("Lerp hispeeds", prev);
    }

    /// Turns every normal hold touched by the selection into a guide of `color`.
    pub fn convert_hold_to_guide(&mut self, color: GuideColor) {
        let holds = self.holds_from_selection();
        let prev = self.score.clone();
        let mut edit = false;

        for hold_id in holds {
            let Some(hold) = self.score.hold_notes.get_mut(&hold_id) else {
                continue;
            };
            if hold.is_guide() {
                continue;
            }

            hold.start_type = HoldNoteType::Guide;
            hold.end_type = HoldNoteType::Guide;
            hold.guide_color = color;
            let end_id = hold.end;
            for id in [hold_id, end_id] {
                if let Some(note) = self.score.notes.get_mut(&id) {
                    note.friction = false;
                    note.flick = FlickType::None;
                }
            }
            edit = true;
        }

        if edit {
            self.push_history("Convert hold to guide", prev);
        }
    }

    /// Turns every guide touched by the selection back into a plain hold.
    pub fn convert_guide_to_hold(&mut self) {
        let holds = self.holds_from_selection();
        let prev = self.score.clone();
        let mut edit = false;

        for hold_id in holds {
            let Some(hold) = self.score.hold_notes.get_mut(&hold_id) else {
                continue;
            };
            if !hold.is_guide() {
                continue;
            }
            hold.start_type = HoldNoteType::Normal;
            hold.end_type = HoldNoteType::Normal;
            edit = true;
        }

        if edit {
            self.push_history("Convert guide to hold", prev);
        }
    }
}
