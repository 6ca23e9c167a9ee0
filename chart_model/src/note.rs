use serde::{Deserialize, Serialize};

use crate::Id;

/// Enum values that property setters can step through with a "next value" request.
pub trait Cycle: Copy {
    fn next(self) -> Self;
}

macro_rules! cycle_in_order {
    ($ty:ty, [$($variant:expr),+ $(,)?]) => {
        impl Cycle for $ty {
            fn next(self) -> Self {
                const ORDER: &[$ty] = &[$($variant),+];
                let pos = ORDER.iter().position(|v| *v == self).unwrap_or(0);
                ORDER[(pos + 1) % ORDER.len()]
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteType {
    Tap,
    Hold,
    HoldMid,
    HoldEnd,
    Damage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlickType {
    #[default]
    None,
    Default,
    Left,
    Right,
}

impl FlickType {
    /// Left and right swap, everything else stays.
    pub fn mirrored(self) -> Self {
        match self {
            FlickType::Left => FlickType::Right,
            FlickType::Right => FlickType::Left,
            other => other,
        }
    }
}

cycle_in_order!(
    FlickType,
    [FlickType::None, FlickType::Default, FlickType::Left, FlickType::Right]
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldStepType {
    #[default]
    Normal,
    #[serde(alias = "invisible")]
    Hidden,
    #[serde(alias = "ignored")]
    Skip,
}

cycle_in_order!(HoldStepType, [HoldStepType::Normal, HoldStepType::Hidden, HoldStepType::Skip]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EaseType {
    #[default]
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "easein", alias = "in")]
    EaseIn,
    #[serde(rename = "easeout", alias = "out")]
    EaseOut,
}

cycle_in_order!(EaseType, [EaseType::Linear, EaseType::EaseIn, EaseType::EaseOut]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldNoteType {
    #[default]
    Normal,
    Hidden,
    Guide,
}

// Guide is only reachable through the dedicated guide conversions.
cycle_in_order!(HoldNoteType, [HoldNoteType::Normal, HoldNoteType::Hidden]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeType {
    #[default]
    Out,
    None,
    In,
}

cycle_in_order!(FadeType, [FadeType::Out, FadeType::None, FadeType::In]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideColor {
    Neutral,
    Red,
    #[default]
    Green,
    Blue,
    Yellow,
    Purple,
    Cyan,
    Black,
}

cycle_in_order!(
    GuideColor,
    [
        GuideColor::Neutral,
        GuideColor::Red,
        GuideColor::Green,
        GuideColor::Blue,
        GuideColor::Yellow,
        GuideColor::Purple,
        GuideColor::Cyan,
        GuideColor::Black,
    ]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Id,
    pub note_type: NoteType,
    pub tick: i32,
    pub lane: f32,
    pub width: f32,
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub friction: bool,
    #[serde(default)]
    pub flick: FlickType,
    #[serde(default)]
    pub layer: usize,
    #[serde(default)]
    pub parent_id: Option<Id>,
}

impl Note {
    pub fn new(note_type: NoteType, tick: i32, lane: f32, width: f32) -> Self {
        Self {
            id: 0,
            note_type,
            tick,
            lane,
            width,
            critical: false,
            friction: false,
            flick: FlickType::None,
            layer: 0,
            parent_id: None,
        }
    }

    pub fn can_flick(&self) -> bool {
        matches!(self.note_type, NoteType::Tap | NoteType::HoldEnd)
    }

    pub fn is_flick(&self) -> bool {
        self.flick != FlickType::None
            && !matches!(self.note_type, NoteType::Hold | NoteType::HoldMid)
    }

    pub fn has_ease(&self) -> bool {
        matches!(self.note_type, NoteType::Hold | NoteType::HoldMid)
    }

    pub fn is_hold_part(&self) -> bool {
        matches!(
            self.note_type,
            NoteType::Hold | NoteType::HoldMid | NoteType::HoldEnd
        )
    }

    pub fn hold_id(&self) -> Option<Id> {
        match self.note_type {
            NoteType::Hold => Some(self.id),
            NoteType::HoldMid | NoteType::HoldEnd => self.parent_id,
            NoteType::Tap | NoteType::Damage => None,
        }
    }

    pub fn right_lane(&self) -> f32 {
        self.lane + self.width - 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldStep {
    pub id: Id,
    #[serde(rename = "type", default)]
    pub step_type: HoldStepType,
    #[serde(default)]
    pub ease: EaseType,
}

impl HoldStep {
    pub fn new(id: Id, step_type: HoldStepType, ease: EaseType) -> Self {
        Self { id, step_type, ease }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldNote {
    pub start: HoldStep,
    pub end: Id,
    #[serde(default)]
    pub steps: Vec<HoldStep>,
    #[serde(default)]
    pub start_type: HoldNoteType,
    #[serde(default)]
    pub end_type: HoldNoteType,
    #[serde(default)]
    pub fade_type: FadeType,
    #[serde(default)]
    pub guide_color: GuideColor,
}

impl HoldNote {
    pub fn new(start: Id, end: Id) -> Self {
        Self {
            start: HoldStep::new(start, HoldStepType::Normal, EaseType::Linear),
            end,
            steps: Vec::new(),
            start_type: HoldNoteType::Normal,
            end_type: HoldNoteType::Normal,
            fade_type: FadeType::Out,
            guide_color: GuideColor::Green,
        }
    }

    pub fn is_guide(&self) -> bool {
        self.start_type == HoldNoteType::Guide && self.end_type == HoldNoteType::Guide
    }

    pub fn step_index(&self, id: Id) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// Step id at `index`, or the end note when `index == steps.len()`.
    pub fn id_at(&self, index: usize) -> Id {
        if index >= self.steps.len() {
            self.end
        } else {
            self.steps[index].id
        }
    }

    pub fn note_ids(&self) -> impl Iterator<Item = Id> + '_ {
        std::iter::once(self.start.id)
            .chain(self.steps.iter().map(|s| s.id))
            .chain(std::iter::once(self.end))
    }

    pub fn references(&self, id: Id) -> bool {
        self.end == id || self.step_index(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_wrap_around() {
        assert_eq!(FlickType::Right.next(), FlickType::None);
        assert_eq!(HoldStepType::Skip.next(), HoldStepType::Normal);
        assert_eq!(EaseType::EaseIn.next(), EaseType::EaseOut);
        assert_eq!(GuideColor::Black.next(), GuideColor::Neutral);
        assert_eq!(HoldNoteType::Hidden.next(), HoldNoteType::Normal);
    }

    #[test]
    fn legacy_step_and_ease_names_are_accepted() {
        let step: HoldStepType = serde_json::from_str("\"invisible\"").unwrap();
        assert_eq!(step, HoldStepType::Hidden);
        let step: HoldStepType = serde_json::from_str("\"ignored\"").unwrap();
        assert_eq!(step, HoldStepType::Skip);
        let ease: EaseType = serde_json::from_str("\"out\"").unwrap();
        assert_eq!(ease, EaseType::EaseOut);
        assert_eq!(serde_json::to_string(&EaseType::EaseIn).unwrap(), "\"easein\"");
    }

    #[test]
    fn flick_only_counts_on_flickable_kinds() {
        let mut mid = Note::new(NoteType::HoldMid, 0, 0.0, 3.0);
        mid.flick = FlickType::Left;
        assert!(!mid.is_flick());

        let mut tap = Note::new(NoteType::Tap, 0, 0.0, 3.0);
        tap.flick = FlickType::Left;
        assert!(tap.is_flick());
        assert!(tap.can_flick());
    }

    #[test]
    fn hold_id_at_falls_back_to_end() {
        let mut hold = HoldNote::new(1, 9);
        hold.steps.push(HoldStep::new(4, HoldStepType::Normal, EaseType::Linear));
        assert_eq!(hold.id_at(0), 4);
        assert_eq!(hold.id_at(1), 9);
        assert_eq!(hold.note_ids().collect::<Vec<_>>(), vec![1, 4, 9]);
    }
}
