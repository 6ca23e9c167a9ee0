//! Chart data model: notes, hold chains, tempo/time-signature/hi-speed events and layers,
//! plus the id allocator and timing helpers shared by the editor and codecs.

pub mod ids;
pub mod note;
pub mod score;
pub mod timing;

pub use ids::{IdAllocator, IdCategory};
pub use note::{
    Cycle, EaseType, FadeType, FlickType, GuideColor, HoldNote, HoldNoteType, HoldStep,
    HoldStepType, Note, NoteType,
};
pub use score::{
    sort_hold_steps, Fever, HiSpeedChange, Layer, Score, ScoreMetadata, SkillTrigger, Tempo,
    TimeSignature, Waypoint,
};

pub type Id = u64;

pub const MIN_LANE: i32 = 0;
pub const MAX_LANE: i32 = 11;
pub const NUM_LANES: i32 = 12;
pub const TICKS_PER_BEAT: i32 = 480;
