//! Score editing engine: selection-driven edit operations with undo/redo, clipboard
//! interchange, note presets and live statistics.

pub mod clipboard;
mod config;
mod context;
mod error;
mod history;
mod integrity;
pub mod preset;
mod stats;

pub use clipboard::{
    decode_clipboard, encode_clipboard, Clipboard, ClipboardData, MemoryClipboard, PasteData,
    CLIPBOARD_SIGNATURE,
};
pub use config::EditorConfig;
pub use context::{Direction, Placement, PropertyEdit, ScoreContext};
pub use error::{EditError, EditErrorKind};
pub use history::{HistoryEntry, HistoryManager};
pub use integrity::check_integrity;
pub use preset::{fix_filename, NotesPreset, PresetManager};
pub use stats::ScoreStats;

#[cfg(test)]
mod tests;
