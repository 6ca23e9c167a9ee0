use chart_model::Id;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditErrorKind {
    Clipboard,
    IO,
    Integrity,
    Preset,
}

impl EditErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            "E1001" | "E1002" => Self::Clipboard,
            "E2001" | "E2002" | "E2003" => Self::IO,
            "E3001" | "E3002" | "E3003" | "E3004" | "E3005" | "E3006" => Self::Integrity,
            "E4001" => Self::Preset,
            _ => Self::Integrity,
        }
    }
}

#[derive(Debug, Error, Clone)]
#[error("{code}: {message}")]
pub struct EditError {
    pub code: &'static str,
    pub kind: EditErrorKind,
    pub message: String,

    // Optional location details; `message` stays the source of truth.
    pub note_id: Option<Id>,
    pub hold_id: Option<Id>,
    pub file: Option<String>,
}

impl EditError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: EditErrorKind::from_code(code),
            message: message.into(),

            note_id: None,
            hold_id: None,
            file: None,
        }
    }

    pub fn with_note(mut self, id: Id) -> Self {
        self.note_id = Some(id);
        self
    }

    pub fn with_hold(mut self, id: Id) -> Self {
        self.hold_id = Some(id);
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}
