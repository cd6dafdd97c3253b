use serde::{Deserialize, Serialize};

/// Shape of a note on disk.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
pub struct NoteEntity {
    #[serde(default)]
    pub text: String,
}

impl NoteEntity {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Notes with only whitespace are treated the same as missing ones.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
