/// Draft buffer for the comment box. Tracks input-method composition so that
/// Enter keypresses that are part of a multi-keystroke character are never
/// mistaken for a submit intent.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommentComposer {
    content: String,
    composing: bool,
}

impl CommentComposer {
    pub fn new() -> CommentComposer {
        CommentComposer::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn clear(&mut self) {
        self.content.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Composition signal from the text input (compositionstart /
    /// compositionend)
    pub fn set_composing(&mut self, composing: bool) {
        self.composing = composing;
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    /// Whether an Enter keypress should submit the draft: Shift+Enter inserts
    /// a newline instead, and keystrokes belonging to an in-progress
    /// composition never submit
    pub fn submit_on_enter(&self, shift_held: bool) -> bool {
        !shift_held && !self.composing
    }
}
