//! Rendering surface the widget draws into.

use super::message::Message;

/// The elements a chat widget owns: message list, typing indicator row
/// and the text input.
///
/// The widget guarantees `show_typing` and `hide_typing` alternate, so
/// implementations never see two shows in a row.
pub trait ChatView: Send {
    /// Insert a row at the bottom of the message list.
    fn append_row(&mut self, message: &Message);

    /// Insert the typing indicator row.
    fn show_typing(&mut self);

    /// Remove the typing indicator row.
    fn hide_typing(&mut self);

    /// Smoothly scroll the message container to its bottom.
    fn scroll_to_bottom(&mut self) {}

    /// Empty the text input.
    fn clear_input(&mut self) {}

    /// Allow or block typing into the input.
    fn set_input_enabled(&mut self, _enabled: bool) {}
}

/// Everything a [`Transcript`] observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Row(Message),
    TypingShown,
    TypingHidden,
    Scrolled,
    InputCleared,
    InputEnabled(bool),
}

/// In-memory view that records every call.
///
/// Useful for headless widgets and for asserting on what a user would
/// have seen.
#[derive(Debug)]
pub struct Transcript {
    events: Vec<ViewEvent>,
    typing_rows: usize,
    input_enabled: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            typing_rows: 0,
            input_enabled: true,
        }
    }

    /// All recorded events.
    #[must_use]
    pub fn events(&self) -> &[ViewEvent] {
        &self.events
    }

    /// Rows currently in the message list.
    pub fn rows(&self) -> Vec<&Message> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ViewEvent::Row(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Number of typing indicator rows currently present.
    #[must_use]
    pub fn typing_rows(&self) -> usize {
        self.typing_rows
    }

    #[must_use]
    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// Count events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&ViewEvent) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatView for Transcript {
    fn append_row(&mut self, message: &Message) {
        self.events.push(ViewEvent::Row(message.clone()));
    }

    fn show_typing(&mut self) {
        self.typing_rows += 1;
        self.events.push(ViewEvent::TypingShown);
    }

    fn hide_typing(&mut self) {
        self.typing_rows = self.typing_rows.saturating_sub(1);
        self.events.push(ViewEvent::TypingHidden);
    }

    fn scroll_to_bottom(&mut self) {
        self.events.push(ViewEvent::Scrolled);
    }

    fn clear_input(&mut self) {
        self.events.push(ViewEvent::InputCleared);
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
        self.events.push(ViewEvent::InputEnabled(enabled));
    }
}
