//! Text queued during a render pass and handed to a [`TextRenderer`] at its end.

use bevy::prelude::*;

/// Receives strings in display space (origin top-left, y down).
pub trait TextRenderer {
    fn draw_string(&mut self, font: &Handle<Font>, text: &str, position: Vec2, color: Color);
}

/// One queued string.
#[derive(Debug, Clone, PartialEq)]
pub struct StringQueueEntry {
    pub position: Vec2,
    pub text: String,
    pub color: Color,
}

/// Strings queued during one render call.
#[derive(Debug, Default)]
pub struct StringQueue {
    entries: Vec<StringQueueEntry>,
}

impl StringQueue {
    pub fn push(&mut self, position: Vec2, text: impl Into<String>, color: Color) {
        self.entries.push(StringQueueEntry {
            position,
            text: text.into(),
            color,
        });
    }

    pub fn entries(&self) -> &[StringQueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hand every entry to `renderer`, then clear the queue.
    pub fn flush<T: TextRenderer + ?Sized>(&mut self, renderer: &mut T, font: &Handle<Font>) {
        for entry in self.entries.drain(..) {
            renderer.draw_string(font, &entry.text, entry.position, entry.color);
        }
    }
}

/// [`TextRenderer`] that keeps the strings it receives.
///
/// The Bevy adapter uses it as the hand-off between the render system and the
/// UI text pool.
#[derive(Resource, Debug, Default)]
pub struct PendingText {
    pub entries: Vec<StringQueueEntry>,
    /// Font of the most recent string.
    pub font: Handle<Font>,
}

impl TextRenderer for PendingText {
    fn draw_string(&mut self, font: &Handle<Font>, text: &str, position: Vec2, color: Color) {
        if self.font != *font {
            self.font = font.clone();
        }
        self.entries.push(StringQueueEntry {
            position,
            text: text.to_owned(),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_moves_entries_and_clears() {
        let mut queue = StringQueue::default();
        queue.push(Vec2::new(1.0, 2.0), "Bodies: 3", Color::WHITE);
        queue.push(Vec2::new(1.0, 20.0), "Joints: 1", Color::WHITE);

        let mut pending = PendingText::default();
        queue.flush(&mut pending, &Handle::default());

        assert!(queue.is_empty());
        assert_eq!(pending.entries.len(), 2);
        assert_eq!(pending.entries[1].text, "Joints: 1");
        assert_eq!(pending.entries[0].position, Vec2::new(1.0, 2.0));
    }
}
