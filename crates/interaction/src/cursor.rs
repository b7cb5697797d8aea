use std::collections::BTreeSet;

use engine::Cursor;

/// Tracks which interactive layers are currently under the pointer.
///
/// The cursor is a pointer while the set is non-empty. Layers are entered
/// and left individually so a non-interactive layer underneath never
/// affects the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorTracker {
    over: BTreeSet<String>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Cursor {
        if self.over.is_empty() {
            Cursor::Default
        } else {
            Cursor::Pointer
        }
    }

    /// Returns the new cursor when it changed.
    pub fn enter(&mut self, layer: &str) -> Option<Cursor> {
        let before = self.cursor();
        self.over.insert(layer.to_string());
        self.changed(before)
    }

    pub fn leave(&mut self, layer: &str) -> Option<Cursor> {
        let before = self.cursor();
        self.over.remove(layer);
        self.changed(before)
    }

    pub fn clear(&mut self) -> Option<Cursor> {
        let before = self.cursor();
        self.over.clear();
        self.changed(before)
    }

    fn changed(&self, before: Cursor) -> Option<Cursor> {
        let now = self.cursor();
        (now != before).then_some(now)
    }
}
