use serde::{Deserialize, Serialize};

/// Half-open range of line indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end_exclusive: usize,
}

impl LineRange {
    pub fn new(start: usize, end_exclusive: usize) -> Self {
        debug_assert!(start <= end_exclusive, "inverted line range");
        Self {
            start,
            end_exclusive,
        }
    }

    /// Empty range positioned before line `at`
    pub fn empty(at: usize) -> Self {
        Self::new(at, at)
    }

    pub fn len(&self) -> usize {
        self.end_exclusive - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end_exclusive
    }
}

/// One line-range edit produced by the engine
///
/// Replaces lines `range` with `new_lines`. An insertion has an empty range,
/// a deletion has no new lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEdit {
    pub range: LineRange,
    pub new_lines: Vec<String>,
}

impl LineEdit {
    pub fn replace(range: LineRange, line: impl Into<String>) -> Self {
        Self {
            range,
            new_lines: vec![line.into()],
        }
    }

    pub fn insert(before: usize, line: impl Into<String>) -> Self {
        Self::replace(LineRange::empty(before), line)
    }

    pub fn delete(range: LineRange) -> Self {
        Self {
            range,
            new_lines: Vec::new(),
        }
    }

    pub fn is_insertion(&self) -> bool {
        self.range.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        self.new_lines.is_empty()
    }

    pub fn replacement_text(&self) -> String {
        self.new_lines.join("\n")
    }

    /// Apply this edit to an in-memory list of lines
    pub fn apply_to_lines(&self, lines: &mut Vec<String>) {
        let end = self.range.end_exclusive.min(lines.len());
        let start = self.range.start.min(end);
        lines.splice(start..end, self.new_lines.iter().cloned());
    }
}

/// Receiver of edits, applied strictly in emission order
///
/// Each edit's line numbers assume every earlier edit has already landed.
pub trait EditSink {
    fn apply_edit(&mut self, edit: LineEdit);
}

impl EditSink for Vec<LineEdit> {
    fn apply_edit(&mut self, edit: LineEdit) {
        self.push(edit);
    }
}

impl<K: EditSink + ?Sized> EditSink for &mut K {
    fn apply_edit(&mut self, edit: LineEdit) {
        (**self).apply_edit(edit);
    }
}

impl EditSink for futures::channel::mpsc::UnboundedSender<LineEdit> {
    fn apply_edit(&mut self, edit: LineEdit) {
        if let Err(e) = self.unbounded_send(edit) {
            log::warn!("edit receiver went away, dropping edit: {e}");
        }
    }
}
