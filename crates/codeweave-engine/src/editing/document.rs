use crate::editing::{DocumentLine, EditSink, LineEdit, LineRange, SentInCodeBlock, SentLineMarker};
use crate::indent::IndentStyle;

/// Handle to a line position kept current across document edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedLine(usize);

/// Working copy of the destination document for one streaming session
///
/// Lines are stored as an indexed arena of [`DocumentLine`]s whose sent tags
/// are fixed at construction. Every mutator emits exactly one [`LineEdit`] to
/// the sink (or none for a no-op) and returns the index at which the next
/// write should happen, so callers chain cursors instead of recomputing
/// indices after a shift.
///
/// ```rust
/// # use codeweave_engine::editing::{LineDocument, LineEdit};
/// # use codeweave_engine::indent::IndentStyle;
/// let sink: Vec<LineEdit> = Vec::new();
/// let mut doc = LineDocument::new("a\nb", "plaintext", IndentStyle::Spaces(4), &[], sink);
/// let next = doc.insert_line_before(0, "top");
/// let next = doc.replace_line(next, "A", false);
/// assert_eq!(next, 2);
/// assert_eq!(doc.text(), "top\nA\nb");
/// assert_eq!(doc.sink().len(), 2);
/// ```
pub struct LineDocument<K = Vec<LineEdit>> {
    lines: Vec<DocumentLine>,
    indent_style: IndentStyle,
    language_id: String,
    first_sent_line_index: usize,
    tracked: Vec<Option<usize>>,
    sink: K,
    did_noop_edits: bool,
    did_edits: bool,
    did_replace_edits: bool,
}

impl<K> LineDocument<K> {
    pub fn new(
        text: &str,
        language_id: impl Into<String>,
        indent_style: IndentStyle,
        sent_lines: &[SentLineMarker],
        sink: K,
    ) -> Self {
        let contents: Vec<&str> = split_lines(text).collect();
        let mut tags = vec![SentInCodeBlock::None; contents.len()];
        for marker in sent_lines {
            match tags.get_mut(marker.line_index) {
                Some(tag) => *tag = marker.tag,
                None => log::debug!(
                    "ignoring sent marker for line {} past end of document",
                    marker.line_index
                ),
            }
        }

        let first_sent_line_index = tags.iter().position(|t| t.was_sent()).unwrap_or(0);
        let lines = contents
            .into_iter()
            .zip(tags)
            .map(|(content, tag)| DocumentLine::new(content, indent_style, tag))
            .collect();

        Self {
            lines,
            indent_style,
            language_id: language_id.into(),
            first_sent_line_index,
            tracked: Vec::new(),
            sink,
            did_noop_edits: false,
            did_edits: false,
            did_replace_edits: false,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The line at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds; callers derive indices from the
    /// cursor protocol, so this is always a bug in the caller.
    pub fn line(&self, index: usize) -> &DocumentLine {
        match self.lines.get(index) {
            Some(line) => line,
            None => panic!(
                "line index {index} out of bounds for document with {} lines",
                self.lines.len()
            ),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &DocumentLine> {
        self.lines.iter()
    }

    pub fn indent_style(&self) -> IndentStyle {
        self.indent_style
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// Lowest index of a line that was shown to the generator
    pub fn first_sent_line_index(&self) -> usize {
        self.first_sent_line_index
    }

    pub fn did_noop_edits(&self) -> bool {
        self.did_noop_edits
    }

    pub fn did_edits(&self) -> bool {
        self.did_edits
    }

    /// Whether any edit replaced or removed pre-existing content
    pub fn did_replace_edits(&self) -> bool {
        self.did_replace_edits
    }

    /// Current text, lines joined with `\n`
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(DocumentLine::content)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Start following the line currently at `index` through later edits
    pub fn track_line(&mut self, index: usize) -> TrackedLine {
        self.tracked.push(Some(index));
        TrackedLine(self.tracked.len() - 1)
    }

    /// Current index of a tracked line
    ///
    /// Returns `None` once the line and everything above it has been deleted.
    pub fn tracked_line(&self, handle: TrackedLine) -> Option<usize> {
        self.tracked.get(handle.0).copied().flatten()
    }

    fn new_line(&self, content: &str) -> DocumentLine {
        DocumentLine::new(content, self.indent_style, SentInCodeBlock::None)
    }

    fn shift_tracked_for_insert(&mut self, at: usize) {
        for t in self.tracked.iter_mut().flatten() {
            if *t >= at {
                *t += 1;
            }
        }
    }

    fn shift_tracked_for_collapse(&mut self, from: usize, to: usize) {
        for t in self.tracked.iter_mut().flatten() {
            if *t > to {
                *t -= to - from;
            } else if *t >= from {
                *t = from;
            }
        }
    }

    fn shift_tracked_for_delete(&mut self, from: usize, to: usize) {
        let removed = to - from + 1;
        for slot in self.tracked.iter_mut() {
            *slot = match *slot {
                Some(t) if t > to => Some(t - removed),
                Some(t) if t >= from => from.checked_sub(1),
                other => other,
            };
        }
    }
}

impl<K: EditSink> LineDocument<K> {
    fn emit(&mut self, edit: LineEdit) {
        log::trace!(
            "edit lines {}..{} -> {:?}",
            edit.range.start,
            edit.range.end_exclusive,
            edit.new_lines
        );
        self.sink.apply_edit(edit);
    }

    /// Replace the line at `index`
    ///
    /// Identical content is a no-op. A preserving replace (a line the user was
    /// typing being continued) does not count as destructive.
    pub fn replace_line(&mut self, index: usize, line: &str, is_preserving: bool) -> usize {
        if self.line(index).content() == line {
            self.did_noop_edits = true;
            return index + 1;
        }

        self.emit(LineEdit::replace(LineRange::new(index, index + 1), line));
        self.lines[index] = self.new_line(line);
        self.did_edits = true;
        if !is_preserving {
            self.did_replace_edits = true;
        }
        index + 1
    }

    /// Collapse the inclusive span `from..=to` into a single line
    ///
    /// A one-line span is a plain [`replace_line`](Self::replace_line), so
    /// rewriting a line with its own content stays a no-op.
    pub fn replace_lines(&mut self, from: usize, to: usize, line: &str) -> usize {
        assert!(from <= to, "inverted replace span {from}..={to}");
        if from == to {
            return self.replace_line(from, line, false);
        }

        self.line(to);
        self.emit(LineEdit::replace(LineRange::new(from, to + 1), line));
        let replacement = self.new_line(line);
        self.lines.splice(from..=to, [replacement]);
        self.shift_tracked_for_collapse(from, to);
        self.did_edits = true;
        self.did_replace_edits = true;
        from + 1
    }

    /// Insert before `index`; `index == line_count()` appends
    pub fn insert_line_before(&mut self, index: usize, line: &str) -> usize {
        assert!(
            index <= self.lines.len(),
            "insert position {index} out of bounds for document with {} lines",
            self.lines.len()
        );

        self.emit(LineEdit::insert(index, line));
        let inserted = self.new_line(line);
        self.lines.insert(index, inserted);
        self.shift_tracked_for_insert(index);
        self.did_edits = true;
        index + 1
    }

    pub fn insert_line_after(&mut self, index: usize, line: &str) -> usize {
        self.line(index);
        self.insert_line_before(index + 1, line)
    }

    pub fn append_line_at_end_of_document(&mut self, line: &str) -> usize {
        self.insert_line_before(self.lines.len(), line)
    }

    /// Delete the inclusive span `from..=to`
    pub fn delete_lines(&mut self, from: usize, to: usize) -> usize {
        assert!(from <= to, "inverted delete span {from}..={to}");
        self.line(to);

        self.emit(LineEdit::delete(LineRange::new(from, to + 1)));
        self.lines.drain(from..=to);
        if self.lines.is_empty() {
            // A document always has at least one (possibly empty) line
            let empty = self.new_line("");
            self.lines.push(empty);
        }
        self.shift_tracked_for_delete(from, to);
        self.did_edits = true;
        self.did_replace_edits = true;
        from
    }
}

/// Split text into lines the way an editor does: a trailing newline leaves an
/// empty last line, and `\r` before `\n` is not part of the content.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(text: &str) -> LineDocument {
        let count = split_lines(text).count();
        let sent: Vec<SentLineMarker> = (0..count)
            .map(|i| SentLineMarker::new(i, SentInCodeBlock::Range))
            .collect();
        LineDocument::new(text, "typescript", IndentStyle::Spaces(2), &sent, Vec::new())
    }

    #[test]
    fn test_split_lines_like_an_editor() {
        assert_eq!(split_lines("a\r\nb\n").collect::<Vec<_>>(), vec!["a", "b", ""]);
        assert_eq!(split_lines("").collect::<Vec<_>>(), vec![""]);
    }

    #[test]
    fn test_replace_with_identical_content_is_noop() {
        let mut d = doc("a\nb");
        let next = d.replace_line(1, "b", false);

        assert_eq!(next, 2);
        assert!(d.did_noop_edits());
        assert!(!d.did_edits());
        assert!(d.sink().is_empty());
    }

    #[test]
    fn test_replace_line_emits_one_edit() {
        let mut d = doc("a\nb");
        d.replace_line(0, "A", false);

        assert_eq!(d.sink(), &vec![LineEdit::replace(LineRange::new(0, 1), "A")]);
        assert!(d.did_edits());
        assert!(d.did_replace_edits());
        assert_eq!(d.line(0).sent(), SentInCodeBlock::None);
    }

    #[test]
    fn test_preserving_replace_is_not_destructive() {
        let mut d = doc("let x");
        d.replace_line(0, "let x = 1;", true);

        assert!(d.did_edits());
        assert!(!d.did_replace_edits());
    }

    #[test]
    fn test_replace_lines_collapses_span() {
        let mut d = doc("a\nb\nc\nd");
        let next = d.replace_lines(1, 2, "bc");

        assert_eq!(next, 2);
        assert_eq!(d.text(), "a\nbc\nd");
        assert_eq!(d.sink(), &vec![LineEdit::replace(LineRange::new(1, 3), "bc")]);
        assert!(d.did_replace_edits());
    }

    #[test]
    fn test_single_line_replace_lines_noop_is_not_destructive() {
        let mut d = doc("a\nb");
        let next = d.replace_lines(0, 0, "a");

        assert_eq!(next, 1);
        assert!(d.sink().is_empty());
        assert!(d.did_noop_edits());
        assert!(!d.did_replace_edits());
    }

    #[test]
    fn test_single_line_replace_lines_change_is_destructive() {
        let mut d = doc("a\nb");
        d.replace_lines(1, 1, "B");

        assert_eq!(d.sink(), &vec![LineEdit::replace(LineRange::new(1, 2), "B")]);
        assert!(d.did_replace_edits());
    }

    #[test]
    fn test_insert_then_replace_chains_cursor() {
        let mut d = doc("a\nb");
        let cursor = d.insert_line_before(0, "new");
        let next = d.replace_line(cursor, "A", false);

        assert_eq!(cursor, 1);
        assert_eq!(next, 2);
        assert_eq!(
            d.sink(),
            &vec![
                LineEdit::insert(0, "new"),
                LineEdit::replace(LineRange::new(1, 2), "A"),
            ]
        );
        assert_eq!(d.text(), "new\nA\nb");
    }

    #[test]
    fn test_insert_after_and_append() {
        let mut d = doc("a\nb");
        assert_eq!(d.insert_line_after(0, "x"), 2);
        assert_eq!(d.append_line_at_end_of_document("z"), 4);
        assert_eq!(d.text(), "a\nx\nb\nz");
        assert!(!d.did_replace_edits());
    }

    #[test]
    fn test_delete_lines_is_destructive() {
        let mut d = doc("a\nb\nc");
        let next = d.delete_lines(1, 2);

        assert_eq!(next, 1);
        assert_eq!(d.text(), "a");
        assert_eq!(d.sink(), &vec![LineEdit::delete(LineRange::new(1, 3))]);
        assert!(d.did_replace_edits());
    }

    #[test]
    fn test_deleting_everything_leaves_one_empty_line() {
        let mut d = doc("a\nb");
        d.delete_lines(0, 1);
        assert_eq!(d.line_count(), 1);
        assert_eq!(d.text(), "");
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_line_out_of_bounds_panics() {
        let d = doc("a");
        d.line(1);
    }

    #[test]
    fn test_tracked_line_follows_edits() {
        let mut d = doc("a\nb\nc\nd\ne");
        let end = d.track_line(3);

        d.insert_line_before(1, "x"); // a x b c d e
        assert_eq!(d.tracked_line(end), Some(4));

        d.replace_lines(1, 2, "xb"); // a xb c d e
        assert_eq!(d.tracked_line(end), Some(3));

        d.insert_line_after(3, "after"); // a xb c d after e
        assert_eq!(d.tracked_line(end), Some(3));

        d.replace_lines(2, 4, "merged"); // a xb merged e
        assert_eq!(d.tracked_line(end), Some(2));

        d.delete_lines(0, 2);
        assert_eq!(d.tracked_line(end), None);
    }

    #[test]
    fn test_sent_tags_and_first_sent_index() {
        let markers = [
            SentLineMarker::new(2, SentInCodeBlock::Above),
            SentLineMarker::new(3, SentInCodeBlock::Range),
            SentLineMarker::new(99, SentInCodeBlock::Below),
        ];
        let d = LineDocument::new("a\nb\nc\nd", "rust", IndentStyle::Tabs(4), &markers, ());

        assert_eq!(d.first_sent_line_index(), 2);
        assert_eq!(d.line(0).sent(), SentInCodeBlock::None);
        assert_eq!(d.line(2).sent(), SentInCodeBlock::Above);
        assert_eq!(d.line(3).sent(), SentInCodeBlock::Range);
    }
}
