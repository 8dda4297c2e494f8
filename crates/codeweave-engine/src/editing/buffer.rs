use xi_rope::delta::Builder;
use xi_rope::{LinesMetric, Rope};

use crate::editing::{EditSink, LineEdit};

/// Text buffer that applies streamed [`LineEdit`]s in arrival order
///
/// Holds the destination text in an xi-rope `Rope`; each edit compiles to a
/// `Delta` over the current text. The line ending of the original text is
/// kept for inserted lines.
pub struct RopeBuffer {
    buffer: Rope,
    eol: &'static str,
    version: u64,
}

impl RopeBuffer {
    pub fn new(text: &str) -> Self {
        let eol = if text.contains("\r\n") { "\r\n" } else { "\n" };
        Self {
            buffer: Rope::from(text),
            eol,
            version: 0,
        }
    }

    pub fn line_count(&self) -> usize {
        self.buffer.measure::<LinesMetric>() + 1
    }

    /// Number of edits applied so far
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text()
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect()
    }

    /// Byte span and replacement text for a line edit against the current text
    fn compile(&self, edit: &LineEdit) -> (std::ops::Range<usize>, String) {
        let line_count = self.line_count();
        let len = self.buffer.len();
        let eol = self.eol;
        let start = edit.range.start.min(line_count);
        let end = edit.range.end_exclusive.min(line_count).max(start);

        if end < line_count {
            // Every replaced line keeps its terminator
            let from = self.buffer.offset_of_line(start);
            let to = self.buffer.offset_of_line(end);
            let text = edit
                .new_lines
                .iter()
                .map(|line| format!("{line}{eol}"))
                .collect();
            return (from..to, text);
        }

        if start == end {
            // Insert past the last line
            let text = edit
                .new_lines
                .iter()
                .map(|line| format!("{eol}{line}"))
                .collect();
            return (len..len, text);
        }

        // The span runs through the last line, which has no terminator
        if edit.new_lines.is_empty() {
            let from = match start {
                0 => 0,
                _ => self.buffer.offset_of_line(start) - eol.len(),
            };
            return (from..len, String::new());
        }
        (
            self.buffer.offset_of_line(start)..len,
            edit.new_lines.join(eol),
        )
    }
}

impl EditSink for RopeBuffer {
    fn apply_edit(&mut self, edit: LineEdit) {
        let (range, text) = self.compile(&edit);
        let mut builder = Builder::new(self.buffer.len());
        builder.replace(range, Rope::from(text));
        let delta = builder.build();
        self.buffer = delta.apply(&self.buffer);
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::LineRange;
    use pretty_assertions::assert_eq;

    fn apply(text: &str, edits: Vec<LineEdit>) -> String {
        let mut buffer = RopeBuffer::new(text);
        for edit in edits {
            buffer.apply_edit(edit);
        }
        buffer.text()
    }

    #[test]
    fn test_replace_middle_line() {
        let out = apply("a\nb\nc", vec![LineEdit::replace(LineRange::new(1, 2), "B")]);
        assert_eq!(out, "a\nB\nc");
    }

    #[test]
    fn test_replace_last_line() {
        let out = apply("a\nb", vec![LineEdit::replace(LineRange::new(1, 2), "B")]);
        assert_eq!(out, "a\nB");
    }

    #[test]
    fn test_insert_before_and_append() {
        let out = apply(
            "a\nb",
            vec![LineEdit::insert(0, "top"), LineEdit::insert(3, "end")],
        );
        assert_eq!(out, "top\na\nb\nend");
    }

    #[test]
    fn test_delete_tail_removes_preceding_newline() {
        let out = apply("a\nb\nc", vec![LineEdit::delete(LineRange::new(1, 3))]);
        assert_eq!(out, "a");
    }

    #[test]
    fn test_delete_everything() {
        let out = apply("a\nb", vec![LineEdit::delete(LineRange::new(0, 2))]);
        assert_eq!(out, "");
    }

    #[test]
    fn test_crlf_is_preserved() {
        let out = apply(
            "a\r\nb\r\n",
            vec![
                LineEdit::replace(LineRange::new(0, 2), "ab"),
                LineEdit::insert(1, "x"),
            ],
        );
        assert_eq!(out, "ab\r\nx\r\n");
    }

    #[test]
    fn test_matches_in_memory_application() {
        let text = "one\ntwo\nthree\nfour";
        let edits = vec![
            LineEdit::insert(1, "1.5"),
            LineEdit::replace(LineRange::new(2, 4), "two-three"),
            LineEdit::delete(LineRange::new(0, 1)),
            LineEdit::insert(3, "five"),
        ];

        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        for edit in &edits {
            edit.apply_to_lines(&mut lines);
        }

        let mut buffer = RopeBuffer::new(text);
        for edit in edits {
            buffer.apply_edit(edit);
        }
        assert_eq!(buffer.lines(), lines);
        assert_eq!(buffer.version(), 4);
    }
}
