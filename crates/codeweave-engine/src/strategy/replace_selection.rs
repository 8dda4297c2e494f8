use std::pin::pin;

use futures::{Stream, StreamExt};

use crate::editing::{EditSink, LineDocument};
use crate::indent::IndentationReconciler;
use crate::strategy::{CancellationToken, LineIntake, StreamingEditsResult, TextRange};
use crate::text::LineOfText;

/// Replaces an explicit selection line by line as the reply arrives
///
/// Each selected line is a unit of replace budget. Once the budget is spent
/// the remaining reply lines are inserted. Text before the selection start is
/// kept on the first written line and text after the selection end is put
/// back on the last one when the stream completes.
#[derive(Debug, Clone)]
pub struct ReplaceSelection {
    selection: TextRange,
}

impl ReplaceSelection {
    pub fn new(selection: TextRange) -> Self {
        Self { selection }
    }

    pub async fn process_stream<K, S>(
        self,
        doc: &mut LineDocument<K>,
        lines: S,
        mut intake: LineIntake,
        cancel: &CancellationToken,
    ) -> StreamingEditsResult
    where
        K: EditSink,
        S: Stream<Item = LineOfText>,
    {
        let mut lines = pin!(lines);
        let start_line = self.selection.start.line;
        let end_line = self.selection.end_line();
        let (prefix, suffix) = self.surrounding_text(doc);

        let mut budget = end_line - start_line + 1;
        let mut cursor = start_line;
        let mut written = 0usize;
        // Whole-line selections are reindented; partial ones are written as is
        let mut reconciler: Option<IndentationReconciler> = None;

        while let Some(line) = lines.next().await {
            if cancel.is_cancelled() {
                log::debug!("selection replacement cancelled after {written} lines");
                return StreamingEditsResult::collect(doc, intake);
            }
            let Some(line) = intake.admit(line) else {
                continue;
            };

            let mut text = if prefix.is_empty() {
                let reconciler = reconciler
                    .get_or_insert_with(|| IndentationReconciler::new(doc, start_line, &line));
                reconciler.reindent(&line).adjusted
            } else {
                line.into_string()
            };
            if written == 0 {
                text.insert_str(0, &prefix);
            }

            cursor = if budget > 0 {
                budget -= 1;
                doc.replace_line(cursor, &text, false)
            } else {
                doc.insert_line_before(cursor, &text)
            };
            written += 1;
        }

        if written == 0 {
            doc.replace_lines(start_line, end_line, &format!("{prefix}{suffix}"));
            return StreamingEditsResult::collect(doc, intake);
        }
        if budget > 0 {
            log::debug!("reply ended with {budget} selected lines unused");
            doc.delete_lines(cursor, cursor + budget - 1);
        }
        if !suffix.is_empty() {
            let last = cursor - 1;
            let joined = format!("{}{suffix}", doc.line(last).content());
            doc.replace_line(last, &joined, false);
        }
        StreamingEditsResult::collect(doc, intake)
    }

    /// Text before the selection on its first line, and after it on its last
    fn surrounding_text<K>(&self, doc: &LineDocument<K>) -> (String, String) {
        let start = self.selection.start;
        let first = doc.line(start.line).content();
        let prefix = first[..char_offset(first, start.character)].to_string();

        let end = self.selection.end;
        let suffix = if end.line == self.selection.end_line() {
            let last = doc.line(end.line).content();
            last[char_offset(last, end.character)..].to_string()
        } else {
            String::new()
        };
        (prefix, suffix)
    }
}

/// Byte offset of character `character`, clamped to the end of `text`
fn char_offset(text: &str, character: usize) -> usize {
    text.char_indices()
        .nth(character)
        .map_or(text.len(), |(offset, _)| offset)
}
