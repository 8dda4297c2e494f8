use std::mem;
use std::ops::RangeInclusive;
use std::pin::pin;

use futures::{Stream, StreamExt};

use crate::editing::{
    EditSink, LineDocument, Placement, SentInCodeBlock, TrackedLine, find_initial_anchor,
    has_enough_anchor_context, match_reply_line, place_unmatched,
};
use crate::indent::IndentationReconciler;
use crate::strategy::{
    CancellationToken, EditStrategy, LineIntake, StreamingEditsResult, TextRange, continues_line,
};
use crate::text::LineOfText;

/// Edits a target range, re-synchronising with the sent lines as the reply
/// streams in
///
/// Leading reply lines are buffered until there is enough text to look for
/// the first anchor. Lines after that are matched forward from the cursor.
/// When the stream ends after a destructive edit, whatever is left of the
/// target range is deleted.
#[derive(Debug, Clone)]
pub struct InsertOrReplace {
    selection: TextRange,
    range: RangeInclusive<usize>,
    strategy: EditStrategy,
}

struct Anchored {
    reconciler: IndentationReconciler,
    cursor: usize,
}

impl InsertOrReplace {
    /// `range` is the adjusted target, inclusive, in whole lines
    pub fn new(selection: TextRange, range: RangeInclusive<usize>, strategy: EditStrategy) -> Self {
        Self {
            selection,
            range,
            strategy,
        }
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
        let range_start = doc.track_line(*self.range.start());
        let range_end = doc.track_line(*self.range.end());
        let mut pending: Vec<LineOfText> = Vec::new();
        let mut anchored: Option<Anchored> = None;

        while let Some(line) = lines.next().await {
            if cancel.is_cancelled() {
                log::debug!("cancelled with {} reply lines still buffered", pending.len());
                return StreamingEditsResult::collect(doc, intake);
            }
            let Some(line) = intake.admit(line) else {
                continue;
            };

            match anchored.as_mut() {
                Some(state) => {
                    state.cursor = apply_reply_line(doc, &mut state.reconciler, state.cursor, &line);
                }
                None => {
                    pending.push(line);
                    if has_enough_anchor_context(&pending) {
                        anchored = self.anchor(doc, mem::take(&mut pending));
                    }
                }
            }
        }

        // Short replies never reach the anchor threshold
        if anchored.is_none() {
            anchored = self.anchor(doc, pending);
        }
        if let Some(state) = anchored {
            delete_untouched(doc, state.cursor, range_start, range_end);
        }
        StreamingEditsResult::collect(doc, intake)
    }

    /// Write the buffered leading lines, at the anchor or by the fallback
    fn anchor<K: EditSink>(
        &self,
        doc: &mut LineDocument<K>,
        pending: Vec<LineOfText>,
    ) -> Option<Anchored> {
        // An all-blank reply has nothing to anchor or write
        let first = pending
            .iter()
            .find(|line| !line.as_str().trim().is_empty())?
            .clone();
        let (start, end) = (*self.range.start(), *self.range.end());

        if self.strategy != EditStrategy::ForceInsertion
            && let Some(found) = find_initial_anchor(doc, &pending)
        {
            let mut reconciler = IndentationReconciler::new(doc, found.line_index, &first);
            let mut rest = pending
                .into_iter()
                .skip_while(|line| line.as_str().trim().is_empty());
            let head = reconciler.reindent(&rest.next()?);

            let mut cursor = if found.sent(doc) == SentInCodeBlock::Range && found.line_index >= start {
                log::debug!(
                    "anchored on selected line {}, collapsing from line {start}",
                    found.line_index
                );
                doc.replace_lines(start, found.line_index, &head.adjusted)
            } else {
                log::debug!("anchored on context line {}", found.line_index);
                doc.replace_lines(found.line_index, found.line_index, &head.adjusted)
            };
            for line in rest {
                cursor = apply_reply_line(doc, &mut reconciler, cursor, &line);
            }
            return Some(Anchored { reconciler, cursor });
        }

        let caret_line = self.selection.start.line;
        let continues_caret =
            self.selection.is_empty() && continues_line(doc.line(caret_line), first.as_str());
        let reference = match self.strategy {
            _ if continues_caret => caret_line,
            EditStrategy::FallbackToInsertBelowRange => end + 1,
            _ => start,
        };
        let mut reconciler = IndentationReconciler::new(doc, reference, &first);
        let mut rest = pending
            .into_iter()
            .skip_while(|line| line.as_str().trim().is_empty());
        let head = reconciler.reindent(&rest.next()?);

        let mut cursor = if continues_caret {
            log::debug!("no anchor, continuing the line at the caret");
            doc.replace_line(caret_line, &head.adjusted, true)
        } else {
            log::debug!("no anchor, falling back to {}", self.strategy);
            match self.strategy {
                EditStrategy::FallbackToInsertAboveRange | EditStrategy::ForceInsertion => {
                    doc.insert_line_before(start, &head.adjusted)
                }
                EditStrategy::FallbackToInsertBelowRange => {
                    doc.insert_line_before(end + 1, &head.adjusted)
                }
                EditStrategy::FallbackToReplaceRange => doc.replace_lines(start, start, &head.adjusted),
            }
        };
        for line in rest {
            cursor = apply_reply_line(doc, &mut reconciler, cursor, &line);
        }
        Some(Anchored { reconciler, cursor })
    }
}

/// Write one reply line after the initial anchor and return the next cursor
fn apply_reply_line<K: EditSink>(
    doc: &mut LineDocument<K>,
    reconciler: &mut IndentationReconciler,
    cursor: usize,
    line: &LineOfText,
) -> usize {
    let reply = reconciler.reindent(line);
    if let Some(found) = match_reply_line(doc, &reply, cursor) {
        return doc.replace_lines(cursor, found.line_index, &reply.adjusted);
    }
    match place_unmatched(doc, &reply, cursor) {
        Placement::Append => doc.append_line_at_end_of_document(&reply.adjusted),
        Placement::InsertBefore => doc.insert_line_before(cursor, &reply.adjusted),
        Placement::Replace => doc.replace_line(cursor, &reply.adjusted, false),
    }
}

/// Remove the part of the target range the reply never reached
fn delete_untouched<K: EditSink>(
    doc: &mut LineDocument<K>,
    cursor: usize,
    range_start: TrackedLine,
    range_end: TrackedLine,
) {
    if !doc.did_replace_edits() {
        return;
    }
    let Some(end) = doc.tracked_line(range_end) else {
        return;
    };
    let from = doc
        .tracked_line(range_start)
        .map_or(cursor, |start| cursor.max(start));
    if from <= end && end < doc.line_count() {
        log::debug!("deleting untouched lines {from}..={end}");
        doc.delete_lines(from, end);
    }
}
