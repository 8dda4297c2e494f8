use std::ops::RangeInclusive;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::editing::{EditSink, LineDocument, SentLineMarker, split_lines};
use crate::error::SessionError;
use crate::imports::{ImportCollector, has_imports_in_range};
use crate::indent::IndentStyle;
use crate::strategy::{
    CancellationToken, EditStrategy, InsertOrReplace, Insertion, LineIntake, ReplaceSelection,
    StrategyMode, StreamingEdits, StreamingEditsResult, TextPosition, TextRange,
};
use crate::text::{LineFilter, code_block_text, line_filters, stream_lines};

/// Lines above and below the target range treated as shown to the generator
pub const DEFAULT_CONTEXT_LINES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    pub mode: StrategyMode,
    pub strategy: EditStrategy,
    /// Pull import statements out of the reply unless the range has its own
    pub hoist_imports: bool,
    /// Only apply reply text found inside fenced code blocks
    pub code_blocks_only: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: StrategyMode::default(),
            strategy: EditStrategy::default(),
            hoist_imports: true,
            code_blocks_only: false,
        }
    }
}

enum SentContext {
    Around(usize),
    Markers(Vec<SentLineMarker>),
}

/// One streaming edit session against one document
///
/// Built from the original text and the caller's selection, then consumed by
/// [`EditSession::run`] with the reply's chunk stream and an edit sink.
///
/// ```rust
/// # use codeweave_engine::{EditSession, SessionOptions, CancellationToken, LineEdit};
/// # use codeweave_engine::strategy::TextRange;
/// let session = EditSession::new(
///     "fn main() {\n    old();\n}",
///     "rust",
///     TextRange::lines(1, 1),
///     SessionOptions::default(),
/// )
/// .unwrap();
/// let chunks = futures::stream::iter(["    new", "();"]);
/// let (result, edits) = futures::executor::block_on(
///     session.run(chunks, Vec::<LineEdit>::new(), &CancellationToken::new()),
/// );
/// assert!(result.did_edits);
/// assert_eq!(edits[0].replacement_text(), "    new();");
/// ```
pub struct EditSession {
    text: String,
    language_id: String,
    selection: TextRange,
    range: RangeInclusive<usize>,
    indent_style: Option<IndentStyle>,
    sent: SentContext,
    line_filter: Option<LineFilter>,
    options: SessionOptions,
}

impl EditSession {
    pub fn new(
        text: impl Into<String>,
        language_id: impl Into<String>,
        selection: TextRange,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let text = text.into();
        let selection = clamp_selection(&text, selection)?;
        let range = selection.start.line..=selection.end_line();

        Ok(Self {
            text,
            language_id: language_id.into(),
            selection,
            range,
            indent_style: None,
            sent: SentContext::Around(DEFAULT_CONTEXT_LINES),
            line_filter: None,
            options,
        })
    }

    /// Use this indent style instead of guessing it from the document
    pub fn with_indent_style(mut self, style: IndentStyle) -> Self {
        self.indent_style = Some(style);
        self
    }

    /// Mark `lines` above and below the target range as sent context
    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.sent = SentContext::Around(lines);
        self
    }

    /// Mark exactly these lines as sent
    pub fn with_sent_lines(mut self, markers: Vec<SentLineMarker>) -> Result<Self, SessionError> {
        let line_count = self.line_count();
        if let Some(marker) = markers.iter().find(|m| m.line_index >= line_count) {
            return Err(SessionError::SentLineOutOfBounds {
                line_index: marker.line_index,
                line_count,
            });
        }
        self.sent = SentContext::Markers(markers);
        Ok(self)
    }

    /// Target these whole lines rather than the selection's own lines
    pub fn with_adjusted_range(mut self, range: RangeInclusive<usize>) -> Result<Self, SessionError> {
        let line_count = self.line_count();
        let (start, end) = (*range.start(), *range.end());
        if end >= line_count {
            return Err(SessionError::SelectionOutOfBounds {
                line: end,
                line_count,
            });
        }
        if start > end {
            return Err(SessionError::InvertedSelection {
                start: TextPosition::new(start, 0),
                end: TextPosition::new(end, 0),
            });
        }
        self.range = range;
        Ok(self)
    }

    /// Filter reply lines before the strategy sees them
    pub fn with_line_filter(mut self, filter: LineFilter) -> Self {
        self.line_filter = Some(filter);
        self
    }

    pub fn selection(&self) -> TextRange {
        self.selection
    }

    pub fn range(&self) -> RangeInclusive<usize> {
        self.range.clone()
    }

    pub fn line_count(&self) -> usize {
        split_lines(&self.text).count()
    }

    /// Stream `chunks` into the document, sending edits to `sink`
    ///
    /// Returns the run's result and the sink. A cancelled run returns what it
    /// had done so far.
    pub async fn run<S, T, K>(
        self,
        chunks: S,
        sink: K,
        cancel: &CancellationToken,
    ) -> (StreamingEditsResult, K)
    where
        S: Stream<Item = T> + Unpin,
        T: AsRef<str>,
        K: EditSink,
    {
        let style = self
            .indent_style
            .unwrap_or_else(|| IndentStyle::detect(&self.text));
        let line_count = self.line_count();
        let markers = match self.sent {
            SentContext::Around(context) => {
                SentLineMarker::around_range(line_count, self.range.clone(), context)
            }
            SentContext::Markers(markers) => markers,
        };
        let mut doc = LineDocument::new(&self.text, &self.language_id, style, &markers, sink);

        let imports = (self.options.hoist_imports && !has_imports_in_range(&doc, self.range.clone()))
            .then(|| ImportCollector::new(&self.language_id));
        let filter = self.line_filter.unwrap_or_else(line_filters::all);
        let intake = LineIntake::new(filter, imports);

        let strategy = match self.options.mode {
            StrategyMode::InsertOrReplace => StreamingEdits::InsertOrReplace(InsertOrReplace::new(
                self.selection,
                self.range,
                self.options.strategy,
            )),
            StrategyMode::Insertion => StreamingEdits::Insertion(Insertion::new(self.selection.end)),
            StrategyMode::ReplaceSelection => {
                StreamingEdits::ReplaceSelection(ReplaceSelection::new(self.selection))
            }
        };
        log::debug!(
            "session: {} in {} ({} lines, {:?}), target lines {}..={}",
            self.options.mode,
            self.language_id,
            doc.line_count(),
            style,
            self.selection.start.line,
            self.selection.end_line()
        );

        let lines = if self.options.code_blocks_only {
            stream_lines(code_block_text(chunks).boxed_local()).boxed_local()
        } else {
            stream_lines(chunks).boxed_local()
        };
        let result = strategy.process_stream(&mut doc, lines, intake, cancel).await;
        (result, doc.into_sink())
    }
}

/// Check line numbers against the text and clamp characters to line length
fn clamp_selection(text: &str, selection: TextRange) -> Result<TextRange, SessionError> {
    let lines: Vec<&str> = split_lines(text).collect();
    let clamp = |position: TextPosition| match lines.get(position.line) {
        Some(line) => Ok(TextPosition::new(
            position.line,
            position.character.min(line.chars().count()),
        )),
        None => Err(SessionError::SelectionOutOfBounds {
            line: position.line,
            line_count: lines.len(),
        }),
    };

    let start = clamp(selection.start)?;
    let end = clamp(selection.end)?;
    if end < start {
        return Err(SessionError::InvertedSelection { start, end });
    }
    Ok(TextRange::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{LineEdit, SentInCodeBlock};
    use futures::executor::block_on;
    use futures::stream;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n";

    fn session(selection: TextRange) -> EditSession {
        EditSession::new(SOURCE, "rust", selection, SessionOptions::default())
            .expect("valid selection")
    }

    #[test]
    fn test_selection_is_validated() {
        let result = EditSession::new(SOURCE, "rust", TextRange::lines(2, 9), SessionOptions::default());
        assert_eq!(
            result.err(),
            Some(SessionError::SelectionOutOfBounds {
                line: 9,
                line_count: 4
            })
        );

        let inverted = TextRange::new(TextPosition::new(2, 0), TextPosition::new(1, 3));
        let result = EditSession::new(SOURCE, "rust", inverted, SessionOptions::default());
        assert!(matches!(result, Err(SessionError::InvertedSelection { .. })));
    }

    #[test]
    fn test_characters_are_clamped_to_line_length() {
        let s = session(TextRange::lines(1, 1));
        assert_eq!(s.selection().end, TextPosition::new(1, 9));
        assert_eq!(s.range(), 1..=1);
    }

    #[test]
    fn test_selection_ending_at_column_zero_excludes_that_line() {
        let s = session(TextRange::new(TextPosition::new(0, 0), TextPosition::new(2, 0)));
        assert_eq!(s.range(), 0..=1);
    }

    #[test]
    fn test_sent_markers_are_validated() {
        let result = session(TextRange::lines(1, 1))
            .with_sent_lines(vec![SentLineMarker::new(4, SentInCodeBlock::Range)]);
        assert_eq!(
            result.err(),
            Some(SessionError::SentLineOutOfBounds {
                line_index: 4,
                line_count: 4
            })
        );
    }

    #[test]
    fn test_adjusted_range_is_validated() {
        assert!(session(TextRange::lines(1, 1)).with_adjusted_range(0..=2).is_ok());
        assert!(session(TextRange::lines(1, 1)).with_adjusted_range(0..=4).is_err());
    }

    #[test]
    fn test_code_blocks_only_ignores_prose() {
        let options = SessionOptions {
            code_blocks_only: true,
            ..SessionOptions::default()
        };
        let session = EditSession::new(SOURCE, "rust", TextRange::lines(1, 1), options)
            .expect("valid selection");
        let chunks = stream::iter(["Sure, here it is:\n```rust\n", "    a.wrapping_add(b)\n```\n", "Done."]);

        let (result, edits) = block_on(session.run(chunks, Vec::<LineEdit>::new(), &CancellationToken::new()));

        assert!(result.did_edits);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].replacement_text(), "    a.wrapping_add(b)");
    }
}
