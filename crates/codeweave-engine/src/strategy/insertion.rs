use std::pin::pin;

use futures::{Stream, StreamExt};

use crate::editing::{EditSink, LineDocument};
use crate::indent::IndentationReconciler;
use crate::strategy::{
    CancellationToken, LineIntake, StreamingEditsResult, TextPosition, continues_line,
};
use crate::text::LineOfText;

/// Writes the reply at a caret without reconciling against existing lines
#[derive(Debug, Clone)]
pub struct Insertion {
    caret: TextPosition,
}

impl Insertion {
    pub fn new(caret: TextPosition) -> Self {
        Self { caret }
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
        let caret_line = self.caret.line;
        let mut state: Option<(IndentationReconciler, usize)> = None;

        while let Some(line) = lines.next().await {
            if cancel.is_cancelled() {
                log::debug!("insertion cancelled");
                break;
            }
            let Some(line) = intake.admit(line) else {
                continue;
            };

            match state.as_mut() {
                Some((reconciler, cursor)) => {
                    let reply = reconciler.reindent(&line);
                    *cursor = doc.insert_line_before(*cursor, &reply.adjusted);
                }
                None => {
                    // The first line either finishes the caret line or goes below it
                    let continues = continues_line(doc.line(caret_line), line.as_str());
                    let reference = if continues { caret_line } else { caret_line + 1 };
                    let mut reconciler = IndentationReconciler::new(doc, reference, &line);
                    let reply = reconciler.reindent(&line);
                    let cursor = if continues {
                        doc.replace_line(caret_line, &reply.adjusted, true)
                    } else {
                        doc.insert_line_after(caret_line, &reply.adjusted)
                    };
                    state = Some((reconciler, cursor));
                }
            }
        }

        StreamingEditsResult::collect(doc, intake)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{LineEdit, LineRange};
    use crate::imports::ImportCollector;
    use crate::indent::IndentStyle;
    use crate::text::line_filters;
    use futures::executor::block_on;
    use futures::stream;
    use pretty_assertions::assert_eq;

    fn run(text: &str, caret: TextPosition, reply: &[&str], intake: LineIntake) -> (StreamingEditsResult, LineDocument) {
        let mut doc: LineDocument = LineDocument::new(text, "python", IndentStyle::Spaces(4), &[], Vec::new());
        let lines = stream::iter(reply.iter().map(|&l| LineOfText::from(l)).collect::<Vec<_>>());
        let result = block_on(Insertion::new(caret).process_stream(
            &mut doc,
            lines,
            intake,
            &CancellationToken::new(),
        ));
        (result, doc)
    }

    #[test]
    fn test_blank_caret_line_is_filled_then_lines_follow() {
        let (result, doc) = run(
            "def f():\n\nprint(f())",
            TextPosition::new(1, 0),
            &["x = 1", "return x"],
            LineIntake::pass_through(),
        );

        assert_eq!(
            doc.sink(),
            &vec![
                LineEdit::replace(LineRange::new(1, 2), "    x = 1"),
                LineEdit::insert(2, "    return x"),
            ]
        );
        assert!(result.did_edits);
        insta::assert_snapshot!(doc.text().replace('\n', "|"), @"def f():|    x = 1|    return x|print(f())");
    }

    #[test]
    fn test_prefix_continuation_replaces_caret_line() {
        let (_, doc) = run(
            "total = sum(",
            TextPosition::new(0, 12),
            &["total = sum(values)"],
            LineIntake::pass_through(),
        );

        assert_eq!(
            doc.sink(),
            &vec![LineEdit::replace(LineRange::new(0, 1), "total = sum(values)")]
        );
        assert!(!doc.did_replace_edits());
    }

    #[test]
    fn test_unrelated_reply_goes_below_caret_line() {
        let (_, doc) = run(
            "import os\nprint(1)",
            TextPosition::new(0, 9),
            &["import sys", "print(sys.argv)"],
            LineIntake::pass_through(),
        );

        assert_eq!(
            doc.sink(),
            &vec![LineEdit::insert(1, "import sys"), LineEdit::insert(2, "print(sys.argv)")]
        );
    }

    #[test]
    fn test_hoisted_imports_and_filter_apply_before_insertion() {
        let intake = LineIntake::new(
            line_filters::inside_code_block(),
            Some(ImportCollector::new("python")),
        );
        let (result, doc) = run(
            "",
            TextPosition::new(0, 0),
            &["Here you go:", "```python", "import json", "", "data = json.loads(s)", "```"],
            intake,
        );

        assert_eq!(result.additional_imports, vec!["import json".to_string()]);
        assert_eq!(doc.text(), "data = json.loads(s)");
    }

    #[test]
    fn test_cancel_stops_before_the_next_line() {
        let mut doc: LineDocument = LineDocument::new("a = 1\nb = 2", "python", IndentStyle::Spaces(4), &[], Vec::new());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let lines = stream::iter(["x = 3", "y = 4", "z = 5"]).map(move |line| {
            if line == "y = 4" {
                trigger.cancel();
            }
            LineOfText::from(line)
        });

        let result = block_on(Insertion::new(TextPosition::new(0, 5)).process_stream(
            &mut doc,
            lines,
            LineIntake::pass_through(),
            &cancel,
        ));

        assert_eq!(doc.sink(), &vec![LineEdit::insert(1, "x = 3")]);
        assert_eq!(doc.text(), "a = 1\nx = 3\nb = 2");
        assert!(result.did_edits);
    }
}
