use crate::editing::LineDocument;
use crate::indent::{IndentStyle, reindent_line};
use crate::text::LineOfText;

/// A reply line together with its reindented form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyLine {
    pub original: String,
    /// Level under the reply's own guessed indent unit
    pub original_indent_level: usize,
    /// Content rewritten in the document's indent style
    pub adjusted: String,
    pub adjusted_indent_level: usize,
}

impl ReplyLine {
    pub fn trimmed(&self) -> &str {
        self.adjusted.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.trimmed().is_empty()
    }
}

/// Maps reply indentation onto the document around one anchor
///
/// The offset between the reply and the document is fixed when the reconciler
/// is built. The reply's indent unit may stay unknown until a line with more
/// than one leading space arrives.
#[derive(Debug, Clone)]
pub struct IndentationReconciler {
    reply_style: Option<IndentStyle>,
    target_style: IndentStyle,
    indent_delta: isize,
}

impl IndentationReconciler {
    pub fn new<K>(doc: &LineDocument<K>, line_index: usize, first_reply_line: &LineOfText) -> Self {
        let baseline = baseline_level(doc, line_index);
        let reply_style = IndentStyle::guess_from_line(first_reply_line.as_str());
        let reply_level = reply_style
            .unwrap_or_default()
            .calculate_depth(first_reply_line.as_str());
        let indent_delta = reply_level as isize - baseline as isize;

        log::debug!(
            "reconciler at line {line_index}: baseline {baseline}, reply level {reply_level}, delta {indent_delta}"
        );

        Self {
            reply_style,
            target_style: doc.indent_style(),
            indent_delta,
        }
    }

    pub fn indent_delta(&self) -> isize {
        self.indent_delta
    }

    pub fn reply_style(&self) -> Option<IndentStyle> {
        self.reply_style
    }

    pub fn reindent(&mut self, line: &LineOfText) -> ReplyLine {
        let content = line.as_str();
        if content.trim().is_empty() {
            return ReplyLine {
                original: content.to_string(),
                original_indent_level: 0,
                adjusted: content.to_string(),
                adjusted_indent_level: 0,
            };
        }

        if self.reply_style.is_none() {
            self.reply_style = IndentStyle::guess_from_line(content);
        }
        let from = self.reply_style.unwrap_or_default();
        let level = from.calculate_depth(content);
        let target = (level as isize - self.indent_delta).max(0) as usize;
        let adjusted = reindent_line(content, from, target, self.target_style);
        let adjusted_indent_level = self.target_style.calculate_depth(&adjusted);

        ReplyLine {
            original: content.to_string(),
            original_indent_level: level,
            adjusted,
            adjusted_indent_level,
        }
    }
}

/// Indent level expected at `line_index`, from the nearest non-blank line above
fn baseline_level<K>(doc: &LineDocument<K>, line_index: usize) -> usize {
    let start = line_index.min(doc.line_count().saturating_sub(1));
    let Some(nearest) = (0..=start).rev().find(|&i| !doc.line(i).is_blank()) else {
        return 0;
    };

    let line = doc.line(nearest);
    let opens_block = match line.trimmed().chars().last() {
        Some('{') => true,
        Some(':') => doc.language_id() == "python",
        _ => false,
    };
    if nearest != line_index && opens_block {
        line.indent_level() + 1
    } else {
        line.indent_level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn doc(text: &str, language: &str, style: IndentStyle) -> LineDocument {
        LineDocument::new(text, language, style, &[], Vec::new())
    }

    #[test]
    fn test_four_space_reply_into_tab_document() {
        let d = doc("function f() {\n\treturn 1;\n}", "javascript", IndentStyle::Tabs(4));
        let mut reconciler = IndentationReconciler::new(&d, 0, &"function f() {".into());

        let line = reconciler.reindent(&"    return x;".into());
        assert_eq!(line.adjusted, "\treturn x;");
        assert_eq!(line.original_indent_level, 1);
        assert_eq!(line.adjusted_indent_level, 1);
    }

    #[test]
    fn test_unindented_reply_is_nested_under_open_brace() {
        let d = doc("class A {\n\n}", "typescript", IndentStyle::Spaces(2));
        let mut reconciler = IndentationReconciler::new(&d, 1, &"foo() {".into());
        assert_eq!(reconciler.indent_delta(), -1);

        assert_eq!(reconciler.reindent(&"foo() {".into()).adjusted, "  foo() {");
        assert_eq!(reconciler.reindent(&"    bar();".into()).adjusted, "    bar();");
        assert_eq!(reconciler.reindent(&"}".into()).adjusted, "  }");
    }

    #[rstest]
    #[case("python", "def f():\n\n", 1)]
    #[case("ruby", "def f():\n\n", 0)]
    #[case("python", "x = 1\n    y = 2\n\n", 1)]
    fn test_baseline(#[case] language: &str, #[case] text: &str, #[case] expected: usize) {
        let d = doc(text, language, IndentStyle::Spaces(4));
        assert_eq!(baseline_level(&d, 2), expected);
    }

    #[test]
    fn test_reference_line_itself_gets_no_bump() {
        let d = doc("if (x) {\n  y();\n}", "c", IndentStyle::Spaces(2));
        assert_eq!(baseline_level(&d, 0), 0);
        assert_eq!(baseline_level(&d, 1), 1);
    }

    #[test]
    fn test_style_guess_is_deferred_past_unindented_lines() {
        let d = doc("x", "rust", IndentStyle::Spaces(4));
        let mut reconciler = IndentationReconciler::new(&d, 0, &"fn f() {".into());
        assert_eq!(reconciler.reply_style(), None);

        reconciler.reindent(&"fn f() {".into());
        assert_eq!(reconciler.reply_style(), None);

        let line = reconciler.reindent(&"  body();".into());
        assert_eq!(reconciler.reply_style(), Some(IndentStyle::Spaces(2)));
        assert_eq!(line.adjusted, "    body();");
    }

    #[test]
    fn test_blank_lines_stay_unchanged() {
        let d = doc("  a", "rust", IndentStyle::Spaces(2));
        let mut reconciler = IndentationReconciler::new(&d, 0, &"a".into());
        let line = reconciler.reindent(&"   ".into());
        assert_eq!(line.adjusted, "   ");
        assert_eq!(line.adjusted_indent_level, 0);
    }

    #[test]
    fn test_levels_never_go_negative() {
        let d = doc("a", "rust", IndentStyle::Spaces(4));
        let mut reconciler = IndentationReconciler::new(&d, 0, &"    a".into());
        assert_eq!(reconciler.reindent(&"    a".into()).adjusted, "a");
        assert_eq!(reconciler.reindent(&"b".into()).adjusted, "b");
    }
}
