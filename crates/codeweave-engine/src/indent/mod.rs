//! Indentation units, levels and reindentation.

pub mod reconciler;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use reconciler::{IndentationReconciler, ReplyLine};

/// Indentation style of a document or a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndentStyle {
    Spaces(usize), // Number of spaces per indent level
    Tabs(usize),   // Tab characters, with their display width
}

impl Default for IndentStyle {
    fn default() -> Self {
        IndentStyle::Spaces(Self::DEFAULT_TAB_SIZE)
    }
}

impl IndentStyle {
    pub const DEFAULT_TAB_SIZE: usize = 4;

    /// Build a style from editor formatting options
    pub fn from_options(tab_size: usize, insert_spaces: bool) -> Self {
        if insert_spaces {
            IndentStyle::Spaces(tab_size)
        } else {
            IndentStyle::Tabs(tab_size)
        }
    }

    /// Width in columns of one indent level
    pub fn tab_size(&self) -> usize {
        match self {
            IndentStyle::Spaces(n) | IndentStyle::Tabs(n) => (*n).max(1),
        }
    }

    pub fn insert_spaces(&self) -> bool {
        matches!(self, IndentStyle::Spaces(_))
    }

    /// The text of a single indent level
    pub fn unit(&self) -> String {
        match self {
            IndentStyle::Spaces(_) => " ".repeat(self.tab_size()),
            IndentStyle::Tabs(_) => "\t".to_string(),
        }
    }

    /// Convert a line's leading whitespace to its indent level
    pub fn calculate_depth(&self, line: &str) -> usize {
        compute_indent_level(line, self.tab_size())
    }

    /// Rewrite the leading whitespace of `line` in this style, keeping its width
    pub fn normalize(&self, line: &str) -> String {
        let whitespace = leading_whitespace(line);
        let columns = indent_columns(whitespace, self.tab_size());
        let indent = self.indent_for_columns(columns);
        format!("{indent}{}", &line[whitespace.len()..])
    }

    fn indent_for_columns(&self, columns: usize) -> String {
        if self.insert_spaces() {
            " ".repeat(columns)
        } else {
            let tab_size = self.tab_size();
            format!(
                "{}{}",
                "\t".repeat(columns / tab_size),
                " ".repeat(columns % tab_size)
            )
        }
    }

    /// Guess the style of a whole document
    ///
    /// Tabs win when more lines start with a tab than with spaces. Otherwise the
    /// most common increase in leading spaces between consecutive non-blank lines
    /// is the indent unit.
    pub fn detect(text: &str) -> IndentStyle {
        let mut tab_lines = 0usize;
        let mut space_lines = 0usize;
        let mut steps: HashMap<usize, usize> = HashMap::new();
        let mut previous = 0usize;

        for line in text.lines() {
            // Skip empty lines
            if line.trim().is_empty() {
                continue;
            }

            let whitespace = leading_whitespace(line);
            if whitespace.starts_with('\t') {
                tab_lines += 1;
                previous = 0;
                continue;
            }

            let spaces = whitespace.len();
            if spaces > 0 {
                space_lines += 1;
            }
            if spaces > previous {
                let step = spaces - previous;
                if (2..=8).contains(&step) {
                    *steps.entry(step).or_default() += 1;
                }
            }
            previous = spaces;
        }

        if tab_lines > space_lines {
            return IndentStyle::Tabs(Self::DEFAULT_TAB_SIZE);
        }

        steps
            .into_iter()
            .max_by(|(step_a, count_a), (step_b, count_b)| {
                count_a.cmp(count_b).then(step_b.cmp(step_a))
            })
            .map(|(step, _)| IndentStyle::Spaces(step))
            .unwrap_or_default()
    }

    /// Guess a style from one line's leading whitespace
    ///
    /// No indentation or a single space tells us nothing, so `None` is returned.
    pub fn guess_from_line(line: &str) -> Option<IndentStyle> {
        let whitespace = leading_whitespace(line);
        if whitespace.is_empty() || whitespace == " " {
            return None;
        }
        if whitespace.contains('\t') {
            return Some(IndentStyle::Tabs(Self::DEFAULT_TAB_SIZE));
        }
        Some(IndentStyle::Spaces(whitespace.len()))
    }
}

/// Leading run of spaces and tabs
pub fn leading_whitespace(line: &str) -> &str {
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

/// Visible width of a whitespace run, with tabs advancing to the next tab stop
pub fn indent_columns(whitespace: &str, tab_size: usize) -> usize {
    let tab_size = tab_size.max(1);
    whitespace.chars().fold(0, |column, c| match c {
        '\t' => column + tab_size - column % tab_size,
        _ => column + 1,
    })
}

pub fn compute_indent_level(line: &str, tab_size: usize) -> usize {
    indent_columns(leading_whitespace(line), tab_size) / tab_size.max(1)
}

/// Move `line` from `from`'s indentation to `target_level` levels of `to`
///
/// The line is de-indented one `from` unit at a time (a tab, or up to
/// `tab_size` spaces), then indented with `to`'s unit. Whitespace left over
/// from a partial unit keeps its width.
pub fn reindent_line(line: &str, from: IndentStyle, target_level: usize, to: IndentStyle) -> String {
    let original_level = from.calculate_depth(line);
    let mut rest = line;
    for _ in 0..original_level {
        if let Some(stripped) = rest.strip_prefix('\t') {
            rest = stripped;
            continue;
        }
        let spaces = rest
            .bytes()
            .take(from.tab_size())
            .take_while(|&b| b == b' ')
            .count();
        if spaces == 0 {
            break;
        }
        rest = &rest[spaces..];
    }

    // Leftover whitespace is measured in the source style before re-rendering
    let leftover = leading_whitespace(rest);
    let leftover_columns = indent_columns(leftover, from.tab_size());
    let columns = target_level * to.tab_size() + leftover_columns;
    format!(
        "{}{}",
        to.indent_for_columns(columns),
        &rest[leftover.len()..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_indent_style_calculate_depth_spaces() {
        let style = IndentStyle::Spaces(2);

        assert_eq!(style.calculate_depth(""), 0);
        assert_eq!(style.calculate_depth("  "), 1); // 2 spaces = 1 level
        assert_eq!(style.calculate_depth("    "), 2); // 4 spaces = 2 levels
        assert_eq!(style.calculate_depth("      x"), 3);

        let style4 = IndentStyle::Spaces(4);
        assert_eq!(style4.calculate_depth("   x"), 0); // partial level rounds down
        assert_eq!(style4.calculate_depth("        x"), 2);
    }

    #[test]
    fn test_indent_style_calculate_depth_tabs() {
        let style = IndentStyle::Tabs(4);

        assert_eq!(style.calculate_depth("x"), 0);
        assert_eq!(style.calculate_depth("\tx"), 1);
        assert_eq!(style.calculate_depth("\t\tx"), 2);
        assert_eq!(style.calculate_depth("    x"), 1); // spaces count by width
        assert_eq!(style.calculate_depth("  \tx"), 1); // tab advances to the stop
    }

    #[rstest]
    #[case(IndentStyle::Spaces(4), "\t\tx", "        x")]
    #[case(IndentStyle::Tabs(4), "      x", "\t  x")]
    #[case(IndentStyle::Tabs(2), "    x", "\t\tx")]
    #[case(IndentStyle::Spaces(2), "x  ", "x  ")]
    fn test_normalize(#[case] style: IndentStyle, #[case] line: &str, #[case] expected: &str) {
        assert_eq!(style.normalize(line), expected);
    }

    #[test]
    fn test_detect_indent_style_2_space() {
        let text = "function f() {\n  return 1;\n}";
        assert_eq!(IndentStyle::detect(text), IndentStyle::Spaces(2));
    }

    #[test]
    fn test_detect_indent_style_most_common_step_wins() {
        let text = "class A {\n    a() {\n        b();\n            c +\n    }\n    d() {}\n}\n";
        assert_eq!(IndentStyle::detect(text), IndentStyle::Spaces(4));
    }

    #[test]
    fn test_detect_indent_style_tabs() {
        let text = "fn main() {\n\tif x {\n\t\ty();\n\t}\n}\n";
        assert_eq!(IndentStyle::detect(text), IndentStyle::Tabs(4));
    }

    #[test]
    fn test_detect_indent_style_defaults_without_indentation() {
        assert_eq!(IndentStyle::detect("a\nb\n\nc"), IndentStyle::Spaces(4));
        assert_eq!(IndentStyle::detect(""), IndentStyle::Spaces(4));
    }

    #[rstest]
    #[case("foo", None)]
    #[case(" foo", None)]
    #[case("  foo", Some(IndentStyle::Spaces(2)))]
    #[case("    foo", Some(IndentStyle::Spaces(4)))]
    #[case("\tfoo", Some(IndentStyle::Tabs(4)))]
    fn test_guess_from_line(#[case] line: &str, #[case] expected: Option<IndentStyle>) {
        assert_eq!(IndentStyle::guess_from_line(line), expected);
    }

    #[rstest]
    #[case("    return x;", IndentStyle::Spaces(4), 1, IndentStyle::Tabs(4), "\treturn x;")]
    #[case("        y();", IndentStyle::Spaces(4), 1, IndentStyle::Spaces(2), "  y();")]
    #[case("\t\tz();", IndentStyle::Tabs(4), 3, IndentStyle::Spaces(2), "      z();")]
    #[case("a();", IndentStyle::Spaces(4), 2, IndentStyle::Spaces(4), "        a();")]
    #[case("      b();", IndentStyle::Spaces(4), 0, IndentStyle::Spaces(4), "  b();")]
    #[case("      c();", IndentStyle::Spaces(4), 1, IndentStyle::Tabs(4), "\t  c();")]
    fn test_reindent_line(
        #[case] line: &str,
        #[case] from: IndentStyle,
        #[case] target: usize,
        #[case] to: IndentStyle,
        #[case] expected: &str,
    ) {
        assert_eq!(reindent_line(line, from, target, to), expected);
    }

    #[test]
    fn test_indent_columns_tab_stops() {
        assert_eq!(indent_columns("\t", 4), 4);
        assert_eq!(indent_columns(" \t", 4), 4);
        assert_eq!(indent_columns("     \t", 4), 8);
        assert_eq!(indent_columns("  ", 0), 2);
    }
}
