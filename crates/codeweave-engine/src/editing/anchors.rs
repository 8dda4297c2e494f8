//! Locating where the reply stream currently sits in the document.
//!
//! The initial anchor is found once, from a buffer of leading reply lines.
//! After that, every reply line is matched forward from the running cursor,
//! and lines that match nothing are placed by [`place_unmatched`].

use crate::editing::{LineDocument, SentInCodeBlock};
use crate::indent::ReplyLine;
use crate::text::LineOfText;

/// Non-whitespace characters to buffer before searching for the first anchor
pub const MIN_ANCHOR_CHARS: usize = 10;

/// Reply lines with at most this many trimmed characters only match at the cursor
pub const VERY_SHORT_LINE_CHARS: usize = 3;

/// A document line found to correspond to a reply line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedDocumentLine {
    pub line_index: usize,
}

impl MatchedDocumentLine {
    pub fn new(line_index: usize) -> Self {
        Self { line_index }
    }

    pub fn sent<K>(&self, doc: &LineDocument<K>) -> SentInCodeBlock {
        doc.line(self.line_index).sent()
    }
}

/// Where a reply line with no match goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Append,
    InsertBefore,
    Replace,
}

pub fn has_enough_anchor_context(lines: &[LineOfText]) -> bool {
    lines.iter().map(LineOfText::significant_chars).sum::<usize>() >= MIN_ANCHOR_CHARS
}

/// Find the sent lines reproduced by the first reply lines
///
/// Leading blank reply lines are ignored. The remaining lines must equal a
/// contiguous run of sent lines, compared trimmed, starting at or after the
/// first sent line. The match points at the line for the first non-blank
/// reply line.
pub fn find_initial_anchor<K>(
    doc: &LineDocument<K>,
    lines: &[LineOfText],
) -> Option<MatchedDocumentLine> {
    let wanted: Vec<&str> = lines
        .iter()
        .map(|line| line.as_str().trim())
        .skip_while(|line| line.is_empty())
        .collect();
    if wanted.is_empty() || wanted.len() > doc.line_count() {
        return None;
    }

    let last_start = doc.line_count() - wanted.len();
    (doc.first_sent_line_index()..=last_start)
        .find(|&start| {
            wanted.iter().enumerate().all(|(offset, text)| {
                let line = doc.line(start + offset);
                line.sent().was_sent() && line.trimmed() == *text
            })
        })
        .map(MatchedDocumentLine::new)
}

/// Find the sent line at or after `from` that `reply` reproduces
///
/// The scan gives up at the first line with content that is indented less
/// than the reply line, since the reply cannot reach outside its scope. A very
/// short reply line (a closing brace, say) gives up at the first line with
/// content of any kind. Unsent lines never match but still stop the scan.
pub fn match_reply_line<K>(
    doc: &LineDocument<K>,
    reply: &ReplyLine,
    from: usize,
) -> Option<MatchedDocumentLine> {
    let very_short = reply.trimmed().chars().count() <= VERY_SHORT_LINE_CHARS;

    for index in from..doc.line_count() {
        let line = doc.line(index);
        if line.sent().was_sent() && line.normalized() == reply.adjusted {
            return Some(MatchedDocumentLine::new(index));
        }
        if line.is_blank() {
            continue;
        }
        if line.indent_level() < reply.adjusted_indent_level || very_short {
            return None;
        }
    }
    None
}

/// Decide where an unmatched reply line goes relative to `cursor`
pub fn place_unmatched<K>(doc: &LineDocument<K>, reply: &ReplyLine, cursor: usize) -> Placement {
    if cursor >= doc.line_count() {
        return Placement::Append;
    }

    let line = doc.line(cursor);
    if !line.sent().was_sent() || line.is_blank() || reply.is_blank() {
        return Placement::InsertBefore;
    }
    if line.indent_level() < reply.adjusted_indent_level {
        return Placement::InsertBefore;
    }
    if line.indent_level() == reply.adjusted_indent_level && !doc.did_replace_edits() {
        return Placement::InsertBefore;
    }
    Placement::Replace
}
