use serde::{Deserialize, Serialize};

use crate::indent::IndentStyle;

/// How an original line was shown to the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SentInCodeBlock {
    /// Not shown at all
    #[default]
    None,
    /// Context above the edit target
    Above,
    /// The edit target itself
    Range,
    /// Context below the edit target
    Below,
    /// Shown somewhere else in the prompt
    Other,
}

impl SentInCodeBlock {
    pub fn was_sent(self) -> bool {
        self != SentInCodeBlock::None
    }
}

/// Marks one original line as sent, with its relation to the edit target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentLineMarker {
    pub line_index: usize,
    pub tag: SentInCodeBlock,
}

impl SentLineMarker {
    pub fn new(line_index: usize, tag: SentInCodeBlock) -> Self {
        Self { line_index, tag }
    }

    /// Markers for a target range with `context` lines of context either side
    ///
    /// `range` is inclusive and must lie within `line_count`.
    pub fn around_range(
        line_count: usize,
        range: std::ops::RangeInclusive<usize>,
        context: usize,
    ) -> Vec<SentLineMarker> {
        let (start, end) = (*range.start(), *range.end());
        let above = start.saturating_sub(context)..start;
        let below = (end + 1)..(end + 1 + context).min(line_count);

        above
            .map(|i| SentLineMarker::new(i, SentInCodeBlock::Above))
            .chain((start..=end).map(|i| SentLineMarker::new(i, SentInCodeBlock::Range)))
            .chain(below.map(|i| SentLineMarker::new(i, SentInCodeBlock::Below)))
            .collect()
    }
}

/// Immutable snapshot of one document line and its derived properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLine {
    content: String,
    normalized: String,
    indent_level: usize,
    sent: SentInCodeBlock,
}

impl DocumentLine {
    pub fn new(content: impl Into<String>, style: IndentStyle, sent: SentInCodeBlock) -> Self {
        let content = content.into();
        let normalized = style.normalize(&content);
        let indent_level = style.calculate_depth(&content);
        Self {
            content,
            normalized,
            indent_level,
            sent,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn trimmed(&self) -> &str {
        self.content.trim()
    }

    /// Content with leading whitespace rewritten in the document's indent style
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    pub fn sent(&self) -> SentInCodeBlock {
        self.sent
    }

    pub fn is_blank(&self) -> bool {
        self.trimmed().is_empty()
    }
}
