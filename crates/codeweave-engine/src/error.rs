use crate::strategy::TextPosition;

/// Caller input rejected before a session starts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Selection line {line} is outside the document ({line_count} lines)")]
    SelectionOutOfBounds { line: usize, line_count: usize },
    #[error("Selection ends at {end}, before it starts at {start}")]
    InvertedSelection {
        start: TextPosition,
        end: TextPosition,
    },
    #[error("Sent line marker {line_index} is outside the document ({line_count} lines)")]
    SentLineOutOfBounds { line_index: usize, line_count: usize },
}
