//! Turning raw reply text into lines, and telling code apart from prose.

pub mod code_guess;
pub mod fence;
pub mod lines;

pub use code_guess::looks_like_code;
pub use fence::{
    ClassifiedTextPiece, CodeFence, FenceTracker, FencedBlockClassifier, LineFilter,
    TextPieceKind, classify_fenced_blocks, code_block_text, line_filters,
};
pub use lines::{LineOfText, LineSplitter, stream_lines};
