pub mod editing;
pub mod error;
pub mod imports;
pub mod indent;
pub mod session;
pub mod strategy;
pub mod text;

// Re-export key types for easier usage
pub use editing::{
    DocumentLine, EditSink, LineDocument, LineEdit, LineRange, RopeBuffer, SentInCodeBlock,
    SentLineMarker,
};
pub use error::SessionError;
pub use indent::{IndentStyle, IndentationReconciler, ReplyLine};
pub use session::{DEFAULT_CONTEXT_LINES, EditSession, SessionOptions};
pub use strategy::{
    CancellationToken, EditStrategy, StrategyMode, StreamingEdits, StreamingEditsResult,
    TextPosition, TextRange,
};
pub use text::{LineOfText, stream_lines};
