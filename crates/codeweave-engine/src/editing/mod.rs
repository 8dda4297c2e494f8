/*!
 * # Editing Core
 *
 * The destination document and everything that writes to it.
 *
 * ## Model
 *
 * - [`LineDocument`] is the working copy for one streaming session: an indexed
 *   arena of [`DocumentLine`]s, each carrying the [`SentInCodeBlock`] tag it was
 *   built with. Tags are never revisited after construction.
 * - Every mutation emits exactly one [`LineEdit`] to an [`EditSink`], or none
 *   when the write would not change anything.
 * - Mutators return the index for the next write. Callers chain that cursor
 *   rather than recomputing indices after lines shift.
 *
 * ## Ordering
 *
 * Edits are emitted in call order and their line numbers assume that every
 * earlier edit has already been applied. [`RopeBuffer`] is a sink that does
 * exactly that against an xi-rope buffer.
 *
 * ## Anchoring
 *
 * [`anchors`] finds where the reply currently sits in the document and decides
 * where unmatched reply lines go.
 */

pub mod anchors;
pub mod buffer;
pub mod document;
pub mod edit;
pub mod line;

pub use anchors::{
    MIN_ANCHOR_CHARS, MatchedDocumentLine, Placement, VERY_SHORT_LINE_CHARS,
    find_initial_anchor, has_enough_anchor_context, match_reply_line, place_unmatched,
};
pub use buffer::RopeBuffer;
pub use document::{LineDocument, TrackedLine, split_lines};
pub use edit::{EditSink, LineEdit, LineRange};
pub use line::{DocumentLine, SentInCodeBlock, SentLineMarker};
