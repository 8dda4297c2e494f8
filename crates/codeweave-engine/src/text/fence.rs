use std::collections::VecDeque;

use futures::{Stream, StreamExt, stream};

use super::code_guess::looks_like_code;
use super::lines::LineOfText;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceKind {
    Backticks,
    Tildes,
}

/// A fence delimiter line: its character and run length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceSig {
    pub kind: FenceKind,
    pub len: usize,
    /// Whether anything (a language tag) follows the fence run
    pub has_info: bool,
}

pub struct CodeFence;

impl CodeFence {
    pub const BACKTICKS: &'static str = "```";
    pub const TILDES: &'static str = "~~~";

    pub fn sig(line: &str) -> Option<FenceSig> {
        let t = line.trim_end_matches(['\r', '\n']).trim_start();
        let kind = if t.starts_with(Self::BACKTICKS) {
            FenceKind::Backticks
        } else if t.starts_with(Self::TILDES) {
            FenceKind::Tildes
        } else {
            return None;
        };
        let marker = match kind {
            FenceKind::Backticks => '`',
            FenceKind::Tildes => '~',
        };
        let len = t.chars().take_while(|&c| c == marker).count();
        let has_info = !t[len..].trim().is_empty();
        Some(FenceSig {
            kind,
            len,
            has_info,
        })
    }

    pub fn closes(open: FenceSig, sig: Option<FenceSig>) -> bool {
        matches!(sig, Some(s) if s.kind == open.kind && s.len >= open.len && !s.has_info)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPieceKind {
    OutsideCodeBlock,
    InsideCodeBlock,
    Delimiter,
}

/// A run of text tagged with where it sits relative to fenced code blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedTextPiece {
    pub kind: TextPieceKind,
    pub value: String,
}

impl ClassifiedTextPiece {
    fn new(kind: TextPieceKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Tracks whether a sequence of lines is currently inside a fenced block
#[derive(Debug, Default, Clone)]
pub struct FenceTracker {
    open: Option<FenceSig>,
    seen_fence: bool,
}

impl FenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_inside(&self) -> bool {
        self.open.is_some()
    }

    pub fn seen_fence(&self) -> bool {
        self.seen_fence
    }

    /// Classify a complete line and advance the state
    pub fn classify(&mut self, line: &str) -> TextPieceKind {
        let sig = CodeFence::sig(line);
        match self.open {
            Some(open) if CodeFence::closes(open, sig) => {
                self.open = None;
                TextPieceKind::Delimiter
            }
            Some(_) => TextPieceKind::InsideCodeBlock,
            None => match sig {
                Some(sig) => {
                    self.open = Some(sig);
                    self.seen_fence = true;
                    TextPieceKind::Delimiter
                }
                None => TextPieceKind::OutsideCodeBlock,
            },
        }
    }
}

/// Pull-based classifier of raw text into prose, code and fence delimiters
///
/// Text that precedes the first fence is held back. If a fence appears it is
/// released as prose; if the input ends without any fence, [`looks_like_code`]
/// decides whether the whole held text was code after all.
#[derive(Debug, Default)]
pub struct FencedBlockClassifier {
    tracker: FenceTracker,
    partial: String,
    held: String,
}

impl FencedBlockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) -> Vec<ClassifiedTextPiece> {
        let mut pieces = Vec::new();
        let mut rest = chunk;
        while let Some(newline) = rest.find('\n') {
            self.partial.push_str(&rest[..=newline]);
            rest = &rest[newline + 1..];
            let line = std::mem::take(&mut self.partial);
            self.classify_line(line, &mut pieces);
        }
        self.partial.push_str(rest);
        pieces
    }

    pub fn finish(&mut self) -> Vec<ClassifiedTextPiece> {
        let mut pieces = Vec::new();
        if !self.partial.is_empty() {
            let line = std::mem::take(&mut self.partial);
            self.classify_line(line, &mut pieces);
        }
        if !self.held.is_empty() {
            let held = std::mem::take(&mut self.held);
            let kind = if looks_like_code(&held) {
                TextPieceKind::InsideCodeBlock
            } else {
                TextPieceKind::OutsideCodeBlock
            };
            log::debug!("no code fence in reply, classified held text as {kind:?}");
            pieces.push(ClassifiedTextPiece::new(kind, held));
        }
        pieces
    }

    fn classify_line(&mut self, line: String, pieces: &mut Vec<ClassifiedTextPiece>) {
        let kind = self.tracker.classify(&line);
        if !self.tracker.seen_fence() {
            self.held.push_str(&line);
            return;
        }
        if !self.held.is_empty() {
            pieces.push(ClassifiedTextPiece::new(
                TextPieceKind::OutsideCodeBlock,
                std::mem::take(&mut self.held),
            ));
        }
        match pieces.last_mut() {
            Some(last) if last.kind == kind && kind != TextPieceKind::Delimiter => {
                last.value.push_str(&line)
            }
            _ => pieces.push(ClassifiedTextPiece::new(kind, line)),
        }
    }
}

struct ClassifyState<S> {
    chunks: S,
    classifier: FencedBlockClassifier,
    ready: VecDeque<ClassifiedTextPiece>,
    finished: bool,
}

/// Classify a chunk stream into [`ClassifiedTextPiece`]s as it arrives
pub fn classify_fenced_blocks<S, T>(chunks: S) -> impl Stream<Item = ClassifiedTextPiece>
where
    S: Stream<Item = T> + Unpin,
    T: AsRef<str>,
{
    let state = ClassifyState {
        chunks,
        classifier: FencedBlockClassifier::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(piece) = state.ready.pop_front() {
                return Some((piece, state));
            }
            if state.finished {
                return None;
            }
            match state.chunks.next().await {
                Some(chunk) => {
                    let pieces = state.classifier.push(chunk.as_ref());
                    state.ready.extend(pieces);
                }
                None => {
                    state.finished = true;
                    let pieces = state.classifier.finish();
                    state.ready.extend(pieces);
                }
            }
        }
    })
}

/// Keep only the text that sits inside fenced code blocks
pub fn code_block_text<S, T>(chunks: S) -> impl Stream<Item = String>
where
    S: Stream<Item = T> + Unpin,
    T: AsRef<str>,
{
    classify_fenced_blocks(chunks).filter_map(|piece| async move {
        (piece.kind == TextPieceKind::InsideCodeBlock).then_some(piece.value)
    })
}

/// Predicate applied to each reply line before a strategy sees it
pub type LineFilter = Box<dyn FnMut(&LineOfText) -> bool + Send>;

pub mod line_filters {
    use super::*;

    /// Admit every line
    pub fn all() -> LineFilter {
        Box::new(|_| true)
    }

    /// Admit only lines strictly between an opening and closing fence
    pub fn inside_code_block() -> LineFilter {
        let mut tracker = FenceTracker::new();
        Box::new(move |line| tracker.classify(line.as_str()) == TextPieceKind::InsideCodeBlock)
    }
}
