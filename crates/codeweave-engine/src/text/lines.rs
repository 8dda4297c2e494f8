use std::collections::VecDeque;
use std::fmt;

use futures::{Stream, StreamExt, stream};

/// One line of incoming text, without its terminator
///
/// A trailing carriage return is stripped on construction, so the value never
/// contains `\n` and never ends in `\r`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineOfText(String);

impl LineOfText {
    pub fn new(value: impl Into<String>) -> Self {
        let mut value = value.into();
        if value.ends_with('\r') {
            value.pop();
        }
        debug_assert!(!value.contains('\n'), "line of text must not contain a newline");
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Number of non-whitespace characters on the line
    pub fn significant_chars(&self) -> usize {
        self.0.chars().filter(|c| !c.is_whitespace()).count()
    }
}

impl AsRef<str> for LineOfText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineOfText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LineOfText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for LineOfText {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Incremental splitter turning arbitrary text chunks into complete lines
#[derive(Debug, Default)]
pub struct LineSplitter {
    partial: String,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every line completed by it
    pub fn push(&mut self, chunk: &str) -> Vec<LineOfText> {
        let mut lines = Vec::new();
        let mut rest = chunk;
        while let Some(newline) = rest.find('\n') {
            self.partial.push_str(&rest[..newline]);
            lines.push(LineOfText::new(std::mem::take(&mut self.partial)));
            rest = &rest[newline + 1..];
        }
        self.partial.push_str(rest);
        lines
    }

    /// Flush the unterminated remainder, if there is one
    pub fn finish(&mut self) -> Option<LineOfText> {
        if self.partial.is_empty() {
            None
        } else {
            Some(LineOfText::new(std::mem::take(&mut self.partial)))
        }
    }
}

struct SplitState<S> {
    chunks: S,
    splitter: LineSplitter,
    ready: VecDeque<LineOfText>,
    finished: bool,
}

/// Split a stream of text chunks into a stream of lines
///
/// Lines are yielded as soon as their `\n` arrives. A trailing partial line
/// with no terminator is yielded when the chunk stream ends.
pub fn stream_lines<S, T>(chunks: S) -> impl Stream<Item = LineOfText>
where
    S: Stream<Item = T> + Unpin,
    T: AsRef<str>,
{
    let state = SplitState {
        chunks,
        splitter: LineSplitter::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.ready.pop_front() {
                return Some((line, state));
            }
            if state.finished {
                return None;
            }
            match state.chunks.next().await {
                Some(chunk) => {
                    let lines = state.splitter.push(chunk.as_ref());
                    state.ready.extend(lines);
                }
                None => {
                    state.finished = true;
                    state.ready.extend(state.splitter.finish());
                }
            }
        }
    })
}
