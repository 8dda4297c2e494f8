//! Edit strategies: how a stream of reply lines turns into document edits.

pub mod insert_or_replace;
pub mod insertion;
pub mod replace_selection;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::editing::{DocumentLine, EditSink, LineDocument};
use crate::imports::ImportCollector;
use crate::text::{LineFilter, LineOfText, line_filters};

pub use insert_or_replace::InsertOrReplace;
pub use insertion::Insertion;
pub use replace_selection::ReplaceSelection;

/// Terminal summary of one strategy run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingEditsResult {
    pub did_noop_edits: bool,
    pub did_edits: bool,
    pub additional_imports: Vec<String>,
}

impl StreamingEditsResult {
    fn collect<K>(doc: &LineDocument<K>, intake: LineIntake) -> Self {
        Self {
            did_noop_edits: doc.did_noop_edits(),
            did_edits: doc.did_edits(),
            additional_imports: intake.into_imports(),
        }
    }
}

/// What the whole-range strategy does when the first reply line has no anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EditStrategy {
    #[serde(rename = "insert-above-range")]
    FallbackToInsertAboveRange,
    #[serde(rename = "insert-below-range")]
    FallbackToInsertBelowRange,
    #[default]
    #[serde(rename = "replace-range")]
    FallbackToReplaceRange,
    /// Always insert; the reply is new code rather than an edit
    #[serde(rename = "force-insertion")]
    ForceInsertion,
}

impl EditStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditStrategy::FallbackToInsertAboveRange => "insert-above-range",
            EditStrategy::FallbackToInsertBelowRange => "insert-below-range",
            EditStrategy::FallbackToReplaceRange => "replace-range",
            EditStrategy::ForceInsertion => "force-insertion",
        }
    }
}

impl fmt::Display for EditStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert-above-range" => Ok(EditStrategy::FallbackToInsertAboveRange),
            "insert-below-range" => Ok(EditStrategy::FallbackToInsertBelowRange),
            "replace-range" => Ok(EditStrategy::FallbackToReplaceRange),
            "force-insertion" => Ok(EditStrategy::ForceInsertion),
            other => Err(format!(
                "unknown strategy '{other}' (expected insert-above-range, insert-below-range, replace-range or force-insertion)"
            )),
        }
    }
}

/// Which of the three strategies a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyMode {
    #[default]
    InsertOrReplace,
    Insertion,
    ReplaceSelection,
}

impl StrategyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyMode::InsertOrReplace => "insert-or-replace",
            StrategyMode::Insertion => "insertion",
            StrategyMode::ReplaceSelection => "replace-selection",
        }
    }
}

impl fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert-or-replace" => Ok(StrategyMode::InsertOrReplace),
            "insertion" => Ok(StrategyMode::Insertion),
            "replace-selection" => Ok(StrategyMode::ReplaceSelection),
            other => Err(format!(
                "unknown mode '{other}' (expected insert-or-replace, insertion or replace-selection)"
            )),
        }
    }
}

/// A zero-based line and character position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TextPosition {
    pub line: usize,
    pub character: usize,
}

impl TextPosition {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

/// Parses `LINE:CHARACTER`, or a bare `LINE` meaning its first character
impl FromStr for TextPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, character) = s.split_once(':').unwrap_or((s, "0"));
        let number = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid position '{s}' (expected LINE:CHARACTER)"))
        };
        Ok(TextPosition::new(number(line)?, number(character)?))
    }
}

/// Selection in the document; `start == end` is a caret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub start: TextPosition,
    pub end: TextPosition,
}

impl TextRange {
    pub fn new(start: TextPosition, end: TextPosition) -> Self {
        Self { start, end }
    }

    pub fn caret(at: TextPosition) -> Self {
        Self::new(at, at)
    }

    /// Whole lines `start..=end`
    pub fn lines(start: usize, end: usize) -> Self {
        Self::new(TextPosition::new(start, 0), TextPosition::new(end, usize::MAX))
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Last line the selection covers
    ///
    /// A selection that ends at column 0 of a later line ends on the line
    /// before it.
    pub fn end_line(&self) -> usize {
        if self.end.character == 0 && self.end.line > self.start.line {
            self.end.line - 1
        } else {
            self.end.line
        }
    }
}

/// Parses `START-END` or a single caret position
impl FromStr for TextRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((start, end)) => Ok(TextRange::new(start.parse()?, end.parse()?)),
            None => Ok(TextRange::caret(s.parse()?)),
        }
    }
}

/// Whether writing `reply` over `line` keeps what the user already has there
///
/// True for a blank line, or when the reply starts with the line's content.
pub(crate) fn continues_line(line: &DocumentLine, reply: &str) -> bool {
    line.is_blank() || reply.trim().starts_with(line.trimmed())
}

/// Cooperative cancellation flag, checked once per reply line
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Front of every strategy: the line filter, then import hoisting
pub struct LineIntake {
    filter: LineFilter,
    imports: Option<ImportCollector>,
}

impl LineIntake {
    pub fn new(filter: LineFilter, imports: Option<ImportCollector>) -> Self {
        Self { filter, imports }
    }

    /// Intake that admits every line unchanged
    pub fn pass_through() -> Self {
        Self::new(line_filters::all(), None)
    }

    /// The line, if it should reach the document
    pub fn admit(&mut self, line: LineOfText) -> Option<LineOfText> {
        if !(self.filter)(&line) {
            return None;
        }
        if let Some(collector) = &mut self.imports
            && collector.offer(&line)
        {
            return None;
        }
        Some(line)
    }

    pub fn into_imports(self) -> Vec<String> {
        self.imports
            .map(ImportCollector::into_imports)
            .unwrap_or_default()
    }
}

/// The closed set of strategies, chosen once per session
#[derive(Debug, Clone)]
pub enum StreamingEdits {
    InsertOrReplace(InsertOrReplace),
    Insertion(Insertion),
    ReplaceSelection(ReplaceSelection),
}

impl StreamingEdits {
    pub async fn process_stream<K, S>(
        self,
        doc: &mut LineDocument<K>,
        lines: S,
        intake: LineIntake,
        cancel: &CancellationToken,
    ) -> StreamingEditsResult
    where
        K: EditSink,
        S: Stream<Item = LineOfText>,
    {
        match self {
            StreamingEdits::InsertOrReplace(s) => s.process_stream(doc, lines, intake, cancel).await,
            StreamingEdits::Insertion(s) => s.process_stream(doc, lines, intake, cancel).await,
            StreamingEdits::ReplaceSelection(s) => {
                s.process_stream(doc, lines, intake, cancel).await
            }
        }
    }
}
