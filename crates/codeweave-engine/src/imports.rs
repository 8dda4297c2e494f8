//! Import and include statements, and hoisting them out of a reply.

use std::ops::RangeInclusive;
use std::sync::OnceLock;

use regex::Regex;

use crate::editing::LineDocument;
use crate::text::LineOfText;

fn js_import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*(import(\s+|\s*[{*'"])|(const|let|var)\s+[\w{}\s,]+=\s*require\s*\()"#)
            .expect("valid regex")
    })
}

fn python_import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(import\s+\w|from\s+[\w.]+\s+import\s)").expect("valid regex")
    })
}

fn keyword_import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*import\s+[\w.(\x22]").expect("valid regex"))
}

fn dotnet_import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(using\s+(static\s+)?[\w.]+(\s*=\s*[\w.<>]+)?\s*;|open\s+[\w.]+\s*$)")
            .expect("valid regex")
    })
}

fn c_include_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*#\s*(include|import)\b").expect("valid regex"))
}

fn rust_use_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*((pub(\([\w:]+\))?\s+)?use\s+[\w:{}*,\s]+;|extern\s+crate\s+\w+)")
            .expect("valid regex")
    })
}

fn php_import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(use\s+[\w\\]+|(require|include)(_once)?\b)").expect("valid regex")
    })
}

fn ruby_require_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*require(_relative)?\s").expect("valid regex"))
}

/// Whether `line` imports or includes another module in `language_id`
///
/// Unknown languages have no import statements.
pub fn is_import_statement(line: &str, language_id: &str) -> bool {
    let re = match language_id {
        "typescript" | "typescriptreact" | "javascript" | "javascriptreact" => js_import_regex(),
        "python" => python_import_regex(),
        "java" | "kotlin" | "scala" | "go" => keyword_import_regex(),
        "csharp" | "fsharp" => dotnet_import_regex(),
        "c" | "cpp" | "objective-c" | "objective-cpp" => c_include_regex(),
        "rust" => rust_use_regex(),
        "php" => php_import_regex(),
        "ruby" => ruby_require_regex(),
        _ => return false,
    };
    re.is_match(line)
}

/// Whether any line in `range` of the document is an import
pub fn has_imports_in_range<K>(doc: &LineDocument<K>, range: RangeInclusive<usize>) -> bool {
    let end = (*range.end()).min(doc.line_count().saturating_sub(1));
    (*range.start()..=end).any(|i| is_import_statement(doc.line(i).content(), doc.language_id()))
}

/// Brackets opened minus brackets closed on one line
fn bracket_balance(text: &str) -> isize {
    text.chars()
        .map(|c| match c {
            '(' | '{' => 1,
            ')' | '}' => -1,
            _ => 0,
        })
        .sum()
}

/// An import statement that spans lines, such as Go's `import (` block
#[derive(Debug, Clone)]
struct OpenGroup {
    text: String,
    depth: isize,
}

/// Side channel collecting import lines pulled out of a reply
#[derive(Debug, Clone)]
pub struct ImportCollector {
    language_id: String,
    imports: Vec<String>,
    group: Option<OpenGroup>,
    after_import: bool,
    seen_code: bool,
}

impl ImportCollector {
    pub fn new(language_id: impl Into<String>) -> Self {
        Self {
            language_id: language_id.into(),
            imports: Vec::new(),
            group: None,
            after_import: false,
            seen_code: false,
        }
    }

    /// Offer a reply line; returns `true` if the collector kept it
    ///
    /// Blank lines directly after a collected import are dropped too, until
    /// the first line of code comes through. An import that leaves a bracket
    /// open keeps every line up to the one closing it, and is hoisted as a
    /// single multi-line entry.
    pub fn offer(&mut self, line: &LineOfText) -> bool {
        let text = line.as_str();
        if let Some(group) = self.group.as_mut() {
            group.text.push('\n');
            group.text.push_str(text.trim_end());
            group.depth += bracket_balance(text);
            if group.depth <= 0 {
                self.close_group();
            }
            return true;
        }

        if is_import_statement(text, &self.language_id) {
            let depth = bracket_balance(text);
            if depth > 0 {
                log::debug!("hoisting import block opened by {:?}", text.trim());
                self.group = Some(OpenGroup {
                    text: text.trim().to_string(),
                    depth,
                });
                return true;
            }
            log::debug!("hoisting import {:?}", text.trim());
            self.imports.push(text.trim().to_string());
            self.after_import = true;
            return true;
        }

        let blank = text.trim().is_empty();
        if blank && self.after_import && !self.seen_code {
            return true;
        }
        self.after_import = false;
        if !blank {
            self.seen_code = true;
        }
        false
    }

    fn close_group(&mut self) {
        if let Some(group) = self.group.take() {
            self.imports.push(group.text);
            self.after_import = true;
        }
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// The collected imports, including a block the reply never closed
    pub fn into_imports(mut self) -> Vec<String> {
        self.close_group();
        self.imports
    }
}
