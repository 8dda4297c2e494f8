use std::sync::OnceLock;

use regex::Regex;

const CODE_LINE_ENDINGS: &[&str] = &[";", "{", "}", "(", ")", "[", "]", ",", ":", "=>", "->", "\\"];

const CODE_KEYWORDS: &[&str] = &[
    "fn", "pub", "let", "const", "var", "function", "def", "class", "struct", "enum", "impl",
    "interface", "import", "from", "use", "return", "if", "else", "for", "while", "switch",
    "case", "match", "try", "catch", "public", "private", "protected", "static", "async",
    "await", "package", "using", "namespace", "export", "type", "#include", "#define", "@",
];

/// Heuristic check for whether unfenced text is source code rather than prose
pub fn looks_like_code(text: &str) -> bool {
    static OPERATOR_REGEX: OnceLock<Regex> = OnceLock::new();
    let operator_regex = OPERATOR_REGEX.get_or_init(|| {
        Regex::new(r"(\w\s*(=|==|!=|\+=|-=|:=|=>)\s*\S)|(\w\()|(^\s*(//|#|/\*|\*|--)\s)")
            .expect("Invalid code operator regex")
    });

    let mut code_lines = 0usize;
    let mut sentence_lines = 0usize;
    let mut total = 0usize;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        total += 1;

        let first_word = trimmed.split_whitespace().next().unwrap_or_default();
        let keyword = CODE_KEYWORDS
            .iter()
            .any(|k| first_word == *k || (k.starts_with(['#', '@']) && first_word.starts_with(k)));
        let ending = CODE_LINE_ENDINGS.iter().any(|e| trimmed.ends_with(e));

        if keyword || ending || operator_regex.is_match(line) {
            code_lines += 1;
        } else if trimmed.ends_with(['.', '?', '!']) && trimmed.split_whitespace().count() > 3 {
            sentence_lines += 1;
        }
    }

    total > 0 && code_lines * 2 >= total && sentence_lines * 2 < total
}
