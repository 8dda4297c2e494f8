use anyhow::{Context, Result, anyhow};
use clap::Parser;
use codeweave_config::Config;
use codeweave_engine::{
    CancellationToken, EditSession, EditStrategy, LineEdit, RopeBuffer, SessionOptions,
    StrategyMode, StreamingEditsResult, TextRange,
};
use futures::executor::block_on;
use futures::stream;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Replay a generated reply against a document as if it were streaming in
#[derive(Parser, Debug)]
#[command(name = "codeweave", version, about)]
struct Cli {
    /// File to edit; it is read, never written
    document: PathBuf,
    /// File holding the generator's reply
    reply: PathBuf,
    /// Target selection as LINE:CHAR-LINE:CHAR (zero-based), or a caret LINE:CHAR
    #[arg(long, default_value = "0:0")]
    selection: TextRange,
    /// Language id; guessed from the document's extension when omitted
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    mode: Option<StrategyMode>,
    /// Fallback when no anchor is found
    #[arg(long)]
    strategy: Option<EditStrategy>,
    #[arg(long)]
    no_hoist_imports: bool,
    /// Ignore reply text outside fenced code blocks
    #[arg(long)]
    code_blocks_only: bool,
    /// Characters per simulated stream chunk
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,
    /// Print the edits as JSON lines instead of the edited document
    #[arg(long)]
    edits: bool,
    /// Config file to use instead of ~/.config/codeweave/config.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let document_path = Config::expand_path(&cli.document);
    let reply_path = Config::expand_path(&cli.reply);
    let document = std::fs::read_to_string(&document_path)
        .with_context(|| format!("Failed to read document {}", document_path.display()))?;
    let reply = std::fs::read_to_string(&reply_path)
        .with_context(|| format!("Failed to read reply {}", reply_path.display()))?;

    let language = cli
        .language
        .clone()
        .unwrap_or_else(|| language_for_path(&document_path).to_string());
    let session = build_session(&cli, &config, &document, &language)?;
    let chunks = split_chunks(&reply, cli.chunk_size);
    log::info!(
        "replaying {} chunks against {} ({language})",
        chunks.len(),
        document_path.display()
    );

    let cancel = CancellationToken::new();
    let mut stdout = std::io::stdout().lock();
    let result = if cli.edits {
        let (result, edits) =
            block_on(session.run(stream::iter(chunks), Vec::<LineEdit>::new(), &cancel));
        for edit in &edits {
            writeln!(stdout, "{}", serde_json::to_string(edit)?)?;
        }
        writeln!(stdout, "{}", serde_json::to_string(&result)?)?;
        result
    } else {
        let (result, buffer) =
            block_on(session.run(stream::iter(chunks), RopeBuffer::new(&document), &cancel));
        write!(stdout, "{}", buffer.text())?;
        result
    };
    report_imports(&result);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let loaded = match path {
        Some(path) => {
            let path = Config::expand_path(path);
            Some(Config::load_from_path(&path)?.ok_or_else(|| {
                anyhow!("Config file not found at {}", path.display())
            })?)
        }
        None => Config::load()?,
    };
    Ok(loaded.unwrap_or_default())
}

/// Config supplies the defaults; flags given on the command line win
fn build_session(cli: &Cli, config: &Config, document: &str, language: &str) -> Result<EditSession> {
    let defaults = config.session_options();
    let options = SessionOptions {
        mode: cli.mode.unwrap_or(defaults.mode),
        strategy: cli.strategy.unwrap_or(defaults.strategy),
        hoist_imports: defaults.hoist_imports && !cli.no_hoist_imports,
        code_blocks_only: defaults.code_blocks_only || cli.code_blocks_only,
    };

    let mut session = EditSession::new(document, language, cli.selection, options)
        .context("Invalid selection")?
        .with_context_lines(config.context_lines);
    if let Some(style) = config.indent_style() {
        session = session.with_indent_style(style);
    }
    Ok(session)
}

fn split_chunks(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn report_imports(result: &StreamingEditsResult) {
    if result.additional_imports.is_empty() {
        return;
    }
    eprintln!("Imports to add:");
    for import in &result.additional_imports {
        eprintln!("  {import}");
    }
}

fn language_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "typescriptreact",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "py" => "python",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "scala" => "scala",
        "go" => "go",
        "cs" => "csharp",
        "fs" => "fsharp",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "m" => "objective-c",
        "mm" => "objective-cpp",
        "rs" => "rust",
        "php" => "php",
        "rb" => "ruby",
        _ => "plaintext",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeweave_engine::{IndentStyle, TextPosition};

    #[test]
    fn test_language_from_extension() {
        assert_eq!(language_for_path(Path::new("src/lib.rs")), "rust");
        assert_eq!(language_for_path(Path::new("App.TSX")), "typescriptreact");
        assert_eq!(language_for_path(Path::new("Makefile")), "plaintext");
    }

    #[test]
    fn test_chunks_split_on_characters() {
        assert_eq!(split_chunks("héllo", 2), vec!["hé", "ll", "o"]);
        assert_eq!(split_chunks("", 4), Vec::<String>::new());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "codeweave",
            "doc.ts",
            "reply.txt",
            "--selection",
            "1:0-2:0",
            "--strategy",
            "insert-below-range",
            "--no-hoist-imports",
        ]);
        let config = Config {
            mode: StrategyMode::InsertOrReplace,
            tab_size: Some(2),
            ..Config::default()
        };

        assert_eq!(
            cli.selection,
            TextRange::new(TextPosition::new(1, 0), TextPosition::new(2, 0))
        );
        assert_eq!(config.indent_style(), Some(IndentStyle::Spaces(2)));

        let Ok(session) = build_session(&cli, &config, "a\nb\nc", "typescript") else {
            panic!("valid selection was rejected");
        };
        assert_eq!(session.range(), 1..=1);
    }

    #[test]
    fn test_selection_outside_document_is_an_error() {
        let cli = Cli::parse_from(["codeweave", "doc.ts", "reply.txt", "--selection", "9:0"]);
        let Err(err) = build_session(&cli, &Config::default(), "a\nb", "typescript") else {
            panic!("selection on line 9 of a two-line document was accepted");
        };
        assert_eq!(err.to_string(), "Invalid selection");
        assert!(format!("{err:#}").contains("outside the document"));
    }
}
